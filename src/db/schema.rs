//! SQL DDL for the three ledger tables, one dialect per backend.

/// SQLite schema:
/// - `entries.date` UNIQUE, so a day holds at most one entry
/// - `payments` has no uniqueness beyond its id
/// - `settings.key` is the primary key
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL UNIQUE, -- YYYY-MM-DD
    quantity REAL,
    rate REAL
);

CREATE TABLE IF NOT EXISTS payments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    amount REAL
);

CREATE INDEX IF NOT EXISTS idx_payments_date ON payments(date);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT
);
"#;

/// Postgres schema; same shape with `BIGSERIAL` ids and `DOUBLE PRECISION` values.
pub const POSTGRES_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    id BIGSERIAL PRIMARY KEY,
    date TEXT NOT NULL UNIQUE,
    quantity DOUBLE PRECISION,
    rate DOUBLE PRECISION
);

CREATE TABLE IF NOT EXISTS payments (
    id BIGSERIAL PRIMARY KEY,
    date TEXT NOT NULL,
    amount DOUBLE PRECISION
);

CREATE INDEX IF NOT EXISTS idx_payments_date ON payments(date);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT
);
"#;

/// Seeds one setting unless the key already exists.
pub const SEED_SETTING: &str =
    "INSERT INTO settings (key, value) VALUES ($1, $2) ON CONFLICT (key) DO NOTHING";

/// Split a DDL script into individual statements; `sqlx::query` runs one at a time.
pub fn statements(script: &str) -> impl Iterator<Item = &str> {
    script.split(';').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_split_into_create_statements() {
        for script in [SQLITE_INIT, POSTGRES_INIT] {
            let stmts: Vec<_> = statements(script).collect();
            assert_eq!(stmts.len(), 4);
            assert!(stmts.iter().all(|s| s.starts_with("CREATE")));
        }
    }
}
