use std::borrow::Cow;

/// Rewrite Postgres-style `$N` placeholders into SQLite's `?N`.
///
/// Numbers are kept so a placeholder may appear more than once. Text inside
/// single-quoted literals and double-quoted identifiers is left alone.
pub fn to_sqlite(sql: &str) -> Cow<'_, str> {
    if !sql.contains('$') {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    out.push(c);
                }
                '$' if chars.peek().is_some_and(char::is_ascii_digit) => {
                    out.push('?');
                    while let Some(d) = chars.next_if(char::is_ascii_digit) {
                        out.push(d);
                    }
                }
                _ => out.push(c),
            },
        }
    }
    Cow::Owned(out)
}
