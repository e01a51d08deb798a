use base64::Engine;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

pub const CONFIG_FILE: &str = "milk-ledger.toml";

/// Runtime configuration.
///
/// Sources, later ones winning: built-in defaults, `milk-ledger.toml`,
/// `MILK_*` environment variables, then a bare `DATABASE_URL`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `sqlite:` for the embedded file database, `postgres:` for a hosted one.
    pub database_url: String,
    pub listen_addr: String,
    pub loglevel: String,
    pub max_connections: u32,
    /// Base64-encoded key (at least 64 bytes) for the session cookie.
    pub cookie_secret: Option<String>,
    pub session_days: i64,
    pub login_attempts_per_minute: u32,
    pub insecure_cookie: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://milk_tracker.db?mode=rwc".to_string(),
            listen_addr: "0.0.0.0:3000".to_string(),
            loglevel: "info".to_string(),
            max_connections: 5,
            cookie_secret: None,
            session_days: 30,
            login_attempts_per_minute: 10,
            insecure_cookie: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, LedgerError> {
        Self::figment()
            .extract()
            .map_err(|e| LedgerError::Config(e.to_string()))
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("MILK_"))
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    /// Decoded cookie key material, if one is configured.
    pub fn cookie_key_bytes(&self) -> Result<Option<Vec<u8>>, LedgerError> {
        let Some(secret) = self.cookie_secret.as_deref() else {
            return Ok(None);
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(secret.trim())
            .map_err(|e| LedgerError::Config(format!("cookie_secret is not base64: {e}")))?;
        if bytes.len() < 64 {
            return Err(LedgerError::Config(format!(
                "cookie_secret must decode to at least 64 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Some(bytes))
    }

    /// Database URL safe for logs.
    pub fn redacted_database_url(&self) -> String {
        match url::Url::parse(&self.database_url) {
            Ok(mut u) if u.password().is_some() => {
                let _ = u.set_password(Some("***"));
                u.to_string()
            }
            _ => self.database_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MILK_LISTEN_ADDR", "127.0.0.1:9000");
            jail.set_env("DATABASE_URL", "postgres://u:secret@db/milk");
            let cfg = Config::load().expect("config loads");
            assert_eq!(cfg.listen_addr, "127.0.0.1:9000");
            assert_eq!(cfg.database_url, "postgres://u:secret@db/milk");
            assert_eq!(cfg.session_days, 30);
            assert!(!cfg.redacted_database_url().contains("secret"));
            Ok(())
        });
    }

    #[test]
    fn short_cookie_secret_is_rejected() {
        let cfg = Config {
            cookie_secret: Some(base64::engine::general_purpose::STANDARD.encode([7u8; 16])),
            ..Config::default()
        };
        assert!(matches!(cfg.cookie_key_bytes(), Err(LedgerError::Config(_))));

        let cfg = Config {
            cookie_secret: Some(base64::engine::general_purpose::STANDARD.encode([7u8; 64])),
            ..Config::default()
        };
        assert_eq!(cfg.cookie_key_bytes().unwrap().unwrap().len(), 64);
    }
}
