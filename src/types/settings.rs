use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_RATE_KEY: &str = "default_rate";
pub const THEME_KEY: &str = "theme";
pub const PIN_KEY: &str = "pin";

pub const DEFAULT_RATE: &str = "60";
pub const DEFAULT_THEME: &str = "midnight";
pub const DEFAULT_PIN: &str = "2580";

/// Seed rows written on first initialization.
pub const SEED_SETTINGS: [(&str, &str); 3] = [
    (DEFAULT_RATE_KEY, DEFAULT_RATE),
    (THEME_KEY, DEFAULT_THEME),
    (PIN_KEY, DEFAULT_PIN),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Midnight,
    Ocean,
    Forest,
    Light,
    Dark,
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "midnight" => Ok(Theme::Midnight),
            "ocean" => Ok(Theme::Ocean),
            "forest" => Ok(Theme::Forest),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(()),
        }
    }
}

/// Typed view over the raw key/value settings, with hardcoded fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppSettings {
    pub default_rate: f64,
    pub theme: Theme,
    #[serde(skip)]
    pub pin: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_rate: 60.0,
            theme: Theme::default(),
            pin: DEFAULT_PIN.to_string(),
        }
    }
}

impl AppSettings {
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();
        let default_rate = map
            .get(DEFAULT_RATE_KEY)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(defaults.default_rate);
        let theme = match map.get(THEME_KEY) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                debug!(theme = %raw, "unknown theme; using default");
                defaults.theme
            }),
            None => defaults.theme,
        };
        let pin = map.get(PIN_KEY).cloned().unwrap_or(defaults.pin);
        Self {
            default_rate,
            theme,
            pin,
        }
    }
}

/// Exactly four ASCII digits.
pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == 4 && pin.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings = AppSettings::from_map(&BTreeMap::new());
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.pin, "2580");
    }

    #[test]
    fn garbage_values_fall_back_per_key() {
        let map = BTreeMap::from([
            (DEFAULT_RATE_KEY.to_string(), "sixty".to_string()),
            (THEME_KEY.to_string(), "Ocean".to_string()),
            (PIN_KEY.to_string(), "1111".to_string()),
        ]);
        let settings = AppSettings::from_map(&map);
        assert_eq!(settings.default_rate, 60.0);
        assert_eq!(settings.theme, Theme::Ocean);
        assert_eq!(settings.pin, "1111");
    }

    #[test]
    fn pin_format() {
        assert!(is_valid_pin("0000"));
        assert!(!is_valid_pin("123"));
        assert!(!is_valid_pin("12a4"));
        assert!(!is_valid_pin("12345"));
    }
}
