//! Lenient numeric input: form fields arrive as numbers or numeric strings.

use serde::{Deserialize, Deserializer, de};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| de::Error::custom(format!("`{s}` is not a number"))),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Form {
        #[serde(deserialize_with = "super::number")]
        quantity: f64,
    }

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let a: Form = serde_json::from_str(r#"{"quantity": 1.5}"#).unwrap();
        let b: Form = serde_json::from_str(r#"{"quantity": " 2 "}"#).unwrap();
        let c: Form = serde_json::from_str(r#"{"quantity": 3}"#).unwrap();
        assert_eq!((a.quantity, b.quantity, c.quantity), (1.5, 2.0, 3.0));
    }

    #[test]
    fn rejects_non_numeric_text() {
        assert!(serde_json::from_str::<Form>(r#"{"quantity": "abc"}"#).is_err());
        assert!(serde_json::from_str::<Form>(r#"{"quantity": "NaN"}"#).is_err());
        assert!(serde_json::from_str::<Form>(r#"{"quantity": null}"#).is_err());
    }
}
