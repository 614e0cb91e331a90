use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::WineId;

/// Free-form extension attributes stored alongside a wine.
pub type KeyValues = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: WineId,
    pub title: String,
    /// `None` for entries stored without a usable year (older clients sent `null`).
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<i64>,
    #[serde(default)]
    pub description: String,
    /// Base64 image payload without a `data:` prefix.
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub kv: KeyValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCatalogEntry {
    pub title: String,
    pub year: i64,
    pub description: String,
    pub image: String,
    pub kv: KeyValues,
}

/// Integers and integral numeric strings become a year; anything else is `None`.
fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_uses_camel_case_token() {
        let body: LoginResponse =
            serde_json::from_str(r#"{"accessToken":"tok-1"}"#).expect("login response");
        assert_eq!(body.access_token, "tok-1");
    }

    #[test]
    fn catalog_entry_defaults_optional_fields() {
        let entry: CatalogEntry =
            serde_json::from_str(r#"{"id":3,"title":"Rioja","year":2015}"#).expect("entry");
        assert_eq!(entry.id, WineId::Numeric(3));
        assert_eq!(entry.year, Some(2015));
        assert!(entry.description.is_empty());
        assert!(entry.image.is_empty());
        assert!(entry.kv.is_empty());
    }

    #[test]
    fn catalog_with_unusable_years_still_decodes() {
        let entries: Vec<CatalogEntry> = serde_json::from_str(
            r#"[
                {"id":1,"title":"Syrah","year":2018},
                {"id":2,"title":"Legacy","year":null,"description":"","image":"","kv":{}},
                {"id":3,"title":"No year"},
                {"id":4,"title":"Typed","year":"1999"},
                {"id":5,"title":"Junk","year":"NaN"},
                {"id":6,"title":"Fraction","year":2019.5}
            ]"#,
        )
        .expect("catalog");
        let years: Vec<Option<i64>> = entries.iter().map(|e| e.year).collect();
        assert_eq!(
            years,
            vec![Some(2018), None, None, Some(1999), None, None]
        );
    }

    #[test]
    fn new_entry_serializes_empty_kv_object() {
        let entry = NewCatalogEntry {
            title: "Malbec".into(),
            year: 2019,
            description: "smoky".into(),
            image: String::new(),
            kv: KeyValues::new(),
        };
        let json = serde_json::to_value(&entry).expect("json");
        assert_eq!(json["year"], 2019);
        assert_eq!(json["kv"], serde_json::json!({}));
    }
}
