//! User-entered wine fields and their conversion into a create request.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::protocol::{KeyValues, NewCatalogEntry};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("title must not be empty")]
    MissingTitle,
    #[error("year '{value}' is not a whole number")]
    InvalidYear { value: String },
    #[error("image is not valid base64: {reason}")]
    InvalidImage { reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WineDraft {
    pub title: String,
    /// Raw text as typed; parsed on submit.
    pub year: String,
    pub description: String,
    pub image: String,
}

impl WineDraft {
    /// Title and description are sent as typed; only the year and image are
    /// normalized.
    pub fn validate(&self) -> Result<NewCatalogEntry, DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::MissingTitle);
        }
        Ok(NewCatalogEntry {
            title: self.title.clone(),
            year: parse_year(&self.year)?,
            description: self.description.clone(),
            image: normalize_image(&self.image)?,
            kv: KeyValues::new(),
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn parse_year(raw: &str) -> Result<i64, DraftError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| DraftError::InvalidYear {
            value: raw.to_string(),
        })
}

/// Accepts bare base64 or a `data:<mime>;base64,` URL and returns bare base64.
fn normalize_image(raw: &str) -> Result<String, DraftError> {
    let raw = raw.trim();
    let payload = match raw.strip_prefix("data:") {
        Some(data_url) => {
            let Some((header, payload)) = data_url.split_once(',') else {
                return Err(DraftError::InvalidImage {
                    reason: "data url has no payload".into(),
                });
            };
            if !header.ends_with(";base64") {
                return Err(DraftError::InvalidImage {
                    reason: "data url is not base64-encoded".into(),
                });
            }
            payload
        }
        None => raw,
    };

    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return Ok(compact);
    }
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| DraftError::InvalidImage {
            reason: err.to_string(),
        })?;
    Ok(compact)
}

pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, year: &str, image: &str) -> WineDraft {
        WineDraft {
            title: title.into(),
            year: year.into(),
            description: "smoky".into(),
            image: image.into(),
        }
    }

    #[test]
    fn converts_year_to_integer_with_empty_kv() {
        let entry = draft("Malbec", " 2019 ", "").validate().expect("valid draft");
        assert_eq!(entry.title, "Malbec");
        assert_eq!(entry.year, 2019);
        assert_eq!(entry.description, "smoky");
        assert!(entry.image.is_empty());
        assert!(entry.kv.is_empty());
    }

    #[test]
    fn rejects_non_numeric_year() {
        for year in ["", "twenty", "2019.5", "19x"] {
            assert_eq!(
                draft("Malbec", year, "").validate(),
                Err(DraftError::InvalidYear {
                    value: year.to_string()
                }),
                "year {year:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_blank_title() {
        assert_eq!(
            draft("   ", "2019", "").validate(),
            Err(DraftError::MissingTitle)
        );
    }

    #[test]
    fn keeps_title_and_description_as_typed() {
        let typed = WineDraft {
            title: "  Château Margaux ".into(),
            year: "2015".into(),
            description: "\tfirst line\nsecond line ".into(),
            image: String::new(),
        };
        let entry = typed.validate().expect("valid draft");
        assert_eq!(entry.title, "  Château Margaux ");
        assert_eq!(entry.description, "\tfirst line\nsecond line ");
    }

    #[test]
    fn strips_data_url_prefix_and_whitespace() {
        let encoded = encode_image(b"\xff\xd8\xff\xe0jpeg");
        let wrapped = format!("data:image/jpeg;base64,{}\n", encoded);
        let entry = draft("Rioja", "2015", &wrapped).validate().expect("valid");
        assert_eq!(entry.image, encoded);
    }

    #[test]
    fn rejects_malformed_images() {
        assert!(matches!(
            draft("Rioja", "2015", "not*base64").validate(),
            Err(DraftError::InvalidImage { .. })
        ));
        assert!(matches!(
            draft("Rioja", "2015", "data:image/png,rawbytes").validate(),
            Err(DraftError::InvalidImage { .. })
        ));
    }

    #[test]
    fn clear_resets_every_field() {
        let mut d = draft("Malbec", "2019", "");
        assert!(!d.is_empty());
        d.clear();
        assert!(d.is_empty());
    }
}
