use serde::{Deserialize, Serialize};

/// Body the catalog API attaches to rejected requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// Extracts the server message from a raw response body, if it carries one.
    pub fn message_from(raw: &str) -> Option<String> {
        serde_json::from_str::<Self>(raw)
            .ok()
            .map(|body| body.error)
            .filter(|message| !message.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorBody;

    #[test]
    fn extracts_server_error_message() {
        assert_eq!(
            ErrorBody::message_from(r#"{"error":"Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
    }

    #[test]
    fn ignores_bodies_without_message() {
        assert_eq!(ErrorBody::message_from("<html>bad gateway</html>"), None);
        assert_eq!(ErrorBody::message_from(r#"{"error":"  "}"#), None);
        assert_eq!(ErrorBody::message_from("{}"), None);
    }
}
