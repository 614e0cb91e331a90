use thiserror::Error;

use crate::draft::DraftError;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Login or signup rejected by the server; `message` is the server's text.
    #[error("{message}")]
    Auth { message: String },
    #[error("session rejected by catalog API ({status}): {message}")]
    Unauthorized { status: u16, message: String },
    #[error("catalog API returned {status}: {message}")]
    Http { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid catalog API url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error("not logged in")]
    NotLoggedIn,
    #[error("token store failure: {0:#}")]
    TokenStore(anyhow::Error),
}

impl CatalogError {
    /// True when the server refused the bearer token, which ends the session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Text suitable for a user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth { message } => message.clone(),
            Self::Unauthorized { .. } => "Your session has expired; please log in again".into(),
            Self::Http { message, .. } => message.clone(),
            Self::Transport(err) if err.is_timeout() => "The catalog server timed out".into(),
            Self::Transport(err) if err.is_connect() => {
                "The catalog server is unreachable; check your network".into()
            }
            other => other.to_string(),
        }
    }
}
