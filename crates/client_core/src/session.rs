use std::fmt;

/// Authentication state of the controller.
///
/// A token read back from device storage is never trusted outright: it stays in
/// `PendingValidation` until the first catalog fetch either succeeds (promoting it to
/// `LoggedIn`) or is refused (dropping back to `LoggedOut`).
#[derive(Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    LoggedOut,
    PendingValidation {
        token: String,
    },
    LoggedIn {
        token: String,
    },
}

impl SessionState {
    pub fn restored(token: Option<String>) -> Self {
        match token {
            Some(token) if !token.trim().is_empty() => Self::PendingValidation { token },
            _ => Self::LoggedOut,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::LoggedOut => None,
            Self::PendingValidation { token } | Self::LoggedIn { token } => Some(token),
        }
    }

    /// Whether the catalog view should be shown. Pending sessions count as logged in.
    pub fn is_logged_in(&self) -> bool {
        !matches!(self, Self::LoggedOut)
    }

    pub fn is_validated(&self) -> bool {
        matches!(self, Self::LoggedIn { .. })
    }

    /// Promotes a pending session after the server accepted its token.
    pub(crate) fn confirm(&mut self) {
        if let Self::PendingValidation { token } = self {
            *self = Self::LoggedIn {
                token: std::mem::take(token),
            };
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::LoggedOut => "logged_out",
            Self::PendingValidation { .. } => "pending_validation",
            Self::LoggedIn { .. } => "logged_in",
        }
    }
}

// Tokens are bearer credentials and must not end up in logs.
impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggedOut => f.write_str("LoggedOut"),
            Self::PendingValidation { .. } => f
                .debug_struct("PendingValidation")
                .field("token", &"<redacted>")
                .finish(),
            Self::LoggedIn { .. } => f
                .debug_struct("LoggedIn")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}
