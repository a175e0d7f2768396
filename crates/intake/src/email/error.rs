//! Mail source error types.

use thiserror::Error;

/// Errors that can occur while talking to the mail provider.
#[derive(Error, Debug)]
pub enum EmailError {
    /// Credential material is missing or unreadable.
    #[error("Setup error: {0}")]
    Setup(String),

    /// A configured credential source did not yield a value.
    #[error("Credentials not found: {0}")]
    CredentialsNotFound(#[from] crate::secrets::SecretError),

    /// OAuth2 token exchange failed.
    #[error("OAuth2 error: {0}")]
    OAuth2Error(String),

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider API answered with a non-success status.
    #[error("Mail API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The provider response could not be interpreted.
    #[error("Failed to parse mail API response: {0}")]
    ParseError(String),

    /// Storing extracted contacts failed.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl EmailError {
    /// True for failures that retrying cannot fix without operator action.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            EmailError::Setup(_) | EmailError::CredentialsNotFound(_)
        )
    }
}

impl From<crate::db::DatabaseError> for EmailError {
    fn from(err: crate::db::DatabaseError) -> Self {
        EmailError::DatabaseError(err.to_string())
    }
}

/// Result type for mail operations.
pub type Result<T> = std::result::Result<T, EmailError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::SecretError;

    #[test]
    fn test_setup_errors_are_flagged() {
        assert!(EmailError::Setup("no client id".into()).is_setup());
        assert!(EmailError::CredentialsNotFound(SecretError::NoSourceProvided).is_setup());
        assert!(!EmailError::OAuth2Error("denied".into()).is_setup());
        assert!(!EmailError::Api {
            status: 500,
            body: String::new()
        }
        .is_setup());
    }

    #[test]
    fn test_display_includes_context() {
        let err = EmailError::Api {
            status: 404,
            body: "not found".into(),
        };
        assert_eq!(err.to_string(), "Mail API returned 404: not found");
    }
}
