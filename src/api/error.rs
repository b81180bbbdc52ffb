use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("{}", .message.as_deref().unwrap_or("invalid email or password"))]
    InvalidCredentials { message: Option<String> },

    #[error("{}", .message.as_deref().unwrap_or("unauthorized - token may be expired"))]
    Unauthorized { message: Option<String> },

    #[error("{}", .message.as_deref().unwrap_or("request was rejected by the server"))]
    Validation { message: Option<String> },

    #[error("{}", .message.as_deref().unwrap_or("account already exists"))]
    Conflict { message: Option<String> },

    #[error("{}", .message.as_deref().unwrap_or("server error"))]
    Server { message: Option<String> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies carried in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error payload inside the service's `{success, data, error}` envelope.
#[derive(Debug, Deserialize)]
struct EnvelopeError {
    error: Option<EnvelopeErrorBody>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeErrorBody {
    message: Option<String>,
}

/// FastAPI-style error payload used by HTTP-level rejections.
#[derive(Debug, Deserialize)]
struct DetailError {
    detail: Option<String>,
}

impl IdentityError {
    /// Truncate a response body to avoid carrying excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Pull the human-readable message out of an error body.
    ///
    /// The service uses an `{error: {message}}` envelope for application
    /// rejections and a bare `{detail}` object for HTTP-level ones; try
    /// both before giving up.
    pub(crate) fn extract_message(body: &str) -> Option<String> {
        if let Ok(envelope) = serde_json::from_str::<EnvelopeError>(body) {
            if let Some(message) = envelope.error.and_then(|e| e.message) {
                return Some(message);
            }
        }
        if let Ok(detail) = serde_json::from_str::<DetailError>(body) {
            if let Some(message) = detail.detail {
                return Some(message);
            }
        }
        None
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::extract_message(body);
        match status.as_u16() {
            401 => IdentityError::Unauthorized { message },
            400 | 422 => IdentityError::Validation { message },
            409 => IdentityError::Conflict { message },
            500..=599 => IdentityError::Server { message },
            _ => IdentityError::InvalidResponse(format!(
                "Status {}: {}",
                status,
                Self::truncate_body(body)
            )),
        }
    }

    /// The server-provided message, if the failure carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            IdentityError::InvalidCredentials { message }
            | IdentityError::Unauthorized { message }
            | IdentityError::Validation { message }
            | IdentityError::Conflict { message }
            | IdentityError::Server { message } => message.as_deref(),
            IdentityError::Network(_) | IdentityError::InvalidResponse(_) => None,
        }
    }

    /// Reinterpret an HTTP 401 as a credential rejection.
    ///
    /// On the login endpoint an `Unauthorized` status means the password
    /// was wrong, not that a token expired.
    pub(crate) fn into_login_rejection(self) -> Self {
        match self {
            IdentityError::Unauthorized { message } => {
                IdentityError::InvalidCredentials { message }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_variants() {
        let err = IdentityError::from_status(reqwest::StatusCode::UNAUTHORIZED, "{}");
        assert!(matches!(err, IdentityError::Unauthorized { .. }));

        let err = IdentityError::from_status(reqwest::StatusCode::CONFLICT, "{}");
        assert!(matches!(err, IdentityError::Conflict { .. }));

        let err = IdentityError::from_status(reqwest::StatusCode::UNPROCESSABLE_ENTITY, "{}");
        assert!(matches!(err, IdentityError::Validation { .. }));

        let err = IdentityError::from_status(reqwest::StatusCode::BAD_GATEWAY, "{}");
        assert!(matches!(err, IdentityError::Server { .. }));
    }

    #[test]
    fn test_extract_message_from_envelope() {
        let body = r#"{"success": false, "error": {"message": "email already registered"}}"#;
        assert_eq!(
            IdentityError::extract_message(body).as_deref(),
            Some("email already registered")
        );
    }

    #[test]
    fn test_extract_message_from_detail() {
        let body = r#"{"detail": "incorrect username or password"}"#;
        assert_eq!(
            IdentityError::extract_message(body).as_deref(),
            Some("incorrect username or password")
        );
    }

    #[test]
    fn test_extract_message_absent() {
        assert_eq!(IdentityError::extract_message("not json"), None);
        assert_eq!(IdentityError::extract_message("{}"), None);
    }

    #[test]
    fn test_login_rejection_rewrites_unauthorized() {
        let err = IdentityError::Unauthorized {
            message: Some("bad password".to_string()),
        };
        let err = err.into_login_rejection();
        match err {
            IdentityError::InvalidCredentials { message } => {
                assert_eq!(message.as_deref(), Some("bad password"));
            }
            other => panic!("expected InvalidCredentials, got {other:?}"),
        }

        // Other variants pass through untouched
        let err = IdentityError::Conflict { message: None }.into_login_rejection();
        assert!(matches!(err, IdentityError::Conflict { .. }));
    }

    #[test]
    fn test_display_falls_back_per_variant() {
        let err = IdentityError::InvalidCredentials { message: None };
        assert_eq!(err.to_string(), "invalid email or password");

        let err = IdentityError::Conflict {
            message: Some("email already registered".to_string()),
        };
        assert_eq!(err.to_string(), "email already registered");
    }
}
