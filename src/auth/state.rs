use serde::{Deserialize, Serialize};

use crate::api::IdentityError;
use crate::models::User;

/// Where the session currently stands.
///
/// Exactly one status is in effect at any instant. `Authenticated` is only
/// ever reached through an identity-service response, so the carried `User`
/// is always server-produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// Startup, stored credential not yet evaluated.
    Initializing,
    /// No valid credential.
    Unauthenticated,
    /// A login, registration, or identity fetch is in flight.
    Authenticating,
    /// Credential valid, identity loaded.
    Authenticated(User),
}

impl SessionStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated(_))
    }

    /// True while the outcome of the session is still undecided.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            SessionStatus::Initializing | SessionStatus::Authenticating
        )
    }
}

/// Failure classes surfaced to the UI shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum SessionErrorKind {
    /// An identity fetch failed on a stored credential.
    SessionExpired,
    /// The credential was rejected or the network faulted during login.
    LoginFailed,
    /// Validation, conflict, or network fault during registration.
    RegistrationFailed,
    /// Identity fetch failure not tied to startup.
    IdentityLoadFailed,
}

impl SessionErrorKind {
    /// Fallback message when the server supplied none.
    fn default_message(self) -> &'static str {
        match self {
            SessionErrorKind::SessionExpired => "Session expired, please sign in again",
            SessionErrorKind::LoginFailed => "Login failed",
            SessionErrorKind::RegistrationFailed => "Registration failed",
            SessionErrorKind::IdentityLoadFailed => "Failed to load user profile",
        }
    }
}

/// The error slot carried alongside the session status.
///
/// Structured as kind + optional server message so the UI can branch on
/// the kind without parsing text, while still preferring the server's
/// wording when one was provided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct SessionError {
    pub kind: SessionErrorKind,
    pub message: Option<String>,
}

impl SessionError {
    pub fn new(kind: SessionErrorKind, message: Option<String>) -> Self {
        Self { kind, message }
    }

    /// Wrap an identity-service failure, keeping its server message.
    pub fn from_identity(kind: SessionErrorKind, err: &IdentityError) -> Self {
        Self::new(kind, err.server_message().map(str::to_string))
    }

    /// The message to render, falling back to the kind's fixed wording.
    pub fn message(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or_else(|| self.kind.default_message())
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Published session snapshot: the client-held belief about who, if
/// anyone, is currently authenticated.
///
/// The error slot is orthogonal to the status and clears independently.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub status: SessionStatus,
    pub last_error: Option<SessionError>,
}

impl Session {
    pub(crate) fn initializing() -> Self {
        Self {
            status: SessionStatus::Initializing,
            last_error: None,
        }
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<&User> {
        match &self.status {
            SessionStatus::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_server_wording() {
        let err = SessionError::new(
            SessionErrorKind::LoginFailed,
            Some("incorrect username or password".to_string()),
        );
        assert_eq!(err.message(), "incorrect username or password");
        assert_eq!(err.to_string(), "incorrect username or password");
    }

    #[test]
    fn test_error_message_falls_back_by_kind() {
        let err = SessionError::new(SessionErrorKind::SessionExpired, None);
        assert_eq!(err.message(), "Session expired, please sign in again");

        let err = SessionError::new(SessionErrorKind::RegistrationFailed, None);
        assert_eq!(err.message(), "Registration failed");
    }

    #[test]
    fn test_from_identity_keeps_server_message() {
        let identity_err = IdentityError::InvalidCredentials {
            message: Some("bad password".to_string()),
        };
        let err = SessionError::from_identity(SessionErrorKind::LoginFailed, &identity_err);
        assert_eq!(err.kind, SessionErrorKind::LoginFailed);
        assert_eq!(err.message(), "bad password");
    }

    #[test]
    fn test_from_identity_network_fault_uses_fallback() {
        // Network faults carry no server message; rendering falls back to
        // the kind's wording.
        let identity_err = IdentityError::InvalidResponse("garbage".to_string());
        let err = SessionError::from_identity(SessionErrorKind::LoginFailed, &identity_err);
        assert_eq!(err.message(), "Login failed");
    }

    #[test]
    fn test_status_predicates() {
        assert!(SessionStatus::Initializing.is_pending());
        assert!(SessionStatus::Authenticating.is_pending());
        assert!(!SessionStatus::Unauthenticated.is_pending());
        assert!(!SessionStatus::Unauthenticated.is_authenticated());
    }
}
