//! HTTP client for the Paperdesk identity service.
//!
//! This module defines the `IdentityClient` seam the session manager
//! drives, plus `HttpIdentityClient`, the production implementation
//! speaking the service's JSON envelope protocol.

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use crate::auth::Credential;
use crate::models::User;

use super::IdentityError;

// ============================================================================
// Constants
// ============================================================================

/// Login endpoint (OAuth2-style password grant)
const LOGIN_PATH: &str = "/api/auth/token";

/// Registration endpoint
const REGISTER_PATH: &str = "/api/auth/register";

/// Current-user endpoint, requires a bearer credential
const CURRENT_USER_PATH: &str = "/api/users/me";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Client seam
// ============================================================================

/// A credential paired with the identity it was issued for.
///
/// Registration returns both inline, so no follow-up identity fetch is
/// needed on that path.
#[derive(Debug, Clone)]
pub struct RegisteredIdentity {
    pub credential: Credential,
    pub user: User,
}

/// Contract to the remote identity service.
///
/// The session manager is the only caller. Implementations own
/// timeout/retry policy; the session layer imposes none.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Exchange a credential for the identity it belongs to.
    async fn fetch_current_user(&self, credential: &Credential) -> Result<User, IdentityError>;

    /// Exchange an email/password pair for a bearer credential.
    async fn login(&self, email: &str, password: &str) -> Result<Credential, IdentityError>;

    /// Create an account; returns the credential and identity inline.
    async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
        organization: Option<&str>,
    ) -> Result<RegisteredIdentity, IdentityError>;
}

// ============================================================================
// Production implementation
// ============================================================================

/// Identity client for the Paperdesk REST API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpIdentityClient {
    client: Client,
    base_url: String,
}

impl HttpIdentityClient {
    /// Create a new client against the given service base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read a response into the service's `{success, data, error}` envelope,
    /// converting HTTP-level failures into typed errors first.
    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<ApiEnvelope<T>, IdentityError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(IdentityError::from_status(status, &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| IdentityError::InvalidResponse(format!("malformed envelope: {e}")))
    }
}

#[async_trait]
impl IdentityClient for HttpIdentityClient {
    async fn fetch_current_user(&self, credential: &Credential) -> Result<User, IdentityError> {
        let url = self.url(CURRENT_USER_PATH);

        let response = self
            .client
            .get(&url)
            .bearer_auth(credential.as_str())
            .send()
            .await?;

        let envelope: ApiEnvelope<User> = Self::read_envelope(response).await?;
        if !envelope.success {
            return Err(IdentityError::Unauthorized {
                message: envelope.error_message(),
            });
        }

        envelope
            .data
            .ok_or_else(|| IdentityError::InvalidResponse("user envelope missing data".to_string()))
    }

    async fn login(&self, email: &str, password: &str) -> Result<Credential, IdentityError> {
        let url = self.url(LOGIN_PATH);
        debug!(email, "Requesting access token");

        // The service follows the OAuth2 password-grant naming: the email
        // is submitted as `username`.
        let body = serde_json::json!({
            "username": email,
            "password": password,
        });

        let response = self.client.post(&url).json(&body).send().await?;

        let envelope: ApiEnvelope<TokenGrant> = Self::read_envelope(response)
            .await
            .map_err(IdentityError::into_login_rejection)?;
        if !envelope.success {
            return Err(IdentityError::InvalidCredentials {
                message: envelope.error_message(),
            });
        }

        let grant = envelope.data.ok_or_else(|| {
            IdentityError::InvalidResponse("token envelope missing data".to_string())
        })?;
        Ok(Credential::new(grant.access_token))
    }

    async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
        organization: Option<&str>,
    ) -> Result<RegisteredIdentity, IdentityError> {
        let url = self.url(REGISTER_PATH);
        debug!(email, "Registering account");

        let body = serde_json::json!({
            "email": email,
            "name": name,
            "password": password,
            "organization": organization,
        });

        let response = self.client.post(&url).json(&body).send().await?;

        let envelope: ApiEnvelope<RegistrationGrant> = Self::read_envelope(response).await?;
        if !envelope.success {
            return Err(IdentityError::Validation {
                message: envelope.error_message(),
            });
        }

        let grant = envelope.data.ok_or_else(|| {
            IdentityError::InvalidResponse("registration envelope missing data".to_string())
        })?;
        Ok(RegisteredIdentity {
            credential: Credential::new(grant.access_token),
            user: grant.user,
        })
    }
}

// Internal API response types for parsing

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

impl<T> ApiEnvelope<T> {
    fn error_message(self) -> Option<String> {
        self.error.and_then(|e| e.message)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct RegistrationGrant {
    access_token: String,
    user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_envelope() {
        let json = r#"{"success": true, "data": {"access_token": "tok-123", "token_type": "bearer", "expires_in": 1800}}"#;
        let envelope: ApiEnvelope<TokenGrant> =
            serde_json::from_str(json).expect("Failed to parse token envelope");
        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap().access_token, "tok-123");
    }

    #[test]
    fn test_parse_registration_envelope() {
        let json = r#"{
            "success": true,
            "data": {
                "access_token": "tok-456",
                "token_type": "bearer",
                "user": {
                    "id": "u1",
                    "email": "ana@example.com",
                    "name": "Ana",
                    "organization": null,
                    "role": "user",
                    "created_at": "2026-01-15T09:30:00Z"
                }
            }
        }"#;
        let envelope: ApiEnvelope<RegistrationGrant> =
            serde_json::from_str(json).expect("Failed to parse registration envelope");
        let grant = envelope.data.expect("registration data missing");
        assert_eq!(grant.access_token, "tok-456");
        assert_eq!(grant.user.name, "Ana");
    }

    #[test]
    fn test_parse_rejection_envelope() {
        let json = r#"{"success": false, "error": {"message": "email already registered"}}"#;
        let envelope: ApiEnvelope<TokenGrant> =
            serde_json::from_str(json).expect("Failed to parse rejection envelope");
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(
            envelope.error_message().as_deref(),
            Some("email already registered")
        );
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = HttpIdentityClient::new("https://api.paperdesk.example/").unwrap();
        assert_eq!(
            client.url(LOGIN_PATH),
            "https://api.paperdesk.example/api/auth/token"
        );
    }
}
