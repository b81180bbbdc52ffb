//! Paperdesk session library - client-side session and identity management.
//!
//! This crate owns the authentication credential, derives the current
//! user's identity from it, exposes login/registration/logout, and gates
//! access to protected views based on session status. It is consumed by
//! the UI shell; it has no CLI surface of its own.
//!
//! Typical wiring:
//!
//! ```no_run
//! use std::sync::Arc;
//! use paperdesk_session::{
//!     guard, Config, HttpIdentityClient, KeyringCredentialStore, SessionManager,
//! };
//!
//! # async fn wire() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let client = Arc::new(HttpIdentityClient::new(&config.api_base_url)?);
//! let manager = Arc::new(SessionManager::new(client, Arc::new(KeyringCredentialStore::new())));
//!
//! manager.initialize().await;
//! let decision = guard::decide(&manager.session());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{HttpIdentityClient, IdentityClient, IdentityError, RegisteredIdentity};
pub use auth::{
    guard, Credential, CredentialStore, FileCredentialStore, KeyringCredentialStore,
    MemoryCredentialStore, RouteDecision, Session, SessionError, SessionErrorKind, SessionManager,
    SessionStatus,
};
pub use config::Config;
pub use models::User;
