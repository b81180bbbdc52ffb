//! REST client module for the Paperdesk identity service.
//!
//! This module provides the `IdentityClient` contract consumed by the
//! session manager, the production `HttpIdentityClient`, and the typed
//! error taxonomy for identity-service failures.
//!
//! The API uses JWT bearer token authentication; the token is attached
//! only to requests made on behalf of an established credential.

pub mod client;
pub mod error;

pub use client::{HttpIdentityClient, IdentityClient, RegisteredIdentity};
pub use error::IdentityError;
