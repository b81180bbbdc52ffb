//! Data models for Paperdesk identity entities.
//!
//! Only the `User` record lives here: it is the one value the identity
//! service produces that the rest of the client consumes directly.

pub mod user;

pub use user::User;
