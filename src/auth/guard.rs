//! Route guard for protected views.
//!
//! Pure decision logic: the host router supplies the current session
//! snapshot and acts on the returned decision. No side effects, safe to
//! evaluate on every state change.

use super::{Session, SessionStatus};

/// Login entry point protected views redirect to.
pub const LOGIN_ROUTE: &str = "/login";

/// What the router should do with a request for a protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the protected content.
    Admit,
    /// Session outcome undecided; render a loading indicator.
    ///
    /// `Authenticating` maps here rather than to a redirect so an
    /// in-flight login never causes a one-frame unauthenticated flash.
    Pending,
    /// Send the user to the given route.
    Redirect(&'static str),
}

impl RouteDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, RouteDecision::Admit)
    }
}

/// Decide whether the current session admits access to protected content.
pub fn decide(session: &Session) -> RouteDecision {
    match session.status {
        SessionStatus::Initializing | SessionStatus::Authenticating => RouteDecision::Pending,
        SessionStatus::Unauthenticated => RouteDecision::Redirect(LOGIN_ROUTE),
        SessionStatus::Authenticated(_) => RouteDecision::Admit,
    }
}
