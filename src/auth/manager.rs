//! Session state machine for the Paperdesk client.
//!
//! `SessionManager` owns the authoritative session snapshot and is its
//! sole writer. It drives the credential lifecycle (startup load, login,
//! registration, logout) against the identity service and publishes every
//! transition through a watch channel for the UI shell and route guard.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{IdentityClient, IdentityError};

use super::{Credential, CredentialStore, Session, SessionError, SessionErrorKind, SessionStatus};

/// Credential copy and supersession counter.
///
/// `generation` advances on every intended session transition (attempt
/// start, credential install, logout). An async resolution carries the
/// generation it was issued under and is discarded if the counter has
/// moved, so a stale identity fetch can never overwrite a later state.
struct Inner {
    credential: Option<Credential>,
    generation: u64,
}

pub struct SessionManager {
    client: Arc<dyn IdentityClient>,
    store: Arc<dyn CredentialStore>,
    inner: Mutex<Inner>,
    state: watch::Sender<Session>,
}

impl SessionManager {
    pub fn new(client: Arc<dyn IdentityClient>, store: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(Session::initializing());
        Self {
            client,
            store,
            inner: Mutex::new(Inner {
                credential: None,
                generation: 0,
            }),
            state,
        }
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Subscribe to session transitions.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().status.is_authenticated()
    }

    /// Transient copy of the active credential, for authorizing other
    /// service requests issued by the shell.
    pub fn credential(&self) -> Option<Credential> {
        self.inner.lock().credential.clone()
    }

    /// Evaluate the stored credential and settle the initial session state.
    ///
    /// With no stored credential the session goes straight to
    /// `Unauthenticated` without touching the network. A stored credential
    /// is exchanged for the current user; if the service rejects it, the
    /// credential is erased and the session surfaces a session-expired
    /// error.
    pub async fn initialize(&self) {
        let stored = match self.store.get() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential, treating as signed out");
                None
            }
        };

        let Some(credential) = stored else {
            debug!("No stored credential");
            self.state
                .send_modify(|s| s.status = SessionStatus::Unauthenticated);
            return;
        };

        let generation = {
            let mut inner = self.inner.lock();
            inner.credential = Some(credential.clone());
            inner.generation += 1;
            inner.generation
        };
        self.state
            .send_modify(|s| s.status = SessionStatus::Authenticating);

        self.load_identity(credential, generation, SessionErrorKind::SessionExpired)
            .await;
    }

    /// Exchange an email/password pair for a session.
    ///
    /// On success the returned credential is persisted and then exchanged
    /// for the user through the same identity-load routine startup uses;
    /// the session becomes `Authenticated` only after that fetch succeeds,
    /// and reverts to `Unauthenticated` (credential discarded) if it
    /// fails. Failures land in the session's error slot; nothing is
    /// returned to the caller.
    pub async fn login(&self, email: &str, password: &str) {
        let attempt = self.begin_attempt();
        debug!(email, "Login requested");

        match self.client.login(email, password).await {
            Ok(credential) => match self.install_credential(&credential, attempt) {
                Ok(Some(generation)) => {
                    self.load_identity(credential, generation, SessionErrorKind::IdentityLoadFailed)
                        .await;
                }
                Ok(None) => {
                    debug!("Login superseded before completion, discarding credential");
                }
                Err(e) => {
                    warn!(error = %e, "Failed to persist credential");
                    self.fail_attempt_message(
                        attempt,
                        SessionErrorKind::LoginFailed,
                        Some(e.to_string()),
                    );
                }
            },
            Err(err) => self.fail_attempt(attempt, SessionErrorKind::LoginFailed, &err),
        }
    }

    /// Create an account and establish a session for it.
    ///
    /// Registration returns the identity inline, so the session becomes
    /// `Authenticated` directly from the response with no follow-up fetch.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
        organization: Option<&str>,
    ) {
        let attempt = self.begin_attempt();
        debug!(email, "Registration requested");

        match self.client.register(email, name, password, organization).await {
            Ok(identity) => match self.install_credential(&identity.credential, attempt) {
                Ok(Some(_generation)) => {
                    info!(user_id = %identity.user.id, "Registration complete");
                    self.state
                        .send_modify(|s| s.status = SessionStatus::Authenticated(identity.user));
                }
                Ok(None) => {
                    debug!("Registration superseded before completion, discarding credential");
                }
                Err(e) => {
                    warn!(error = %e, "Failed to persist credential");
                    self.fail_attempt_message(
                        attempt,
                        SessionErrorKind::RegistrationFailed,
                        Some(e.to_string()),
                    );
                }
            },
            Err(err) => self.fail_attempt(attempt, SessionErrorKind::RegistrationFailed, &err),
        }
    }

    /// Drop the session unconditionally. Synchronous, no network call.
    ///
    /// Also supersedes any in-flight identity fetch, so a result that
    /// resolves after logout cannot resurrect the session.
    pub fn logout(&self) {
        info!("Logging out");
        {
            let mut inner = self.inner.lock();
            inner.credential = None;
            inner.generation += 1;
        }
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored credential");
        }
        self.state
            .send_modify(|s| s.status = SessionStatus::Unauthenticated);
    }

    /// Drop the error slot. The session status is untouched and no new
    /// snapshot is published when there was nothing to clear.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| {
            if s.last_error.is_some() {
                s.last_error = None;
                true
            } else {
                false
            }
        });
    }

    // =========================================================================
    // Transition plumbing
    // =========================================================================

    /// Start a login/register attempt: clear the error slot, move to
    /// `Authenticating`, and supersede any in-flight resolution.
    fn begin_attempt(&self) -> u64 {
        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.generation
        };
        self.state.send_modify(|s| {
            s.last_error = None;
            s.status = SessionStatus::Authenticating;
        });
        generation
    }

    /// Persist a freshly issued credential and take ownership of it.
    ///
    /// Returns the new generation, or `None` when a later operation
    /// superseded the attempt while its network call was in flight (the
    /// credential is then dropped without being persisted).
    fn install_credential(
        &self,
        credential: &Credential,
        attempt: u64,
    ) -> anyhow::Result<Option<u64>> {
        if self.inner.lock().generation != attempt {
            return Ok(None);
        }
        self.store.set(credential)?;
        let mut inner = self.inner.lock();
        inner.credential = Some(credential.clone());
        inner.generation += 1;
        Ok(Some(inner.generation))
    }

    /// Erase the credential everywhere and supersede in-flight work.
    fn retire_credential(&self) {
        {
            let mut inner = self.inner.lock();
            inner.credential = None;
            inner.generation += 1;
        }
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored credential");
        }
    }

    /// Exchange a credential for the user it identifies and settle the
    /// session. The shared continuation of startup and login.
    ///
    /// The result is applied only if `generation` is still current; a
    /// rejection also retires the credential so it is never left dangling.
    async fn load_identity(
        &self,
        credential: Credential,
        generation: u64,
        failure_kind: SessionErrorKind,
    ) {
        let result = self.client.fetch_current_user(&credential).await;

        if self.inner.lock().generation != generation {
            debug!("Discarding stale identity fetch result");
            return;
        }

        match result {
            Ok(user) => {
                info!(user_id = %user.id, "Identity loaded");
                self.state
                    .send_modify(|s| s.status = SessionStatus::Authenticated(user));
            }
            Err(err) => {
                warn!(error = %err, "Identity fetch failed, discarding credential");
                self.retire_credential();
                self.state.send_modify(|s| {
                    s.status = SessionStatus::Unauthenticated;
                    s.last_error = Some(SessionError::from_identity(failure_kind, &err));
                });
            }
        }
    }

    /// Settle a failed attempt, unless a later operation superseded it.
    fn fail_attempt(&self, attempt: u64, kind: SessionErrorKind, err: &IdentityError) {
        warn!(error = %err, ?kind, "Attempt failed");
        if self.inner.lock().generation != attempt {
            debug!("Discarding stale attempt failure");
            return;
        }
        self.state.send_modify(|s| {
            s.status = SessionStatus::Unauthenticated;
            s.last_error = Some(SessionError::from_identity(kind, err));
        });
    }

    fn fail_attempt_message(&self, attempt: u64, kind: SessionErrorKind, message: Option<String>) {
        if self.inner.lock().generation != attempt {
            debug!("Discarding stale attempt failure");
            return;
        }
        self.state.send_modify(|s| {
            s.status = SessionStatus::Unauthenticated;
            s.last_error = Some(SessionError::new(kind, message));
        });
    }
}
