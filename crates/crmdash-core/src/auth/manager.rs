//! Session store: owns the in-memory session and keeps the persisted token in step with it.
//!
//! The session is only written after a network response has resolved, and the
//! lock is never held across a request. Concurrent logins are not deduplicated;
//! whichever response resolves last wins.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, LoginResponse};
use crate::models::User;
use crate::routes::{self, Route, RouteDecision};

use super::error::AuthError;
use super::session::Session;
use super::store::TokenStore;
use super::Credentials;

pub struct SessionManager {
    api: ApiClient,
    store: Arc<dyn TokenStore>,
    state: RwLock<Session>,
}

impl SessionManager {
    /// Start with an empty session. Call `restore` to pick up a persisted token.
    pub fn new(api: ApiClient, store: Arc<dyn TokenStore>) -> Self {
        Self {
            api,
            store,
            state: RwLock::new(Session::empty()),
        }
    }

    pub fn store(&self) -> &dyn TokenStore {
        self.store.as_ref()
    }

    /// Snapshot of the current session
    pub async fn session(&self) -> Session {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    /// Startup hook: if a token was persisted by an earlier run, check it against the server.
    pub async fn restore(&self) -> Option<User> {
        match self.store.load() {
            Ok(Some(stored)) => {
                debug!("Persisted token found, fetching profile");
                *self.state.write().await = Session::with_token(stored.token);
                self.fetch_current_user().await
            }
            Ok(None) => {
                debug!("No persisted token");
                None
            }
            Err(e) => {
                warn!(error = %e, location = %self.store.location(), "Failed to read persisted token");
                self.logout().await;
                None
            }
        }
    }

    /// Exchange credentials for a token and make the session authenticated.
    ///
    /// On failure the session is left unauthenticated and nothing is persisted.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        if !credentials.is_complete() {
            self.reset_memory().await;
            return Err(AuthError::Authentication(
                "Username and password required".to_string(),
            ));
        }

        match self.api.login(credentials).await {
            Ok(LoginResponse { access, user }) => {
                // Storage and memory change under one guard
                let mut state = self.state.write().await;
                if let Err(e) = self.store.save(&access) {
                    warn!(error = %e, location = %self.store.location(), "Failed to persist token");
                }

                let session = Session::authenticated(user, access);
                *state = session.clone();
                drop(state);
                info!(username = %credentials.identifier, "Login successful");
                Ok(session)
            }
            Err(e) => {
                error!(error = %e, username = %credentials.identifier, "Login failed");
                self.reset_memory().await;
                Err(AuthError::from_login_failure(&e))
            }
        }
    }

    /// Remove the persisted token and empty the session. Always succeeds.
    pub async fn logout(&self) {
        let mut state = self.state.write().await;
        self.clear_locked(&mut state);
        drop(state);
        info!("Logged out");
    }

    /// Fetch the profile for the persisted token.
    ///
    /// Any failure is treated as an expired session: the session is logged out
    /// and `None` is returned. There is no retry. A response for a token that
    /// was logged out or replaced while the request was in flight is dropped.
    pub async fn fetch_current_user(&self) -> Option<User> {
        let stored = match self.store.load() {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                debug!("No persisted token to fetch a profile with");
                self.logout().await;
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                self.logout().await;
                return None;
            }
        };

        match self.api.fetch_user(&stored.token).await {
            Ok(user) => {
                let mut state = self.state.write().await;
                if !self.holds_token(&state, &stored.token) {
                    debug!("Session changed while the profile was in flight, dropping response");
                    return None;
                }
                *state = Session::authenticated(user.clone(), stored.token);
                drop(state);
                info!(user = %user.display_name(), "Session restored");
                Some(user)
            }
            Err(e) => {
                warn!(error = %e, "Profile fetch failed, treating session as expired");
                self.expire(&stored.token).await;
                None
            }
        }
    }

    /// Authorized GET against the CRM API with the session token.
    ///
    /// A 401 means the token is no longer valid: the session is logged out and
    /// `SessionExpired` is returned.
    pub async fn get_json(&self, path: &str) -> Result<serde_json::Value, AuthError> {
        let token = {
            let session = self.state.read().await;
            match session.token() {
                Some(token) if session.is_authenticated() => token.to_string(),
                _ => return Err(AuthError::NotAuthenticated),
            }
        };

        match self.api.with_token(token.clone()).get_json(path).await {
            Ok(value) => Ok(value),
            Err(e) if e.is_unauthorized() => {
                warn!(path = path, "Token rejected, session expired");
                self.expire(&token).await;
                Err(AuthError::SessionExpired)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Guard decision for a path against the current session
    pub async fn route(&self, path: &str) -> RouteDecision {
        let session = self.state.read().await;
        routes::guard(&session, Route::from_path(path))
    }

    async fn reset_memory(&self) {
        *self.state.write().await = Session::empty();
    }

    /// Log out, but only if `token` is still the session's token. A newer
    /// login must not be undone by a late failure for an older token.
    async fn expire(&self, token: &str) {
        let mut state = self.state.write().await;
        if self.holds_token(&state, token) {
            self.clear_locked(&mut state);
            drop(state);
            info!("Logged out");
        } else {
            debug!("Expired token is no longer current, keeping session");
        }
    }

    /// Whether memory or storage still carries `token`. Callers hold the write guard.
    fn holds_token(&self, state: &Session, token: &str) -> bool {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                None
            }
        };
        state.token() == Some(token) || stored.is_some_and(|s| s.token == token)
    }

    fn clear_locked(&self, state: &mut Session) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, location = %self.store.location(), "Failed to remove persisted token");
        }
        *state = Session::empty();
    }
}
