//! Session store: bearer token, user profile, and identity transitions.
//!
//! # States
//!
//! - `Anonymous` - no token
//! - `Resolving` - a token is held but its profile has not been confirmed
//! - `Authenticated` - token and profile both present
//!
//! A profile is never held without a token. When resolving a token fails for
//! any reason the token is dropped, the same as an explicit logout.
//!
//! # Notifications
//!
//! Every committed transition publishes a [`SessionSnapshot`] on a `watch`
//! channel. Identity transitions (login, signup, resolution, logout) also
//! call each registered [`IdentityListener`] in registration order, one at a
//! time, before the operation returns.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use soil2spoon_core::Email;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::gateway::{ApiClient, ApiError};
use crate::storage::{StorageError, TokenStore};
use crate::types::{ForgotPasswordResponse, UserProfile};

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backend rejected the call (bad credentials, duplicate email, ...).
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Input was rejected locally; no request was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The operation needs a signed-in user.
    #[error("Not signed in")]
    NotAuthenticated,

    /// Token storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Resolving,
    Authenticated,
}

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub user: Option<UserProfile>,
    /// `true` until the first identity resolution finishes, and again while
    /// a newly adopted token is being resolved.
    pub loading: bool,
    pub has_token: bool,
}

/// Receives identity changes. `None` means signed out.
#[async_trait]
pub trait IdentityListener: Send + Sync {
    async fn on_identity_changed(&self, user: Option<UserProfile>);
}

#[derive(Default)]
struct SessionData {
    token: Option<SecretString>,
    user: Option<UserProfile>,
    loading: bool,
    /// Bumped whenever the token changes; stale resolutions compare against it.
    generation: u64,
}

impl SessionData {
    fn state(&self) -> SessionState {
        match (&self.token, &self.user) {
            (None, _) => SessionState::Anonymous,
            (Some(_), None) => SessionState::Resolving,
            (Some(_), Some(_)) => SessionState::Authenticated,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            user: self.user.clone(),
            loading: self.loading,
            has_token: self.token.is_some(),
        }
    }
}

/// Owns the session. Cheap to clone.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: ApiClient,
    tokens: Arc<dyn TokenStore>,
    data: Mutex<SessionData>,
    listeners: RwLock<Vec<Arc<dyn IdentityListener>>>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    /// Serializes commit + listener notification so listeners observe
    /// transitions in the order they were committed.
    transition: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create the store, reading any persisted token.
    ///
    /// The store starts `Resolving` when a token was found and `Anonymous`
    /// otherwise, with `loading` set until [`SessionStore::start`] runs.
    #[must_use]
    pub fn new(api: ApiClient, tokens: Arc<dyn TokenStore>) -> Self {
        let token = tokens.load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read persisted token");
            None
        });
        api.set_token(token.clone());

        let data = SessionData {
            token,
            user: None,
            loading: true,
            generation: 0,
        };
        let (snapshot_tx, _) = watch::channel(data.snapshot());

        Self {
            inner: Arc::new(SessionInner {
                api,
                tokens,
                data: Mutex::new(data),
                listeners: RwLock::new(Vec::new()),
                snapshot_tx,
                transition: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Register a listener. Listeners are called in registration order.
    pub fn add_listener(&self, listener: Arc<dyn IdentityListener>) {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Watch snapshots as transitions commit.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock().state()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.lock().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// The signed-in user, or `SessionError::NotAuthenticated`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAuthenticated` when no profile is held.
    pub fn require_user(&self) -> Result<UserProfile, SessionError> {
        self.user().ok_or(SessionError::NotAuthenticated)
    }

    /// Run the initial identity resolution.
    ///
    /// With a persisted token this fetches the profile; without one it just
    /// ends the loading phase.
    #[instrument(skip(self))]
    pub async fn start(&self) -> SessionSnapshot {
        let generation = {
            let mut data = self.lock();
            if data.token.is_none() {
                data.loading = false;
                self.publish(&data);
                return data.snapshot();
            }
            data.generation
        };
        self.resolve(generation).await;
        self.snapshot()
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidInput` for a malformed email or empty password
    /// - `SessionError::Api` with the backend's message on rejection; the
    ///   session is left unchanged
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, SessionError> {
        let email = validate_credentials(email, password)?;
        let response = self.inner.api.login(email.as_str(), password).await?;
        info!(user_id = %response.user.id, "Logged in");
        self.adopt(response.token, response.user.clone()).await;
        Ok(response.user)
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidInput` for a malformed email, empty password
    ///   or empty name
    /// - `SessionError::Api` with the backend's message on rejection
    #[instrument(skip(self, password))]
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<UserProfile, SessionError> {
        let email = validate_credentials(email, password)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::InvalidInput("name is required".to_string()));
        }
        let response = self
            .inner
            .api
            .signup(email.as_str(), password, name)
            .await?;
        info!(user_id = %response.user.id, "Signed up");
        self.adopt(response.token, response.user.clone()).await;
        Ok(response.user)
    }

    /// Drop the token and profile. Local only; the backend is not called.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let _transition = self.inner.transition.lock().await;
        self.clear_locked();
        info!("Logged out");
        self.notify(None).await;
    }

    /// Adopt a token obtained elsewhere. A non-empty token is persisted and
    /// resolved; an empty one logs out.
    #[instrument(skip_all)]
    pub async fn set_token(&self, token: Option<String>) {
        let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
            self.logout().await;
            return;
        };

        let generation = {
            let _transition = self.inner.transition.lock().await;
            let secret = SecretString::from(token);
            self.persist(&secret);
            self.inner.api.set_token(Some(secret.clone()));

            let mut data = self.lock();
            data.generation += 1;
            data.token = Some(secret);
            data.user = None;
            data.loading = true;
            self.publish(&data);
            data.generation
        };
        self.resolve(generation).await;
    }

    /// Ask the backend to send a reset email. Session state is untouched.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidInput` for a malformed email
    /// - `SessionError::Api` on backend failure
    #[instrument(skip(self))]
    pub async fn forgot_password(
        &self,
        email: &str,
    ) -> Result<ForgotPasswordResponse, SessionError> {
        let email = Email::parse(email).map_err(|e| SessionError::InvalidInput(e.to_string()))?;
        Ok(self.inner.api.forgot_password(email.as_str()).await?)
    }

    /// Set a new password with a reset token. Session state is untouched.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidInput` if either value is empty
    /// - `SessionError::Api` if the token is rejected
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<String, SessionError> {
        if token.trim().is_empty() {
            return Err(SessionError::InvalidInput(
                "reset token is required".to_string(),
            ));
        }
        if new_password.is_empty() {
            return Err(SessionError::InvalidInput(
                "password is required".to_string(),
            ));
        }
        Ok(self.inner.api.reset_password(token, new_password).await?)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Fetch the profile for the token of `generation` and commit the result
    /// unless the token changed meanwhile.
    async fn resolve(&self, generation: u64) {
        let result = self.inner.api.me().await;

        let _transition = self.inner.transition.lock().await;
        if self.lock().generation != generation {
            debug!("Discarding profile for a replaced token");
            return;
        }

        match result {
            Ok(user) => {
                {
                    let mut data = self.lock();
                    data.user = Some(user.clone());
                    data.loading = false;
                    self.publish(&data);
                }
                set_sentry_user(&user.id, Some(user.email.as_str()));
                debug!(user_id = %user.id, "Resolved identity");
                self.notify(Some(user)).await;
            }
            Err(e) => {
                warn!(error = %e, "Token rejected, signing out");
                self.clear_locked();
                self.notify(None).await;
            }
        }
    }

    /// Commit a token and profile returned by login or signup.
    async fn adopt(&self, token: String, user: UserProfile) {
        let _transition = self.inner.transition.lock().await;
        let secret = SecretString::from(token);
        self.persist(&secret);
        self.inner.api.set_token(Some(secret.clone()));
        {
            let mut data = self.lock();
            data.generation += 1;
            data.token = Some(secret);
            data.user = Some(user.clone());
            data.loading = false;
            self.publish(&data);
        }
        set_sentry_user(&user.id, Some(user.email.as_str()));
        self.notify(Some(user)).await;
    }

    /// Clear token and profile. Caller holds the transition lock.
    fn clear_locked(&self) {
        if let Err(e) = self.inner.tokens.clear() {
            warn!(error = %e, "Failed to clear persisted token");
        }
        self.inner.api.set_token(None);
        {
            let mut data = self.lock();
            data.generation += 1;
            data.token = None;
            data.user = None;
            data.loading = false;
            self.publish(&data);
        }
        clear_sentry_user();
    }

    fn persist(&self, token: &SecretString) {
        if let Err(e) = self.inner.tokens.save(token) {
            warn!(error = %e, "Failed to persist token");
        }
    }

    async fn notify(&self, user: Option<UserProfile>) {
        let listeners = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.on_identity_changed(user.clone()).await;
        }
    }

    fn publish(&self, data: &SessionData) {
        self.inner.snapshot_tx.send_replace(data.snapshot());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionData> {
        self.inner
            .data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<Email, SessionError> {
    let email = Email::parse(email).map_err(|e| SessionError::InvalidInput(e.to_string()))?;
    if password.is_empty() {
        return Err(SessionError::InvalidInput(
            "password is required".to_string(),
        ));
    }
    Ok(email)
}
