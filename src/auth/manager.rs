//! Session manager: the authentication lifecycle as discrete operations.
//!
//! The manager is the only component that mutates [`Session`]. Every
//! mutating operation runs under a single-slot async lock, so two
//! concurrently invoked operations cannot interleave their writes to
//! the session or the store. Operations uniformly return `Result`;
//! [`Session::last_error`] carries the human-readable message for the
//! UI.

use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::{paths, ApiError, RequestClient};
use crate::models::{AnonymousLoginPayload, Credentials, LoginPayload, User, UserPayload};
use crate::storage::{keys, Storage};

use super::session::{Session, SessionStatus};

/// What kind of account string the caller collected. The wire field is
/// `username_or_email` either way; the distinction is kept for callers
/// that branch on form validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountType {
    #[default]
    Email,
    Username,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("anonymous login failed: {0}")]
    AnonymousLogin(String),

    #[error("registration failed: {0}")]
    Registration(String),

    #[error("login failed: {0}")]
    Login(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Owns the session and orchestrates the authentication lifecycle.
pub struct SessionManager {
    client: RequestClient,
    storage: Storage,
    session: Mutex<Session>,
}

impl SessionManager {
    /// `storage` must be the same store handed to `client`, so the
    /// credentials this manager persists are the ones the client
    /// injects into headers.
    pub fn new(client: RequestClient, storage: Storage) -> Self {
        Self {
            client,
            storage,
            session: Mutex::new(Session::new()),
        }
    }

    /// Snapshot of the current session for the UI layer.
    pub async fn session(&self) -> Session {
        self.session.lock().await.clone()
    }

    /// Restore persisted credentials and re-derive status. Runs
    /// unattended at startup and therefore never fails: store problems
    /// are logged and leave the session untouched.
    pub async fn initialize(&self) {
        let mut session = self.session.lock().await;

        let Some(credentials) = self.restore_credentials().await else {
            debug!("no persisted credentials, starting unauthenticated");
            return;
        };

        session.credentials = Some(credentials);
        session.status = SessionStatus::Authenticated;

        if let Err(e) = self.fetch_user_into(&mut session).await {
            // Keep the token: the profile fetch can be retried later.
            warn!(error = %e, "profile fetch after restore failed");
            session.last_error = Some(e.to_string());
            session.status = SessionStatus::Error;
        }
    }

    /// Adopt the persisted anonymous identity, or request a fresh one
    /// from the backend. Two calls in a row make at most one network
    /// call.
    pub async fn anonymous_login(&self) -> Result<(), SessionError> {
        let mut session = self.session.lock().await;

        if let Some(anonymous_id) = self.storage.get(keys::ANONYMOUS_ID).await {
            debug!("adopting persisted anonymous identity");
            if session.user.is_none() {
                session.user = self.storage.get_json::<User>(keys::USER_PROFILE).await;
            }
            session.anonymous_id = Some(anonymous_id);
            session.credentials = None;
            session.status = SessionStatus::Anonymous;
            return Ok(());
        }

        session.status = SessionStatus::Pending;
        session.last_error = None;

        match self
            .client
            .post_empty::<AnonymousLoginPayload>(paths::ANONYMOUS_LOGIN)
            .await
        {
            Ok(payload) => {
                let user = payload.user.into_user();
                // A failed write leaves the identity memory-only; the
                // next startup bootstraps again from scratch.
                if let Err(e) = self
                    .storage
                    .set(keys::ANONYMOUS_ID, &payload.anonymous_id)
                    .await
                {
                    warn!(error = %e, "failed to persist anonymous identity");
                }
                if let Err(e) = self.storage.set_json(keys::USER_PROFILE, &user).await {
                    warn!(error = %e, "failed to cache anonymous profile");
                }
                session.anonymous_id = Some(payload.anonymous_id);
                session.user = Some(user);
                session.credentials = None;
                session.status = SessionStatus::Anonymous;
                Ok(())
            }
            Err(e) => {
                // Identity stays unset so the next bootstrap retries
                // from scratch.
                warn!(error = %e, "anonymous login failed");
                session.last_error = Some(e.to_string());
                session.status = SessionStatus::Unauthenticated;
                Err(SessionError::AnonymousLogin(e.to_string()))
            }
        }
    }

    /// Create an account. Registration never implies login: on success
    /// the one-shot `register_success` flag is set and the session
    /// stays in its prior state. Input validation is the caller's job.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<(), SessionError> {
        let mut session = self.session.lock().await;
        let prior = session.status;
        session.status = SessionStatus::Pending;
        session.last_error = None;
        session.register_success = false;

        let body = json!({
            "username": username,
            "email": email,
            "password": password,
        });

        match self
            .client
            .post_data::<UserPayload, _>(paths::REGISTER, &body)
            .await
        {
            Ok(_) => {
                session.register_success = true;
                session.status = prior;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "registration failed");
                session.last_error = Some(e.to_string());
                session.status = prior;
                Err(SessionError::Registration(e.to_string()))
            }
        }
    }

    /// Exchange an account string and an already-encrypted password for
    /// credentials. On success the anonymous identity is cleared in
    /// memory and in the store, and the profile is fetched immediately;
    /// a profile-fetch failure degrades status but keeps the token. On
    /// failure the session holds at `Unauthenticated`.
    pub async fn login(
        &self,
        account: &str,
        password: &str,
        account_type: AccountType,
    ) -> Result<(), SessionError> {
        let mut session = self.session.lock().await;
        session.status = SessionStatus::Pending;
        session.last_error = None;

        debug!(?account_type, "logging in");
        let body = json!({
            "username_or_email": account,
            "password": password,
        });

        match self
            .client
            .post_data::<LoginPayload, _>(paths::LOGIN, &body)
            .await
        {
            Ok(payload) => {
                let credentials = Credentials::from_login(payload);
                // Credentials are only adopted once the write-through
                // succeeded; otherwise memory and store would diverge.
                if let Err(e) = self.persist_credentials(&credentials).await {
                    warn!(error = %e, "failed to persist credentials, dropping them");
                    self.remove_credential_keys().await;
                    session.credentials = None;
                    session.last_error = Some(e.to_string());
                    session.status = SessionStatus::Error;
                    return Err(e);
                }
                if let Err(e) = self.storage.remove(keys::ANONYMOUS_ID).await {
                    warn!(error = %e, "failed to remove persisted anonymous identity");
                }

                session.credentials = Some(credentials);
                session.anonymous_id = None;
                session.user = None;
                session.status = SessionStatus::Authenticated;

                if let Err(e) = self.fetch_user_into(&mut session).await {
                    warn!(error = %e, "profile fetch after login failed");
                    session.last_error = Some(e.to_string());
                    session.status = SessionStatus::Error;
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                // A failed re-login drops credentials from store and
                // memory together, so no stale token keeps flowing
                // into headers.
                self.remove_credential_keys().await;
                session.credentials = None;
                session.user = None;
                session.last_error = Some(e.to_string());
                session.status = SessionStatus::Unauthenticated;
                Err(SessionError::Login(e.to_string()))
            }
        }
    }

    /// Refresh the user profile. Precondition: credentials are held;
    /// otherwise this fails locally without touching the network. Never
    /// alters `status`.
    pub async fn fetch_user_info(&self) -> Result<(), SessionError> {
        let mut session = self.session.lock().await;
        self.fetch_user_into(&mut session).await
    }

    /// Drop credentials from memory and store and return to the
    /// pristine unauthenticated state. Safe to call when already logged
    /// out. The anonymous identity key is deliberately left in the
    /// store so device history survives an account logout.
    pub async fn logout(&self) {
        let mut session = self.session.lock().await;
        self.remove_credential_keys().await;
        *session = Session::new();
    }

    /// Consume the one-shot registration flag.
    pub async fn take_register_success(&self) -> bool {
        let mut session = self.session.lock().await;
        std::mem::take(&mut session.register_success)
    }

    pub async fn clear_error(&self) {
        self.session.lock().await.last_error = None;
    }

    async fn fetch_user_into(&self, session: &mut Session) -> Result<(), SessionError> {
        if session.access_token().is_none() {
            debug!("profile fetch without credentials, failing locally");
            return Err(SessionError::NotAuthenticated);
        }

        match self.client.get_data::<UserPayload>(paths::USER_INFO).await {
            Ok(payload) => {
                let user = payload.into_user();
                if let Err(e) = self.storage.set_json(keys::USER_PROFILE, &user).await {
                    warn!(error = %e, "failed to cache user profile");
                }
                session.user = Some(user);
                Ok(())
            }
            Err(e) => {
                session.last_error = Some(e.to_string());
                Err(SessionError::Api(e))
            }
        }
    }

    /// Best-effort removal of the four credential keys; failures are
    /// logged.
    async fn remove_credential_keys(&self) {
        for key in keys::CREDENTIAL_KEYS {
            if let Err(e) = self.storage.remove(key).await {
                warn!(key, error = %e, "failed to remove credential key");
            }
        }
    }

    /// Write all four credential keys through to the store.
    async fn persist_credentials(&self, credentials: &Credentials) -> Result<(), SessionError> {
        let expires_at = credentials.expires_at.to_rfc3339();
        let writes = [
            (keys::ACCESS_TOKEN, credentials.access_token.as_str()),
            (keys::REFRESH_TOKEN, credentials.refresh_token.as_str()),
            (keys::EXPIRES_AT, expires_at.as_str()),
            (keys::TOKEN_TYPE, credentials.token_type.as_str()),
        ];
        for (key, value) in writes {
            self.storage
                .set(key, value)
                .await
                .map_err(|e| SessionError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    /// Read the persisted credential set. Writes are key-by-key, so a
    /// crash can leave a partial set; any missing or unparseable key
    /// makes the whole set count as absent.
    async fn restore_credentials(&self) -> Option<Credentials> {
        let access_token = self.storage.get(keys::ACCESS_TOKEN).await;
        let refresh_token = self.storage.get(keys::REFRESH_TOKEN).await;
        let expires_at = self.storage.get(keys::EXPIRES_AT).await;
        let token_type = self.storage.get(keys::TOKEN_TYPE).await;

        match (access_token, refresh_token, expires_at, token_type) {
            (Some(access_token), Some(refresh_token), Some(expires_at), Some(token_type)) => {
                let expires_at = match DateTime::parse_from_rfc3339(&expires_at) {
                    Ok(dt) => dt.with_timezone(&Utc),
                    Err(e) => {
                        warn!(error = %e, "persisted token expiry unparseable, discarding set");
                        return None;
                    }
                };
                Some(Credentials {
                    access_token,
                    refresh_token,
                    token_type,
                    expires_at,
                })
            }
            (None, None, None, None) => None,
            _ => {
                warn!("partial credential set in store, treating as absent");
                None
            }
        }
    }
}
