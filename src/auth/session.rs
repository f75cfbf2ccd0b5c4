//! In-memory session state.

use crate::models::{Credentials, User};

/// Where the client stands in the authentication lifecycle.
///
/// `Pending` marks a network-bound operation in flight; `Error` marks a
/// failed operation whose message sits in [`Session::last_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Unauthenticated,
    Anonymous,
    Authenticated,
    Pending,
    Error,
}

/// The authoritative authentication record for the running client.
///
/// Mutated only by [`crate::SessionManager`]; the UI reads snapshots.
/// At most one of `credentials` / `anonymous_id` is populated for the
/// purpose of outbound auth headers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub status: SessionStatus,
    pub credentials: Option<Credentials>,
    pub anonymous_id: Option<String>,
    pub user: Option<User>,
    pub last_error: Option<String>,
    /// One-shot flag set by a successful registration, consumed by the
    /// caller via [`crate::SessionManager::take_register_success`].
    pub register_success: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    pub fn is_anonymous(&self) -> bool {
        self.status == SessionStatus::Anonymous
    }

    /// Access token, if any credentials are held.
    pub fn access_token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.access_token.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_unauthenticated_and_empty() {
        let session = Session::new();
        assert_eq!(session.status, SessionStatus::Unauthenticated);
        assert!(session.credentials.is_none());
        assert!(session.anonymous_id.is_none());
        assert!(session.user.is_none());
        assert!(session.last_error.is_none());
        assert!(!session.register_success);
    }
}
