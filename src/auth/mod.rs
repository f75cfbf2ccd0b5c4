//! Authentication module: the session state machine and its manager.
//!
//! This module provides:
//! - `Session`: the in-memory authoritative authentication record
//! - `SessionManager`: the only component allowed to mutate it
//!
//! Credentials write through to the persistent store on every mutation
//! and are restored at startup by [`SessionManager::initialize`].

pub mod manager;
pub mod session;

pub use manager::{AccountType, SessionError, SessionManager};
pub use session::{Session, SessionStatus};
