//! Core library for the Glance mobile search client.
//!
//! This crate implements the session and request layer shared by the
//! app's UI shells:
//! - `api`: the resilient HTTP client all outbound traffic goes through
//! - `auth`: the session manager and authentication state machine
//! - `storage`: the persistent key-value store backing credentials
//! - `crypto`: the password-obscuring cipher used before submission
//!
//! Screens, navigation, and theming live in the host application and
//! drive this crate through [`auth::SessionManager`].

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod models;
pub mod storage;

pub use api::{ApiError, RequestClient};
pub use auth::{AccountType, Session, SessionError, SessionManager, SessionStatus};
pub use config::{Config, DeviceInfo, RetryPolicy};
pub use storage::Storage;
