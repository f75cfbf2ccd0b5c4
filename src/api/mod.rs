//! Resilient HTTP client module.
//!
//! All outbound traffic goes through [`RequestClient`], which stamps
//! contextual headers onto every call, injects stored bearer
//! credentials, and retries timeouts with growing backoff. Callers see
//! classified [`ApiError`]s instead of raw transport failures.

pub mod client;
pub mod error;
pub mod paths;

pub use client::RequestClient;
pub use error::ApiError;
