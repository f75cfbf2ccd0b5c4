//! Namespaced storage key constants.
//!
//! Every key the client persists lives here so the full storage
//! footprint is visible in one place.

/// Bearer access token.
pub const ACCESS_TOKEN: &str = "auth.accessToken";

/// Refresh token. Tracked but not yet used for a refresh flow.
pub const REFRESH_TOKEN: &str = "auth.refreshToken";

/// Access token expiry, RFC 3339.
pub const EXPIRES_AT: &str = "auth.expiresAt";

/// Token type, e.g. `Bearer`.
pub const TOKEN_TYPE: &str = "auth.tokenType";

/// Server-issued identity for a not-yet-registered device.
pub const ANONYMOUS_ID: &str = "auth.anonymousId";

/// Cached user profile, JSON.
pub const USER_PROFILE: &str = "user.profile";

/// The credential set written by a successful login, in write order.
/// Restore treats the set as absent unless every key is present.
pub const CREDENTIAL_KEYS: [&str; 4] = [ACCESS_TOKEN, REFRESH_TOKEN, EXPIRES_AT, TOKEN_TYPE];
