//! API path constants, grouped by backend service area.

pub const REGISTER: &str = "/api/users/register";
pub const LOGIN: &str = "/api/users/login";
pub const USER_INFO: &str = "/api/users/me";
pub const ANONYMOUS_LOGIN: &str = "/api/users/anonymous-login";

pub const SEARCH: &str = "/api/search";
