use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,

    #[error("unauthorized - token may be stale")]
    Unauthorized,

    #[error("server error ({status}): {message}")]
    Protocol { status: u16, message: String },

    #[error("{0}")]
    Rejected(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
}

/// Maximum length of a response body carried inside an error message.
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Classify a transport-level failure. Timeouts are the only
    /// retryable class; everything else propagates immediately.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err)
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            _ => ApiError::Protocol {
                status: status.as_u16(),
                message: Self::truncate_body(body),
            },
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Timeout)
    }

    /// Truncate a response body to keep error messages bounded.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }
}
