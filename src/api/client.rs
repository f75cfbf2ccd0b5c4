//! Resilient request client for the Glance backend.
//!
//! Single chokepoint for outbound HTTP. Before dispatch every request
//! is augmented with the UI locale, device descriptors, the stored
//! anonymous identity, and stored bearer credentials; timeouts are
//! retried with growing backoff and all other failures propagate on
//! the first attempt.
//!
//! The client reads auth context from the persistent store but never
//! mutates session state; reacting to auth failures is the session
//! manager's job.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT_LANGUAGE, AUTHORIZATION};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{Envelope, SearchData};
use crate::storage::{keys, Storage};

use super::{paths, ApiError};

/// Anonymous device identity header.
const HEADER_ANONYMOUS_ID: HeaderName = HeaderName::from_static("x-anonymous-id");
/// Device descriptor headers.
const HEADER_DEVICE_PLATFORM: HeaderName = HeaderName::from_static("x-device-platform");
const HEADER_DEVICE_VERSION: HeaderName = HeaderName::from_static("x-device-version");
const HEADER_DEVICE_SCREEN: HeaderName = HeaderName::from_static("x-device-screen");

/// One outbound call in flight: what to send plus the remaining retry
/// budget. Created per call, dropped after terminal success or
/// exhaustion; never persisted.
struct RequestAttempt {
    method: Method,
    url: String,
    body: Option<Value>,
    headers: HeaderMap,
    remaining: u32,
    delay: Duration,
}

/// Request client for the Glance backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct RequestClient {
    http: Client,
    config: Config,
    storage: Storage,
}

impl RequestClient {
    pub fn new(config: Config, storage: Storage) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            config,
            storage,
        })
    }

    /// Perform a call against `path`, retrying timeouts per the
    /// configured policy. `headers` are caller overrides and always win
    /// over augmented headers of the same name.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> Result<T, ApiError> {
        let mut attempt = RequestAttempt {
            method,
            url: format!("{}{}", self.config.api_url.trim_end_matches('/'), path),
            body,
            headers: headers.unwrap_or_default(),
            remaining: self.config.retry.attempts.max(1),
            delay: self.config.retry.initial_delay,
        };

        loop {
            attempt.remaining -= 1;
            match self.dispatch(&attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt.remaining > 0 => {
                    debug!(
                        url = %attempt.url,
                        remaining = attempt.remaining,
                        delay_ms = attempt.delay.as_millis() as u64,
                        "request timed out, backing off before retry"
                    );
                    tokio::time::sleep(attempt.delay).await;
                    attempt.delay = attempt.delay.mul_f64(self.config.retry.multiplier);
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.request(Method::POST, path, Some(body), None).await
    }

    /// GET an enveloped endpoint and unwrap its payload.
    pub async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get::<Envelope<T>>(path).await?.into_data()
    }

    /// POST to an enveloped endpoint and unwrap its payload.
    pub async fn post_data<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.post::<Envelope<T>, B>(path, body).await?.into_data()
    }

    /// POST to an enveloped endpoint that takes no body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<Envelope<T>>(Method::POST, path, None, None)
            .await?
            .into_data()
    }

    /// Run a search query. Routed through the same chokepoint so search
    /// traffic carries the identity headers like everything else.
    pub async fn search(&self, query: &str) -> Result<SearchData, ApiError> {
        self.post_data(paths::SEARCH, &serde_json::json!({ "query": query }))
            .await
    }

    async fn dispatch<T: DeserializeOwned>(&self, attempt: &RequestAttempt) -> Result<T, ApiError> {
        let headers = self.augmented_headers(&attempt.headers).await;

        let mut request = self
            .http
            .request(attempt.method.clone(), &attempt.url)
            .headers(headers);
        if let Some(ref body) = attempt.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ApiError::from_transport)?;
        let status = response.status();

        if status.as_u16() == 401 {
            // Surfaced to the caller; no logout and no token refresh
            // happens here.
            warn!(url = %attempt.url, "unauthorized response, credentials may be stale");
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let text = response.text().await.map_err(ApiError::from_transport)?;
        serde_json::from_str(&text).map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }

    /// Build the outbound header set: caller overrides first, then the
    /// contextual headers for any name not already present.
    async fn augmented_headers(&self, explicit: &HeaderMap) -> HeaderMap {
        let mut headers = explicit.clone();

        insert_if_absent(&mut headers, ACCEPT_LANGUAGE, &self.config.locale);
        insert_if_absent(&mut headers, HEADER_DEVICE_PLATFORM, &self.config.device.platform);
        insert_if_absent(&mut headers, HEADER_DEVICE_VERSION, &self.config.device.version);
        insert_if_absent(&mut headers, HEADER_DEVICE_SCREEN, &self.config.device.screen);

        if let Some(anonymous_id) = self.storage.get(keys::ANONYMOUS_ID).await {
            insert_if_absent(&mut headers, HEADER_ANONYMOUS_ID, &anonymous_id);
        }

        let token = self.storage.get(keys::ACCESS_TOKEN).await;
        let token_type = self.storage.get(keys::TOKEN_TYPE).await;
        if let (Some(token), Some(token_type)) = (token, token_type) {
            insert_if_absent(&mut headers, AUTHORIZATION, &format!("{} {}", token_type, token));
        }

        headers
    }
}

fn insert_if_absent(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if headers.contains_key(&name) {
        return;
    }
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => warn!(header = %name, "skipping header with invalid value"),
    }
}
