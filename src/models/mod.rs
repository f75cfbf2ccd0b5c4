//! Wire and domain types for the Glance API.
//!
//! Every endpoint answers the same envelope, `{success, message, data}`.
//! The payload structs here mirror the server's snake_case field names
//! exactly; domain types (`User`, `Credentials`) are the shapes the rest
//! of the client works with.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Common response envelope.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Validate the envelope and extract its payload.
    ///
    /// A 2xx body with `success=false` is a server-side rejection and
    /// carries the server's message; a successful envelope without the
    /// payload it promised is malformed.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message.unwrap_or_else(|| "request rejected".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| ApiError::MalformedResponse("missing data field".to_string()))
    }
}

/// User shape as the server sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub user_id: String,
    pub username: String,
    pub email: Option<String>,
    /// Epoch seconds.
    pub created_at: i64,
    pub last_login: Option<i64>,
    #[serde(default)]
    pub is_anonymous: Option<bool>,
}

/// User profile as the client holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub created_at: i64,
    pub last_login: Option<i64>,
    #[serde(default)]
    pub is_anonymous: bool,
}

impl UserPayload {
    pub fn into_user(self) -> User {
        User {
            id: self.user_id,
            username: self.username,
            email: self.email,
            created_at: self.created_at,
            last_login: self.last_login,
            is_anonymous: self.is_anonymous.unwrap_or(false),
        }
    }
}

/// Payload of `POST /api/users/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayload {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// Payload of `POST /api/users/anonymous-login`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnonymousLoginPayload {
    pub user: UserPayload,
    pub anonymous_id: String,
}

/// Token material plus metadata needed to authenticate requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl Credentials {
    /// Build credentials from a login payload, anchoring `expires_in`
    /// to the current clock.
    pub fn from_login(payload: LoginPayload) -> Self {
        Self {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
            token_type: payload.token_type,
            expires_at: Utc::now() + Duration::seconds(payload.expires_in),
        }
    }
}

/// GPT-generated summary card for a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GptSummary {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date: String,
}

/// One organic web result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleResult {
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub link: String,
    pub thumbnail_link: Option<String>,
    pub content_link: String,
    /// `text`, `image`, or `video`; left open for new result kinds.
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
}

/// Payload of `POST /api/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchData {
    pub gpt_summary: GptSummary,
    pub google_results: Vec<GoogleResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<T: serde::de::DeserializeOwned>(raw: &str) -> Envelope<T> {
        serde_json::from_str(raw).expect("envelope")
    }

    #[test]
    fn envelope_deserializes_behind_generic_helpers() {
        // LoginPayload has no Default impl; parsing through a helper
        // bounded only by DeserializeOwned must not require one.
        let envelope = parse::<LoginPayload>(
            r#"{"success": true, "message": "ok",
                "data": {"access_token": "A", "refresh_token": "R",
                         "token_type": "Bearer", "expires_in": 3600}}"#,
        );
        assert_eq!(envelope.into_data().unwrap().access_token, "A");
    }

    #[test]
    fn envelope_rejection_carries_server_message() {
        let envelope: Envelope<LoginPayload> = serde_json::from_str(
            r#"{"success": false, "message": "bad password", "data": null}"#,
        )
        .unwrap();
        match envelope.into_data() {
            Err(ApiError::Rejected(msg)) => assert_eq!(msg, "bad password"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn envelope_success_without_data_is_malformed() {
        let envelope: Envelope<LoginPayload> =
            serde_json::from_str(r#"{"success": true, "message": "ok"}"#).unwrap();
        assert!(matches!(
            envelope.into_data(),
            Err(ApiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn user_payload_maps_to_domain_user() {
        let payload: UserPayload = serde_json::from_str(
            r#"{"user_id": "u1", "username": "ada", "email": null,
                "created_at": 1700000000, "last_login": null}"#,
        )
        .unwrap();
        let user = payload.into_user();
        assert_eq!(user.id, "u1");
        assert_eq!(user.email, None);
        assert!(!user.is_anonymous);
    }

    #[test]
    fn credentials_anchor_expiry_to_now() {
        let before = Utc::now();
        let creds = Credentials::from_login(LoginPayload {
            access_token: "A".into(),
            refresh_token: "R".into(),
            token_type: "Bearer".into(),
            expires_in: 3600,
        });
        let lower = before + Duration::seconds(3595);
        let upper = Utc::now() + Duration::seconds(3605);
        assert!(creds.expires_at > lower && creds.expires_at < upper);
    }

    #[test]
    fn search_payload_parses_result_kind() {
        let data: SearchData = serde_json::from_str(
            r#"{"gpt_summary": {"id": "s1", "title": "t", "content": "c", "date": "2026-01-01"},
                "google_results": [{"id": "r1", "title": "t", "snippet": "s",
                    "link": "https://x", "thumbnail_link": null,
                    "content_link": "https://x/c", "type": "image", "date": "2026-01-01"}]}"#,
        )
        .unwrap();
        assert_eq!(data.google_results[0].kind, "image");
    }
}
