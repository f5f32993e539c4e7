//! Request and response shapes for the auth endpoints.

use petmily_storage::UserIdentity;
use serde::{Deserialize, Serialize};

/// Body for `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body for `POST /auth/register`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Login ID chosen by the user
    pub id: String,
    pub password: String,
    pub email: String,
    pub name: String,
    pub phone_number: String,
}

/// Response shape shared by login, registration, and the Kakao exchange.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Backend-issued bearer token
    pub access_token: String,
    pub user_id: i64,
    pub username: String,
    pub role: String,
    /// Token lifetime in seconds; informational, the client does not
    /// track expiry locally
    pub expires_in: i64,
}

impl AuthResponse {
    /// The identity this response confirms.
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            account_id: self.user_id,
            username: self.username.clone(),
            role: self.role.clone(),
        }
    }
}

/// Body for `POST /auth/kakao/token`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct KakaoTokenRequest {
    pub access_token: String,
}

/// Response shape of `GET /auth/me`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MeResponse {
    pub account_id: i64,
    pub username: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "USER".to_string()
}

impl From<MeResponse> for UserIdentity {
    fn from(me: MeResponse) -> Self {
        UserIdentity {
            account_id: me.account_id,
            username: me.username,
            role: me.role,
        }
    }
}

/// Generic backend error envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub timestamp: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    /// Field-level messages on validation failures
    #[serde(default)]
    pub validation_errors: Option<serde_json::Value>,
}
