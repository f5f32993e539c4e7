//! Backend REST client with uniform request authorization.

use crate::error::{message_for_status, ApiError, ApiResult};
use crate::types::{KakaoTokenRequest, MeResponse};
use crate::{AuthResponse, ErrorEnvelope, LoginRequest, RegisterRequest};
use petmily_storage::{CredentialStore, UserIdentity};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Callback invoked when the backend rejects the current credential.
pub type AuthFailureHook = Box<dyn Fn() + Send + Sync>;

/// REST API client for the Petmily backend.
///
/// Every request goes out with the bearer credential currently held by the
/// credential store (durable scope checked before ephemeral); requests
/// without a stored credential are sent without the header. Error
/// responses are annotated here, once, with the fixed message table.
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    store: Arc<CredentialStore>,
    auth_failure_hook: Mutex<Option<AuthFailureHook>>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Arguments
    /// * `base_url` - The backend base URL (e.g. `https://api.petmily.app`)
    /// * `store` - Shared credential store supplying the bearer token
    pub fn new(base_url: impl Into<String>, store: Arc<CredentialStore>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
            store,
            auth_failure_hook: Mutex::new(None),
        }
    }

    /// The credential store this client reads bearer tokens from.
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Register the hook fired on a detected authorization failure.
    ///
    /// The hook must not issue API calls; it is the client-side analog of
    /// being sent back to the login entry point.
    pub fn set_auth_failure_hook(&self, hook: AuthFailureHook) {
        let mut slot = self.auth_failure_hook.lock().unwrap();
        *slot = Some(hook);
    }

    /// Build the full URL for an API path.
    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Attach the current bearer credential, if any.
    ///
    /// Returns the builder plus whether a credential was attached. A
    /// storage failure here downgrades to an unauthenticated request.
    fn authorized(&self, builder: reqwest::RequestBuilder) -> (reqwest::RequestBuilder, bool) {
        match self.store.token() {
            Ok(Some(token)) => (
                builder.header(AUTHORIZATION, format!("Bearer {}", token)),
                true,
            ),
            Ok(None) => (builder, false),
            Err(e) => {
                warn!(error = %e, "Credential lookup failed, sending request unauthenticated");
                (builder, false)
            }
        }
    }

    /// Send a request and run every response through the uniform policy.
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        had_credential: bool,
    ) -> ApiResult<reqwest::Response> {
        let response = builder.send().await.map_err(ApiError::from_transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let envelope = decode_envelope(response).await;
        if status.as_u16() == 401 {
            self.handle_unauthorized(had_credential);
        }

        Err(ApiError::Status {
            status: status.as_u16(),
            message: message_for_status(Some(status.as_u16())),
            envelope,
        })
    }

    /// The global authorization-failure policy: purge the stored
    /// credential and notify the hook, once per failing response.
    ///
    /// A 401 on a request that carried no credential is skipped: there is
    /// nothing to clear and the caller is already unauthenticated.
    fn handle_unauthorized(&self, had_credential: bool) {
        if !had_credential {
            return;
        }

        debug!("Authorization failure from backend, purging stored credential");
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to purge credential store after 401");
        }

        let hook = self.auth_failure_hook.lock().unwrap();
        if let Some(hook) = hook.as_ref() {
            hook();
        }
    }

    /// GET an authorized JSON resource.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.api_url(path);
        let (builder, had_credential) = self.authorized(self.http_client.get(&url));
        let response = self.send(builder, had_credential).await?;
        response.json().await.map_err(ApiError::Decode)
    }

    /// POST a JSON body to an authorized endpoint and decode the reply.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = self.api_url(path);
        let (builder, had_credential) = self.authorized(self.http_client.post(&url).json(body));
        let response = self.send(builder, had_credential).await?;
        response.json().await.map_err(ApiError::Decode)
    }

    /// DELETE an authorized resource, expecting an empty reply.
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let url = self.api_url(path);
        let (builder, had_credential) = self.authorized(self.http_client.delete(&url));
        self.send(builder, had_credential).await?;
        Ok(())
    }

    // ==========================================
    // Auth endpoints
    // ==========================================

    /// `POST /auth/login`
    pub async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        debug!(username = %request.username, "Requesting login");
        self.post_json("/auth/login", request).await
    }

    /// `POST /auth/register`
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        debug!(id = %request.id, "Requesting registration");
        self.post_json("/auth/register", request).await
    }

    /// `POST /auth/kakao/token`: exchange a provider access token for a
    /// backend-issued session.
    pub async fn exchange_kakao_token(&self, provider_access_token: &str) -> ApiResult<AuthResponse> {
        debug!("Exchanging Kakao access token");
        self.post_json(
            "/auth/kakao/token",
            &KakaoTokenRequest {
                access_token: provider_access_token.to_string(),
            },
        )
        .await
    }

    /// `GET /auth/me`
    pub async fn me(&self) -> ApiResult<UserIdentity> {
        let me: MeResponse = self.get_json("/auth/me").await?;
        Ok(me.into())
    }

    /// `POST /auth/logout`: best-effort; failures are logged and ignored
    /// because the client-side session teardown happens regardless.
    pub async fn logout_best_effort(&self) {
        let url = self.api_url("/auth/logout");
        let (builder, _) = self.authorized(self.http_client.post(&url));
        match builder.send().await {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), "Server-side logout failed");
            }
            Ok(_) => debug!("Server-side logout acknowledged"),
            Err(e) => warn!(error = %e, "Server-side logout unreachable"),
        }
    }

    /// `DELETE /auth/account`
    pub async fn delete_account(&self) -> ApiResult<()> {
        self.delete("/auth/account").await
    }
}

/// Try to decode the backend error envelope from a failed response.
async fn decode_envelope(response: reqwest::Response) -> Option<ErrorEnvelope> {
    let body = response.text().await.ok()?;
    serde_json::from_str(&body).ok()
}
