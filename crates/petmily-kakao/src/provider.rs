//! Lazily-initialized Kakao provider and its authorization flow.

use crate::callback::{CallbackParams, CallbackServer};
use crate::query::percent_encode;
use crate::{BridgeError, BridgeResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Kakao authorization endpoint.
const KAKAO_AUTHORIZE_URL: &str = "https://kauth.kakao.com/oauth/authorize";

/// One-shot holder for the Kakao provider.
///
/// Mirrors the dynamic-SDK contract: initialization happens at most once
/// per process, concurrent callers before the first completion share the
/// same initialization, and a missing app key fails descriptively.
pub struct KakaoBridge {
    app_key: Option<String>,
    provider: OnceCell<KakaoProvider>,
    initializations: AtomicUsize,
}

impl KakaoBridge {
    /// Create a bridge for the configured app key (possibly absent).
    pub fn new(app_key: Option<String>) -> Self {
        Self {
            app_key,
            provider: OnceCell::new(),
            initializations: AtomicUsize::new(0),
        }
    }

    /// Initialize the provider exactly once and return it.
    pub async fn ensure_initialized(&self) -> BridgeResult<&KakaoProvider> {
        self.provider
            .get_or_try_init(|| async {
                let app_key = self
                    .app_key
                    .as_deref()
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .ok_or(BridgeError::MissingAppKey)?;

                self.initializations.fetch_add(1, Ordering::SeqCst);
                debug!("Kakao provider initialized");
                Ok(KakaoProvider::new(app_key.to_string(), CallbackServer::with_defaults()))
            })
            .await
    }

    /// Run the full provider authorization flow, returning the provider
    /// access token. The authorization URL is logged for the caller to
    /// open; prefer `start_authorization` when the URL must be shown
    /// directly.
    pub async fn authorize(&self) -> BridgeResult<String> {
        let provider = self.ensure_initialized().await?;
        let attempt = provider.start_authorization();
        info!(url = %attempt.url(), "Open this URL in a browser to continue Kakao login");
        attempt.finish().await
    }
}

/// Initialized Kakao provider.
pub struct KakaoProvider {
    app_key: String,
    server: CallbackServer,
}

impl KakaoProvider {
    fn new(app_key: String, server: CallbackServer) -> Self {
        Self { app_key, server }
    }

    /// Build the authorization URL for a given state parameter.
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=token&state={}",
            KAKAO_AUTHORIZE_URL,
            percent_encode(&self.app_key),
            percent_encode(&self.server.callback_url()),
            state
        )
    }

    /// Begin an authorization attempt with a fresh state parameter.
    pub fn start_authorization(&self) -> AuthorizationAttempt<'_> {
        let state = uuid::Uuid::new_v4().to_string();
        let url = self.authorize_url(&state);
        AuthorizationAttempt {
            provider: self,
            state,
            url,
        }
    }
}

/// An in-flight authorization attempt.
pub struct AuthorizationAttempt<'a> {
    provider: &'a KakaoProvider,
    state: String,
    url: String,
}

impl AuthorizationAttempt<'_> {
    /// The URL the user must open to grant access.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Wait for the provider redirect and extract the access token.
    ///
    /// On cancellation, denial, or timeout nothing is persisted and the
    /// failure surfaces to the caller.
    pub async fn finish(self) -> BridgeResult<String> {
        let params = self.provider.server.wait_for_callback().await?;
        validate_callback(params, &self.state)
    }
}

/// Check a callback against the expected state and pull out the token.
fn validate_callback(params: CallbackParams, expected_state: &str) -> BridgeResult<String> {
    if let Some(error) = params.error {
        return Err(BridgeError::Provider(error));
    }
    if params.state.as_deref() != Some(expected_state) {
        return Err(BridgeError::StateMismatch);
    }
    params
        .access_token
        .ok_or_else(|| BridgeError::MalformedRedirect("access_token missing".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_app_key_fails_descriptively() {
        let bridge = KakaoBridge::new(None);
        match bridge.ensure_initialized().await {
            Err(BridgeError::MissingAppKey) => {}
            other => panic!("Expected MissingAppKey, got {:?}", other.map(|_| ())),
        }

        let bridge = KakaoBridge::new(Some("   ".to_string()));
        assert!(matches!(
            bridge.ensure_initialized().await,
            Err(BridgeError::MissingAppKey)
        ));
    }

    #[tokio::test]
    async fn test_initialization_happens_once() {
        let bridge = KakaoBridge::new(Some("app-key-1".to_string()));

        let (a, b) = tokio::join!(bridge.ensure_initialized(), bridge.ensure_initialized());
        assert!(a.is_ok());
        assert!(b.is_ok());

        // Two more sequential calls reuse the cached provider
        bridge.ensure_initialized().await.unwrap();
        bridge.ensure_initialized().await.unwrap();

        assert_eq!(bridge.initializations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_authorize_url_contents() {
        let bridge = KakaoBridge::new(Some("app-key-1".to_string()));
        let provider = bridge.ensure_initialized().await.unwrap();

        let attempt = provider.start_authorization();
        let url = attempt.url();

        assert!(url.starts_with("https://kauth.kakao.com/oauth/authorize?"));
        assert!(url.contains("client_id=app-key-1"));
        assert!(url.contains("response_type=token"));
        // Redirect URI is percent-encoded
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8791%2Fcallback"));
        assert!(url.contains(&format!("state={}", attempt.state)));
    }

    #[tokio::test]
    async fn test_fresh_state_per_attempt() {
        let bridge = KakaoBridge::new(Some("app-key-1".to_string()));
        let provider = bridge.ensure_initialized().await.unwrap();

        let first = provider.start_authorization();
        let second = provider.start_authorization();
        assert_ne!(first.state, second.state);
    }

    #[test]
    fn test_validate_callback_success() {
        let params = CallbackParams {
            access_token: Some("provider-token".to_string()),
            refresh_token: None,
            state: Some("s1".to_string()),
            error: None,
        };
        assert_eq!(validate_callback(params, "s1").unwrap(), "provider-token");
    }

    #[test]
    fn test_validate_callback_error_wins() {
        let params = CallbackParams {
            access_token: Some("provider-token".to_string()),
            refresh_token: None,
            state: Some("s1".to_string()),
            error: Some("access_denied".to_string()),
        };
        assert!(matches!(
            validate_callback(params, "s1"),
            Err(BridgeError::Provider(_))
        ));
    }

    #[test]
    fn test_validate_callback_state_mismatch() {
        let params = CallbackParams {
            access_token: Some("provider-token".to_string()),
            refresh_token: None,
            state: Some("other".to_string()),
            error: None,
        };
        assert!(matches!(
            validate_callback(params, "s1"),
            Err(BridgeError::StateMismatch)
        ));
    }

    #[test]
    fn test_validate_callback_missing_token() {
        let params = CallbackParams {
            access_token: None,
            refresh_token: None,
            state: Some("s1".to_string()),
            error: None,
        };
        assert!(matches!(
            validate_callback(params, "s1"),
            Err(BridgeError::MalformedRedirect(_))
        ));
    }
}
