//! One-time redirect token exchange.
//!
//! The backend's OAuth2 redirect lands with either a directly issued
//! bearer token (`token=`), a provider token still needing a server-side
//! exchange (`accessToken=`), or an error (`error=`). The exchange runs
//! at most once, persists the finished credential straight into the
//! store, and leaves re-deriving the live session to a restart + restore.

use crate::query::parse_query;
use crate::{BridgeError, BridgeResult};
use petmily_api::ApiClient;
use petmily_storage::{CredentialStore, StorageScope};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Fixed pause before handing a failed exchange back to the login entry
/// point.
const FAILURE_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

/// The one-time payload carried by the redirect query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangePayload {
    /// The backend already issued a bearer token.
    Issued {
        token: String,
        refresh_token: Option<String>,
    },
    /// A provider token that must be exchanged server-side.
    Provider {
        access_token: String,
        refresh_token: Option<String>,
    },
    /// The provider reported a failure.
    Denied { error: String },
}

impl ExchangePayload {
    /// Parse the redirect query parameters.
    pub fn from_query(query: &str) -> BridgeResult<Self> {
        let params = parse_query(query);

        if let Some(error) = params.get("error") {
            return Ok(ExchangePayload::Denied {
                error: error.clone(),
            });
        }
        if let Some(token) = params.get("token").filter(|t| !t.is_empty()) {
            return Ok(ExchangePayload::Issued {
                token: token.clone(),
                refresh_token: params.get("refreshToken").cloned(),
            });
        }
        if let Some(access_token) = params.get("accessToken").filter(|t| !t.is_empty()) {
            return Ok(ExchangePayload::Provider {
                access_token: access_token.clone(),
                refresh_token: params.get("refreshToken").cloned(),
            });
        }

        Err(BridgeError::MalformedRedirect(
            "expected token, accessToken, or error parameter".to_string(),
        ))
    }
}

/// Outcome of a completed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The credential is persisted; the application must restart so the
    /// session is re-derived via restore.
    RestartForRestore,
}

/// Redirect exchange runner.
pub struct RedirectExchange {
    api: Arc<ApiClient>,
    store: Arc<CredentialStore>,
    failure_delay: Duration,
}

impl RedirectExchange {
    /// Create a new redirect exchange.
    pub fn new(api: Arc<ApiClient>, store: Arc<CredentialStore>) -> Self {
        Self {
            api,
            store,
            failure_delay: FAILURE_REDIRECT_DELAY,
        }
    }

    /// Override the failure pause (tests use zero).
    pub fn with_failure_delay(mut self, delay: Duration) -> Self {
        self.failure_delay = delay;
        self
    }

    /// Complete the exchange for the given redirect query.
    ///
    /// Any failing step purges whatever was written before pausing and
    /// returning the error, so no half-written credential survives.
    pub async fn complete(&self, query: &str) -> BridgeResult<ExchangeOutcome> {
        match self.run(query).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(error = %e, "Redirect exchange failed, purging partial credential");
                if let Err(purge) = self.store.clear() {
                    warn!(error = %purge, "Failed to purge credential store after exchange failure");
                }
                tokio::time::sleep(self.failure_delay).await;
                Err(e)
            }
        }
    }

    async fn run(&self, query: &str) -> BridgeResult<ExchangeOutcome> {
        let payload = ExchangePayload::from_query(query)?;

        let token = match payload {
            ExchangePayload::Denied { error } => return Err(BridgeError::Provider(error)),
            ExchangePayload::Issued { token, .. } => token,
            ExchangePayload::Provider { access_token, .. } => {
                // The single exchange call
                self.api.exchange_kakao_token(&access_token).await?.access_token
            }
        };

        // Stage the bearer so the identity fetch below goes out authorized
        self.store.stage_token(StorageScope::Durable, &token)?;
        let user = self.api.me().await?;
        self.store.write(StorageScope::Durable, &token, &user)?;

        info!(username = %user.username, "External login credential persisted");
        Ok(ExchangeOutcome::RestartForRestore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petmily_storage::MemoryStorage;

    fn test_store() -> Arc<CredentialStore> {
        Arc::new(CredentialStore::new(
            Box::new(MemoryStorage::new()),
            Box::new(MemoryStorage::new()),
        ))
    }

    fn test_exchange(store: Arc<CredentialStore>) -> RedirectExchange {
        // Port 1 is never listening, so backend calls fail fast
        let api = Arc::new(ApiClient::new("http://127.0.0.1:1", store.clone()));
        RedirectExchange::new(api, store).with_failure_delay(Duration::ZERO)
    }

    #[test]
    fn test_payload_direct_issuance() {
        let payload = ExchangePayload::from_query("token=bearer-1&refreshToken=r1").unwrap();
        assert_eq!(
            payload,
            ExchangePayload::Issued {
                token: "bearer-1".to_string(),
                refresh_token: Some("r1".to_string()),
            }
        );
    }

    #[test]
    fn test_payload_provider_token() {
        let payload = ExchangePayload::from_query("?accessToken=kakao-1").unwrap();
        assert_eq!(
            payload,
            ExchangePayload::Provider {
                access_token: "kakao-1".to_string(),
                refresh_token: None,
            }
        );
    }

    #[test]
    fn test_payload_error() {
        let payload = ExchangePayload::from_query("error=access_denied").unwrap();
        assert_eq!(
            payload,
            ExchangePayload::Denied {
                error: "access_denied".to_string(),
            }
        );
    }

    #[test]
    fn test_payload_error_takes_precedence() {
        let payload = ExchangePayload::from_query("token=t1&error=server_error").unwrap();
        assert!(matches!(payload, ExchangePayload::Denied { .. }));
    }

    #[test]
    fn test_payload_missing_parameters() {
        assert!(matches!(
            ExchangePayload::from_query("unrelated=1"),
            Err(BridgeError::MalformedRedirect(_))
        ));
        assert!(matches!(
            ExchangePayload::from_query(""),
            Err(BridgeError::MalformedRedirect(_))
        ));
    }

    #[test]
    fn test_payload_empty_token_rejected() {
        assert!(matches!(
            ExchangePayload::from_query("token="),
            Err(BridgeError::MalformedRedirect(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_identity_fetch_purges_partial_write() {
        let store = test_store();
        let exchange = test_exchange(store.clone());

        // Direct issuance stages the token, then the identity fetch fails
        // (the backend is unreachable)
        let result = exchange.complete("token=bearer-1").await;
        assert!(result.is_err());

        // No token or user keys remain in either scope
        assert_eq!(store.token().unwrap(), None);
        assert!(store.read().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_denied_redirect_leaves_no_credential() {
        let store = test_store();
        let exchange = test_exchange(store.clone());

        let result = exchange.complete("error=access_denied").await;
        assert!(matches!(result, Err(BridgeError::Provider(_))));
        assert_eq!(store.token().unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_redirect_errors() {
        let store = test_store();
        let exchange = test_exchange(store.clone());

        let result = exchange.complete("nothing=here").await;
        assert!(matches!(result, Err(BridgeError::MalformedRedirect(_))));
    }

    #[tokio::test]
    async fn test_provider_exchange_failure_purges() {
        let store = test_store();
        let exchange = test_exchange(store.clone());

        // The exchange call itself fails; nothing may remain staged
        let result = exchange.complete("accessToken=kakao-1").await;
        assert!(result.is_err());
        assert_eq!(store.token().unwrap(), None);
    }
}
