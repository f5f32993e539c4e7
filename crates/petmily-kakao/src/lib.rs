//! Kakao external login for the Petmily client.
//!
//! This crate provides:
//! - Lazy one-shot initialization of the Kakao provider (shared by
//!   concurrent callers, failing descriptively without an app key)
//! - The provider authorization flow via a local HTTP callback server
//! - The one-time redirect token exchange that persists a credential
//!   directly and hands control back to restore

mod callback;
mod error;
mod exchange;
mod provider;
mod query;

pub use callback::{CallbackParams, CallbackServer, DEFAULT_CALLBACK_PORT, DEFAULT_CALLBACK_TIMEOUT_SECS};
pub use error::{BridgeError, BridgeResult};
pub use exchange::{ExchangeOutcome, ExchangePayload, RedirectExchange};
pub use provider::{AuthorizationAttempt, KakaoBridge, KakaoProvider};
