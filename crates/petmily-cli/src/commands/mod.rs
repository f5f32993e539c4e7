//! Command handlers.

pub mod account;
pub mod kakao;
pub mod login;
pub mod logout;
pub mod me;
pub mod register;
pub mod status;

use petmily_api::ApiClient;
use petmily_auth::SessionManager;
use petmily_core::Config;
use petmily_storage::CredentialStore;
use std::sync::Arc;

/// Shared context handed to every command.
pub struct Context {
    pub config: Config,
    pub store: Arc<CredentialStore>,
    pub api: Arc<ApiClient>,
    pub session: Arc<SessionManager>,
}
