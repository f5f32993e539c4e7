//! Credential key constants.
//!
//! Both persistence scopes use the identical key set. `token` is the
//! canonical bearer key; `userToken` and `accessToken` are compatibility
//! aliases written in a single step by the store (see `CredentialStore`),
//! never by individual call sites.

/// Keys used by the credential store
pub struct CredentialKeys;

impl CredentialKeys {
    /// Canonical bearer token
    pub const TOKEN: &'static str = "token";

    /// Bearer token alias (cross-subsystem compatibility)
    pub const USER_TOKEN: &'static str = "userToken";

    /// Bearer token alias (legacy)
    pub const ACCESS_TOKEN: &'static str = "accessToken";

    /// Serialized user identity (JSON)
    pub const USER: &'static str = "user";

    /// Durable-login marker
    pub const REMEMBER_ME: &'static str = "rememberMe";

    /// Username saved for login form prefill
    pub const SAVED_USERNAME: &'static str = "savedUsername";

    /// Every key the store knows about, for fail-safe clearing.
    pub const ALL: [&'static str; 6] = [
        Self::TOKEN,
        Self::USER_TOKEN,
        Self::ACCESS_TOKEN,
        Self::USER,
        Self::REMEMBER_ME,
        Self::SAVED_USERNAME,
    ];
}
