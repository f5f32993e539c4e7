//! Session manager tying the FSM to the credential store and API client.

use crate::session_fsm::{SessionMachine, SessionMachineInput, SessionState};
use crate::{AuthError, AuthResult};
use chrono::{Duration, Utc};
use petmily_api::{ApiClient, AuthResponse, LoginRequest, RegisterRequest};
use petmily_storage::{CredentialStore, StorageScope, UserIdentity};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Snapshot of the in-memory session, the single source of truth UI
/// layers read.
///
/// Invariant: `is_authenticated` implies both `user` and `token` are
/// present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: Option<UserIdentity>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl Session {
    /// The empty session every client starts from.
    pub fn unauthenticated() -> Self {
        Self {
            user: None,
            token: None,
            is_authenticated: false,
            is_loading: false,
        }
    }
}

/// Callback type for session change notifications.
pub type SessionCallback = Box<dyn Fn(Session) + Send + Sync>;

/// Session manager for the Petmily client.
///
/// An explicit context object: constructed once in `main` and passed to
/// whatever needs it, never a global. The FSM tracks the lifecycle, the
/// credential store holds the persisted record, and the in-memory
/// user/token pair mirrors whatever the store last confirmed.
pub struct SessionManager {
    store: Arc<CredentialStore>,
    api: Arc<ApiClient>,
    machine: Mutex<SessionMachine>,
    user: Mutex<Option<UserIdentity>>,
    token: Mutex<Option<String>>,
    /// Optional callback for session change notifications.
    callback: Mutex<Option<SessionCallback>>,
}

impl SessionManager {
    /// Create a new session manager.
    pub fn new(store: Arc<CredentialStore>, api: Arc<ApiClient>) -> Self {
        Self {
            store,
            api,
            machine: Mutex::new(SessionMachine::new()),
            user: Mutex::new(None),
            token: Mutex::new(None),
            callback: Mutex::new(None),
        }
    }

    /// Wire the API client's authorization-failure hook to this manager,
    /// so a 401 anywhere resets the session uniformly.
    ///
    /// Holds a weak reference; the hook goes inert if the manager drops.
    pub fn install_authorization_hook(manager: &Arc<SessionManager>) {
        let weak = Arc::downgrade(manager);
        manager
            .api
            .set_auth_failure_hook(Box::new(move || {
                if let Some(manager) = weak.upgrade() {
                    manager.handle_authorization_failure();
                }
            }));
    }

    /// Set a callback to be notified whenever the session changes.
    pub fn set_callback(&self, callback: SessionCallback) {
        let mut slot = self.callback.lock().unwrap();
        *slot = Some(callback);
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        let machine = self.machine.lock().unwrap();
        SessionState::from(machine.state())
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        let state = self.state();
        Session {
            user: self.user.lock().unwrap().clone(),
            token: self.token.lock().unwrap().clone(),
            is_authenticated: state.is_authenticated(),
            is_loading: state.is_loading(),
        }
    }

    /// Transition the FSM and notify the callback if the state changed.
    fn transition(&self, input: &SessionMachineInput) -> AuthResult<SessionState> {
        let mut machine = self.machine.lock().unwrap();
        let old_state = SessionState::from(machine.state());

        machine.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                machine.state()
            ))
        })?;

        let new_state = SessionState::from(machine.state());
        drop(machine);

        if old_state != new_state {
            debug!(old_state = ?old_state, new_state = ?new_state, "Session state transition");
            self.notify();
        }

        Ok(new_state)
    }

    fn notify(&self) {
        let callback = self.callback.lock().unwrap();
        if let Some(callback) = callback.as_ref() {
            callback(self.session());
        }
    }

    /// Enter the transient attempt state, mapping the illegal cases to
    /// their specific errors.
    fn begin_attempt(&self) -> AuthResult<()> {
        match self.transition(&SessionMachineInput::AttemptStarted) {
            Ok(_) => Ok(()),
            Err(e) => match self.state() {
                SessionState::Authenticating => Err(AuthError::AttemptInFlight),
                SessionState::Authenticated => Err(AuthError::AlreadyAuthenticated),
                _ => Err(e),
            },
        }
    }

    /// Finish a successful login-shaped attempt: persist the credential,
    /// update the in-memory pair, then flip the machine.
    fn complete_attempt(&self, response: AuthResponse, scope: StorageScope) -> AuthResult<Session> {
        let user = response.identity();

        if let Err(e) = self.store.write(scope, &response.access_token, &user) {
            let _ = self.transition(&SessionMachineInput::AttemptFailed);
            return Err(e.into());
        }

        *self.user.lock().unwrap() = Some(user.clone());
        *self.token.lock().unwrap() = Some(response.access_token);
        self.transition(&SessionMachineInput::AttemptSucceeded)?;

        let expires_at = Utc::now() + Duration::seconds(response.expires_in);
        info!(
            username = %user.username,
            scope = ?scope,
            expires_at = %expires_at.to_rfc3339(),
            "Login successful"
        );
        Ok(self.session())
    }

    /// Rebuild the session from the persisted credential, without a
    /// network round-trip. The record is trusted as-is; if the backend
    /// has since revoked it, the first authorized request corrects the
    /// state through the middleware's 401 policy.
    ///
    /// Returns whether a session was restored.
    pub fn restore(&self) -> AuthResult<bool> {
        match self.store.read()? {
            Some(credential) => {
                *self.user.lock().unwrap() = Some(credential.user.clone());
                *self.token.lock().unwrap() = Some(credential.token);
                self.transition(&SessionMachineInput::CredentialRestored)?;

                info!(username = %credential.user.username, "Session restored from storage");
                Ok(true)
            }
            None => {
                debug!("No stored credential to restore");
                Ok(false)
            }
        }
    }

    /// Log in with username and password.
    ///
    /// `remember` chooses the durable scope; otherwise the credential
    /// lives only for this process. On failure the session returns to
    /// unauthenticated and the annotated error is re-thrown.
    pub async fn login(&self, username: &str, password: &str, remember: bool) -> AuthResult<Session> {
        self.begin_attempt()?;

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        match self.api.login(&request).await {
            Ok(response) => self.complete_attempt(response, scope_for(remember)),
            Err(e) => {
                let _ = self.transition(&SessionMachineInput::AttemptFailed);
                Err(e.into())
            }
        }
    }

    /// Register a new account.
    ///
    /// Success never authenticates: the backend accepts the account, the
    /// loading flag clears, and no credential is written anywhere. The
    /// caller logs in separately.
    pub async fn register(&self, request: &RegisterRequest) -> AuthResult<()> {
        self.begin_attempt()?;

        match self.api.register(request).await {
            Ok(response) => {
                self.transition(&SessionMachineInput::RegistrationCompleted)?;
                info!(username = %response.username, "Registration accepted");
                Ok(())
            }
            Err(e) => {
                let _ = self.transition(&SessionMachineInput::AttemptFailed);
                Err(e.into())
            }
        }
    }

    /// Log in through a Kakao provider access token.
    ///
    /// Same contract as `login`; persistence defaults to durable unless
    /// the caller overrides.
    pub async fn login_with_kakao(
        &self,
        provider_access_token: &str,
        remember: Option<bool>,
    ) -> AuthResult<Session> {
        self.begin_attempt()?;

        match self.api.exchange_kakao_token(provider_access_token).await {
            Ok(response) => self.complete_attempt(response, scope_for(remember.unwrap_or(true))),
            Err(e) => {
                let _ = self.transition(&SessionMachineInput::AttemptFailed);
                Err(e.into())
            }
        }
    }

    /// Log out.
    ///
    /// The server call is best-effort; the client-side teardown (store
    /// clear, in-memory reset, transition to unauthenticated) happens
    /// unconditionally.
    pub async fn logout(&self) -> AuthResult<()> {
        self.api.logout_best_effort().await;

        let result = self.teardown_local();
        info!("Logged out");
        result
    }

    /// Clear the store, drop the in-memory pair, and land in
    /// Unauthenticated regardless of the current state.
    fn teardown_local(&self) -> AuthResult<()> {
        let cleared = self.store.clear();
        *self.user.lock().unwrap() = None;
        *self.token.lock().unwrap() = None;
        // LoggedOut is only legal from Authenticated; the revocation input
        // is accepted everywhere and lands in the same place.
        if self.transition(&SessionMachineInput::LoggedOut).is_err() {
            let _ = self.transition(&SessionMachineInput::AuthorizationRevoked);
        }

        cleared.map_err(Into::into)
    }

    /// Reset the session after a server-signaled authorization failure.
    ///
    /// Invoked by the middleware hook; issues no API call. Clearing an
    /// already-cleared store is a no-op, so this composes with the
    /// middleware's own purge.
    pub fn handle_authorization_failure(&self) {
        debug!("Authorization failure reported, resetting session");

        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to purge credentials after authorization failure");
        }
        *self.user.lock().unwrap() = None;
        *self.token.lock().unwrap() = None;
        let _ = self.transition(&SessionMachineInput::AuthorizationRevoked);
    }

    /// Delete the account server-side, then tear the session down like a
    /// logout.
    pub async fn delete_account(&self) -> AuthResult<()> {
        self.api.delete_account().await?;

        let result = self.teardown_local();
        info!("Account deleted");
        result
    }
}

fn scope_for(remember: bool) -> StorageScope {
    if remember {
        StorageScope::Durable
    } else {
        StorageScope::Ephemeral
    }
}
