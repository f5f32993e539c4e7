//! Session state machine using rust-fsm.
//!
//! The machine makes the session lifecycle explicit instead of deriving it
//! from storage checks or boolean flags.
//!
//! ## State Diagram
//!
//! ```text
//! ┌──────────────────┐  CredentialRestored   ┌─────────────────┐
//! │ Unauthenticated  │ ────────────────────► │  Authenticated  │
//! └────────┬─────────┘                       └───────┬─────────┘
//!          │ AttemptStarted                          │ LoggedOut /
//!          ▼                                         │ AuthorizationRevoked
//! ┌──────────────────┐  AttemptSucceeded             ▼
//! │  Authenticating  │ ────────────────────►  Authenticated
//! └────────┬─────────┘
//!          │ AttemptFailed ──────────────►  Unauthenticated
//!          │ RegistrationCompleted
//!          ▼
//! ┌──────────────────────────┐  AttemptStarted
//! │  RegisteredPendingLogin  │ ───────────────►  Authenticating
//! └──────────────────────────┘
//!
//! AuthorizationRevoked is accepted in every state and lands in
//! Unauthenticated.
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

// Define the FSM using rust-fsm's declarative macro
// This generates a module `session_machine` with:
// - session_machine::State (enum)
// - session_machine::Input (enum)
// - session_machine::StateMachine (type alias)
state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Unauthenticated)

    Unauthenticated => {
        CredentialRestored => Authenticated,
        AttemptStarted => Authenticating,
        AuthorizationRevoked => Unauthenticated
    },
    Authenticating => {
        AttemptSucceeded => Authenticated,
        AttemptFailed => Unauthenticated,
        RegistrationCompleted => RegisteredPendingLogin,
        AuthorizationRevoked => Unauthenticated
    },
    Authenticated => {
        LoggedOut => Unauthenticated,
        AuthorizationRevoked => Unauthenticated
    },
    RegisteredPendingLogin => {
        AttemptStarted => Authenticating,
        AuthorizationRevoked => Unauthenticated
    }
}

// Re-export the generated types with clearer names
pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Session state as seen by callers and UI layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session. Initial state.
    Unauthenticated,
    /// A login, registration, or external login is in flight.
    Authenticating,
    /// Logged in with a usable credential.
    Authenticated,
    /// Registration succeeded; explicitly not authenticated.
    RegisteredPendingLogin,
}

impl SessionState {
    /// Returns true only for a fully established session.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }

    /// Returns true while an attempt is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Authenticating)
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Unauthenticated => SessionState::Unauthenticated,
            SessionMachineState::Authenticating => SessionState::Authenticating,
            SessionMachineState::Authenticated => SessionState::Authenticated,
            SessionMachineState::RegisteredPendingLogin => SessionState::RegisteredPendingLogin,
        }
    }
}
