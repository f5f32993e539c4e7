//! Session lifecycle management for the Petmily client.
//!
//! This crate provides:
//! - An explicit FSM for the session states (login, registration,
//!   external login, restore, logout, authorization revocation)
//! - The `SessionManager` context object tying the machine to the
//!   credential store and the API client
//! - The `Session` snapshot consumed by UI layers

mod error;
mod session;
mod session_fsm;

pub use error::{AuthError, AuthResult};
pub use session::{Session, SessionCallback, SessionManager};
pub use session_fsm::session_machine;
pub use session_fsm::{SessionMachine, SessionMachineInput, SessionMachineState, SessionState};
