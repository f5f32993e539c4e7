//! REST client for the Petmily backend.
//!
//! This crate is the single place outgoing requests get their bearer
//! credential and incoming error responses get their handling:
//! - the Authorization header comes from the credential store (durable
//!   scope before ephemeral), silently absent when not logged in
//! - a 401 anywhere purges the stored credential and fires the
//!   registered authorization-failure hook, regardless of endpoint
//! - every error is annotated with a fixed human-readable message so no
//!   caller ever switches on status codes

mod client;
mod error;
mod types;

pub use client::{ApiClient, AuthFailureHook};
pub use error::{message_for_status, ApiError, ApiResult};
pub use types::{AuthResponse, ErrorEnvelope, LoginRequest, RegisterRequest};
