//! Session error types.

use crate::SessionState;
use gapi_bootstrap::{AuthFailure, BootstrapError};
use thiserror::Error;

/// Session error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The opposing operation is in flight
    #[error("Cannot {requested} while {in_flight}")]
    SessionBusy {
        requested: &'static str,
        in_flight: SessionState,
    },

    /// The library rejected sign-in for a reason other than user cancellation
    #[error("Sign-in failed: {0}")]
    SignInError(AuthFailure),

    /// The library rejected sign-out
    #[error("Sign-out failed: {0}")]
    SignOutError(AuthFailure),

    /// Loading the auth module failed
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),
}

impl SessionError {
    /// Returns true if the operation was refused because another one is running.
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionError::SessionBusy { .. })
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
