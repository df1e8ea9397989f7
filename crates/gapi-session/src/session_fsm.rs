//! Session state machine using rust-fsm.
//!
//! ```text
//!            SignInRequested              SignOutRequested
//!   SigningIn ◄─────────────── Idle ───────────────► SigningOut
//!       │                       ▲ ▲                      │
//!       └──────SignInSettled────┘ └────SignOutSettled────┘
//! ```
//!
//! Success and failure both settle back to `Idle`; errors are returned to the
//! caller of the operation, never stored as a state.

use rust_fsm::*;
use serde::{Deserialize, Serialize};
use std::fmt;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Idle)

    Idle => {
        SignInRequested => SigningIn,
        SignOutRequested => SigningOut
    },
    SigningIn => {
        SignInSettled => Idle
    },
    SigningOut => {
        SignOutSettled => Idle
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Session activity for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    Idle,
    SigningIn,
    SigningOut,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::SigningIn => "signing-in",
            SessionState::SigningOut => "signing-out",
        }
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self, SessionState::Idle)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Idle => SessionState::Idle,
            SessionMachineState::SigningIn => SessionState::SigningIn,
            SessionMachineState::SigningOut => SessionState::SigningOut,
        }
    }
}
