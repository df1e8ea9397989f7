//! Authenticated-session tracking on top of the bootstrapped client library.
//!
//! `SessionStateMachine` delegates sign-in/sign-out to the library's `auth2`
//! module, enforces single-flight between the two operations, and broadcasts
//! every `(user, state)` change to subscribers.

mod error;
mod session;
mod session_fsm;

pub use error::{SessionError, SessionResult};
pub use session::{SessionSnapshot, SessionStateMachine};
pub use session_fsm::session_machine;
pub use session_fsm::{SessionMachine, SessionMachineInput, SessionMachineState, SessionState};
