//! Bootstrap for the asynchronously loaded Google API client library.
//!
//! This crate provides:
//! - Host abstractions: script injection target, readiness global, tick scheduler
//! - The client library surface the bootstrap and session layers talk to
//! - `ResourceBootstrap`: inject once, poll until ready, load modules, initialize
//! - Explicit FSM-based bootstrap progress tracking

mod auth;
mod bootstrap;
mod bootstrap_fsm;
mod error;
mod host;
mod library;

pub use auth::{
    AuthFailure, AuthInstance, AuthModule, LibraryUser, SignInOptions, UserListener, UserProfile,
    POPUP_CLOSED_BY_USER,
};
pub use bootstrap::{
    initialize_client, load_modules, BootstrapOptions, ResourceBootstrap, ScriptInjection,
    DEFAULT_MODULE_TIMEOUT_MS, DEFAULT_READY_TIMEOUT_MS, DEFAULT_SCRIPT_URL,
};
pub use bootstrap_fsm::bootstrap_machine;
pub use bootstrap_fsm::{BootstrapMachine, BootstrapMachineInput, BootstrapMachineState, BootstrapState};
pub use error::{BootstrapError, BootstrapResult};
pub use host::{FrameScheduler, ScriptElement, ScriptHost, TickScheduler, DEFAULT_FRAME_INTERVAL};
pub use library::{
    ClientInitConfig, ClientLibrary, ClientModule, ClientOptions, LibraryHandle, LoadRequest,
    SpreadsheetsResource, AUTH_MODULE, CLIENT_MODULE,
};
