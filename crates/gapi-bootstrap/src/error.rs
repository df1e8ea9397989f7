//! Bootstrap error types.

use thiserror::Error;

/// Bootstrap error type.
///
/// `Clone` because a failed bootstrap is cached and replayed to every awaiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    /// The library global never became defined
    #[error("Timed out trying to load the client library after {elapsed_ms} ms (limit {timeout_ms} ms)")]
    BootstrapTimeout { timeout_ms: u64, elapsed_ms: u64 },

    /// The library reported an error while loading modules
    #[error("Failed to load library module(s) {modules}: {reason}")]
    ModuleLoadError { modules: String, reason: String },

    /// The library's own load timeout fired
    #[error("Timed out loading library module(s) {modules} after {timeout_ms} milliseconds")]
    ModuleLoadTimeout { modules: String, timeout_ms: u64 },

    /// The client init entrypoint rejected
    #[error("Client initialization failed: {0}")]
    ClientInitError(String),

    /// Load reported success but the module is not exposed on the library
    #[error("Library module '{0}' is not available after loading")]
    ModuleMissing(String),

    /// Invalid state transition in the bootstrap FSM
    #[error("Invalid bootstrap state transition: {0}")]
    InvalidStateTransition(String),
}

impl BootstrapError {
    /// Returns true for either timeout flavor.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            BootstrapError::BootstrapTimeout { .. } | BootstrapError::ModuleLoadTimeout { .. }
        )
    }
}

/// Result type alias using BootstrapError.
pub type BootstrapResult<T> = Result<T, BootstrapError>;
