//! Bootstrap state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//!   NotStarted ──InjectScript──► Injecting ──ScriptInjected──┐
//!       │                                                    ▼
//!       └───────────────ScriptPresent──────────────────► Polling ──ReadyTimeout──► Failed
//!                                                            │
//!                                                            │ GlobalReady
//!                                                            ▼
//!                                                     LoadingModules ──ModulesFailed──► Failed
//!                                                            │
//!                                                            │ ModulesLoaded
//!                                                            ▼
//!                                                      Initializing ──InitFailed──► Failed
//!                                                            │
//!                                                            │ ClientInitialized
//!                                                            ▼
//!                                                          Ready
//! ```
//!
//! `Ready` and `Failed` are terminal for the lifetime of a bootstrap.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub bootstrap_machine(NotStarted)

    NotStarted => {
        InjectScript => Injecting,
        ScriptPresent => Polling
    },
    Injecting => {
        ScriptInjected => Polling
    },
    Polling => {
        GlobalReady => LoadingModules,
        ReadyTimeout => Failed
    },
    LoadingModules => {
        ModulesLoaded => Initializing,
        ModulesFailed => Failed
    },
    Initializing => {
        ClientInitialized => Ready,
        InitFailed => Failed
    }
}

pub use bootstrap_machine::Input as BootstrapMachineInput;
pub use bootstrap_machine::State as BootstrapMachineState;
pub use bootstrap_machine::StateMachine as BootstrapMachine;

/// Bootstrap progress for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BootstrapState {
    NotStarted,
    Injecting,
    Polling,
    LoadingModules,
    Initializing,
    Ready,
    Failed,
}

impl BootstrapState {
    /// Ready or failed; nothing further happens.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BootstrapState::Ready | BootstrapState::Failed)
    }
}

impl From<&BootstrapMachineState> for BootstrapState {
    fn from(state: &BootstrapMachineState) -> Self {
        match state {
            BootstrapMachineState::NotStarted => BootstrapState::NotStarted,
            BootstrapMachineState::Injecting => BootstrapState::Injecting,
            BootstrapMachineState::Polling => BootstrapState::Polling,
            BootstrapMachineState::LoadingModules => BootstrapState::LoadingModules,
            BootstrapMachineState::Initializing => BootstrapState::Initializing,
            BootstrapMachineState::Ready => BootstrapState::Ready,
            BootstrapMachineState::Failed => BootstrapState::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_not_started() {
        let machine = BootstrapMachine::new();
        assert_eq!(*machine.state(), BootstrapMachineState::NotStarted);
    }

    #[test]
    fn test_full_bootstrap_path() {
        let mut machine = BootstrapMachine::new();

        machine.consume(&BootstrapMachineInput::InjectScript).unwrap();
        machine.consume(&BootstrapMachineInput::ScriptInjected).unwrap();
        assert_eq!(*machine.state(), BootstrapMachineState::Polling);

        machine.consume(&BootstrapMachineInput::GlobalReady).unwrap();
        machine.consume(&BootstrapMachineInput::ModulesLoaded).unwrap();
        machine
            .consume(&BootstrapMachineInput::ClientInitialized)
            .unwrap();
        assert_eq!(*machine.state(), BootstrapMachineState::Ready);
    }

    #[test]
    fn test_existing_script_skips_injection() {
        let mut machine = BootstrapMachine::new();

        machine.consume(&BootstrapMachineInput::ScriptPresent).unwrap();
        assert_eq!(*machine.state(), BootstrapMachineState::Polling);
    }

    #[test]
    fn test_ready_timeout_fails() {
        let mut machine = BootstrapMachine::new();
        machine.consume(&BootstrapMachineInput::ScriptPresent).unwrap();

        machine.consume(&BootstrapMachineInput::ReadyTimeout).unwrap();
        assert_eq!(*machine.state(), BootstrapMachineState::Failed);
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut machine = BootstrapMachine::new();
        machine.consume(&BootstrapMachineInput::ScriptPresent).unwrap();
        machine.consume(&BootstrapMachineInput::ReadyTimeout).unwrap();

        assert!(machine.consume(&BootstrapMachineInput::InjectScript).is_err());
        assert!(machine.consume(&BootstrapMachineInput::GlobalReady).is_err());
    }

    #[test]
    fn test_cannot_load_modules_before_ready() {
        let mut machine = BootstrapMachine::new();
        assert!(machine.consume(&BootstrapMachineInput::ModulesLoaded).is_err());
    }

    #[test]
    fn test_bootstrap_state_conversion() {
        assert_eq!(
            BootstrapState::from(&BootstrapMachineState::LoadingModules),
            BootstrapState::LoadingModules
        );
        assert!(BootstrapState::Ready.is_terminal());
        assert!(BootstrapState::Failed.is_terminal());
        assert!(!BootstrapState::Polling.is_terminal());
    }

    #[test]
    fn test_bootstrap_state_serializes_kebab_case() {
        let json = serde_json::to_string(&BootstrapState::LoadingModules).unwrap();
        assert_eq!(json, "\"loading-modules\"");
    }
}
