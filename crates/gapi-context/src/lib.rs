//! Application-facing entry point for the Google API client stack.
//!
//! A `ClientContext` owns one bootstrap, the session built on it and the
//! spreadsheets API. Create one per application (or per test) and pass it
//! down instead of relying on process globals.

mod config;
mod context;
mod error;
mod logging;
pub mod plan;
pub mod sheets;

pub use config::{
    Config, DEFAULT_DISCOVERY_DOC, DEFAULT_LOG_LEVEL, DEFAULT_SCOPE, ENV_API_KEY, ENV_CLIENT_ID,
    ENV_LOG_LEVEL, ENV_SCRIPT_URL,
};
pub use context::ClientContext;
pub use error::{ConfigError, ConfigResult, SheetsError, SheetsResult};
pub use logging::{init_logging, parse_level, LogConfig, LogFormat};
pub use plan::{Plan, PlanCache, PlanSheet, PLAN_TITLE};
pub use sheets::{Spreadsheet, SpreadsheetTemplate, SpreadsheetsApi};
