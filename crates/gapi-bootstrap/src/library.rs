//! Surface of the external client library as seen from Rust.

use crate::auth::AuthModule;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Core client module, loaded during bootstrap.
pub const CLIENT_MODULE: &str = "client";

/// Authentication module, loaded on demand by the session layer.
pub const AUTH_MODULE: &str = "auth2";

/// Arguments to the library's `load` entrypoint.
///
/// The library calls exactly one of `callback`, `onerror` or `ontimeout`.
pub struct LoadRequest {
    pub timeout: Duration,
    pub callback: Box<dyn FnOnce() + Send>,
    pub onerror: Box<dyn FnOnce(String) + Send>,
    pub ontimeout: Box<dyn FnOnce() + Send>,
}

impl fmt::Debug for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadRequest")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// The library root defined as a host global once the script has loaded.
pub trait ClientLibrary: Send + Sync {
    /// Load one or more modules; `modules` is a `:`-joined list.
    fn load(&self, modules: &str, request: LoadRequest);

    /// The `client` module, present after it has been loaded.
    fn client(&self) -> Option<Arc<dyn ClientModule>>;

    /// The `auth2` module, present after it has been loaded.
    fn auth2(&self) -> Option<Arc<dyn AuthModule>>;
}

/// The `client` module.
#[async_trait]
pub trait ClientModule: Send + Sync {
    /// The library's own initialization entrypoint.
    async fn init(&self, config: &ClientInitConfig) -> Result<(), String>;

    /// Spreadsheets resource, available once discovery documents are loaded.
    fn spreadsheets(&self) -> Option<Arc<dyn SpreadsheetsResource>>;
}

/// Spreadsheet CRUD resource exposed by the initialized client.
#[async_trait]
pub trait SpreadsheetsResource: Send + Sync {
    async fn create(&self, resource: serde_json::Value) -> Result<serde_json::Value, String>;

    async fn get(&self, spreadsheet_id: &str) -> Result<serde_json::Value, String>;
}

/// Options used to initialize the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    pub client_id: String,
    pub api_key: String,
    #[serde(default)]
    pub discovery_docs: Vec<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Payload passed to `ClientModule::init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInitConfig {
    pub api_key: String,
    pub discovery_docs: Vec<String>,
    pub client_id: String,
    /// Space-separated scopes.
    pub scope: String,
}

impl From<&ClientOptions> for ClientInitConfig {
    fn from(options: &ClientOptions) -> Self {
        Self {
            api_key: options.api_key.clone(),
            discovery_docs: options.discovery_docs.clone(),
            client_id: options.client_id.clone(),
            scope: options.scopes.join(" "),
        }
    }
}

/// Handle to the initialized library. Cheap to clone; equality is identity.
#[derive(Clone)]
pub struct LibraryHandle {
    library: Arc<dyn ClientLibrary>,
}

impl LibraryHandle {
    pub fn new(library: Arc<dyn ClientLibrary>) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &Arc<dyn ClientLibrary> {
        &self.library
    }

    pub fn client(&self) -> Option<Arc<dyn ClientModule>> {
        self.library.client()
    }

    pub fn auth2(&self) -> Option<Arc<dyn AuthModule>> {
        self.library.auth2()
    }
}

impl PartialEq for LibraryHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.library, &other.library)
    }
}

impl Eq for LibraryHandle {}

impl fmt::Debug for LibraryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryHandle")
            .field("library", &Arc::as_ptr(&self.library))
            .finish()
    }
}
