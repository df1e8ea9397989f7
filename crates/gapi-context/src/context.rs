//! Injectable owner of the library, session and spreadsheets resources.

use crate::sheets::SpreadsheetsApi;
use crate::{Config, ConfigResult, PlanCache};
use async_singleton::SharedAsyncResource;
use gapi_bootstrap::{
    BootstrapError, BootstrapOptions, BootstrapState, LibraryHandle, ResourceBootstrap,
    ScriptHost, TickScheduler,
};
use gapi_session::{SessionError, SessionStateMachine};
use std::sync::Arc;
use tracing::info;

/// One bootstrap and everything layered on it.
///
/// Nothing starts until a resource is subscribed to or resolved. A failed
/// bootstrap stays failed for the lifetime of the context; build a new
/// context to try again.
pub struct ClientContext {
    bootstrap: Arc<ResourceBootstrap>,
    library: SharedAsyncResource<LibraryHandle, BootstrapError>,
    session: SharedAsyncResource<Arc<SessionStateMachine>, SessionError>,
    spreadsheets: SharedAsyncResource<SpreadsheetsApi, BootstrapError>,
    plans: PlanCache,
}

impl ClientContext {
    pub fn new(
        host: Arc<dyn ScriptHost>,
        scheduler: Arc<dyn TickScheduler>,
        options: BootstrapOptions,
    ) -> Self {
        let module_timeout = options.module_timeout;
        let bootstrap = Arc::new(ResourceBootstrap::new(host, scheduler, options));
        let library = bootstrap.clone().into_resource();

        let session = {
            let library = library.clone();
            SharedAsyncResource::new("session", move |_updater| async move {
                let handle = library.resolve().await?;
                SessionStateMachine::load(&handle, module_timeout).await
            })
        };

        let spreadsheets =
            SharedAsyncResource::derived("spreadsheets", &library, |handle, _updater| async move {
                SpreadsheetsApi::from_library(&handle)
            });

        Self {
            bootstrap,
            library,
            session,
            spreadsheets,
            plans: PlanCache::new(),
        }
    }

    /// Validate `config` and build a context from it.
    pub fn from_config(
        config: &Config,
        host: Arc<dyn ScriptHost>,
        scheduler: Arc<dyn TickScheduler>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        info!(script_url = %config.script_url, "Creating client context");
        Ok(Self::new(host, scheduler, config.bootstrap_options()))
    }

    pub fn bootstrap_state(&self) -> BootstrapState {
        self.bootstrap.state()
    }

    pub fn library(&self) -> &SharedAsyncResource<LibraryHandle, BootstrapError> {
        &self.library
    }

    pub fn session(&self) -> &SharedAsyncResource<Arc<SessionStateMachine>, SessionError> {
        &self.session
    }

    pub fn spreadsheets(&self) -> &SharedAsyncResource<SpreadsheetsApi, BootstrapError> {
        &self.spreadsheets
    }

    pub fn plans(&self) -> &PlanCache {
        &self.plans
    }
}
