//! Script injection, readiness polling, module loading and client init.
//!
//! `ResourceBootstrap` drives the whole procedure and tracks progress through
//! an internal FSM. `into_resource` wraps it in a `SharedAsyncResource`, which
//! guarantees the procedure runs at most once and that a failure is cached.

use crate::bootstrap_fsm::{BootstrapMachine, BootstrapMachineInput, BootstrapState};
use crate::host::{ScriptElement, ScriptHost, TickScheduler};
use crate::library::{ClientModule, ClientOptions, LibraryHandle, LoadRequest, CLIENT_MODULE};
use crate::{BootstrapError, BootstrapResult, ClientInitConfig};
use async_singleton::SharedAsyncResource;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Default library script location.
pub const DEFAULT_SCRIPT_URL: &str = "https://apis.google.com/js/api.js";

/// Default time to wait for the library global.
pub const DEFAULT_READY_TIMEOUT_MS: u64 = 15_000;

/// Default time the library may take to load a module.
pub const DEFAULT_MODULE_TIMEOUT_MS: u64 = 15_000;

/// Settings for one bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapOptions {
    pub script_url: String,
    pub ready_timeout: Duration,
    pub module_timeout: Duration,
    pub client: ClientOptions,
}

impl BootstrapOptions {
    pub fn new(client: ClientOptions) -> Self {
        Self {
            script_url: DEFAULT_SCRIPT_URL.to_string(),
            ready_timeout: Duration::from_millis(DEFAULT_READY_TIMEOUT_MS),
            module_timeout: Duration::from_millis(DEFAULT_MODULE_TIMEOUT_MS),
            client,
        }
    }
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self::new(ClientOptions::default())
    }
}

/// Outcome of `ensure_script_injected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptInjection {
    /// A new script tag was appended.
    Injected,
    /// A tag with the same `src` already existed; reused.
    AlreadyPresent,
}

enum LoadOutcome {
    Loaded,
    Failed(String),
    TimedOut,
}

/// Load one or more library modules as a single `:`-joined request.
///
/// Exactly one of success, `ModuleLoadError` or `ModuleLoadTimeout` is
/// produced, whichever callback the library fires first.
pub async fn load_modules(
    library: &LibraryHandle,
    names: &[&str],
    timeout: Duration,
) -> BootstrapResult<()> {
    let modules = names.join(":");
    let timeout_ms = millis(timeout);
    debug!(modules = %modules, timeout_ms, "Loading library modules");

    let (tx, rx) = oneshot::channel::<LoadOutcome>();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let settle = |tx: &Arc<Mutex<Option<oneshot::Sender<LoadOutcome>>>>, outcome: LoadOutcome| {
        if let Some(tx) = tx.lock().take() {
            let _ = tx.send(outcome);
        }
    };

    let request = LoadRequest {
        timeout,
        callback: Box::new({
            let tx = tx.clone();
            move || settle(&tx, LoadOutcome::Loaded)
        }),
        onerror: Box::new({
            let tx = tx.clone();
            move |reason| settle(&tx, LoadOutcome::Failed(reason))
        }),
        ontimeout: Box::new({
            let tx = tx.clone();
            move || settle(&tx, LoadOutcome::TimedOut)
        }),
    };
    drop(tx);

    library.library().load(&modules, request);

    match rx.await {
        Ok(LoadOutcome::Loaded) => {
            debug!(modules = %modules, "Library modules loaded");
            Ok(())
        }
        Ok(LoadOutcome::Failed(reason)) => {
            warn!(modules = %modules, reason = %reason, "Library module load failed");
            Err(BootstrapError::ModuleLoadError { modules, reason })
        }
        Ok(LoadOutcome::TimedOut) => {
            warn!(modules = %modules, timeout_ms, "Library module load timed out");
            Err(BootstrapError::ModuleLoadTimeout {
                modules,
                timeout_ms,
            })
        }
        Err(_) => Err(BootstrapError::ModuleLoadError {
            modules,
            reason: "library dropped the load request without answering".to_string(),
        }),
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Call the library's client init entrypoint.
pub async fn initialize_client(
    client: &Arc<dyn ClientModule>,
    options: &ClientOptions,
) -> BootstrapResult<()> {
    let config = ClientInitConfig::from(options);
    debug!(
        client_id = %config.client_id,
        scope = %config.scope,
        discovery_docs = config.discovery_docs.len(),
        "Initializing client"
    );

    match client.init(&config).await {
        Ok(()) => {
            debug!("Client initialized");
            Ok(())
        }
        Err(reason) => {
            warn!(reason = %reason, "Client initialization failed");
            Err(BootstrapError::ClientInitError(reason))
        }
    }
}

/// Brings the client library from "not in the document" to initialized.
pub struct ResourceBootstrap {
    host: Arc<dyn ScriptHost>,
    scheduler: Arc<dyn TickScheduler>,
    options: BootstrapOptions,
    fsm: Mutex<BootstrapMachine>,
}

impl ResourceBootstrap {
    pub fn new(
        host: Arc<dyn ScriptHost>,
        scheduler: Arc<dyn TickScheduler>,
        options: BootstrapOptions,
    ) -> Self {
        Self {
            host,
            scheduler,
            options,
            fsm: Mutex::new(BootstrapMachine::new()),
        }
    }

    pub fn options(&self) -> &BootstrapOptions {
        &self.options
    }

    /// Current bootstrap progress.
    pub fn state(&self) -> BootstrapState {
        BootstrapState::from(self.fsm.lock().state())
    }

    fn transition(&self, input: &BootstrapMachineInput) -> BootstrapResult<BootstrapState> {
        let mut fsm = self.fsm.lock();
        let old_state = BootstrapState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            BootstrapError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_state = BootstrapState::from(fsm.state());
        if old_state != new_state {
            debug!(
                old_state = ?old_state,
                new_state = ?new_state,
                "Bootstrap state transition"
            );
        }
        Ok(new_state)
    }

    /// Make sure exactly one script tag for `url` exists in the document.
    ///
    /// The host performs the check and the append atomically, so concurrent
    /// bootstraps on one host never inject twice.
    pub fn ensure_script_injected(&self, url: &str) -> ScriptInjection {
        if self.host.ensure_script(ScriptElement::javascript(url)) {
            debug!(url = %url, "Injected library script");
            ScriptInjection::Injected
        } else {
            debug!(url = %url, "Library script already present; reusing");
            ScriptInjection::AlreadyPresent
        }
    }

    /// Poll the host once per tick until the library global is defined.
    pub async fn wait_for_global_ready(&self, timeout: Duration) -> BootstrapResult<LibraryHandle> {
        let started_at = self.scheduler.now();

        loop {
            let elapsed = self.scheduler.now().saturating_sub(started_at);

            if let Some(library) = self.host.library_global() {
                debug!(elapsed_ms = millis(elapsed), "Library global ready");
                return Ok(library);
            }

            if elapsed > timeout {
                warn!(
                    elapsed_ms = millis(elapsed),
                    timeout_ms = millis(timeout),
                    "Timed out waiting for library global"
                );
                return Err(BootstrapError::BootstrapTimeout {
                    timeout_ms: millis(timeout),
                    elapsed_ms: millis(elapsed),
                });
            }

            self.scheduler.next_tick().await;
        }
    }

    /// Load modules with the configured module timeout.
    pub async fn load_modules(&self, library: &LibraryHandle, names: &[&str]) -> BootstrapResult<()> {
        load_modules(library, names, self.options.module_timeout).await
    }

    /// Initialize the client module with the configured client options.
    pub async fn initialize_client(&self, client: &Arc<dyn ClientModule>) -> BootstrapResult<()> {
        initialize_client(client, &self.options.client).await
    }

    /// Run inject → poll → load `client` → init.
    ///
    /// Call through `into_resource` to get run-once semantics; calling this
    /// twice on the same instance fails with `InvalidStateTransition`.
    pub async fn bootstrap(&self) -> BootstrapResult<LibraryHandle> {
        let url = self.options.script_url.clone();
        info!(url = %url, "Bootstrapping client library");

        if self.host.has_script(&url) {
            debug!(url = %url, "Library script already present; reusing");
            self.transition(&BootstrapMachineInput::ScriptPresent)?;
        } else {
            self.transition(&BootstrapMachineInput::InjectScript)?;
            // Another bootstrap on this host may have appended it meanwhile.
            self.ensure_script_injected(&url);
            self.transition(&BootstrapMachineInput::ScriptInjected)?;
        }

        let library = match self.wait_for_global_ready(self.options.ready_timeout).await {
            Ok(library) => library,
            Err(e) => {
                self.transition(&BootstrapMachineInput::ReadyTimeout)?;
                return Err(e);
            }
        };
        self.transition(&BootstrapMachineInput::GlobalReady)?;

        let client = match self.load_client(&library).await {
            Ok(client) => client,
            Err(e) => {
                self.transition(&BootstrapMachineInput::ModulesFailed)?;
                return Err(e);
            }
        };
        self.transition(&BootstrapMachineInput::ModulesLoaded)?;

        if let Err(e) = self.initialize_client(&client).await {
            self.transition(&BootstrapMachineInput::InitFailed)?;
            return Err(e);
        }
        self.transition(&BootstrapMachineInput::ClientInitialized)?;

        info!("Client library ready");
        Ok(library)
    }

    async fn load_client(&self, library: &LibraryHandle) -> BootstrapResult<Arc<dyn ClientModule>> {
        self.load_modules(library, &[CLIENT_MODULE]).await?;
        library
            .client()
            .ok_or_else(|| BootstrapError::ModuleMissing(CLIENT_MODULE.to_string()))
    }

    /// Wrap the bootstrap in a lazily started, run-once shared resource.
    pub fn into_resource(self: Arc<Self>) -> SharedAsyncResource<LibraryHandle, BootstrapError> {
        SharedAsyncResource::new("client-library", move |_updater| async move {
            self.bootstrap().await
        })
    }
}
