use async_trait::async_trait;
use gapi_bootstrap::{
    AuthFailure, AuthInstance, AuthModule, BootstrapError, ClientLibrary, ClientModule,
    LibraryHandle, LibraryUser, LoadRequest, SignInOptions, UserListener, UserProfile,
};
use gapi_session::{SessionError, SessionState, SessionStateMachine};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

struct Auth {
    user: LibraryUser,
}

#[async_trait]
impl AuthInstance for Auth {
    fn current_user(&self) -> LibraryUser {
        self.user.clone()
    }

    fn listen_current_user(&self, _listener: UserListener) {}

    async fn sign_in(&self, _options: Option<SignInOptions>) -> Result<LibraryUser, AuthFailure> {
        Ok(self.user.clone())
    }

    async fn sign_out(&self) -> Result<(), AuthFailure> {
        Ok(())
    }
}

struct Module {
    instance: Arc<Auth>,
}

impl AuthModule for Module {
    fn auth_instance(&self) -> Arc<dyn AuthInstance> {
        self.instance.clone()
    }
}

/// Library whose `auth2` module appears only after a successful load.
struct Library {
    fail_with: Option<&'static str>,
    loaded: Mutex<Option<Arc<Module>>>,
    requested: Mutex<Vec<String>>,
}

impl Library {
    fn new(fail_with: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            fail_with,
            loaded: Mutex::new(None),
            requested: Mutex::new(Vec::new()),
        })
    }
}

impl ClientLibrary for Library {
    fn load(&self, modules: &str, request: LoadRequest) {
        self.requested.lock().push(modules.to_string());
        match self.fail_with {
            Some(reason) => (request.onerror)(reason.to_string()),
            None => {
                *self.loaded.lock() = Some(Arc::new(Module {
                    instance: Arc::new(Auth {
                        user: LibraryUser::signed_in(UserProfile {
                            id: "already-signed-in".to_string(),
                            ..Default::default()
                        }),
                    }),
                }));
                (request.callback)();
            }
        }
    }

    fn client(&self) -> Option<Arc<dyn ClientModule>> {
        None
    }

    fn auth2(&self) -> Option<Arc<dyn AuthModule>> {
        self.loaded
            .lock()
            .clone()
            .map(|module| module as Arc<dyn AuthModule>)
    }
}

#[tokio::test]
async fn test_load_requests_auth_module() {
    let library = Library::new(None);
    let handle = LibraryHandle::new(library.clone());

    let session = SessionStateMachine::load(&handle, Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(*library.requested.lock(), vec!["auth2".to_string()]);
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(
        session.user().map(|u| u.id),
        Some("already-signed-in".to_string())
    );
}

#[tokio::test]
async fn test_load_failure_is_bootstrap_error() {
    let handle = LibraryHandle::new(Library::new(Some("blocked by client")));

    let error = match SessionStateMachine::load(&handle, Duration::from_secs(1)).await {
        Ok(_) => panic!("expected auth module load to fail"),
        Err(error) => error,
    };

    assert_eq!(
        error,
        SessionError::Bootstrap(BootstrapError::ModuleLoadError {
            modules: "auth2".to_string(),
            reason: "blocked by client".to_string(),
        })
    );
}
