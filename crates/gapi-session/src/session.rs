//! Session management on top of the library's `auth2` module.
//!
//! `SessionStateMachine` keeps the current user and an internal FSM under one
//! lock. Every mutation that changes the `(user, state)` pair produces exactly
//! one broadcast; subscribers are invoked after the state lock is released,
//! under the subscriber set's reentrant delivery guard.

use crate::session_fsm::{SessionMachine, SessionMachineInput, SessionState};
use crate::{SessionError, SessionResult};
use async_singleton::{Callback, SubscriberSet, Subscription};
use gapi_bootstrap::{
    load_modules, AuthInstance, BootstrapError, LibraryHandle, LibraryUser, SignInOptions,
    UserProfile, AUTH_MODULE,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The `(user, state)` pair broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub user: Option<UserProfile>,
    pub state: SessionState,
}

struct SessionInner {
    fsm: SessionMachine,
    user: Option<UserProfile>,
}

impl SessionInner {
    fn state(&self) -> SessionState {
        SessionState::from(self.fsm.state())
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user.clone(),
            state: self.state(),
        }
    }

    fn consume(&mut self, input: &SessionMachineInput) -> SessionResult<()> {
        let old_state = self.state();

        self.fsm.consume(input).map_err(|_| {
            SessionError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                self.fsm.state()
            ))
        })?;

        debug!(
            old_state = ?old_state,
            new_state = ?self.state(),
            "Session state transition"
        );
        Ok(())
    }
}

enum UserUpdate {
    Keep,
    Replace(Option<UserProfile>),
}

/// Settles an in-flight operation back to idle, even if the caller's future
/// is dropped before the library answers.
struct InFlight<'a> {
    session: &'a SessionStateMachine,
    settle: Option<SessionMachineInput>,
}

impl InFlight<'_> {
    fn finish(mut self, update: UserUpdate) -> SessionResult<()> {
        match self.settle.take() {
            Some(input) => self.session.settle(&input, update),
            None => Ok(()),
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(input) = self.settle.take() {
            warn!(input = ?input, "Session operation abandoned before the library answered");
            let _ = self.session.settle(&input, UserUpdate::Keep);
        }
    }
}

/// Tracks a single authenticated session with single-flight sign-in/sign-out.
pub struct SessionStateMachine {
    auth: Arc<dyn AuthInstance>,
    inner: Mutex<SessionInner>,
    subscribers: SubscriberSet<SessionSnapshot>,
}

impl SessionStateMachine {
    /// Create a session over `auth` and start listening for library-pushed
    /// user changes.
    pub fn new(auth: Arc<dyn AuthInstance>) -> Arc<Self> {
        let user = auth.current_user().into_profile();
        let session = Arc::new(Self {
            auth,
            inner: Mutex::new(SessionInner {
                fsm: SessionMachine::new(),
                user,
            }),
            subscribers: SubscriberSet::new(),
        });

        let weak = Arc::downgrade(&session);
        session.auth.listen_current_user(Arc::new(move |user: LibraryUser| {
            if let Some(session) = weak.upgrade() {
                session.on_library_user(user);
            }
        }));

        session
    }

    /// Load the `auth2` module into `library` and build a session over it.
    pub async fn load(library: &LibraryHandle, module_timeout: Duration) -> SessionResult<Arc<Self>> {
        load_modules(library, &[AUTH_MODULE], module_timeout).await?;

        let auth = library
            .auth2()
            .ok_or_else(|| BootstrapError::ModuleMissing(AUTH_MODULE.to_string()))?;

        info!("Auth module loaded");
        Ok(Self::new(auth.auth_instance()))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.inner.lock().user.clone()
    }

    /// Register `callback` for every `(user, state)` change.
    ///
    /// The current pair is replayed synchronously before this returns, ahead
    /// of any change made concurrently on another thread.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SessionSnapshot) + Send + Sync + 'static,
    {
        let callback: Callback<SessionSnapshot> = Arc::new(callback);

        let _delivery = self.subscribers.delivery();
        let (subscription, replay) = {
            let inner = self.inner.lock();
            (self.subscribers.insert(callback.clone()), inner.snapshot())
        };

        callback(&replay);
        subscription
    }

    /// Sign in through the library.
    ///
    /// A second call while signing in is a no-op. Calling while signing out
    /// fails with `SessionBusy`. A user-dismissed prompt is not an error.
    pub async fn sign_in(&self, options: Option<SignInOptions>) -> SessionResult<()> {
        let Some(in_flight) = self.begin(
            SessionMachineInput::SignInRequested,
            SessionMachineInput::SignInSettled,
            "sign in",
        )?
        else {
            warn!("Sign-in already in progress; ignoring duplicate request");
            return Ok(());
        };

        info!("Signing in");
        match self.auth.sign_in(options).await {
            Ok(user) => {
                let profile = user.into_profile();
                let user_id = profile.as_ref().map(|p| p.id.clone());
                in_flight.finish(UserUpdate::Replace(profile))?;
                info!(user_id = ?user_id, "Signed in");
                Ok(())
            }
            Err(failure) if failure.is_user_cancellation() => {
                in_flight.finish(UserUpdate::Keep)?;
                info!("Sign-in cancelled by user");
                Ok(())
            }
            Err(failure) => {
                in_flight.finish(UserUpdate::Keep)?;
                warn!(error = %failure, details = ?failure.details, "Sign-in failed");
                Err(SessionError::SignInError(failure))
            }
        }
    }

    /// Sign out through the library.
    ///
    /// A second call while signing out is a no-op. Calling while signing in
    /// fails with `SessionBusy`.
    pub async fn sign_out(&self) -> SessionResult<()> {
        let Some(in_flight) = self.begin(
            SessionMachineInput::SignOutRequested,
            SessionMachineInput::SignOutSettled,
            "sign out",
        )?
        else {
            warn!("Sign-out already in progress; ignoring duplicate request");
            return Ok(());
        };

        info!("Signing out");
        match self.auth.sign_out().await {
            Ok(()) => {
                in_flight.finish(UserUpdate::Replace(None))?;
                info!("Signed out");
                Ok(())
            }
            Err(failure) => {
                in_flight.finish(UserUpdate::Keep)?;
                warn!(error = %failure, details = ?failure.details, "Sign-out failed");
                Err(SessionError::SignOutError(failure))
            }
        }
    }

    /// Enter an operation's in-flight state.
    ///
    /// Returns `None` if the same operation is already running.
    fn begin(
        &self,
        request: SessionMachineInput,
        settle: SessionMachineInput,
        operation: &'static str,
    ) -> SessionResult<Option<InFlight<'_>>> {
        let target = match request {
            SessionMachineInput::SignOutRequested => SessionState::SigningOut,
            _ => SessionState::SigningIn,
        };

        let started = self.apply(|inner| {
            let current = inner.state();
            if current == target {
                return Ok(false);
            }
            if current.is_busy() {
                debug!(requested = operation, in_flight = %current, "Refusing conflicting session operation");
                return Err(SessionError::SessionBusy {
                    requested: operation,
                    in_flight: current,
                });
            }
            inner.consume(&request)?;
            Ok(true)
        })?;

        Ok(started.then(|| InFlight {
            session: self,
            settle: Some(settle),
        }))
    }

    fn settle(&self, input: &SessionMachineInput, update: UserUpdate) -> SessionResult<()> {
        self.apply(|inner| {
            inner.consume(input)?;
            if let UserUpdate::Replace(user) = update {
                inner.user = user;
            }
            Ok(())
        })
    }

    fn on_library_user(&self, user: LibraryUser) {
        let profile = user.into_profile();
        debug!(
            signed_in = profile.is_some(),
            "Library pushed a current-user change"
        );
        let _ = self.apply(|inner| {
            inner.user = profile;
            Ok(())
        });
    }

    /// Run `change` under the lock and broadcast once if the pair changed.
    ///
    /// `change` must not mutate anything before returning an error.
    fn apply<R>(
        &self,
        change: impl FnOnce(&mut SessionInner) -> SessionResult<R>,
    ) -> SessionResult<R> {
        let _delivery = self.subscribers.delivery();
        let (result, delivery) = {
            let mut inner = self.inner.lock();
            let before = inner.snapshot();
            let result = change(&mut *inner)?;
            let after = inner.snapshot();

            let delivery = (after != before).then(|| (self.subscribers.snapshot(), after));
            (result, delivery)
        };

        if let Some((targets, snapshot)) = delivery {
            debug!(
                state = %snapshot.state,
                signed_in = snapshot.user.is_some(),
                subscribers = targets.len(),
                "Session changed"
            );
            self.subscribers.deliver(targets, &snapshot);
        }
        Ok(result)
    }
}

/// Sessions compare by identity.
impl PartialEq for SessionStateMachine {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for SessionStateMachine {}
