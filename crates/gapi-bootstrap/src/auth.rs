//! Authentication module surface of the client library.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Error discriminator the library uses when the user closes the sign-in popup.
pub const POPUP_CLOSED_BY_USER: &str = "popup_closed_by_user";

/// Basic profile of an authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// The library's current-user object. It exists even when nobody is signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryUser {
    pub signed_in: bool,
    pub profile: UserProfile,
}

impl LibraryUser {
    pub fn signed_in(profile: UserProfile) -> Self {
        Self {
            signed_in: true,
            profile,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Profile if signed in.
    pub fn into_profile(self) -> Option<UserProfile> {
        self.signed_in.then_some(self.profile)
    }
}

/// Rejection raised by the library's sign-in/sign-out calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{error}")]
pub struct AuthFailure {
    /// Machine-readable discriminator, e.g. `popup_closed_by_user`.
    pub error: String,
    pub details: Option<String>,
}

impl AuthFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// The user dismissed the sign-in prompt.
    pub fn is_user_cancellation(&self) -> bool {
        self.error == POPUP_CLOSED_BY_USER
    }
}

/// Options forwarded to the library's sign-in call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ux_mode: Option<String>,
}

/// Listener for library-pushed current-user changes.
pub type UserListener = Arc<dyn Fn(LibraryUser) + Send + Sync>;

/// The `auth2` module.
pub trait AuthModule: Send + Sync {
    fn auth_instance(&self) -> Arc<dyn AuthInstance>;
}

/// The library's auth instance.
#[async_trait]
pub trait AuthInstance: Send + Sync {
    fn current_user(&self) -> LibraryUser;

    /// Register for current-user changes (sign-in, sign-out, expiry).
    fn listen_current_user(&self, listener: UserListener);

    async fn sign_in(&self, options: Option<SignInOptions>) -> Result<LibraryUser, AuthFailure>;

    async fn sign_out(&self) -> Result<(), AuthFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popup_closed_is_cancellation() {
        assert!(AuthFailure::new(POPUP_CLOSED_BY_USER).is_user_cancellation());
        assert!(!AuthFailure::new("access_denied").is_user_cancellation());
    }

    #[test]
    fn test_signed_out_user_has_no_profile() {
        assert_eq!(LibraryUser::signed_out().into_profile(), None);

        let profile = UserProfile {
            id: "u-1".to_string(),
            ..Default::default()
        };
        assert_eq!(
            LibraryUser::signed_in(profile.clone()).into_profile(),
            Some(profile)
        );
    }

    #[test]
    fn test_sign_in_options_wire_names() {
        let options = SignInOptions {
            ux_mode: Some("popup".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json, serde_json::json!({ "uxMode": "popup" }));
    }
}
