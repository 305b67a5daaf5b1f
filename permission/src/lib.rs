//! Foreground location permission handling.
//!
//! This crate exposes the raw platform permission calls ([`check`] and
//! [`request`]) and the [`PermissionGate`], which asks for location access
//! once per session and collapses every non-grant outcome into
//! [`PermissionState::Denied`].

#![warn(missing_docs)]

use std::future::Future;
use std::sync::Mutex;

use log::{info, warn};

/// Platform-specific implementations.
pub mod sys;

/// Types of permissions that can be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Permission {
    /// Access to device location while the application is in use.
    Location,
}

/// The platform-reported status of a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionStatus {
    /// Permission has been granted by the user.
    Granted,
    /// Permission has been denied by the user.
    Denied,
    /// Permission is restricted (e.g., parental controls).
    Restricted,
    /// Permission has not been requested yet.
    NotDetermined,
}

/// Session-level outcome of the permission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PermissionState {
    /// Access has not been requested in this session.
    #[default]
    Unrequested,
    /// Access was granted.
    Granted,
    /// Access was refused, or the platform could not answer.
    Denied,
}

impl PermissionState {
    /// Returns `true` if location access was granted.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl From<PermissionStatus> for PermissionState {
    fn from(status: PermissionStatus) -> Self {
        match status {
            PermissionStatus::Granted => Self::Granted,
            PermissionStatus::Denied
            | PermissionStatus::Restricted
            | PermissionStatus::NotDetermined => Self::Denied,
        }
    }
}

/// Errors that can occur when requesting permissions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// The permission type is not supported on this platform.
    #[error("permission not supported on this platform")]
    NotSupported,
    /// An unknown error occurred.
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Check the current status of a permission without requesting it.
pub async fn check(permission: Permission) -> PermissionStatus {
    sys::check(permission).await
}

/// Request a permission from the user.
///
/// If the permission has already been granted or denied, this returns
/// the current status without showing a prompt.
///
/// # Errors
/// Returns a `PermissionError` if:
/// - The permission type is not supported on this platform.
/// - An underlying platform error occurs.
pub async fn request(permission: Permission) -> Result<PermissionStatus, PermissionError> {
    sys::request(permission).await
}

/// Source of permission answers for a [`PermissionGate`].
pub trait PermissionPrompt: Send + Sync {
    /// Ask the host for `permission`, possibly showing a user prompt.
    fn request(
        &self,
        permission: Permission,
    ) -> impl Future<Output = Result<PermissionStatus, PermissionError>> + Send;
}

/// Prompt backed by the current platform's permission API.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPrompt;

impl PermissionPrompt for SystemPrompt {
    fn request(
        &self,
        permission: Permission,
    ) -> impl Future<Output = Result<PermissionStatus, PermissionError>> + Send {
        sys::request(permission)
    }
}

/// Requests foreground location access once and remembers the answer.
///
/// The first call to [`request_access`](Self::request_access) prompts through
/// the configured [`PermissionPrompt`]; every later call returns the cached
/// state. A failing platform API counts as a denial.
#[derive(Debug, Default)]
pub struct PermissionGate<P = SystemPrompt> {
    prompt: P,
    state: Mutex<PermissionState>,
}

impl PermissionGate<SystemPrompt> {
    /// Create a gate backed by the platform permission API.
    #[must_use]
    pub fn system() -> Self {
        Self::new(SystemPrompt)
    }
}

impl<P: PermissionPrompt> PermissionGate<P> {
    /// Create a gate that asks `prompt`.
    pub const fn new(prompt: P) -> Self {
        Self {
            prompt,
            state: Mutex::new(PermissionState::Unrequested),
        }
    }

    /// The prompt this gate asks.
    pub const fn prompt(&self) -> &P {
        &self.prompt
    }

    /// The resolved state, without prompting.
    #[must_use]
    pub fn state(&self) -> PermissionState {
        *self.state.lock().expect("permission state mutex poisoned")
    }

    /// Request location access, prompting only if not already resolved.
    pub async fn request_access(&self) -> PermissionState {
        let current = self.state();
        if current != PermissionState::Unrequested {
            return current;
        }

        let resolved = match self.prompt.request(Permission::Location).await {
            Ok(status) => PermissionState::from(status),
            Err(err) => {
                warn!("location permission request failed, treating as denied: {err}");
                PermissionState::Denied
            }
        };

        let mut guard = self.state.lock().expect("permission state mutex poisoned");
        // A concurrent caller may have resolved first; the first answer wins.
        if *guard == PermissionState::Unrequested {
            info!("location permission resolved: {resolved:?}");
            *guard = resolved;
        }
        *guard
    }
}
