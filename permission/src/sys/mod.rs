//! Platform-specific permission implementations.

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "windows")]
pub(crate) use windows::{check, request};

#[cfg(target_os = "linux")]
pub(crate) use linux::{check, request};

// Mobile hosts answer the prompt themselves and hand the result to the gate
// through their own `PermissionPrompt`.
#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub(crate) async fn check(_permission: crate::Permission) -> crate::PermissionStatus {
    crate::PermissionStatus::NotDetermined
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub(crate) async fn request(
    _permission: crate::Permission,
) -> Result<crate::PermissionStatus, crate::PermissionError> {
    Err(crate::PermissionError::NotSupported)
}
