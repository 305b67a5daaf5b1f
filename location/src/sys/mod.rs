//! Platform-specific location implementations.
//!
//! Each platform exposes a `Session`: a started platform client that can be
//! asked for fixes repeatedly and closed once.

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "windows")]
pub(crate) use windows::Session;

#[cfg(target_os = "linux")]
pub(crate) use linux::Session;

/// Whether this platform has a built-in location backend.
pub const SUPPORTED: bool = cfg!(any(target_os = "windows", target_os = "linux"));

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
mod fallback {
    use crate::{LocationError, LocationResult, LocationSample, WatchOptions};

    #[derive(Debug)]
    pub struct Session;

    impl Session {
        pub async fn open(_options: &WatchOptions) -> LocationResult<Self> {
            Err(LocationError::NotAvailable)
        }

        pub async fn fix(&self) -> LocationResult<LocationSample> {
            Err(LocationError::NotAvailable)
        }

        pub async fn close(self) {}
    }
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub(crate) use fallback::Session;

/// Take a single fix with the default policy.
pub(crate) async fn get_location() -> crate::LocationResult<crate::LocationSample> {
    let session = Session::open(&crate::WatchOptions::default()).await?;
    let fix = session.fix().await;
    session.close().await;
    fix
}
