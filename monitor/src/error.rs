use mockguard_location::LocationError;
use thiserror::Error;

/// Errors that can occur when starting location monitoring.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    /// Monitoring was started before location access was granted.
    #[error("location permission has not been requested")]
    PermissionRequired,

    /// Location access was refused; monitoring never starts.
    #[error("location permission denied")]
    PermissionDenied,

    /// The monitor already owns an active subscription.
    #[error("location monitor is already running")]
    AlreadyStarted,

    /// The provider could not establish the subscription.
    #[error("location provider unavailable: {0}")]
    Provider(#[from] LocationError),
}
