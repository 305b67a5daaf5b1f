//! Location samples and the provider seam behind them.
//!
//! A [`LocationProvider`] opens a subscription ([`Watch`]) and pushes
//! [`LocationEvent`]s into a [`LocationDelegate`] until the watch is
//! cancelled. Two providers ship with the crate:
//!
//! - [`SystemLocationProvider`] polls the desktop platform (GeoClue2 on
//!   Linux, `Geolocator` on Windows) from a background thread.
//! - [`FeedProvider`] lets a host application forward the fixes its native
//!   location callbacks deliver, including the platform's mock flag.

#![warn(missing_docs)]

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

mod feed;
mod filter;
mod shutdown;
mod system;

/// Platform-specific implementations.
pub mod sys;

pub use feed::{FeedProvider, FeedSender};
pub use filter::{DisplacementFilter, distance_m};
pub use mockguard_permission::{Permission, PermissionStatus};
pub use system::SystemLocationProvider;

/// A single position fix reported by a location provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
    /// Whether the platform flagged this fix as software-injected.
    pub is_simulated: bool,
    /// Capture time as Unix epoch milliseconds.
    pub captured_at: u64,
    /// Altitude in meters above sea level, if available.
    pub altitude: Option<f64>,
    /// Horizontal accuracy in meters, if available.
    pub horizontal_accuracy: Option<f64>,
}

impl LocationSample {
    /// Create a sample captured now, without altitude or accuracy.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, is_simulated: bool) -> Self {
        Self {
            latitude,
            longitude,
            is_simulated,
            captured_at: timestamp_now(),
            altitude: None,
            horizontal_accuracy: None,
        }
    }
}

/// Accuracy tier requested from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Accuracy {
    /// City-level accuracy.
    Low,
    /// Street-level accuracy.
    Balanced,
    /// The best accuracy the device offers.
    #[default]
    High,
}

/// Subscription policy passed to [`LocationProvider::watch`].
///
/// Providers may skip fixes that arrive sooner than `min_interval` or that
/// moved less than `min_distance_m` from the last delivered fix, so
/// consumers must not rely on regular timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchOptions {
    /// Requested accuracy tier.
    pub accuracy: Accuracy,
    /// Minimum time between delivered fixes.
    pub min_interval: Duration,
    /// Minimum displacement in meters between delivered fixes.
    pub min_distance_m: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::High,
            min_interval: Duration::from_millis(5000),
            min_distance_m: 1.0,
        }
    }
}

/// Errors that can occur when accessing location.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum LocationError {
    /// Location permission was not granted.
    #[error("location permission denied")]
    PermissionDenied,
    /// Location services are disabled on the device.
    #[error("location services disabled")]
    ServiceDisabled,
    /// Location request timed out.
    #[error("location request timed out")]
    Timeout,
    /// Location is not available.
    #[error("location not available")]
    NotAvailable,
    /// An unknown error occurred.
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Result alias for location operations.
pub type LocationResult<T> = Result<T, LocationError>;

/// Event delivered by a provider to its delegate.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// A new position fix.
    Sample {
        /// The fix.
        sample: LocationSample,
    },
    /// The provider failed to deliver a fix.
    Error {
        /// What went wrong.
        error: LocationError,
    },
}

/// Receives events from an active watch.
///
/// Providers call `on_event` from their own thread, one event at a time and
/// in the order the platform observed them.
pub trait LocationDelegate: Send + Sync {
    /// Handle a provider event.
    fn on_event(&self, event: LocationEvent);
}

/// An active provider subscription.
pub trait Watch: Send + fmt::Debug {
    /// Release the platform subscription.
    ///
    /// Callers invoke this once; implementations treat repeated calls as
    /// no-ops.
    fn cancel(&mut self);
}

/// A source of continuous location updates.
pub trait LocationProvider: Send + Sync {
    /// Start delivering events to `delegate` under `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be established.
    fn watch(
        &self,
        options: &WatchOptions,
        delegate: Arc<dyn LocationDelegate>,
    ) -> LocationResult<Box<dyn Watch>>;
}

impl<P: LocationProvider + ?Sized> LocationProvider for Arc<P> {
    fn watch(
        &self,
        options: &WatchOptions,
        delegate: Arc<dyn LocationDelegate>,
    ) -> LocationResult<Box<dyn Watch>> {
        (**self).watch(options, delegate)
    }
}

/// One-shot access to the device location.
#[derive(Debug)]
pub struct LocationManager;

impl LocationManager {
    /// Get the current device location.
    ///
    /// This will request location permission if not already granted.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::PermissionDenied`] if access is refused, or
    /// the platform error if no fix could be obtained.
    pub async fn get_location() -> LocationResult<LocationSample> {
        let status = mockguard_permission::request(Permission::Location)
            .await
            .map_err(|e| LocationError::Unknown(e.to_string()))?;

        if status != PermissionStatus::Granted {
            return Err(LocationError::PermissionDenied);
        }

        sys::get_location().await
    }

    /// Get the current location without checking permissions.
    ///
    /// # Errors
    ///
    /// Returns the platform error if no fix could be obtained.
    pub async fn get_location_unchecked() -> LocationResult<LocationSample> {
        sys::get_location().await
    }
}

pub(crate) fn timestamp_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
