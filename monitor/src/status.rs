//! The status model and its reducer.
//!
//! All state a presentation layer sees is one [`Snapshot`], replaced as a
//! whole by [`reduce`] for every [`MonitorEvent`].

use mockguard_location::{LocationError, LocationSample};
use mockguard_permission::PermissionState;
use serde::{Deserialize, Serialize};

/// Message carried by [`Status::PermissionDenied`].
pub const PERMISSION_DENIED_MESSAGE: &str = "Permission to access location was denied";

/// Classification state of the monitored device location.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Status {
    /// No fix has arrived yet and permission was not refused.
    #[default]
    Initializing,
    /// Location access was refused. Terminal.
    PermissionDenied(String),
    /// The latest fix came from the device's sensors.
    Authentic(LocationSample),
    /// The latest fix was flagged as software-injected.
    Simulated(LocationSample),
}

impl Status {
    /// Classify a single fix on its own mock flag.
    #[must_use]
    pub fn classify(sample: LocationSample) -> Self {
        if sample.is_simulated {
            Self::Simulated(sample)
        } else {
            Self::Authentic(sample)
        }
    }

    /// The retained fix, if one has arrived.
    #[must_use]
    pub const fn sample(&self) -> Option<&LocationSample> {
        match self {
            Self::Authentic(sample) | Self::Simulated(sample) => Some(sample),
            Self::Initializing | Self::PermissionDenied(_) => None,
        }
    }

    /// Whether no further event can change this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

/// Everything published to the presentation layer after a transition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current classification.
    pub status: Status,
    /// Last provider failure, cleared by the next fix.
    pub error: Option<LocationError>,
}

impl Snapshot {
    /// The retained fix, if one has arrived.
    #[must_use]
    pub const fn latest(&self) -> Option<&LocationSample> {
        self.status.sample()
    }
}

/// Input to [`reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// The permission gate resolved.
    PermissionResolved(PermissionState),
    /// The provider delivered a fix.
    Sample(LocationSample),
    /// The provider failed to deliver a fix.
    ProviderError(LocationError),
}

/// Compute the snapshot that follows `current` after `event`.
///
/// A fix replaces the previous one and is classified on its own flag, with no
/// smoothing across fixes. A denial is terminal: every later event leaves the
/// snapshot unchanged. Provider errors only touch [`Snapshot::error`].
#[must_use]
pub fn reduce(current: &Snapshot, event: MonitorEvent) -> Snapshot {
    if current.status.is_terminal() {
        return current.clone();
    }

    match event {
        MonitorEvent::PermissionResolved(PermissionState::Denied) => Snapshot {
            status: Status::PermissionDenied(PERMISSION_DENIED_MESSAGE.to_owned()),
            error: None,
        },
        MonitorEvent::PermissionResolved(_) => current.clone(),
        MonitorEvent::Sample(sample) => Snapshot {
            status: Status::classify(sample),
            error: None,
        },
        MonitorEvent::ProviderError(error) => Snapshot {
            status: current.status.clone(),
            error: Some(error),
        },
    }
}
