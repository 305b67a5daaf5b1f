use std::sync::Arc;

use log::info;
use mockguard_location::{LocationProvider, SystemLocationProvider, WatchOptions};
use mockguard_permission::{PermissionGate, PermissionPrompt, PermissionState, SystemPrompt};

use crate::{
    LocationMonitor, MonitorError, MonitorEvent, Snapshot, StatusProjector, StatusView,
    SubscriptionHandle,
};

/// Wires the permission gate to the location monitor.
#[derive(Debug)]
pub struct Detector<G = SystemPrompt, P = SystemLocationProvider> {
    gate: PermissionGate<G>,
    provider: P,
    options: WatchOptions,
}

impl Detector {
    /// Detector using the platform permission API and location service.
    #[must_use]
    pub fn system() -> Self {
        Self::new(PermissionGate::system(), SystemLocationProvider::new())
    }
}

impl<G: PermissionPrompt, P: LocationProvider> Detector<G, P> {
    /// Create a detector with the default watch policy.
    pub fn new(gate: PermissionGate<G>, provider: P) -> Self {
        Self {
            gate,
            provider,
            options: WatchOptions::default(),
        }
    }

    /// Override the watch policy.
    #[must_use]
    pub fn with_options(mut self, options: WatchOptions) -> Self {
        self.options = options;
        self
    }

    /// The permission gate.
    pub const fn gate(&self) -> &PermissionGate<G> {
        &self.gate
    }

    /// Request access and, if granted, start monitoring.
    ///
    /// `projector` first receives the `Initializing` snapshot, then every
    /// transition. A denial yields a session that stays in
    /// `PermissionDenied` and never subscribes.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Provider`] if the subscription cannot be
    /// established; the failure is also published to `projector`.
    pub async fn start(&self, projector: Arc<dyn StatusProjector>) -> Result<Session, MonitorError> {
        let monitor = LocationMonitor::new(projector);
        monitor.publish();

        let permission = self.gate.request_access().await;
        monitor.apply(MonitorEvent::PermissionResolved(permission));
        if permission != PermissionState::Granted {
            info!("location monitoring not started: {permission:?}");
            return Ok(Session {
                monitor,
                subscription: None,
            });
        }

        match monitor.start(permission, &self.provider, &self.options) {
            Ok(subscription) => Ok(Session {
                monitor,
                subscription: Some(subscription),
            }),
            Err(MonitorError::Provider(error)) => {
                monitor.apply(MonitorEvent::ProviderError(error.clone()));
                Err(MonitorError::Provider(error))
            }
            Err(other) => Err(other),
        }
    }
}

/// A running (or denied) detection session.
///
/// Dropping the session stops monitoring.
#[derive(Debug)]
pub struct Session {
    monitor: LocationMonitor,
    subscription: Option<SubscriptionHandle>,
}

impl Session {
    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.monitor.snapshot()
    }

    /// The current snapshot rendered for presentation.
    #[must_use]
    pub fn view(&self) -> StatusView {
        StatusView::from(&self.monitor.snapshot())
    }

    /// Whether the location subscription is active.
    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(SubscriptionHandle::is_active)
    }

    /// Stop monitoring. Calling this again is a no-op.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.as_mut() {
            subscription.stop();
        }
    }
}
