use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};
use mockguard_location::{LocationDelegate, LocationEvent, LocationProvider, Watch, WatchOptions};
use mockguard_permission::PermissionState;

use crate::{MonitorError, MonitorEvent, Snapshot, StatusProjector, reduce};

struct MonitorState {
    snapshot: Snapshot,
    // Id of the subscription allowed to write; `None` once stopped.
    active: Option<u64>,
    next_id: u64,
}

struct MonitorCore {
    state: Mutex<MonitorState>,
    projector: Arc<dyn StatusProjector>,
}

impl MonitorCore {
    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().expect("monitor state mutex poisoned")
    }

    fn apply(state: &mut MonitorState, projector: &dyn StatusProjector, event: MonitorEvent) {
        let next = reduce(&state.snapshot, event);
        if next != state.snapshot {
            state.snapshot = next;
            projector.project(&state.snapshot);
        }
    }
}

/// Owns the location subscription and the published [`Snapshot`].
///
/// Every write goes through one mutex: provider callbacks, permission
/// resolution and [`SubscriptionHandle::stop`]. The projector runs inside that
/// section, so it sees transitions one at a time and in order, and it must not
/// call back into the monitor.
///
/// Fixes only reach the snapshot through the monitor's own subscription:
///
/// ```compile_fail
/// use std::sync::Arc;
/// use mockguard_monitor::{LocationMonitor, LocationSample, LogProjector, MonitorEvent};
///
/// let monitor = LocationMonitor::new(Arc::new(LogProjector));
/// monitor.apply(MonitorEvent::Sample(LocationSample::new(1.0, 2.0, true)));
/// ```
#[derive(Clone)]
pub struct LocationMonitor {
    core: Arc<MonitorCore>,
}

impl fmt::Debug for LocationMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationMonitor").finish_non_exhaustive()
    }
}

impl LocationMonitor {
    /// Create a monitor in the `Initializing` state publishing to `projector`.
    pub fn new(projector: Arc<dyn StatusProjector>) -> Self {
        Self {
            core: Arc::new(MonitorCore {
                state: Mutex::new(MonitorState {
                    snapshot: Snapshot::default(),
                    active: None,
                    next_id: 0,
                }),
                projector,
            }),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.core.lock().snapshot.clone()
    }

    /// Whether a subscription is currently active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.core.lock().active.is_some()
    }

    /// Publish the current snapshot without changing it.
    pub fn publish(&self) {
        let state = self.core.lock();
        self.core.projector.project(&state.snapshot);
    }

    /// Feed an event through the reducer outside of any subscription.
    ///
    /// Used for permission resolution and subscription failures.
    pub(crate) fn apply(&self, event: MonitorEvent) {
        let mut state = self.core.lock();
        MonitorCore::apply(&mut state, self.core.projector.as_ref(), event);
    }

    /// Subscribe to `provider` and classify every fix it delivers.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::PermissionRequired`] if `permission` is still unrequested.
    /// - [`MonitorError::PermissionDenied`] if access was refused. The snapshot
    ///   moves to `PermissionDenied` and stays there.
    /// - [`MonitorError::AlreadyStarted`] if a subscription is active.
    /// - [`MonitorError::Provider`] if the subscription cannot be established.
    pub fn start<P: LocationProvider + ?Sized>(
        &self,
        permission: PermissionState,
        provider: &P,
        options: &WatchOptions,
    ) -> Result<SubscriptionHandle, MonitorError> {
        let id = {
            let mut state = self.core.lock();
            if state.snapshot.status.is_terminal() {
                return Err(MonitorError::PermissionDenied);
            }
            match permission {
                PermissionState::Granted => {}
                PermissionState::Denied => {
                    MonitorCore::apply(
                        &mut state,
                        self.core.projector.as_ref(),
                        MonitorEvent::PermissionResolved(PermissionState::Denied),
                    );
                    return Err(MonitorError::PermissionDenied);
                }
                PermissionState::Unrequested => return Err(MonitorError::PermissionRequired),
            }
            if state.active.is_some() {
                return Err(MonitorError::AlreadyStarted);
            }
            state.next_id += 1;
            state.active = Some(state.next_id);
            state.next_id
        };

        let delegate = Arc::new(MonitorDelegate {
            core: self.core.clone(),
            id,
        });
        match provider.watch(options, delegate) {
            Ok(watch) => {
                info!("location monitor {id} started: {options:?}");
                Ok(SubscriptionHandle {
                    core: self.core.clone(),
                    id,
                    watch: Some(watch),
                })
            }
            Err(err) => {
                warn!("location monitor {id} failed to subscribe: {err}");
                self.core.lock().active = None;
                Err(MonitorError::Provider(err))
            }
        }
    }
}

struct MonitorDelegate {
    core: Arc<MonitorCore>,
    id: u64,
}

impl LocationDelegate for MonitorDelegate {
    fn on_event(&self, event: LocationEvent) {
        let mut state = self.core.lock();
        if state.active != Some(self.id) {
            debug!("dropping location event for stopped monitor {}", self.id);
            return;
        }

        let event = match event {
            LocationEvent::Sample { sample } => {
                debug!(
                    "fix {:.6}, {:.6} simulated={}",
                    sample.latitude, sample.longitude, sample.is_simulated
                );
                MonitorEvent::Sample(sample)
            }
            LocationEvent::Error { error } => {
                warn!("location provider error, staying subscribed: {error}");
                MonitorEvent::ProviderError(error)
            }
        };
        MonitorCore::apply(&mut state, self.core.projector.as_ref(), event);
    }
}

/// Exclusive owner of an active provider subscription.
///
/// The subscription is released exactly once, by [`stop`](Self::stop) or on
/// drop. After `stop` returns, no provider callback can change the monitor's
/// snapshot.
pub struct SubscriptionHandle {
    core: Arc<MonitorCore>,
    id: u64,
    watch: Option<Box<dyn Watch>>,
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("watch", &self.watch)
            .finish()
    }
}

impl SubscriptionHandle {
    /// Whether the subscription is still held.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.watch.is_some()
    }

    /// Stop monitoring. Calling this again is a no-op.
    pub fn stop(&mut self) {
        let Some(mut watch) = self.watch.take() else {
            return;
        };

        {
            let mut state = self.core.lock();
            if state.active == Some(self.id) {
                state.active = None;
            }
        }
        // Cancelled outside the monitor lock: providers may hold their own
        // lock while calling into the delegate.
        watch.cancel();
        info!("location monitor {} stopped", self.id);
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
