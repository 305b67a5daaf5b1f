use std::fmt;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

use crate::{
    DisplacementFilter, LocationDelegate, LocationError, LocationEvent, LocationProvider,
    LocationResult, LocationSample, Watch, WatchOptions,
};

#[derive(Default)]
struct FeedState {
    next_id: u64,
    active: Option<ActiveFeed>,
}

struct ActiveFeed {
    id: u64,
    options: WatchOptions,
    filter: DisplacementFilter,
    delegate: Arc<dyn LocationDelegate>,
}

fn lock(state: &Mutex<FeedState>) -> std::sync::MutexGuard<'_, FeedState> {
    state.lock().expect("feed state mutex poisoned")
}

/// Provider fed by the host application.
///
/// Mobile hosts own the native location subscription (Android
/// `FusedLocationProviderClient`, iOS `CLLocationManager`) and forward each
/// fix, together with the platform's mock flag, through a [`FeedSender`].
/// The host reads the requested policy from [`FeedSender::options`] when it
/// configures its native subscription.
///
/// At most one watch is active at a time. Fixes pushed while nothing is
/// watching are dropped, and so are fixes that moved less than the watch's
/// `min_distance_m` without changing the mock flag.
#[derive(Clone, Default)]
pub struct FeedProvider {
    state: Arc<Mutex<FeedState>>,
}

impl fmt::Debug for FeedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedProvider")
            .field("watched", &lock(&self.state).active.is_some())
            .finish()
    }
}

impl FeedProvider {
    /// Create a provider and the sender the host pushes fixes through.
    #[must_use]
    pub fn new() -> (Self, FeedSender) {
        let provider = Self::default();
        let sender = FeedSender {
            state: provider.state.clone(),
        };
        (provider, sender)
    }
}

impl LocationProvider for FeedProvider {
    fn watch(
        &self,
        options: &WatchOptions,
        delegate: Arc<dyn LocationDelegate>,
    ) -> LocationResult<Box<dyn Watch>> {
        let mut state = lock(&self.state);
        if state.active.is_some() {
            return Err(LocationError::Unknown(
                "feed provider already has an active watch".into(),
            ));
        }

        state.next_id += 1;
        let id = state.next_id;
        state.active = Some(ActiveFeed {
            id,
            options: options.clone(),
            filter: DisplacementFilter::new(options.min_distance_m),
            delegate,
        });
        info!("feed watch {id} started");

        Ok(Box::new(FeedWatch {
            state: self.state.clone(),
            id,
            cancelled: false,
        }))
    }
}

/// Host-side handle for pushing fixes into a [`FeedProvider`].
#[derive(Clone)]
pub struct FeedSender {
    state: Arc<Mutex<FeedState>>,
}

impl fmt::Debug for FeedSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedSender").finish_non_exhaustive()
    }
}

impl FeedSender {
    /// Forward a fix. Returns `true` if it reached the active watch.
    ///
    /// Deliveries are serialized: concurrent pushes reach the delegate one at
    /// a time, in the order they acquired the feed.
    pub fn push(&self, sample: LocationSample) -> bool {
        let mut state = lock(&self.state);
        let Some(active) = state.active.as_mut() else {
            debug!("dropping location fix, no active watch");
            return false;
        };
        if !active.filter.admit(&sample) {
            debug!("skipping fix below displacement threshold");
            return false;
        }
        active.delegate.on_event(LocationEvent::Sample { sample });
        true
    }

    /// Report a native delivery failure. Returns `false` if no watch is active.
    pub fn fail(&self, error: LocationError) -> bool {
        let state = lock(&self.state);
        match &state.active {
            Some(active) => {
                active.delegate.on_event(LocationEvent::Error { error });
                true
            }
            None => {
                debug!("dropping location error, no active watch");
                false
            }
        }
    }

    /// Whether a watch is currently active.
    #[must_use]
    pub fn is_watched(&self) -> bool {
        lock(&self.state).active.is_some()
    }

    /// Options of the active watch, if any.
    #[must_use]
    pub fn options(&self) -> Option<WatchOptions> {
        lock(&self.state)
            .active
            .as_ref()
            .map(|active| active.options.clone())
    }
}

struct FeedWatch {
    state: Arc<Mutex<FeedState>>,
    id: u64,
    cancelled: bool,
}

impl fmt::Debug for FeedWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedWatch")
            .field("id", &self.id)
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

impl Watch for FeedWatch {
    fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;

        let mut state = lock(&self.state);
        if state.active.as_ref().is_some_and(|active| active.id == self.id) {
            state.active = None;
            info!("feed watch {} cancelled", self.id);
        } else {
            warn!("feed watch {} was already replaced", self.id);
        }
    }
}

impl Drop for FeedWatch {
    fn drop(&mut self) {
        self.cancel();
    }
}
