#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mockguard_location::{
    LocationDelegate, LocationError, LocationEvent, LocationProvider, LocationResult,
    LocationSample, Watch, WatchOptions,
};
use mockguard_monitor::Snapshot;

/// Provider driven by the test: it keeps the delegate even after cancel so
/// late deliveries can be simulated.
#[derive(Default)]
pub struct ManualProvider {
    delegate: Mutex<Option<Arc<dyn LocationDelegate>>>,
    options: Mutex<Option<WatchOptions>>,
    pub watches: AtomicUsize,
    pub cancels: Arc<AtomicUsize>,
    pub refuse: Option<LocationError>,
}

impl ManualProvider {
    pub fn refusing(error: LocationError) -> Self {
        Self {
            refuse: Some(error),
            ..Self::default()
        }
    }

    pub fn emit(&self, event: LocationEvent) {
        let delegate = self.delegate.lock().unwrap().clone();
        if let Some(delegate) = delegate {
            delegate.on_event(event);
        }
    }

    pub fn sample(&self, latitude: f64, longitude: f64, is_simulated: bool) {
        self.emit(LocationEvent::Sample {
            sample: LocationSample::new(latitude, longitude, is_simulated),
        });
    }

    pub fn fail(&self, error: LocationError) {
        self.emit(LocationEvent::Error { error });
    }

    pub fn watch_count(&self) -> usize {
        self.watches.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<WatchOptions> {
        self.options.lock().unwrap().clone()
    }
}

impl LocationProvider for ManualProvider {
    fn watch(
        &self,
        options: &WatchOptions,
        delegate: Arc<dyn LocationDelegate>,
    ) -> LocationResult<Box<dyn Watch>> {
        self.watches.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.refuse {
            return Err(error.clone());
        }
        *self.delegate.lock().unwrap() = Some(delegate);
        *self.options.lock().unwrap() = Some(options.clone());
        Ok(Box::new(CountingWatch {
            cancels: self.cancels.clone(),
        }))
    }
}

#[derive(Debug)]
struct CountingWatch {
    cancels: Arc<AtomicUsize>,
}

impl Watch for CountingWatch {
    fn cancel(&mut self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// Projector that records every snapshot it receives.
#[derive(Default)]
pub struct Recording {
    snapshots: Mutex<Vec<Snapshot>>,
}

impl Recording {
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.snapshots.lock().unwrap().clone()
    }
}

impl mockguard_monitor::StatusProjector for Recording {
    fn project(&self, snapshot: &Snapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }
}
