use std::sync::Arc;
use std::thread;

use log::{debug, error, info};

use crate::shutdown::{ShutdownHandle, ShutdownReceiver};
use crate::{
    DisplacementFilter, LocationDelegate, LocationError, LocationEvent, LocationProvider,
    LocationResult, LocationSample, Watch, WatchOptions, sys,
};

/// Provider backed by the desktop platform's location service.
///
/// Each watch runs on its own thread: it opens a platform session, takes a fix
/// every `min_interval`, drops fixes that moved less than `min_distance_m`,
/// and reports failures as [`LocationEvent::Error`] without giving up. A failed
/// fix other than "no fix yet" closes the session and the next poll reopens
/// it. The thread exits once the watch is cancelled or dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLocationProvider;

impl SystemLocationProvider {
    /// Create a provider for the current platform.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Whether this platform has a built-in location backend.
    #[must_use]
    pub const fn is_supported() -> bool {
        sys::SUPPORTED
    }
}

impl LocationProvider for SystemLocationProvider {
    fn watch(
        &self,
        options: &WatchOptions,
        delegate: Arc<dyn LocationDelegate>,
    ) -> LocationResult<Box<dyn Watch>> {
        if !Self::is_supported() {
            return Err(LocationError::NotAvailable);
        }

        let (shutdown, receiver) = ShutdownHandle::new();
        let options = options.clone();
        thread::Builder::new()
            .name("mockguard-location".into())
            .spawn(move || {
                futures::executor::block_on(poll_fixes(Platform, options, delegate, receiver));
            })
            .map_err(|e| LocationError::Unknown(format!("failed to spawn location thread: {e}")))?;

        info!("system location watch started");
        Ok(Box::new(PollingWatch { shutdown }))
    }
}

#[derive(Debug)]
struct PollingWatch {
    shutdown: ShutdownHandle,
}

impl Watch for PollingWatch {
    fn cancel(&mut self) {
        if self.shutdown.shutdown() {
            info!("system location watch cancelled");
        }
    }
}

/// Opens and drives the sessions a polling watch takes fixes from.
trait SessionSource {
    type Session;

    async fn open(&self, options: &WatchOptions) -> LocationResult<Self::Session>;
    async fn fix(&self, session: &Self::Session) -> LocationResult<LocationSample>;
    async fn close(&self, session: Self::Session);
}

/// The current platform's backend in [`sys`].
struct Platform;

impl SessionSource for Platform {
    type Session = sys::Session;

    async fn open(&self, options: &WatchOptions) -> LocationResult<sys::Session> {
        sys::Session::open(options).await
    }

    async fn fix(&self, session: &sys::Session) -> LocationResult<LocationSample> {
        session.fix().await
    }

    async fn close(&self, session: sys::Session) {
        session.close().await;
    }
}

async fn poll_fixes<S: SessionSource>(
    source: S,
    options: WatchOptions,
    delegate: Arc<dyn LocationDelegate>,
    shutdown: ShutdownReceiver,
) {
    let mut filter = DisplacementFilter::new(options.min_distance_m);
    let mut session: Option<S::Session> = None;

    while !shutdown.is_shutdown() {
        if session.is_none() {
            match source.open(&options).await {
                Ok(opened) => session = Some(opened),
                Err(err) => report(delegate.as_ref(), &shutdown, err),
            }
        }

        if let Some(active) = &session {
            let fix = source.fix(active).await;
            match fix {
                Ok(sample) if filter.admit(&sample) => {
                    if !shutdown.is_shutdown() {
                        delegate.on_event(LocationEvent::Sample { sample });
                    }
                }
                Ok(_) => debug!("skipping fix below displacement threshold"),
                Err(LocationError::NotAvailable) => {
                    report(delegate.as_ref(), &shutdown, LocationError::NotAvailable);
                }
                Err(err) => {
                    report(delegate.as_ref(), &shutdown, err);
                    if let Some(stale) = session.take() {
                        source.close(stale).await;
                    }
                }
            }
        }

        if !shutdown.sleep(options.min_interval).await {
            break;
        }
    }

    if let Some(active) = session {
        source.close(active).await;
    }
    debug!("system location thread exiting");
}

fn report(delegate: &dyn LocationDelegate, shutdown: &ShutdownReceiver, error: LocationError) {
    if shutdown.is_shutdown() {
        return;
    }
    error!("location provider failure: {error}");
    delegate.on_event(LocationEvent::Error { error });
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use super::*;

    /// Replays a fixed list of fix results, then repeats the last fix.
    #[derive(Default)]
    struct Scripted {
        fixes: Mutex<VecDeque<LocationResult<LocationSample>>>,
        last: Mutex<Option<LocationSample>>,
        opens: AtomicUsize,
        closes: AtomicUsize,
    }

    impl Scripted {
        fn new(fixes: Vec<LocationResult<LocationSample>>) -> Arc<Self> {
            Arc::new(Self {
                fixes: Mutex::new(fixes.into()),
                ..Self::default()
            })
        }
    }

    impl SessionSource for Arc<Scripted> {
        type Session = usize;

        async fn open(&self, _options: &WatchOptions) -> LocationResult<usize> {
            Ok(self.opens.fetch_add(1, Ordering::SeqCst) + 1)
        }

        async fn fix(&self, _session: &usize) -> LocationResult<LocationSample> {
            let next = self.fixes.lock().unwrap().pop_front();
            match next {
                Some(Ok(sample)) => {
                    *self.last.lock().unwrap() = Some(sample.clone());
                    Ok(sample)
                }
                Some(Err(error)) => Err(error),
                None => self
                    .last
                    .lock()
                    .unwrap()
                    .clone()
                    .ok_or(LocationError::NotAvailable),
            }
        }

        async fn close(&self, _session: usize) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<LocationEvent>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<LocationEvent> {
            self.events.lock().unwrap().clone()
        }

        fn wait_for(&self, count: usize) {
            let deadline = Instant::now() + Duration::from_secs(5);
            while self.events.lock().unwrap().len() < count {
                assert!(Instant::now() < deadline, "timed out waiting for {count} events");
                thread::sleep(Duration::from_millis(5));
            }
        }
    }

    impl LocationDelegate for Recorder {
        fn on_event(&self, event: LocationEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn fast() -> WatchOptions {
        WatchOptions {
            min_interval: Duration::from_millis(5),
            ..WatchOptions::default()
        }
    }

    fn spawn(
        source: Arc<Scripted>,
        recorder: Arc<Recorder>,
    ) -> (ShutdownHandle, thread::JoinHandle<()>) {
        let (handle, receiver) = ShutdownHandle::new();
        let worker = thread::spawn(move || {
            futures::executor::block_on(poll_fixes(source, fast(), recorder, receiver));
        });
        (handle, worker)
    }

    #[test]
    fn failures_are_reported_and_polling_continues() {
        let first = LocationSample::new(40.0, -3.0, false);
        let second = LocationSample::new(40.001, -3.0, false);
        let source = Scripted::new(vec![
            Err(LocationError::NotAvailable),
            Ok(first.clone()),
            Err(LocationError::Unknown("connection closed".into())),
            Ok(second.clone()),
        ]);
        let recorder = Arc::new(Recorder::default());
        let (handle, worker) = spawn(source.clone(), recorder.clone());

        recorder.wait_for(4);
        assert_eq!(
            recorder.events(),
            vec![
                LocationEvent::Error {
                    error: LocationError::NotAvailable
                },
                LocationEvent::Sample { sample: first },
                LocationEvent::Error {
                    error: LocationError::Unknown("connection closed".into())
                },
                LocationEvent::Sample { sample: second },
            ]
        );
        // "No fix yet" keeps the session; any other failure reopens it.
        assert_eq!(source.opens.load(Ordering::SeqCst), 2);
        assert_eq!(source.closes.load(Ordering::SeqCst), 1);

        handle.shutdown();
        worker.join().unwrap();
        assert_eq!(source.closes.load(Ordering::SeqCst), 2);
        assert_eq!(recorder.events().len(), 4);
    }

    #[test]
    fn cancel_stops_delivery_and_closes_the_session() {
        let fixes = (0..1000)
            .map(|i| Ok(LocationSample::new(40.0 + f64::from(i) * 0.001, -3.0, false)))
            .collect();
        let source = Scripted::new(fixes);
        let recorder = Arc::new(Recorder::default());
        let (handle, worker) = spawn(source.clone(), recorder.clone());

        recorder.wait_for(2);
        handle.shutdown();
        worker.join().unwrap();
        let delivered = recorder.events().len();

        thread::sleep(Duration::from_millis(30));
        assert_eq!(recorder.events().len(), delivered);
        assert!(delivered < 1000);
        assert_eq!(source.opens.load(Ordering::SeqCst), 1);
        assert_eq!(source.closes.load(Ordering::SeqCst), 1);
    }
}
