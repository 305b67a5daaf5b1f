mod common;

use std::sync::Arc;

use common::{ManualProvider, Recording};
use mockguard_location::{FeedProvider, LocationError, LocationSample, WatchOptions};
use mockguard_monitor::{
    ChannelProjector, Detector, MonitorError, PERMISSION_DENIED_MESSAGE, Status, Tone,
};
use mockguard_permission::{
    Permission, PermissionError, PermissionGate, PermissionPrompt, PermissionStatus,
};

struct FixedPrompt(Result<PermissionStatus, PermissionError>);

impl PermissionPrompt for FixedPrompt {
    async fn request(&self, _permission: Permission) -> Result<PermissionStatus, PermissionError> {
        self.0.clone()
    }
}

fn gate(answer: Result<PermissionStatus, PermissionError>) -> PermissionGate<FixedPrompt> {
    PermissionGate::new(FixedPrompt(answer))
}

#[tokio::test]
async fn granted_authentic_fix_shows_coordinates() {
    let (provider, feed) = FeedProvider::new();
    let detector = Detector::new(gate(Ok(PermissionStatus::Granted)), provider);
    let (projector, updates) = ChannelProjector::new();

    let session = detector.start(Arc::new(projector)).await.unwrap();
    assert!(session.is_monitoring());
    assert_eq!(updates.recv().await.unwrap().status, Status::Initializing);
    assert_eq!(feed.options(), Some(WatchOptions::default()));

    assert!(feed.push(LocationSample::new(40.0, -3.0, false)));
    let snapshot = updates.recv().await.unwrap();
    assert!(matches!(snapshot.status, Status::Authentic(_)));

    let view = session.view();
    assert_eq!(view.tone, Tone::Success);
    assert_eq!(view.coordinates().as_deref(), Some("40.000000 / -3.000000"));
}

#[tokio::test]
async fn simulated_fix_is_flagged_then_cleared() {
    let (provider, feed) = FeedProvider::new();
    let detector = Detector::new(gate(Ok(PermissionStatus::Granted)), provider);
    let recording = Arc::new(Recording::default());
    let session = detector.start(recording.clone()).await.unwrap();

    feed.push(LocationSample::new(40.0, -3.0, true));
    assert!(matches!(session.snapshot().status, Status::Simulated(_)));
    assert_eq!(session.view().tone, Tone::Warning);

    feed.push(LocationSample::new(40.0, -3.0, false));
    assert!(matches!(session.snapshot().status, Status::Authentic(_)));

    let statuses: Vec<_> = recording
        .snapshots()
        .into_iter()
        .map(|snapshot| snapshot.status)
        .collect();
    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses[0], Status::Initializing);
    assert!(matches!(statuses[1], Status::Simulated(_)));
    assert!(matches!(statuses[2], Status::Authentic(_)));
}

#[tokio::test]
async fn denied_permission_never_starts_the_monitor() {
    let provider = Arc::new(ManualProvider::default());
    let detector = Detector::new(gate(Ok(PermissionStatus::Denied)), provider.clone());
    let recording = Arc::new(Recording::default());

    let session = detector.start(recording.clone()).await.unwrap();
    assert!(!session.is_monitoring());
    assert_eq!(provider.watch_count(), 0);

    let denied = Status::PermissionDenied(PERMISSION_DENIED_MESSAGE.to_owned());
    assert_eq!(session.snapshot().status, denied);
    let view = session.view();
    assert_eq!(view.tone, Tone::Error);
    assert!(view.coordinates().is_none());
    assert_eq!(recording.snapshots().last().unwrap().status, denied);
}

#[tokio::test]
async fn failing_permission_api_counts_as_denied() {
    let provider = Arc::new(ManualProvider::default());
    let detector = Detector::new(
        gate(Err(PermissionError::Unknown("no service".into()))),
        provider.clone(),
    );
    let session = detector.start(Arc::new(Recording::default())).await.unwrap();

    assert!(matches!(session.snapshot().status, Status::PermissionDenied(_)));
    assert_eq!(provider.watch_count(), 0);
}

#[tokio::test]
async fn unavailable_provider_is_reported_distinctly() {
    let provider = ManualProvider::refusing(LocationError::ServiceDisabled);
    let detector = Detector::new(gate(Ok(PermissionStatus::Granted)), provider);
    let recording = Arc::new(Recording::default());

    let err = detector.start(recording.clone()).await.unwrap_err();
    assert_eq!(err, MonitorError::Provider(LocationError::ServiceDisabled));

    let last = recording.snapshots().last().cloned().unwrap();
    assert_eq!(last.status, Status::Initializing);
    assert_eq!(last.error, Some(LocationError::ServiceDisabled));
}

#[tokio::test]
async fn stopping_the_session_releases_the_feed() {
    let (provider, feed) = FeedProvider::new();
    let detector = Detector::new(gate(Ok(PermissionStatus::Granted)), provider);
    let mut session = detector.start(Arc::new(Recording::default())).await.unwrap();
    assert!(feed.is_watched());

    session.stop();
    session.stop();
    assert!(!session.is_monitoring());
    assert!(!feed.is_watched());
    assert!(!feed.push(LocationSample::new(1.0, 1.0, true)));
    assert_eq!(session.snapshot().status, Status::Initializing);
}

#[tokio::test]
async fn permission_is_requested_once_per_detector() {
    let (provider, _feed) = FeedProvider::new();
    let detector = Detector::new(gate(Ok(PermissionStatus::Granted)), provider);
    let mut first = detector.start(Arc::new(Recording::default())).await.unwrap();
    first.stop();

    assert!(detector.gate().state().is_granted());
    let second = detector.start(Arc::new(Recording::default())).await.unwrap();
    assert!(second.is_monitoring());
}
