//! The presentation boundary.
//!
//! A [`StatusProjector`] receives every published [`Snapshot`]. It renders or
//! forwards state and never classifies, subscribes or prompts.

use async_channel::{Receiver, Sender, TryRecvError};
use log::{info, warn};
use serde::Serialize;

use crate::{Snapshot, Status};

/// Receives snapshots after every transition.
///
/// Called from the monitor's single-writer section, possibly on a provider
/// thread. Implementations must return quickly and must not call back into
/// the monitor.
pub trait StatusProjector: Send + Sync {
    /// Render or forward `snapshot`.
    fn project(&self, snapshot: &Snapshot);
}

impl<F> StatusProjector for F
where
    F: Fn(&Snapshot) + Send + Sync,
{
    fn project(&self, snapshot: &Snapshot) {
        self(snapshot);
    }
}

/// Visual treatment of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Tone {
    /// Waiting for the first fix.
    Loading,
    /// Authentic location.
    Success,
    /// Simulated location.
    Warning,
    /// Permission refused.
    Error,
}

/// Presentation-ready rendering of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    /// Visual treatment.
    pub tone: Tone,
    /// Status line.
    pub headline: String,
    /// Latitude with six decimals, once a fix has arrived.
    pub latitude: Option<String>,
    /// Longitude with six decimals, once a fix has arrived.
    pub longitude: Option<String>,
    /// Provider failure text, if the last delivery failed.
    pub error: Option<String>,
}

impl StatusView {
    /// `"<latitude> / <longitude>"`, once a fix has arrived.
    #[must_use]
    pub fn coordinates(&self) -> Option<String> {
        match (&self.latitude, &self.longitude) {
            (Some(lat), Some(lon)) => Some(format!("{lat} / {lon}")),
            _ => None,
        }
    }

    /// Serialize for a native UI bridge.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<&Snapshot> for StatusView {
    fn from(snapshot: &Snapshot) -> Self {
        let (tone, headline) = match &snapshot.status {
            Status::Initializing => (Tone::Loading, "Checking GPS...".to_owned()),
            Status::PermissionDenied(message) => (Tone::Error, message.clone()),
            Status::Authentic(_) => (Tone::Success, "Real location detected".to_owned()),
            Status::Simulated(_) => (Tone::Warning, "Location is being simulated".to_owned()),
        };
        let latest = snapshot.latest();

        Self {
            tone,
            headline,
            latitude: latest.map(|s| format!("{:.6}", s.latitude)),
            longitude: latest.map(|s| format!("{:.6}", s.longitude)),
            error: snapshot.error.as_ref().map(ToString::to_string),
        }
    }
}

/// Forwards snapshots to an async consumer.
///
/// The channel holds one snapshot; a newer one replaces any snapshot the
/// consumer has not taken yet.
#[derive(Debug, Clone)]
pub struct ChannelProjector {
    sender: Sender<Snapshot>,
}

impl ChannelProjector {
    /// Create a projector and the receiver it feeds.
    #[must_use]
    pub fn new() -> (Self, StatusReceiver) {
        let (sender, receiver) = async_channel::bounded(1);
        (Self { sender }, StatusReceiver { receiver })
    }
}

impl StatusProjector for ChannelProjector {
    fn project(&self, snapshot: &Snapshot) {
        if let Err(err) = self.sender.force_send(snapshot.clone()) {
            warn!("dropping status snapshot: {err}");
        }
    }
}

/// Receiving side of a [`ChannelProjector`].
#[derive(Debug, Clone)]
pub struct StatusReceiver {
    receiver: Receiver<Snapshot>,
}

impl StatusReceiver {
    /// Wait for the next snapshot. Returns `None` once every projector is gone.
    pub async fn recv(&self) -> Option<Snapshot> {
        self.receiver.recv().await.ok()
    }

    /// Take the pending snapshot without waiting.
    #[must_use]
    pub fn try_recv(&self) -> Option<Snapshot> {
        match self.receiver.try_recv() {
            Ok(snapshot) => Some(snapshot),
            Err(TryRecvError::Empty | TryRecvError::Closed) => None,
        }
    }
}

/// Logs every transition at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProjector;

impl StatusProjector for LogProjector {
    fn project(&self, snapshot: &Snapshot) {
        let view = StatusView::from(snapshot);
        match (view.coordinates(), view.error) {
            (Some(coords), None) => info!("{:?}: {} ({coords})", view.tone, view.headline),
            (Some(coords), Some(err)) => {
                info!("{:?}: {} ({coords}), provider error: {err}", view.tone, view.headline);
            }
            (None, None) => info!("{:?}: {}", view.tone, view.headline),
            (None, Some(err)) => info!("{:?}: {}, provider error: {err}", view.tone, view.headline),
        }
    }
}
