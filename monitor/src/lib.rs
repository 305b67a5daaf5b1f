//! Live classification of device locations as authentic or simulated.
//!
//! The [`Detector`] asks for foreground location access once, then a
//! [`LocationMonitor`] subscribes to a location provider and classifies each
//! fix on the platform's mock flag. Every transition produces one immutable
//! [`Snapshot`] handed to a [`StatusProjector`].
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use mockguard_monitor::{ChannelProjector, Detector, StatusView};
//!
//! let (projector, updates) = ChannelProjector::new();
//! let session = Detector::system().start(Arc::new(projector)).await?;
//! while let Some(snapshot) = updates.recv().await {
//!     let view = StatusView::from(&snapshot);
//!     println!("{} {:?}", view.headline, view.coordinates());
//! }
//! ```

#![warn(missing_docs)]

mod detector;
mod error;
mod monitor;
mod projector;
mod status;

pub use detector::{Detector, Session};
pub use error::MonitorError;
pub use monitor::{LocationMonitor, SubscriptionHandle};
pub use projector::{
    ChannelProjector, LogProjector, StatusProjector, StatusReceiver, StatusView, Tone,
};
pub use status::{MonitorEvent, PERMISSION_DENIED_MESSAGE, Snapshot, Status, reduce};

pub use mockguard_location::{LocationError, LocationSample, WatchOptions};
pub use mockguard_permission::PermissionState;
