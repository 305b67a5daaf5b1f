//! # mockguard
//!
//! Detects simulated (mocked) device locations.
//!
//! mockguard asks for foreground location access once, subscribes to the
//! platform location service and classifies every fix as authentic or
//! simulated based on the flag the platform attaches to it. The result is a
//! single status value plus the latest coordinates, ready for any UI.
//!
//! ## Features
//!
//! - `permission`: the foreground location permission gate.
//! - `location`: location samples, the provider seam and platform providers.
//! - `monitor` (default): classification, subscription lifecycle and the
//!   presentation boundary.
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! mockguard = { version = "0.1", features = ["full"] }
//! ```
//!
//! ```ignore
//! use std::sync::Arc;
//! use mockguard::monitor::{Detector, LogProjector};
//!
//! async fn watch() -> Result<(), mockguard::monitor::MonitorError> {
//!     let session = Detector::system().start(Arc::new(LogProjector)).await?;
//!     println!("{:?}", session.view());
//!     Ok(())
//! }
//! ```

#[cfg(feature = "location")]
pub use mockguard_location as location;

#[cfg(feature = "monitor")]
pub use mockguard_monitor as monitor;

#[cfg(feature = "permission")]
pub use mockguard_permission as permission;
