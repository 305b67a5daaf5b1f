//! Desktop test binary for mockguard-monitor.
//!
//! Run with: cargo run -p mockguard-monitor-test

use std::sync::Arc;

use mockguard_location::{SystemLocationProvider, WatchOptions};
use mockguard_monitor::{ChannelProjector, Detector, StatusView};
use mockguard_permission::{Permission, PermissionGate};

const UPDATES: usize = 5;

#[tokio::main]
async fn main() {
    println!("=== mockguard Monitor Test ===\n");

    if !SystemLocationProvider::is_supported() {
        println!("No built-in location backend on this platform.");
        return;
    }

    let status = mockguard_permission::check(Permission::Location).await;
    println!("Permission status: {status:?}\n");

    let options = WatchOptions::default();
    println!("Watch policy: {options:?}\n");

    let detector = Detector::new(PermissionGate::system(), SystemLocationProvider::new())
        .with_options(options);
    let (projector, updates) = ChannelProjector::new();

    let mut session = match detector.start(Arc::new(projector)).await {
        Ok(session) => session,
        Err(e) => {
            println!("✗ Failed to start monitoring: {e}");
            return;
        }
    };

    if !session.is_monitoring() {
        println!("✗ {}", session.view().headline);
        return;
    }

    for _ in 0..UPDATES {
        let Some(snapshot) = updates.recv().await else {
            break;
        };
        print_view(&StatusView::from(&snapshot));
    }

    session.stop();
    println!("\nMonitoring stopped.");
}

fn print_view(view: &StatusView) {
    println!("[{:?}] {}", view.tone, view.headline);
    if let (Some(lat), Some(lon)) = (&view.latitude, &view.longitude) {
        println!("  Latitude:  {lat}");
        println!("  Longitude: {lon}");
    }
    if let Some(err) = &view.error {
        println!("  Error: {err}");
    }
}
