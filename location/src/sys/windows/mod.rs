//! Windows location implementation using the WinRT `Geolocator`.
//!
//! `Geolocator` does not expose a mock flag, so every sample reports
//! `is_simulated = false`.

use windows::Devices::Geolocation::{GeolocationAccessStatus, Geolocator, PositionAccuracy};

use crate::{Accuracy, LocationError, LocationResult, LocationSample, WatchOptions};

// 100 ns ticks between 1601-01-01 and 1970-01-01.
const UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;

fn winrt_error(e: &windows::core::Error) -> LocationError {
    LocationError::Unknown(e.message().to_string())
}

/// A configured `Geolocator`.
#[derive(Debug)]
pub struct Session {
    geolocator: Geolocator,
}

impl Session {
    pub async fn open(options: &WatchOptions) -> LocationResult<Self> {
        // Request access (this also serves as permission check on Windows)
        let access = Geolocator::RequestAccessAsync()
            .and_then(|op| op.get())
            .map_err(|e| winrt_error(&e))?;

        match access {
            GeolocationAccessStatus::Allowed => {}
            GeolocationAccessStatus::Denied => return Err(LocationError::PermissionDenied),
            _ => return Err(LocationError::NotAvailable),
        }

        let geolocator = Geolocator::new().map_err(|e| winrt_error(&e))?;
        let desired = match options.accuracy {
            Accuracy::High => PositionAccuracy::High,
            Accuracy::Low | Accuracy::Balanced => PositionAccuracy::Default,
        };
        geolocator
            .SetDesiredAccuracy(desired)
            .map_err(|e| winrt_error(&e))?;
        geolocator
            .SetMovementThreshold(options.min_distance_m)
            .map_err(|e| winrt_error(&e))?;

        Ok(Self { geolocator })
    }

    pub async fn fix(&self) -> LocationResult<LocationSample> {
        let position = self
            .geolocator
            .GetGeopositionAsync()
            .and_then(|op| op.get())
            .map_err(|e| winrt_error(&e))?;

        let coord = position.Coordinate().map_err(|e| winrt_error(&e))?;
        let pos = coord
            .Point()
            .and_then(|point| point.Position())
            .map_err(|e| winrt_error(&e))?;

        let ticks = coord
            .Timestamp()
            .map_err(|e| winrt_error(&e))?
            .UniversalTime;
        let captured_at = u64::try_from((ticks - UNIX_EPOCH_TICKS) / 10_000).unwrap_or(0);

        Ok(LocationSample {
            latitude: pos.Latitude,
            longitude: pos.Longitude,
            is_simulated: false,
            captured_at,
            altitude: Some(pos.Altitude),
            horizontal_accuracy: coord.Accuracy().ok(),
        })
    }

    #[allow(clippy::unused_async)]
    pub async fn close(self) {}
}
