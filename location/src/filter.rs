use crate::LocationSample;

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance in meters between two fixes (haversine).
#[must_use]
pub fn distance_m(a: &LocationSample, b: &LocationSample) -> f64 {
    let (lat_a, lat_b) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = lat_b - lat_a;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Drops fixes that moved less than a minimum distance from the last one let through.
///
/// A fix whose mock flag differs from the last one always passes, so a switch
/// between simulated and real positions is never hidden by a standstill.
#[derive(Debug, Clone)]
pub struct DisplacementFilter {
    min_distance_m: f64,
    last: Option<LocationSample>,
}

impl DisplacementFilter {
    /// Create a filter with the given threshold in meters.
    #[must_use]
    pub const fn new(min_distance_m: f64) -> Self {
        Self {
            min_distance_m,
            last: None,
        }
    }

    /// Returns `true` and remembers `sample` if it should be delivered.
    ///
    /// The first fix always passes.
    pub fn admit(&mut self, sample: &LocationSample) -> bool {
        let admitted = self.last.as_ref().is_none_or(|last| {
            last.is_simulated != sample.is_simulated
                || distance_m(last, sample) >= self.min_distance_m
        });
        if admitted {
            self.last = Some(sample.clone());
        }
        admitted
    }
}
