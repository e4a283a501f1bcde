//! Normal-aspect Mercator projection on an ellipsoid (Snyder 7-6, 7-7).
//!
//! Used for tropical domains. Latitudes are clamped just short of the poles
//! so projected y stays finite.

use crate::ellipsoid::{phi_from_ts, tsfn, wrap_degrees, wrap_radians, Ellipsoid};
use crate::error::{ProjectionError, Result};
use crate::projector::Projector;

const LATITUDE_LIMIT: f64 = 89.5;

/// Mercator projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Mercator {
    /// Central meridian (degrees)
    pub central_longitude: f64,
    /// Added to projected x (meters)
    pub false_easting: f64,
    /// Added to projected y (meters)
    pub false_northing: f64,
    ellipsoid: Ellipsoid,
    e: f64,
}

impl Mercator {
    /// Create a Mercator projection about `central_longitude`.
    pub fn new(
        ellipsoid: Ellipsoid,
        central_longitude: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Result<Self> {
        if !ellipsoid.is_valid() {
            return Err(ProjectionError::InvalidEllipsoid(format!("{ellipsoid:?}")));
        }

        if !(central_longitude.abs() <= 180.0) {
            return Err(ProjectionError::invalid_parameter(
                "central_longitude",
                format!("{central_longitude} is not in [-180, 180]"),
            ));
        }

        if !false_easting.is_finite() || !false_northing.is_finite() {
            return Err(ProjectionError::invalid_parameter(
                "false_easting/false_northing",
                "must be finite",
            ));
        }

        Ok(Self {
            central_longitude,
            false_easting,
            false_northing,
            ellipsoid,
            e: ellipsoid.eccentricity(),
        })
    }
}

impl Projector for Mercator {
    fn name(&self) -> &'static str {
        "mercator"
    }

    fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    fn parameters(&self) -> Vec<f64> {
        vec![self.central_longitude, self.false_easting, self.false_northing]
    }

    fn project(&self, longitude: f64, latitude: f64) -> (f64, f64) {
        let a = self.ellipsoid.major_semiaxis;
        let phi = latitude.clamp(-LATITUDE_LIMIT, LATITUDE_LIMIT).to_radians();
        let dlon = wrap_radians((longitude - self.central_longitude).to_radians());

        let x = a * dlon + self.false_easting;
        let y = -a * tsfn(phi, self.e).ln() + self.false_northing;
        (x, y)
    }

    fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let a = self.ellipsoid.major_semiaxis;
        let ts = (-(y - self.false_northing) / a).exp();
        let latitude = phi_from_ts(ts, self.e).to_degrees();
        let longitude = self.central_longitude + ((x - self.false_easting) / a).to_degrees();
        (wrap_degrees(longitude), latitude)
    }

    fn clone_box(&self) -> Box<dyn Projector> {
        Box::new(self.clone())
    }
}
