//! Reference ellipsoids and the conformal-latitude helpers shared by the
//! ellipsoidal projections.
//!
//! The helper functions follow Snyder, "Map Projections: A Working Manual"
//! (USGS Professional Paper 1395), equations 7-7, 14-15 and 15-9.

use std::f64::consts::FRAC_PI_2;
use std::f64::consts::FRAC_PI_4;

use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};

/// An oblate ellipsoid of revolution described by its two semi-axes (meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// Equatorial radius (meters)
    pub major_semiaxis: f64,
    /// Polar radius (meters)
    pub minor_semiaxis: f64,
}

impl Ellipsoid {
    /// World Geodetic System 1984.
    pub const WGS84: Ellipsoid = Ellipsoid {
        major_semiaxis: 6378137.0,
        minor_semiaxis: 6356752.314245,
    };

    /// Geodetic Reference System 1980 (also the NAD83 datum).
    pub const GRS80: Ellipsoid = Ellipsoid {
        major_semiaxis: 6378137.0,
        minor_semiaxis: 6356752.31414,
    };

    /// The perfect sphere used by MM5, WRF and CMAQ model grids.
    pub const MM5_SPHERE: Ellipsoid = Ellipsoid {
        major_semiaxis: 6370000.0,
        minor_semiaxis: 6370000.0,
    };

    /// Create an ellipsoid, checking that `major >= minor > 0`.
    pub fn new(major_semiaxis: f64, minor_semiaxis: f64) -> Result<Self> {
        let ellipsoid = Self {
            major_semiaxis,
            minor_semiaxis,
        };

        if ellipsoid.is_valid() {
            Ok(ellipsoid)
        } else {
            Err(ProjectionError::InvalidEllipsoid(format!(
                "major {major_semiaxis} minor {minor_semiaxis}"
            )))
        }
    }

    /// A sphere of the given radius.
    pub fn sphere(radius: f64) -> Result<Self> {
        Self::new(radius, radius)
    }

    /// Both semi-axes finite and positive with `major >= minor`.
    pub fn is_valid(&self) -> bool {
        self.major_semiaxis.is_finite()
            && self.minor_semiaxis.is_finite()
            && self.minor_semiaxis > 0.0
            && self.major_semiaxis >= self.minor_semiaxis
    }

    /// Whether the two semi-axes are identical.
    pub fn is_sphere(&self) -> bool {
        self.major_semiaxis == self.minor_semiaxis
    }

    /// First eccentricity squared.
    pub fn eccentricity_squared(&self) -> f64 {
        let ratio = self.minor_semiaxis / self.major_semiaxis;
        1.0 - ratio * ratio
    }

    /// First eccentricity.
    pub fn eccentricity(&self) -> f64 {
        self.eccentricity_squared().sqrt()
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::MM5_SPHERE
    }
}

/// Snyder's `t` (eq. 15-9): tan(π/4 - φ/2) scaled by the eccentricity term.
pub(crate) fn tsfn(phi: f64, e: f64) -> f64 {
    let e_sin = e * phi.sin();
    (FRAC_PI_4 - 0.5 * phi).tan() / ((1.0 - e_sin) / (1.0 + e_sin)).powf(0.5 * e)
}

/// Snyder's `m` (eq. 14-15): cos φ / sqrt(1 - e² sin² φ).
pub(crate) fn msfn(phi: f64, e: f64) -> f64 {
    let e_sin = e * phi.sin();
    phi.cos() / (1.0 - e_sin * e_sin).sqrt()
}

/// Invert [`tsfn`] by fixed-point iteration (eq. 7-9).
pub(crate) fn phi_from_ts(ts: f64, e: f64) -> f64 {
    const TOLERANCE: f64 = 1e-12;
    const MAXIMUM_ITERATIONS: usize = 15;
    let half_e = 0.5 * e;
    let mut phi = FRAC_PI_2 - 2.0 * ts.atan();

    for _ in 0..MAXIMUM_ITERATIONS {
        let e_sin = e * phi.sin();
        let next = FRAC_PI_2 - 2.0 * (ts * ((1.0 - e_sin) / (1.0 + e_sin)).powf(half_e)).atan();
        let delta = (next - phi).abs();
        phi = next;

        if delta < TOLERANCE {
            break;
        }
    }

    phi
}

/// Wrap a longitude difference in radians into [-π, π].
pub(crate) fn wrap_radians(mut angle: f64) -> f64 {
    use std::f64::consts::PI;

    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Wrap a longitude in degrees into [-180, 180].
pub(crate) fn wrap_degrees(mut longitude: f64) -> f64 {
    while longitude > 180.0 {
        longitude -= 360.0;
    }
    while longitude < -180.0 {
        longitude += 360.0;
    }
    longitude
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_detection() {
        assert!(Ellipsoid::MM5_SPHERE.is_sphere());
        assert!(!Ellipsoid::WGS84.is_sphere());
        assert_eq!(Ellipsoid::MM5_SPHERE.eccentricity(), 0.0);
    }

    #[test]
    fn test_invalid_ellipsoid() {
        assert!(Ellipsoid::new(6356752.0, 6378137.0).is_err());
        assert!(Ellipsoid::new(f64::NAN, 1.0).is_err());
        assert!(Ellipsoid::sphere(0.0).is_err());
    }

    #[test]
    fn test_ts_roundtrip() {
        let e = Ellipsoid::WGS84.eccentricity();
        for degrees in [-80.0_f64, -33.0, 0.0, 12.5, 45.0, 89.0] {
            let phi = degrees.to_radians();
            let back = phi_from_ts(tsfn(phi, e), e);
            assert!((back - phi).abs() < 1e-10, "{} -> {}", phi, back);
        }
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-181.0), 179.0);
        assert!((wrap_radians(4.0) - (4.0 - 2.0 * std::f64::consts::PI)).abs() < 1e-12);
    }
}
