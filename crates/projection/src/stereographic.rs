//! Stereographic projection, polar or oblique, on an ellipsoid.
//!
//! Polar aspect (central latitude ±90) follows Snyder 21-33 to 21-40 and
//! honours a latitude of true scale. Any other central latitude uses the
//! oblique ellipsoidal form built on conformal latitude (Snyder 21-27 to
//! 21-38), with a scale factor of one at the center.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::ellipsoid::{msfn, phi_from_ts, tsfn, wrap_degrees, wrap_radians, Ellipsoid};
use crate::error::{ProjectionError, Result};
use crate::projector::Projector;

/// Stereographic projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Stereographic {
    /// Longitude of the projection center (degrees)
    pub central_longitude: f64,
    /// Latitude of the projection center (degrees)
    pub central_latitude: f64,
    /// Latitude of true scale for the polar aspect (degrees)
    pub secant_latitude: f64,
    /// Added to projected x (meters)
    pub false_easting: f64,
    /// Added to projected y (meters)
    pub false_northing: f64,
    ellipsoid: Ellipsoid,
    e: f64,
    aspect: Aspect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Aspect {
    /// `rho = t * scale`; south flips signs.
    Polar { south: bool, scale: f64 },
    /// Conformal latitude of the center, and 2 a m1 / cos(chi1).
    Oblique { chi1: f64, scale: f64 },
}

/// Conformal latitude (Snyder 3-1).
fn conformal_latitude(phi: f64, e: f64) -> f64 {
    let e_sin = e * phi.sin();
    2.0 * ((FRAC_PI_4 + 0.5 * phi).tan() * ((1.0 - e_sin) / (1.0 + e_sin)).powf(0.5 * e)).atan()
        - FRAC_PI_2
}

impl Stereographic {
    /// Create a stereographic projection.
    ///
    /// # Arguments
    /// * `ellipsoid` - Reference ellipsoid
    /// * `central_longitude` - Longitude of the center / straight-down meridian
    /// * `central_latitude` - Latitude of the center; ±90 selects the polar aspect
    /// * `secant_latitude` - Latitude of true scale (polar aspect only)
    /// * `false_easting` - Offset added to x (meters)
    /// * `false_northing` - Offset added to y (meters)
    pub fn new(
        ellipsoid: Ellipsoid,
        central_longitude: f64,
        central_latitude: f64,
        secant_latitude: f64,
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

        if !(central_latitude.abs() <= 90.0) {
            return Err(ProjectionError::invalid_parameter(
                "central_latitude",
                format!("{central_latitude} is not in [-90, 90]"),
            ));
        }

        if !(secant_latitude.abs() <= 90.0) {
            return Err(ProjectionError::invalid_parameter(
                "secant_latitude",
                format!("{secant_latitude} is not in [-90, 90]"),
            ));
        }

        if !false_easting.is_finite() || !false_northing.is_finite() {
            return Err(ProjectionError::invalid_parameter(
                "false_easting/false_northing",
                "must be finite",
            ));
        }

        let a = ellipsoid.major_semiaxis;
        let e = ellipsoid.eccentricity();

        let aspect = if central_latitude.abs() == 90.0 {
            let south = central_latitude < 0.0;
            let phi_c = secant_latitude.abs().to_radians();

            let scale = if (phi_c - FRAC_PI_2).abs() < 1e-10 {
                2.0 * a / ((1.0 + e).powf(1.0 + e) * (1.0 - e).powf(1.0 - e)).sqrt()
            } else {
                a * msfn(phi_c, e) / tsfn(phi_c, e)
            };

            Aspect::Polar { south, scale }
        } else {
            let phi1 = central_latitude.to_radians();
            let chi1 = conformal_latitude(phi1, e);
            let scale = 2.0 * a * msfn(phi1, e) / chi1.cos();
            Aspect::Oblique { chi1, scale }
        };

        Ok(Self {
            central_longitude,
            central_latitude,
            secant_latitude,
            false_easting,
            false_northing,
            ellipsoid,
            e,
            aspect,
        })
    }
}

impl Projector for Stereographic {
    fn name(&self) -> &'static str {
        "stereographic"
    }

    fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    fn parameters(&self) -> Vec<f64> {
        vec![
            self.central_longitude,
            self.central_latitude,
            self.secant_latitude,
            self.false_easting,
            self.false_northing,
        ]
    }

    fn project(&self, longitude: f64, latitude: f64) -> (f64, f64) {
        let phi = latitude.to_radians();
        let dlon = wrap_radians((longitude - self.central_longitude).to_radians());

        let (x, y) = match self.aspect {
            Aspect::Polar { south: false, scale } => {
                let rho = scale * tsfn(phi, self.e);
                (rho * dlon.sin(), -rho * dlon.cos())
            }
            Aspect::Polar { south: true, scale } => {
                let rho = scale * tsfn(-phi, self.e);
                (rho * dlon.sin(), rho * dlon.cos())
            }
            Aspect::Oblique { chi1, scale } => {
                let chi = conformal_latitude(phi, self.e);
                let denominator =
                    1.0 + chi1.sin() * chi.sin() + chi1.cos() * chi.cos() * dlon.cos();
                // The antipode of the center has no image.
                let big_a = scale / denominator.max(1e-12);
                (
                    big_a * chi.cos() * dlon.sin(),
                    big_a * (chi1.cos() * chi.sin() - chi1.sin() * chi.cos() * dlon.cos()),
                )
            }
        };

        (x + self.false_easting, y + self.false_northing)
    }

    fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let x = x - self.false_easting;
        let y = y - self.false_northing;
        let rho = x.hypot(y);

        let (dlon, phi) = match self.aspect {
            Aspect::Polar { south: false, scale } => {
                (x.atan2(-y), phi_from_ts(rho / scale, self.e))
            }
            Aspect::Polar { south: true, scale } => {
                (x.atan2(y), -phi_from_ts(rho / scale, self.e))
            }
            Aspect::Oblique { chi1, scale } => {
                if rho == 0.0 {
                    (0.0, self.central_latitude.to_radians())
                } else {
                    let ce = 2.0 * (rho / scale).atan();
                    let chi = (ce.cos() * chi1.sin() + y * ce.sin() * chi1.cos() / rho).asin();
                    let dlon = (x * ce.sin())
                        .atan2(rho * chi1.cos() * ce.cos() - y * chi1.sin() * ce.sin());
                    // chi -> phi is the same fixed point as t -> phi.
                    let ts = (FRAC_PI_4 - 0.5 * chi).tan();
                    (dlon, phi_from_ts(ts, self.e))
                }
            }
        };

        let longitude = self.central_longitude + dlon.to_degrees();
        (wrap_degrees(longitude), phi.to_degrees())
    }

    fn clone_box(&self) -> Box<dyn Projector> {
        Box::new(self.clone())
    }
}
