//! Lambert Conformal Conic projection.
//!
//! This projection is the usual choice for mid-latitude air-quality and
//! weather model domains (CMAQ, WRF, HRRR). It maps a cone tangent or secant
//! to the Earth's surface onto a flat plane.
//!
//! The projection parameters include:
//! - Standard parallels: lower and upper latitude (equal for a tangent cone)
//! - Central longitude: the meridian parallel to the y axis
//! - Central latitude: the latitude of the projected origin (y = 0)
//! - False easting/northing in meters
//!
//! Formulas are the ellipsoidal ones from Snyder (15-1 to 15-11) and reduce
//! to the spherical case when the ellipsoid is a sphere.

use std::f64::consts::FRAC_PI_2;

use crate::ellipsoid::{msfn, phi_from_ts, tsfn, wrap_degrees, wrap_radians, Ellipsoid};
use crate::error::{ProjectionError, Result};
use crate::projector::Projector;

/// Lambert Conformal Conic projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LambertConformal {
    /// First standard parallel (degrees)
    pub lower_latitude: f64,
    /// Second standard parallel (degrees)
    pub upper_latitude: f64,
    /// Central meridian (degrees)
    pub central_longitude: f64,
    /// Latitude of the projected origin (degrees)
    pub central_latitude: f64,
    /// Added to projected x (meters)
    pub false_easting: f64,
    /// Added to projected y (meters)
    pub false_northing: f64,
    ellipsoid: Ellipsoid,
    /// Eccentricity
    e: f64,
    /// Cone constant (n)
    n: f64,
    /// a * F
    af: f64,
    /// Rho at the central latitude
    rho0: f64,
}

impl LambertConformal {
    /// Create a new Lambert Conformal projection.
    ///
    /// # Arguments
    /// * `ellipsoid` - Reference ellipsoid (a sphere for most model grids)
    /// * `lower_latitude` - First standard parallel (degrees)
    /// * `upper_latitude` - Second standard parallel (degrees)
    /// * `central_longitude` - Central meridian (degrees)
    /// * `central_latitude` - Latitude of the origin (degrees)
    /// * `false_easting` - Offset added to x (meters)
    /// * `false_northing` - Offset added to y (meters)
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ellipsoid: Ellipsoid,
        lower_latitude: f64,
        upper_latitude: f64,
        central_longitude: f64,
        central_latitude: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Result<Self> {
        if !ellipsoid.is_valid() {
            return Err(ProjectionError::InvalidEllipsoid(format!("{ellipsoid:?}")));
        }

        for (param, value) in [
            ("lower_latitude", lower_latitude),
            ("upper_latitude", upper_latitude),
            ("central_latitude", central_latitude),
        ] {
            if !(value.abs() < 90.0) {
                return Err(ProjectionError::invalid_parameter(
                    param,
                    format!("{value} is not in (-90, 90)"),
                ));
            }
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

        if lower_latitude > upper_latitude {
            return Err(ProjectionError::invalid_parameter(
                "lower_latitude",
                "must not exceed upper_latitude",
            ));
        }

        if lower_latitude.signum() != upper_latitude.signum() || lower_latitude == 0.0 {
            return Err(ProjectionError::invalid_parameter(
                "lower_latitude",
                "standard parallels must lie in the same hemisphere, off the equator",
            ));
        }

        let e = ellipsoid.eccentricity();
        let phi1 = lower_latitude.to_radians();
        let phi2 = upper_latitude.to_radians();
        let phi0 = central_latitude.to_radians();

        let m1 = msfn(phi1, e);
        let t1 = tsfn(phi1, e);

        // Cone constant: tangent cone when the parallels coincide.
        let n = if (phi1 - phi2).abs() < 1e-10 {
            phi1.sin()
        } else {
            let m2 = msfn(phi2, e);
            let t2 = tsfn(phi2, e);
            (m1.ln() - m2.ln()) / (t1.ln() - t2.ln())
        };

        let f = m1 / (n * t1.powf(n));
        let af = ellipsoid.major_semiaxis * f;
        let rho0 = af * tsfn(phi0, e).powf(n);

        Ok(Self {
            lower_latitude,
            upper_latitude,
            central_longitude,
            central_latitude,
            false_easting,
            false_northing,
            ellipsoid,
            e,
            n,
            af,
            rho0,
        })
    }

    /// HRRR CONUS domain projection: tangent at 38.5°N, LoV 97.5°W, on the
    /// 6371229 m sphere used by NCEP.
    pub fn hrrr() -> Result<Self> {
        Self::new(
            Ellipsoid::sphere(6371229.0)?,
            38.5,   // latin1
            38.5,   // latin2
            -97.5,  // LoV (262.5 - 360)
            38.5,   // origin latitude
            0.0,
            0.0,
        )
    }

    /// Cone constant.
    pub fn cone_constant(&self) -> f64 {
        self.n
    }
}

impl Projector for LambertConformal {
    fn name(&self) -> &'static str {
        "lambert"
    }

    fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    fn parameters(&self) -> Vec<f64> {
        vec![
            self.lower_latitude,
            self.upper_latitude,
            self.central_longitude,
            self.central_latitude,
            self.false_easting,
            self.false_northing,
        ]
    }

    fn project(&self, longitude: f64, latitude: f64) -> (f64, f64) {
        // Keep the pole opposite the cone apex finite.
        let limit = 89.999_999;
        let latitude = latitude.clamp(-limit, limit);
        let phi = latitude.to_radians();
        let dlon = wrap_radians((longitude - self.central_longitude).to_radians());

        let rho = self.af * tsfn(phi, self.e).powf(self.n);
        let theta = self.n * dlon;

        let x = rho * theta.sin() + self.false_easting;
        let y = self.rho0 - rho * theta.cos() + self.false_northing;
        (x, y)
    }

    fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let x = x - self.false_easting;
        let dy = self.rho0 - (y - self.false_northing);
        let sign = self.n.signum();

        let rho = sign * x.hypot(dy);
        let theta = (sign * x).atan2(sign * dy);

        let latitude = if rho == 0.0 {
            sign * FRAC_PI_2
        } else {
            let ts = (rho / self.af).powf(1.0 / self.n);
            phi_from_ts(ts, self.e)
        };

        let longitude = self.central_longitude + (theta / self.n).to_degrees();
        (wrap_degrees(longitude), latitude.to_degrees())
    }

    fn clone_box(&self) -> Box<dyn Projector> {
        Box::new(self.clone())
    }
}
