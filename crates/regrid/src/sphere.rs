//! Latitude correction between the GRS80/WGS84 spheroid and a perfect
//! sphere.
//!
//! Input samples are referenced to the WGS84/GRS80/NAD83 spheroid while most
//! model grids are defined on a sphere. A spheroidal (geodetic) latitude is
//! mapped to the sphere as the geocentric latitude of the same point,
//! `tan(φc) = (1 - e²) tan(φ)`, which keeps the direction from the Earth's
//! center fixed. The inverse is exact.

use projection::Ellipsoid;

/// Convert a geodetic latitude (degrees) to the matching spherical latitude.
pub fn spheroid_to_sphere(latitude: f64) -> f64 {
    if latitude.abs() >= 90.0 || !latitude.is_finite() {
        return latitude;
    }

    let factor = 1.0 - Ellipsoid::GRS80.eccentricity_squared();
    (factor * latitude.to_radians().tan()).atan().to_degrees()
}

/// Convert a spherical latitude (degrees) back to geodetic latitude.
pub fn sphere_to_spheroid(latitude: f64) -> f64 {
    if latitude.abs() >= 90.0 || !latitude.is_finite() {
        return latitude;
    }

    let factor = 1.0 - Ellipsoid::GRS80.eccentricity_squared();
    (latitude.to_radians().tan() / factor).atan().to_degrees()
}
