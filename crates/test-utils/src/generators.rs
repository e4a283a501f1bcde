//! Seeded generators for synthetic sensor data.
//!
//! Every generator takes a seed so tests and benches see the same samples
//! on every run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Scattered surface samples: parallel longitude, latitude and value arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatteredPoints {
    pub longitudes: Vec<f64>,
    pub latitudes: Vec<f64>,
    pub values: Vec<f64>,
}

impl ScatteredPoints {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A smooth, strictly positive field (roughly 250 to 310) for sample values.
pub fn temperature_field(longitude: f64, latitude: f64) -> f64 {
    280.0 + 20.0 * (latitude.to_radians() * 3.0).cos() + 10.0 * (longitude.to_radians() * 2.0).sin()
}

/// `count` points uniformly distributed over `bbox = (min_lon, min_lat,
/// max_lon, max_lat)`, valued by [`temperature_field`].
///
/// # Example
///
/// ```
/// use test_utils::scattered_points;
///
/// let points = scattered_points(100, (-10.0, -5.0, 10.0, 5.0), 7);
/// assert_eq!(points.len(), 100);
/// assert!(points.longitudes.iter().all(|&lon| (-10.0..=10.0).contains(&lon)));
/// ```
pub fn scattered_points(count: usize, bbox: (f64, f64, f64, f64), seed: u64) -> ScatteredPoints {
    let (min_lon, min_lat, max_lon, max_lat) = bbox;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut longitudes = Vec::with_capacity(count);
    let mut latitudes = Vec::with_capacity(count);
    let mut values = Vec::with_capacity(count);

    for _ in 0..count {
        let longitude = rng.gen_range(min_lon..=max_lon);
        let latitude = rng.gen_range(min_lat..=max_lat);
        longitudes.push(longitude);
        latitudes.push(latitude);
        values.push(temperature_field(longitude, latitude));
    }

    ScatteredPoints {
        longitudes,
        latitudes,
        values,
    }
}

/// Vertical profiles: every sample carries an elevation and the terrain
/// height under it.
#[derive(Debug, Clone, PartialEq)]
pub struct Profiles {
    pub longitudes: Vec<f64>,
    pub latitudes: Vec<f64>,
    pub elevations: Vec<f64>,
    pub surface_elevations: Vec<f64>,
    pub values: Vec<f64>,
}

/// `profiles` soundings over `bbox`, each with `levels` samples spaced
/// evenly from its surface elevation up to `top` meters. Values decrease
/// with height at 6.5 K/km.
pub fn profiles(
    profiles: usize,
    levels: usize,
    bbox: (f64, f64, f64, f64),
    top: f64,
    seed: u64,
) -> Profiles {
    let (min_lon, min_lat, max_lon, max_lat) = bbox;
    let mut rng = StdRng::seed_from_u64(seed);
    let total = profiles * levels;

    let mut result = Profiles {
        longitudes: Vec::with_capacity(total),
        latitudes: Vec::with_capacity(total),
        elevations: Vec::with_capacity(total),
        surface_elevations: Vec::with_capacity(total),
        values: Vec::with_capacity(total),
    };

    for _ in 0..profiles {
        let longitude = rng.gen_range(min_lon..=max_lon);
        let latitude = rng.gen_range(min_lat..=max_lat);
        let surface = rng.gen_range(0.0..1500.0);
        let step = (top - surface) / levels.max(1) as f64;

        for level in 0..levels {
            let elevation = surface + (level as f64 + 0.5) * step;
            result.longitudes.push(longitude);
            result.latitudes.push(latitude);
            result.elevations.push(elevation);
            result.surface_elevations.push(surface);
            result
                .values
                .push(temperature_field(longitude, latitude) - 0.0065 * elevation);
        }
    }

    result
}

/// Pixel centers of a `rows x columns` swath: a regular lattice of `step`
/// degrees starting at `origin`, rotated by `angle` degrees.
pub fn swath_centers(
    rows: usize,
    columns: usize,
    origin: (f64, f64),
    step: f64,
    angle: f64,
) -> (Vec<f64>, Vec<f64>) {
    let (sin, cos) = angle.to_radians().sin_cos();
    let mut longitudes = Vec::with_capacity(rows * columns);
    let mut latitudes = Vec::with_capacity(rows * columns);

    for row in 0..rows {
        for column in 0..columns {
            let (u, v) = (column as f64 * step, row as f64 * step);
            longitudes.push(origin.0 + u * cos - v * sin);
            latitudes.push(origin.1 + u * sin + v * cos);
        }
    }

    (longitudes, latitudes)
}

/// Replace roughly `fraction` of `values` with NaN.
pub fn with_missing(values: &[f64], fraction: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    values
        .iter()
        .map(|&value| if rng.gen_bool(fraction) { f64::NAN } else { value })
        .collect()
}
