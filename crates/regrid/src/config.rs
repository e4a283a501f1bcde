//! Configuration for the regridding engine.

use serde::{Deserialize, Serialize};

/// Surface elevation change (meters) below which a worker reuses the layer
/// boundaries it derived for the previous sample.
pub const SURFACE_ELEVATION_TOLERANCE: f64 = 40.0;

/// Swath cells with a corner farther than this (degrees) from their center
/// are collapsed onto the center.
pub const BOGUS_CELL_DEGREES: f64 = 3.0;

/// Lower bound on a sample's squared normalized distance to its cell center.
pub const MINIMUM_RADIUS: f64 = 1e-6;

/// Configuration for the regridding engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegridConfig {
    /// Number of worker partitions per aggregation call. Each worker owns one
    /// scratch buffer of layer boundaries.
    pub workers: usize,

    /// See [`SURFACE_ELEVATION_TOLERANCE`]. The reused column is the
    /// worker's previous one, so with a non-zero tolerance a sample's layer
    /// can depend on how the input is split across workers. Zero derives
    /// every column exactly and makes layered results independent of
    /// `workers`.
    pub surface_elevation_tolerance: f64,

    /// See [`BOGUS_CELL_DEGREES`].
    pub bogus_cell_degrees: f64,

    /// See [`MINIMUM_RADIUS`].
    pub minimum_radius: f64,
}

impl Default for RegridConfig {
    fn default() -> Self {
        Self {
            workers: rayon::current_num_threads().max(1),
            surface_elevation_tolerance: SURFACE_ELEVATION_TOLERANCE,
            bogus_cell_degrees: BOGUS_CELL_DEGREES,
            minimum_radius: MINIMUM_RADIUS,
        }
    }
}

impl RegridConfig {
    /// Single worker; aggregation runs sequentially.
    pub fn sequential() -> Self {
        Self {
            workers: 1,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("REGRID_WORKERS") {
            if let Ok(workers) = val.parse() {
                config.workers = workers;
            }
        }

        if let Ok(val) = std::env::var("REGRID_SURFACE_TOLERANCE_M") {
            if let Ok(meters) = val.parse() {
                config.surface_elevation_tolerance = meters;
            }
        }

        if let Ok(val) = std::env::var("REGRID_BOGUS_CELL_DEGREES") {
            if let Ok(degrees) = val.parse() {
                config.bogus_cell_degrees = degrees;
            }
        }

        if let Ok(val) = std::env::var("REGRID_MINIMUM_RADIUS") {
            if let Ok(radius) = val.parse() {
                config.minimum_radius = radius;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be > 0".to_string());
        }

        if !(self.surface_elevation_tolerance >= 0.0) {
            return Err("surface_elevation_tolerance must be >= 0".to_string());
        }

        if !(self.bogus_cell_degrees > 0.0) {
            return Err("bogus_cell_degrees must be > 0".to_string());
        }

        if !(self.minimum_radius > 0.0 && self.minimum_radius.is_finite()) {
            return Err("minimum_radius must be a positive number".to_string());
        }

        Ok(())
    }
}
