//! Vertical coordinate resolution.
//!
//! Turns a vertical grid description (type, physical constants and per-level
//! breakpoints) plus a surface elevation into layer-boundary elevations in
//! meters above mean sea level.
//!
//! The sigma-pressure families share the MM5/WRF reference atmosphere, whose
//! temperature varies with the log of pressure:
//!
//! ```text
//! T0(p) = T0s + A ln(p / P00)
//! z(p)  = -(R A / 2g) ln²(p / P00) - (R T0s / g) ln(p / P00)
//! ```
//!
//! The surface pressure for a terrain height `Zs` is the root of `z(Ps) = Zs`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RegridError, Result};

/// Gravitational acceleration (m/s²).
pub const DEFAULT_G: f64 = 9.81;
/// Gas constant for dry air (J/kg/K).
pub const DEFAULT_R: f64 = 287.04;
/// Temperature lapse with the log of pressure (K).
pub const DEFAULT_A: f64 = 50.0;
/// Reference sea-level temperature (K).
pub const DEFAULT_T0S: f64 = 290.0;
/// Reference sea-level pressure (Pa).
pub const DEFAULT_P00: f64 = 100000.0;
/// Model top used when a 2D grid is normalized to a single layer (Pa).
pub const DEFAULT_TOP_PRESSURE: f64 = 10000.0;

/// Smallest column depth (meters) kept between terrain and a sigma-Z top.
const MINIMUM_DEPTH: f64 = 1.0;

/// Vertical coordinate system of a grid's layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalType {
    /// MM5 hydrostatic sigma-pressure.
    HydrostaticSigmaPressure,
    /// MM5 non-hydrostatic sigma-pressure (reference-state pressure).
    NonHydrostaticSigmaPressure,
    /// WRF mass-coordinate sigma-pressure.
    WrfSigmaPressure,
    /// Terrain-following height fraction up to a fixed model top.
    SigmaZ,
    /// Pressure levels (Pa).
    Pressure,
    /// Height above mean sea level (m).
    Z,
    /// Height above ground (m).
    H,
}

impl VerticalType {
    /// Uses the sigma-pressure reference-atmosphere formula.
    pub fn is_sigma_pressure(&self) -> bool {
        matches!(
            self,
            Self::HydrostaticSigmaPressure
                | Self::NonHydrostaticSigmaPressure
                | Self::WrfSigmaPressure
        )
    }

    /// Levels are fractions in [0, 1], 1 at the surface.
    pub fn is_sigma(&self) -> bool {
        self.is_sigma_pressure() || *self == Self::SigmaZ
    }

    /// Levels must decrease from the surface upwards.
    pub fn levels_decrease(&self) -> bool {
        self.is_sigma() || *self == Self::Pressure
    }

    /// Get the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HydrostaticSigmaPressure => "hydrostatic_sigma_pressure",
            Self::NonHydrostaticSigmaPressure => "non_hydrostatic_sigma_pressure",
            Self::WrfSigmaPressure => "wrf_sigma_pressure",
            Self::SigmaZ => "sigma_z",
            Self::Pressure => "pressure",
            Self::Z => "z",
            Self::H => "h",
        }
    }
}

impl fmt::Display for VerticalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VerticalType {
    type Err = RegridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "hydrostatic_sigma_pressure" | "sigma_p_hydrostatic" | "vgsgph3" => {
                Ok(Self::HydrostaticSigmaPressure)
            }
            "non_hydrostatic_sigma_pressure" | "sigma_p_nonhydrostatic" | "vgsgpn3" => {
                Ok(Self::NonHydrostaticSigmaPressure)
            }
            "wrf_sigma_pressure" | "wrf" | "vgwrfem" => Ok(Self::WrfSigmaPressure),
            "sigma_z" | "vgsigz" => Ok(Self::SigmaZ),
            "pressure" | "vgpres" => Ok(Self::Pressure),
            "z" | "vgzval" => Ok(Self::Z),
            "h" | "vghval" => Ok(Self::H),
            other => Err(RegridError::invalid_vertical(format!(
                "unknown vertical type '{other}'"
            ))),
        }
    }
}

fn default_g() -> f64 {
    DEFAULT_G
}
fn default_r() -> f64 {
    DEFAULT_R
}
fn default_a() -> f64 {
    DEFAULT_A
}
fn default_t0s() -> f64 {
    DEFAULT_T0S
}
fn default_p00() -> f64 {
    DEFAULT_P00
}

/// Vertical grid description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalSpec {
    /// Coordinate family.
    pub vertical_type: VerticalType,
    /// Model-top pressure (Pa). For [`VerticalType::SigmaZ`] this is the
    /// model-top height in meters.
    pub top_pressure: f64,
    /// `layers + 1` layer-boundary breakpoints, surface first.
    pub levels: Vec<f64>,
    #[serde(default = "default_g")]
    pub g: f64,
    #[serde(default = "default_r")]
    pub r: f64,
    #[serde(default = "default_a")]
    pub a: f64,
    #[serde(default = "default_t0s")]
    pub t0s: f64,
    #[serde(default = "default_p00")]
    pub p00: f64,
}

impl VerticalSpec {
    /// A vertical description with the default MM5 constants.
    pub fn new(vertical_type: VerticalType, top_pressure: f64, levels: Vec<f64>) -> Self {
        Self {
            vertical_type,
            top_pressure,
            levels,
            g: DEFAULT_G,
            r: DEFAULT_R,
            a: DEFAULT_A,
            t0s: DEFAULT_T0S,
            p00: DEFAULT_P00,
        }
    }

    /// The single surface-to-top sigma-pressure layer that stands in for the
    /// vertical dimension of a 2D grid.
    pub fn trivial() -> Self {
        Self::new(
            VerticalType::HydrostaticSigmaPressure,
            DEFAULT_TOP_PRESSURE,
            vec![1.0, 0.0],
        )
    }

    /// Number of layers.
    pub fn layers(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Validate the description.
    pub fn validate(&self) -> Result<()> {
        let kind = self.vertical_type;

        if self.levels.len() < 2 {
            return Err(RegridError::invalid_vertical(format!(
                "{kind} needs at least 2 levels, got {}",
                self.levels.len()
            )));
        }

        for (name, value) in [
            ("top_pressure", self.top_pressure),
            ("g", self.g),
            ("R", self.r),
            ("A", self.a),
            ("T0s", self.t0s),
            ("P00", self.p00),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(RegridError::invalid_vertical(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        if self.levels.iter().any(|level| !level.is_finite()) {
            return Err(RegridError::invalid_vertical("levels must be finite"));
        }

        let monotonic = if kind.levels_decrease() {
            self.levels.windows(2).all(|pair| pair[0] > pair[1])
        } else {
            self.levels.windows(2).all(|pair| pair[0] < pair[1])
        };

        if !monotonic {
            let direction = if kind.levels_decrease() {
                "decreasing"
            } else {
                "increasing"
            };
            return Err(RegridError::invalid_vertical(format!(
                "{kind} levels must be strictly {direction}: {:?}",
                self.levels
            )));
        }

        if kind.is_sigma() && self.levels.iter().any(|level| !(0.0..=1.0).contains(level)) {
            return Err(RegridError::invalid_vertical(format!(
                "{kind} levels must lie in [0, 1]"
            )));
        }

        if kind == VerticalType::Pressure && self.levels.iter().any(|&level| level <= 0.0) {
            return Err(RegridError::invalid_vertical("pressure levels must be > 0"));
        }

        // Above this pressure the reference-atmosphere height stops increasing.
        if kind.is_sigma_pressure() {
            let turning = self.p00 * (-self.t0s / self.a).exp();
            if self.top_pressure <= turning {
                return Err(RegridError::invalid_vertical(format!(
                    "top_pressure {} must exceed {turning:.1} Pa",
                    self.top_pressure
                )));
            }
        }

        Ok(())
    }

    /// Reference-atmosphere height (m AMSL) of pressure `p` (Pa).
    fn height_of_pressure(&self, pressure: f64) -> f64 {
        let log_ratio = (pressure / self.p00).ln();
        -(self.r * self.a / (2.0 * self.g)) * log_ratio * log_ratio
            - (self.r * self.t0s / self.g) * log_ratio
    }

    /// Reference-atmosphere pressure (Pa) at terrain height `elevation` (m).
    fn surface_pressure(&self, elevation: f64) -> f64 {
        let t_over_a = self.t0s / self.a;
        let discriminant = t_over_a * t_over_a - 2.0 * self.g * elevation / (self.a * self.r);
        let log_ratio = -t_over_a + discriminant.max(0.0).sqrt();
        self.p00 * log_ratio.exp()
    }

    /// Fill `z` (length `layers + 1`) with layer-boundary elevations in
    /// meters above mean sea level for a column whose terrain height is
    /// `surface_elevation`.
    pub fn elevations(&self, surface_elevation: f64, z: &mut [f64]) {
        debug_assert_eq!(z.len(), self.levels.len());

        match self.vertical_type {
            VerticalType::HydrostaticSigmaPressure
            | VerticalType::NonHydrostaticSigmaPressure
            | VerticalType::WrfSigmaPressure => {
                let top = self.top_pressure;
                // A column at least 1 Pa deep keeps p strictly decreasing.
                let surface = self.surface_pressure(surface_elevation).max(top + 1.0);
                let depth = surface - top;

                for (boundary, &sigma) in z.iter_mut().zip(&self.levels) {
                    *boundary = self.height_of_pressure(sigma * depth + top);
                }
            }
            VerticalType::SigmaZ => {
                let depth = (self.top_pressure - surface_elevation).max(MINIMUM_DEPTH);

                for (boundary, &sigma) in z.iter_mut().zip(&self.levels) {
                    *boundary = surface_elevation + (1.0 - sigma) * depth;
                }
            }
            VerticalType::Pressure => {
                let scale_height = self.r * self.t0s / self.g;

                for (boundary, &pressure) in z.iter_mut().zip(&self.levels) {
                    *boundary = scale_height * (self.p00 / pressure).ln();
                }
            }
            VerticalType::Z => z.copy_from_slice(&self.levels),
            VerticalType::H => {
                for (boundary, &height) in z.iter_mut().zip(&self.levels) {
                    *boundary = height + surface_elevation;
                }
            }
        }
    }

    /// Allocating form of [`VerticalSpec::elevations`].
    pub fn resolve(&self, surface_elevation: f64) -> Vec<f64> {
        let mut z = vec![0.0; self.levels.len()];
        self.elevations(surface_elevation, &mut z);
        z
    }
}

/// Layer and normalized offset of an elevation within a boundary array.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VerticalLocation {
    /// 1-based layer, or 0 when outside `[z[0], z[layers]]`.
    pub layer: usize,
    /// Offset from the layer center scaled to [-1, 1].
    pub offset: f64,
}

impl VerticalLocation {
    /// Whether the elevation fell inside the column.
    pub fn is_inside(&self) -> bool {
        self.layer > 0
    }
}

/// Locate `elevation` within the strictly increasing boundaries `z`.
pub fn locate(z: &[f64], elevation: f64) -> VerticalLocation {
    let layers = z.len().saturating_sub(1);

    if layers == 0 || !(elevation >= z[0] && elevation <= z[layers]) {
        return VerticalLocation::default();
    }

    for layer in 0..layers {
        let (bottom, top) = (z[layer], z[layer + 1]);

        if elevation <= top {
            let offset = 2.0 * (elevation - bottom) / (top - bottom) - 1.0;
            return VerticalLocation {
                layer: layer + 1,
                offset: offset.clamp(-1.0, 1.0),
            };
        }
    }

    VerticalLocation::default()
}

/// Whether every boundary is above the one below it.
pub fn is_strictly_increasing(z: &[f64]) -> bool {
    z.windows(2).all(|pair| pair[0] < pair[1])
}

/// Per-worker cache of the layer boundaries last derived for a column.
#[derive(Debug, Clone)]
pub struct VerticalScratch {
    surface_elevation: f64,
    z: Vec<f64>,
}

impl VerticalScratch {
    pub(crate) fn new(z: Vec<f64>) -> Self {
        Self {
            surface_elevation: f64::NAN,
            z,
        }
    }

    /// Boundaries for `surface_elevation`, recomputed only when it differs
    /// from the cached column's surface elevation by `tolerance` or more.
    pub fn boundaries(
        &mut self,
        spec: &VerticalSpec,
        surface_elevation: f64,
        tolerance: f64,
    ) -> &[f64] {
        let stale = !((surface_elevation - self.surface_elevation).abs() < tolerance);

        if stale {
            spec.elevations(surface_elevation, &mut self.z);
            self.surface_elevation = surface_elevation;
        }

        &self.z
    }

    /// Surface elevation the cached boundaries were derived for.
    pub fn surface_elevation(&self) -> f64 {
        self.surface_elevation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sigma_levels() -> Vec<f64> {
        vec![1.0, 0.995, 0.99, 0.98, 0.96, 0.93, 0.89, 0.84, 0.77, 0.7, 0.5, 0.3, 0.1, 0.0]
    }

    #[test]
    fn test_sigma_pressure_surface_scenario() {
        let spec = VerticalSpec {
            vertical_type: VerticalType::HydrostaticSigmaPressure,
            top_pressure: 10000.0,
            levels: vec![1.0, 0.995],
            g: 9.81,
            r: 287.04,
            a: 50.0,
            t0s: 290.0,
            p00: 100000.0,
        };
        spec.validate().unwrap();

        let z = spec.resolve(0.0);
        assert_eq!(z.len(), 2);
        assert_eq!(z[0], 0.0);
        assert!(z[1] > z[0]);
        // First layer of a 0.995 sigma level is roughly 38 m deep.
        assert!((z[1] - 38.0).abs() < 2.0, "z[1] = {}", z[1]);
    }

    #[test]
    fn test_sigma_pressure_bottom_is_terrain() {
        let spec = VerticalSpec::new(VerticalType::NonHydrostaticSigmaPressure, 5000.0, sigma_levels());
        for terrain in [0.0, 250.0, 1600.0, 4200.0] {
            let z = spec.resolve(terrain);
            assert!((z[0] - terrain).abs() < 1e-6, "{} vs {}", z[0], terrain);
            assert!(is_strictly_increasing(&z));
        }
    }

    #[test]
    fn test_all_types_strictly_increasing() {
        let cases = vec![
            VerticalSpec::new(VerticalType::HydrostaticSigmaPressure, 10000.0, sigma_levels()),
            VerticalSpec::new(VerticalType::WrfSigmaPressure, 5000.0, sigma_levels()),
            VerticalSpec::new(VerticalType::SigmaZ, 20000.0, sigma_levels()),
            VerticalSpec::new(
                VerticalType::Pressure,
                10000.0,
                vec![100000.0, 92500.0, 85000.0, 70000.0, 50000.0, 30000.0, 10000.0],
            ),
            VerticalSpec::new(VerticalType::Z, 1.0, vec![0.0, 100.0, 500.0, 2000.0, 10000.0]),
            VerticalSpec::new(VerticalType::H, 1.0, vec![0.0, 50.0, 200.0, 1000.0]),
        ];

        for spec in cases {
            spec.validate().unwrap();
            for terrain in [-50.0, 0.0, 800.0, 3000.0] {
                let z = spec.resolve(terrain);
                assert_eq!(z.len(), spec.layers() + 1);
                assert!(
                    is_strictly_increasing(&z),
                    "{} at {} m: {:?}",
                    spec.vertical_type,
                    terrain,
                    z
                );
            }
        }
    }

    #[test]
    fn test_sigma_z_above_top_stays_increasing() {
        let spec = VerticalSpec::new(VerticalType::SigmaZ, 1000.0, vec![1.0, 0.5, 0.0]);
        let z = spec.resolve(1500.0);
        assert!(is_strictly_increasing(&z));
        assert_eq!(z[0], 1500.0);
    }

    #[test]
    fn test_h_is_offset_by_terrain() {
        let spec = VerticalSpec::new(VerticalType::H, 1.0, vec![0.0, 10.0, 30.0]);
        assert_eq!(spec.resolve(100.0), vec![100.0, 110.0, 130.0]);
    }

    #[test]
    fn test_validation_rejects_bad_levels() {
        let increasing_sigma = VerticalSpec::new(VerticalType::SigmaZ, 1000.0, vec![0.0, 0.5, 1.0]);
        assert!(increasing_sigma.validate().is_err());

        let out_of_range = VerticalSpec::new(
            VerticalType::HydrostaticSigmaPressure,
            10000.0,
            vec![1.2, 0.5],
        );
        assert!(out_of_range.validate().is_err());

        let decreasing_z = VerticalSpec::new(VerticalType::Z, 1.0, vec![100.0, 50.0]);
        assert!(decreasing_z.validate().is_err());

        let single = VerticalSpec::new(VerticalType::Z, 1.0, vec![0.0]);
        assert!(single.validate().is_err());

        let mut negative_g = VerticalSpec::trivial();
        negative_g.g = -9.81;
        assert!(negative_g.validate().is_err());

        let mut nan_top = VerticalSpec::trivial();
        nan_top.top_pressure = f64::NAN;
        assert!(nan_top.validate().is_err());

        let high_top = VerticalSpec::new(VerticalType::WrfSigmaPressure, 100.0, vec![1.0, 0.0]);
        assert!(high_top.validate().is_err());
    }

    #[test]
    fn test_locate() {
        let z = [0.0, 100.0, 300.0];
        assert_eq!(locate(&z, -1.0).layer, 0);
        assert_eq!(locate(&z, 301.0).layer, 0);
        assert_eq!(locate(&z, f64::NAN).layer, 0);

        let bottom = locate(&z, 0.0);
        assert_eq!(bottom.layer, 1);
        assert_eq!(bottom.offset, -1.0);

        let middle = locate(&z, 200.0);
        assert_eq!(middle.layer, 2);
        assert!(middle.offset.abs() < 1e-12);

        let top = locate(&z, 300.0);
        assert_eq!(top.layer, 2);
        assert_eq!(top.offset, 1.0);
    }

    #[test]
    fn test_scratch_reuses_within_tolerance() {
        let spec = VerticalSpec::new(VerticalType::H, 1.0, vec![0.0, 10.0]);
        let mut scratch = VerticalScratch::new(vec![0.0; 2]);

        assert_eq!(scratch.boundaries(&spec, 100.0, 40.0), &[100.0, 110.0]);
        // 39 m away: cached column is reused.
        assert_eq!(scratch.boundaries(&spec, 139.0, 40.0), &[100.0, 110.0]);
        assert_eq!(scratch.surface_elevation(), 100.0);
        // 40 m away: recomputed.
        assert_eq!(scratch.boundaries(&spec, 140.0, 40.0), &[140.0, 150.0]);
    }

    #[test]
    fn test_type_names() {
        for kind in [
            VerticalType::HydrostaticSigmaPressure,
            VerticalType::NonHydrostaticSigmaPressure,
            VerticalType::WrfSigmaPressure,
            VerticalType::SigmaZ,
            VerticalType::Pressure,
            VerticalType::Z,
            VerticalType::H,
        ] {
            assert_eq!(kind.as_str().parse::<VerticalType>().unwrap(), kind);
        }
        assert_eq!("VGSGPH3".parse::<VerticalType>().unwrap(), VerticalType::HydrostaticSigmaPressure);
        assert!("eta".parse::<VerticalType>().is_err());
    }
}
