//! Declarative grid definitions, as read from YAML or JSON job files.
//!
//! ```yaml
//! projection:
//!   kind: lambert
//!   lower_latitude: 33
//!   upper_latitude: 45
//!   central_longitude: -97
//!   central_latitude: 40
//! grid:
//!   columns: 459
//!   rows: 299
//!   west_edge: -2556000
//!   south_edge: -1728000
//!   cell_width: 12000
//!   cell_height: 12000
//!   vertical:
//!     vertical_type: hydrostatic_sigma_pressure
//!     top_pressure: 5000
//!     levels: [1.0, 0.995, 0.99, 0.98, 0.96]
//! config:
//!   workers: 8
//! ```

use projection::ProjectionSpec;
use serde::{Deserialize, Serialize};

use crate::config::RegridConfig;
use crate::error::{RegridError, Result};
use crate::vertical::VerticalSpec;

/// Horizontal lattice and optional vertical layering of a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDefinition {
    pub columns: usize,
    pub rows: usize,
    /// West edge of the first column (projected meters, or degrees for an
    /// unprojected grid).
    pub west_edge: f64,
    /// South edge of the first row.
    pub south_edge: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    /// Absent for a 2D grid.
    #[serde(default)]
    pub vertical: Option<VerticalSpec>,
}

impl GridDefinition {
    /// A 2D lattice.
    pub fn new(
        columns: usize,
        rows: usize,
        west_edge: f64,
        south_edge: f64,
        cell_width: f64,
        cell_height: f64,
    ) -> Self {
        Self {
            columns,
            rows,
            west_edge,
            south_edge,
            cell_width,
            cell_height,
            vertical: None,
        }
    }

    /// Add vertical layering.
    pub fn with_vertical(mut self, vertical: VerticalSpec) -> Self {
        self.vertical = Some(vertical);
        self
    }

    /// Number of vertical layers; 0 for a 2D grid.
    pub fn layers(&self) -> usize {
        self.vertical.as_ref().map_or(0, VerticalSpec::layers)
    }

    /// East edge of the last column.
    pub fn east_edge(&self) -> f64 {
        self.west_edge + self.columns as f64 * self.cell_width
    }

    /// North edge of the last row.
    pub fn north_edge(&self) -> f64 {
        self.south_edge + self.rows as f64 * self.cell_height
    }

    /// Validate the definition. `projected` is false for a lon/lat grid,
    /// whose edges must then be valid longitudes and latitudes.
    pub fn validate(&self, projected: bool) -> Result<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(RegridError::invalid_grid(format!(
                "columns ({}) and rows ({}) must be > 0",
                self.columns, self.rows
            )));
        }

        let layers = self.layers().max(1);
        let cells = self
            .columns
            .checked_mul(self.rows)
            .and_then(|cells| cells.checked_mul(layers));

        if cells.is_none() {
            return Err(RegridError::invalid_grid(format!(
                "{} x {} x {} cells overflow",
                self.columns, self.rows, layers
            )));
        }

        for (name, value) in [
            ("west_edge", self.west_edge),
            ("south_edge", self.south_edge),
            ("cell_width", self.cell_width),
            ("cell_height", self.cell_height),
        ] {
            if !value.is_finite() {
                return Err(RegridError::invalid_grid(format!("{name} must be finite")));
            }
        }

        if !(self.cell_width > 0.0 && self.cell_height > 0.0) {
            return Err(RegridError::invalid_grid(format!(
                "cell size {} x {} must be positive",
                self.cell_width, self.cell_height
            )));
        }

        if !projected {
            let (east, north) = (self.east_edge(), self.north_edge());
            let longitude = -180.0..=180.0;
            let latitude = -90.0..=90.0;

            if !longitude.contains(&self.west_edge)
                || !longitude.contains(&east)
                || !latitude.contains(&self.south_edge)
                || !latitude.contains(&north)
            {
                return Err(RegridError::invalid_grid(format!(
                    "lon/lat extent [{}, {}] x [{}, {}] is not on the globe",
                    self.west_edge, east, self.south_edge, north
                )));
            }
        }

        if let Some(vertical) = &self.vertical {
            vertical.validate()?;
        }

        Ok(())
    }
}

/// A complete regridding job description: projection, lattice and engine
/// tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridFile {
    #[serde(default)]
    pub projection: ProjectionSpec,
    pub grid: GridDefinition,
    /// Absent means the engine tunables come from the environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<RegridConfig>,
}

impl GridFile {
    /// Parse a YAML job description.
    pub fn from_yaml_str(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Parse a JSON job description.
    pub fn from_json_str(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The job's engine tunables, falling back to [`RegridConfig::from_env`].
    pub fn config(&self) -> RegridConfig {
        self.config.clone().unwrap_or_else(RegridConfig::from_env)
    }
}
