//! Aggregation policies: how samples landing in the same cell combine.
//!
//! Each policy has three steps. The first valid sample for a cell
//! initializes it (count, center, indices); every later one is combined into
//! it; and once all samples of a run are in, [`AggregationMethod::finish`]
//! runs over every populated cell. Only [`AggregationMethod::Weighted`] does
//! work in the last step, because its division has to wait for the complete
//! weight sum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellSite};
use crate::error::{RegridError, Result};

/// Aggregation policy applied by `aggregate` and `regrid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMethod {
    /// Keep the sample closest to the cell center.
    Nearest,
    /// Arithmetic mean of all valid samples.
    #[default]
    Mean,
    /// Inverse squared distance weighted mean.
    Weighted,
}

/// One sample on its way into a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<'a> {
    /// Position in the caller's input arrays.
    pub index: usize,
    pub value: f64,
    pub value2: f64,
    /// Squared normalized offset from the cell center, already clamped.
    pub radius: f64,
    /// Contribution weight (`1 / radius` for points, overlap area for swaths).
    pub weight: f64,
    pub note: Option<&'a str>,
}

impl<'a> Sample<'a> {
    /// A sample whose radius and weight are filled in once its cell is known.
    pub(crate) fn of_value(index: usize, value: f64, note: Option<&'a str>) -> Self {
        Self {
            index,
            value,
            value2: 0.0,
            radius: 0.0,
            weight: 0.0,
            note,
        }
    }
}

impl AggregationMethod {
    /// Get the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Mean => "mean",
            Self::Weighted => "weighted",
        }
    }

    /// Combine one sample into `cell`. Invalid samples are ignored.
    ///
    /// Returns whether the sample was combined.
    pub fn combine(self, cell: &mut Cell, site: &CellSite, sample: &Sample<'_>) -> bool {
        if !cell.is_valid(sample.value) {
            return false;
        }

        if cell.count == 0 {
            self.initialize(cell, site, sample);
        } else {
            self.accumulate(cell, site, sample);
        }

        true
    }

    fn initialize(self, cell: &mut Cell, site: &CellSite, sample: &Sample<'_>) {
        cell.count = 1;
        cell.column = site.column;
        cell.row = site.row;
        cell.layer = site.layer;
        cell.longitude = site.longitude;
        cell.latitude = site.latitude;
        cell.elevation = site.elevation;
        cell.surface_elevation = site.surface_elevation;
        cell.radius = sample.radius;
        cell.sample = sample.index;
        cell.set_note(sample.note);

        match self {
            Self::Nearest | Self::Mean => {
                cell.data = sample.value;
                cell.data2 = sample.value2;
                cell.weights = 0.0;
            }
            Self::Weighted => {
                cell.data = sample.value * sample.weight;
                cell.data2 = sample.value2 * sample.weight;
                cell.weights = sample.weight;
            }
        }
    }

    fn accumulate(self, cell: &mut Cell, site: &CellSite, sample: &Sample<'_>) {
        cell.count += 1;
        cell.surface_elevation = site.surface_elevation;

        match self {
            Self::Nearest => {
                let closer = sample.radius < cell.radius
                    || (sample.radius == cell.radius && sample.index < cell.sample);

                if !cell.is_valid(cell.data) || closer {
                    cell.data = sample.value;
                    cell.data2 = sample.value2;
                    cell.radius = sample.radius;
                    cell.sample = sample.index;
                    cell.set_note(sample.note);
                }
            }
            Self::Mean => {
                if cell.is_valid(cell.data) {
                    let count = cell.count as f64;
                    cell.data += (sample.value - cell.data) / count;
                    cell.data2 += (sample.value2 - cell.data2) / count;
                } else {
                    cell.data = sample.value;
                    cell.data2 = sample.value2;
                }
                cell.radius = sample.radius;
                cell.append_note(sample.note);
            }
            Self::Weighted => {
                cell.data += sample.value * sample.weight;
                cell.data2 += sample.value2 * sample.weight;
                cell.weights += sample.weight;
                cell.radius = sample.radius;
                cell.append_note(sample.note);
            }
        }
    }

    /// Post-aggregation pass over a populated cell.
    pub fn finish(self, cell: &mut Cell) {
        if self == Self::Weighted && cell.count > 0 && cell.weights > 0.0 {
            cell.data /= cell.weights;
            cell.data2 /= cell.weights;
        }
    }
}

impl fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AggregationMethod {
    type Err = RegridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "mean" => Ok(Self::Mean),
            "weighted" => Ok(Self::Weighted),
            other => Err(RegridError::InvalidConfig(format!(
                "unknown aggregation method '{other}'"
            ))),
        }
    }
}
