//! Per-lattice-point aggregation state.

use serde::Serialize;

/// Value reported for cells that never received a valid sample.
pub const BAD_VALUE: f64 = -9999.0;

/// Separator between provenance notes appended to one cell.
pub const NOTE_SEPARATOR: char = ';';

/// Aggregation state of one grid cell.
///
/// A cell is untouched while `count == 0`; its lattice indices are then all
/// zero. Once a valid sample lands in it, `column`, `row` and `layer` are the
/// 1-based position and `data` holds a value `>= minimum_valid_value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    /// Number of valid samples combined.
    pub count: usize,
    pub column: usize,
    pub row: usize,
    pub layer: usize,
    /// Cell center longitude (degrees).
    pub longitude: f64,
    /// Cell center latitude (degrees).
    pub latitude: f64,
    /// Cell center elevation (m AMSL); zero on a 2D grid.
    pub elevation: f64,
    /// Surface elevation of the last sample combined.
    pub surface_elevation: f64,
    pub data: f64,
    /// Second vector component, if the batch carried one.
    pub data2: f64,
    /// Running weight sum (weighted and area-weighted aggregation).
    pub weights: f64,
    /// Squared normalized offset of the best or latest sample.
    pub radius: f64,
    pub minimum_valid_value: f64,
    /// Provenance of the samples combined.
    pub note: Option<String>,
    /// Input index of the sample currently held by a nearest-neighbor cell.
    #[serde(skip)]
    pub(crate) sample: usize,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            count: 0,
            column: 0,
            row: 0,
            layer: 0,
            longitude: 0.0,
            latitude: 0.0,
            elevation: 0.0,
            surface_elevation: 0.0,
            data: f64::NAN,
            data2: 0.0,
            weights: 0.0,
            radius: 0.0,
            minimum_valid_value: f64::NEG_INFINITY,
            note: None,
            sample: usize::MAX,
        }
    }
}

impl Cell {
    /// Return the cell to its untouched state for a new aggregation run.
    pub fn reset(&mut self, minimum_valid_value: f64) {
        *self = Self {
            minimum_valid_value,
            ..Self::default()
        };
    }

    /// Whether any valid sample has been combined.
    pub fn is_populated(&self) -> bool {
        self.count > 0
    }

    /// Whether `value` passes this run's validity threshold. NaN never does.
    pub fn is_valid(&self, value: f64) -> bool {
        value >= self.minimum_valid_value
    }

    /// Replace the note.
    pub(crate) fn set_note(&mut self, note: Option<&str>) {
        self.note = note.filter(|text| !text.is_empty()).map(str::to_string);
    }

    /// Append a note unless it is already present.
    pub(crate) fn append_note(&mut self, note: Option<&str>) {
        let Some(text) = note.filter(|text| !text.is_empty()) else {
            return;
        };

        match &mut self.note {
            None => self.note = Some(text.to_string()),
            Some(existing) => {
                if !existing.split(NOTE_SEPARATOR).any(|part| part == text) {
                    existing.push(NOTE_SEPARATOR);
                    existing.push_str(text);
                }
            }
        }
    }
}

/// Where a sample lands: the cell's 1-based position and center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellSite {
    pub column: usize,
    pub row: usize,
    pub layer: usize,
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: f64,
    pub surface_elevation: f64,
}
