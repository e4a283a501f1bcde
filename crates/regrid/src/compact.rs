//! Compaction: gathering the populated cells of a grid into dense arrays.

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::cell::{Cell, BAD_VALUE};
use crate::error::{try_filled, RegridError, Result};
use crate::grid::Grid;

/// Populated cells as parallel arrays, in `row, column, layer` order.
///
/// Arrays are sized to the buffer's capacity; entries past `count` are zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompactedCells {
    /// Number of populated cells written.
    pub count: usize,
    /// Whether `layers` and `elevations` are meaningful.
    pub vertical: bool,
    /// Whether `data2` is meaningful.
    pub has_data2: bool,
    pub columns: Vec<usize>,
    pub rows: Vec<usize>,
    pub layers: Vec<usize>,
    pub longitudes: Vec<f64>,
    pub latitudes: Vec<f64>,
    pub elevations: Vec<f64>,
    pub data: Vec<f64>,
    pub data2: Vec<f64>,
    pub notes: Vec<String>,
}

/// One populated cell, for record-oriented output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellRecord {
    pub column: usize,
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<usize>,
    pub longitude: f64,
    pub latitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CompactedCells {
    /// A zero-filled buffer able to hold `capacity` cells.
    pub fn zeroed(capacity: usize) -> Result<Self> {
        Ok(Self {
            count: 0,
            vertical: false,
            has_data2: false,
            columns: try_filled(capacity, 0, "compacted columns")?,
            rows: try_filled(capacity, 0, "compacted rows")?,
            layers: try_filled(capacity, 0, "compacted layers")?,
            longitudes: try_filled(capacity, 0.0, "compacted longitudes")?,
            latitudes: try_filled(capacity, 0.0, "compacted latitudes")?,
            elevations: try_filled(capacity, 0.0, "compacted elevations")?,
            data: try_filled(capacity, 0.0, "compacted data")?,
            data2: try_filled(capacity, 0.0, "compacted data2")?,
            notes: try_filled(capacity, String::new(), "compacted notes")?,
        })
    }

    /// Number of cells the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The populated entries as records.
    pub fn records(&self) -> Vec<CellRecord> {
        (0..self.count)
            .map(|i| CellRecord {
                column: self.columns[i],
                row: self.rows[i],
                layer: self.vertical.then_some(self.layers[i]),
                longitude: self.longitudes[i],
                latitude: self.latitudes[i],
                elevation: self.vertical.then_some(self.elevations[i]),
                value: self.data[i],
                value2: self.has_data2.then_some(self.data2[i]),
                note: Some(&self.notes[i])
                    .filter(|note| !note.is_empty())
                    .cloned(),
            })
            .collect()
    }

    fn write(&mut self, slot: usize, cell: &Cell) {
        self.columns[slot] = cell.column;
        self.rows[slot] = cell.row;
        self.layers[slot] = cell.layer;
        self.longitudes[slot] = cell.longitude;
        self.latitudes[slot] = cell.latitude;
        self.elevations[slot] = cell.elevation;
        self.data[slot] = cell.data;
        self.data2[slot] = cell.data2;
        self.notes[slot] = cell.note.clone().unwrap_or_default();
    }

    fn clear_from(&mut self, start: usize) {
        self.columns[start..].fill(0);
        self.rows[start..].fill(0);
        self.layers[start..].fill(0);
        self.longitudes[start..].fill(0.0);
        self.latitudes[start..].fill(0.0);
        self.elevations[start..].fill(0.0);
        self.data[start..].fill(0.0);
        self.data2[start..].fill(0.0);
        self.notes[start..].iter_mut().for_each(String::clear);
    }
}

/// Every cell's value in `row, column, layer` order, with [`BAD_VALUE`]
/// where no valid sample landed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FullOutput {
    pub data: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data2: Option<Vec<f64>>,
}

impl Grid {
    /// Gather the populated cells into a buffer sized to fit them exactly.
    pub fn compact(&self) -> Result<CompactedCells> {
        let mut output = CompactedCells::zeroed(self.populated())?;
        self.compact_into(&mut output)?;
        Ok(output)
    }

    /// Gather the populated cells into a caller-provided buffer, zeroing its
    /// unused tail. Returns the number of cells written.
    pub fn compact_into(&self, output: &mut CompactedCells) -> Result<usize> {
        let populated = self.populated();

        if output.capacity() < populated {
            return Err(RegridError::invalid_input(format!(
                "compaction buffer holds {} cells, {populated} are populated",
                output.capacity()
            )));
        }

        output.vertical = self.vertical;
        output.has_data2 = self.has_data2;

        let mut slot = 0;
        for cell in self.cells.iter().filter(|cell| cell.is_populated()) {
            output.write(slot, cell);
            slot += 1;
        }

        output.count = slot;
        output.clear_from(slot);

        debug!(count = slot, capacity = output.capacity(), "compacted cells");

        Ok(slot)
    }

    /// Every cell's value, populated or not.
    pub fn full_output(&self) -> FullOutput {
        let data = self
            .cells
            .par_iter()
            .map(|cell| if cell.is_populated() { cell.data } else { BAD_VALUE })
            .collect();

        let data2 = self.has_data2.then(|| {
            self.cells
                .par_iter()
                .map(|cell| if cell.is_populated() { cell.data2 } else { BAD_VALUE })
                .collect()
        });

        FullOutput { data, data2 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_buffer() {
        let buffer = CompactedCells::zeroed(4).unwrap();
        assert_eq!(buffer.capacity(), 4);
        assert!(buffer.is_empty());
        assert!(buffer.records().is_empty());
    }

    #[test]
    fn test_records_hide_absent_fields() {
        let mut buffer = CompactedCells::zeroed(2).unwrap();
        let cell = Cell {
            count: 1,
            column: 3,
            row: 2,
            layer: 1,
            longitude: -90.0,
            latitude: 35.0,
            data: 4.5,
            note: Some("a".to_string()),
            ..Cell::default()
        };
        buffer.write(0, &cell);
        buffer.count = 1;

        let records = buffer.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].layer, None);
        assert_eq!(records[0].value2, None);
        assert_eq!(records[0].note.as_deref(), Some("a"));

        let json = serde_json::to_string(&records[0]).unwrap();
        assert!(!json.contains("layer"));
        assert!(json.contains("\"value\":4.5"));
    }
}
