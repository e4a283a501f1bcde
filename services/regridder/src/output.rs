//! JSON result documents.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use regrid::{CellRecord, FullOutput, Grid};
use serde::Serialize;

/// Shape and outcome of one regridding run.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub method: &'static str,
    pub populated: usize,
    pub columns: usize,
    pub rows: usize,
    pub layers: usize,
}

impl Summary {
    pub fn new(grid: &Grid, method: &'static str, populated: usize) -> Self {
        Self {
            method,
            populated,
            columns: grid.columns(),
            rows: grid.rows(),
            layers: grid.layers(),
        }
    }
}

/// Populated cells only.
#[derive(Debug, Serialize)]
pub struct CompactReport {
    #[serde(flatten)]
    pub summary: Summary,
    pub cells: Vec<CellRecord>,
}

/// Every cell in `row, column, layer` order.
#[derive(Debug, Serialize)]
pub struct FullReport {
    #[serde(flatten)]
    pub summary: Summary,
    #[serde(flatten)]
    pub output: FullOutput,
}

/// Serialize `report` to `path`, or standard output when absent.
pub fn write_report<T: Serialize>(report: &T, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {:?}", path))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, report)
                .with_context(|| format!("Failed to write results to {:?}", path))?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer(&mut writer, report).context("Failed to write results")?;
            writeln!(writer)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regrid::{AggregationMethod, GridDefinition, RegridConfig, Samples, BAD_VALUE};
    use test_utils::ScratchDir;

    fn populated_grid() -> Grid {
        let definition = GridDefinition::new(2, 1, 0.0, 0.0, 1.0, 1.0);
        let mut grid = Grid::new(None, &definition, RegridConfig::sequential()).unwrap();
        grid.regrid(
            AggregationMethod::Mean,
            0.0,
            &Samples::new(&[0.5], &[0.5], &[4.0]),
        )
        .unwrap();
        grid
    }

    #[test]
    fn test_compact_report_document() {
        let grid = populated_grid();
        let report = CompactReport {
            summary: Summary::new(&grid, "mean", 1),
            cells: grid.compact().unwrap().records(),
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["method"], "mean");
        assert_eq!(value["populated"], 1);
        assert_eq!(value["columns"], 2);
        assert_eq!(value["cells"].as_array().unwrap().len(), 1);
        assert_eq!(value["cells"][0]["value"], 4.0);
        assert!(value["cells"][0].get("value2").is_none());
    }

    #[test]
    fn test_full_report_to_file() {
        let grid = populated_grid();
        let report = FullReport {
            summary: Summary::new(&grid, "mean", 1),
            output: grid.full_output(),
        };

        let scratch = ScratchDir::new();
        let path = scratch.path("out.json");
        write_report(&report, Some(&path)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["data"][0], 4.0);
        assert_eq!(value["data"][1], BAD_VALUE);
        assert!(value.get("data2").is_none());
    }
}
