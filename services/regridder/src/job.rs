//! Job file loading.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use projection::ProjectionSpec;
use regrid::{Grid, GridFile, RegridConfig};
use tracing::info;

/// Load a job description; `.json` files are read as JSON, anything else as
/// YAML.
pub fn load_job(path: &Path) -> Result<GridFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read grid definition from {:?}", path))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let job = if is_json {
        GridFile::from_json_str(&text)
            .with_context(|| format!("Failed to parse JSON grid definition {:?}", path))?
    } else {
        GridFile::from_yaml_str(&text)
            .with_context(|| format!("Failed to parse YAML grid definition {:?}", path))?
    };

    Ok(job)
}

/// Command-line adjustments applied on top of a job file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub projection: Option<ProjectionSpec>,
    pub workers: Option<usize>,
}

/// Build the grid a job describes.
pub fn build_grid(job: &GridFile, overrides: &Overrides) -> Result<Grid> {
    let spec = overrides.projection.as_ref().unwrap_or(&job.projection);
    let projector = spec
        .build()
        .with_context(|| format!("Failed to build {} projection", spec.kind()))?;

    let mut config: RegridConfig = job.config();
    if let Some(workers) = overrides.workers {
        config.workers = workers;
    }

    if let Err(e) = config.validate() {
        bail!("Invalid engine configuration: {e}");
    }

    let grid = Grid::new(projector, &job.grid, config).context("Failed to create grid")?;

    info!(
        projection = spec.kind(),
        columns = grid.columns(),
        rows = grid.rows(),
        layers = grid.layers(),
        "Grid ready"
    );

    Ok(grid)
}
