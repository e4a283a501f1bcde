//! Regridder command-line service.
//!
//! Reads a grid definition (YAML or JSON) and a whitespace-separated sample
//! file, aggregates the samples into grid cells and writes the result as
//! JSON to standard output or a file.
//!
//! ```text
//! regridder --grid conus.yaml --input obs.txt --method mean
//! regridder --grid hrrr.yaml --input soundings.txt --vertical --method weighted
//! regridder --grid conus.yaml --input pixels.txt --swath 400x250 --full
//! ```

mod input;
mod job;
mod output;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use projection::ProjectionSpec;
use regrid::{derive_corners, AggregationMethod, Grid, Swath};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use input::{Layout, SampleColumns};
use job::Overrides;
use output::{CompactReport, FullReport, Summary};

#[derive(Parser, Debug)]
#[command(name = "regridder")]
#[command(about = "Aggregate point, profile and swath samples onto a projected grid")]
struct Args {
    /// Grid definition file (.yaml or .json)
    #[arg(short, long)]
    grid: PathBuf,

    /// Sample file, or '-' for standard input
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Aggregation method: nearest, mean or weighted
    #[arg(short, long, default_value = "mean")]
    method: AggregationMethod,

    /// Values below this are ignored
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    minimum_valid_value: f64,

    /// Samples carry elevation and surface elevation columns
    #[arg(long, conflicts_with = "swath")]
    vertical: bool,

    /// Samples are swath pixel centers in row-major order, e.g. 400x250
    #[arg(long, value_name = "ROWSxCOLUMNS")]
    swath: Option<String>,

    /// Override the job's projection, e.g. lambert:33,45,-97,40
    #[arg(long)]
    projection: Option<ProjectionSpec>,

    /// Override the job's worker count
    #[arg(long)]
    workers: Option<usize>,

    /// Write every cell instead of only the populated ones
    #[arg(long)]
    full: bool,

    /// Output file (default: standard output)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing; stdout carries the results.
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!(grid = ?args.grid, input = ?args.input, method = %args.method, "Starting regridder");

    let job = job::load_job(&args.grid)?;
    let overrides = Overrides {
        projection: args.projection.clone(),
        workers: args.workers,
    };
    let mut grid = job::build_grid(&job, &overrides)?;

    let layout = if args.vertical {
        Layout::Profile
    } else {
        Layout::Surface
    };
    let columns = input::read_samples(&args.input, layout)?;
    info!(samples = columns.len(), "Loaded samples");

    let populated = match &args.swath {
        Some(shape) => regrid_swath(&mut grid, &args, shape, &columns)?,
        None => grid.regrid(
            args.method,
            args.minimum_valid_value,
            &columns.samples(layout),
        )?,
    };

    let method = if args.swath.is_some() {
        AggregationMethod::Weighted
    } else {
        args.method
    };
    let summary = Summary::new(&grid, method.as_str(), populated);

    info!(populated, full = args.full, "Writing results");

    if args.full {
        let report = FullReport {
            summary,
            output: grid.full_output(),
        };
        output::write_report(&report, args.output.as_deref())?;
    } else {
        let report = CompactReport {
            summary,
            cells: grid.compact()?.records(),
        };
        output::write_report(&report, args.output.as_deref())?;
    }

    Ok(())
}

/// Bin swath pixels by footprint overlap.
fn regrid_swath(
    grid: &mut Grid,
    args: &Args,
    shape: &str,
    columns: &SampleColumns,
) -> Result<usize> {
    let (rows, pixels) = input::parse_shape(shape)?;

    check_swath_shape(rows, pixels, columns.len())?;
    if columns.values2.is_some() {
        bail!("swath input carries a single value per pixel");
    }
    if args.method != AggregationMethod::Weighted {
        info!(method = %args.method, "Swath pixels are always area weighted");
    }

    let corners = derive_corners(
        rows,
        pixels,
        &columns.longitudes,
        &columns.latitudes,
        grid.config().bogus_cell_degrees,
    )?;

    let mut swath = Swath::new(&corners, &columns.values);
    if let Some(notes) = &columns.notes {
        swath = swath.with_notes(notes);
    }

    Ok(grid.regrid_swath(args.minimum_valid_value, &swath)?)
}

/// The swath shape must cover exactly the loaded pixels.
fn check_swath_shape(rows: usize, pixels: usize, samples: usize) -> Result<()> {
    let needed = rows
        .checked_mul(pixels)
        .with_context(|| format!("swath shape {rows}x{pixels} is too large"))?;
    if needed != samples {
        bail!("swath shape {rows}x{pixels} needs {needed} pixels, input has {samples}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "regridder",
            "--grid",
            "job.yaml",
            "--method",
            "weighted",
            "--minimum-valid-value",
            "-50",
            "--vertical",
        ])
        .unwrap();

        assert_eq!(args.method, AggregationMethod::Weighted);
        assert_eq!(args.minimum_valid_value, -50.0);
        assert!(args.vertical);
        assert_eq!(args.input, PathBuf::from("-"));
    }

    #[test]
    fn test_args_conflicts() {
        let result = Args::try_parse_from([
            "regridder", "--grid", "job.yaml", "--vertical", "--swath", "2x2",
        ]);
        assert!(result.is_err());

        let result = Args::try_parse_from(["regridder", "--grid", "job.yaml", "--method", "median"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_projection_argument() {
        let args = Args::try_parse_from([
            "regridder",
            "--grid",
            "job.yaml",
            "--projection",
            "lambert:33,45,-97,40",
        ])
        .unwrap();
        assert_eq!(args.projection.map(|p| p.kind()), Some("lambert"));
    }

    #[test]
    fn test_swath_shape_check() {
        assert!(check_swath_shape(2, 3, 6).is_ok());
        assert!(check_swath_shape(2, 3, 5).is_err());
        assert!(check_swath_shape(0, 3, 0).is_ok());

        let err = check_swath_shape(usize::MAX / 2 + 1, 3, 0).unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert!(check_swath_shape(usize::MAX, 2, 0).is_err());
    }
}
