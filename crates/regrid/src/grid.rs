//! The grid: lattice geometry, vertical layering and the cell array, plus
//! the projection and aggregation passes that populate it.
//!
//! # Aggregation
//!
//! ```text
//! aggregate / regrid / regrid_swath
//!      │
//!      ├─► reset every cell (count and indices zeroed, threshold stamped)
//!      │
//!      ├─► wrap each cell in its own Mutex
//!      │
//!      ├─► split the input into one chunk per worker (rayon)
//!      │         │
//!      │         └─► per sample: locate cell(s) ─► lock ─► combine ─► unlock
//!      │
//!      ├─► unwrap the cells, run the policy's post pass
//!      │
//!      └─► number of populated cells
//! ```
//!
//! Each worker owns one [`VerticalScratch`], so recomputing a sample's layer
//! boundaries from its own surface elevation never races.

use std::sync::{Mutex, PoisonError};

use projection::Projector;
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::aggregate::{AggregationMethod, Sample};
use crate::cell::{Cell, CellSite};
use crate::config::RegridConfig;
use crate::definition::GridDefinition;
use crate::error::{try_filled, RegridError, Result};
use crate::sphere::{sphere_to_spheroid, spheroid_to_sphere};
use crate::vertical::{self, VerticalLocation, VerticalScratch, VerticalSpec};

/// Horizontal cell of a point and its offset from the cell center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HorizontalLocation {
    /// 1-based column, 0 when outside the grid.
    pub column: usize,
    /// 1-based row, 0 when outside the grid.
    pub row: usize,
    /// Offset from the cell center in [-1, 1]; ±1 is the cell edge.
    pub x_offset: f64,
    pub y_offset: f64,
}

impl HorizontalLocation {
    /// Whether the point fell inside the grid.
    pub fn is_inside(&self) -> bool {
        self.row > 0
    }
}

/// Result of [`Grid::project_xy`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedPoints {
    pub locations: Vec<HorizontalLocation>,
    /// Number of points inside the grid.
    pub gridded: usize,
}

impl ProjectedPoints {
    /// Cell-center longitude/latitude of every gridded point, for snapping
    /// output coordinates to the lattice.
    pub fn snap(&self, grid: &Grid) -> Vec<Option<(f64, f64)>> {
        self.locations
            .iter()
            .map(|location| grid.cell_center(location.column, location.row))
            .collect()
    }
}

/// Pre-projected points and their values, for [`Grid::aggregate`].
#[derive(Debug, Clone, Copy)]
pub struct PointBatch<'a> {
    pub locations: &'a [HorizontalLocation],
    /// Required on a grid with vertical layers.
    pub vertical: Option<&'a [VerticalLocation]>,
    pub values: &'a [f64],
    pub values2: Option<&'a [f64]>,
    pub notes: Option<&'a [String]>,
}

impl<'a> PointBatch<'a> {
    pub fn new(locations: &'a [HorizontalLocation], values: &'a [f64]) -> Self {
        Self {
            locations,
            vertical: None,
            values,
            values2: None,
            notes: None,
        }
    }

    pub fn with_vertical(mut self, vertical: &'a [VerticalLocation]) -> Self {
        self.vertical = Some(vertical);
        self
    }

    pub fn with_values2(mut self, values2: &'a [f64]) -> Self {
        self.values2 = Some(values2);
        self
    }

    pub fn with_notes(mut self, notes: &'a [String]) -> Self {
        self.notes = Some(notes);
        self
    }

    fn validate(&self, vertical_grid: bool) -> Result<()> {
        let count = self.values.len();
        check_len("locations", self.locations.len(), count)?;
        check_optional_len("vertical", self.vertical.map(<[_]>::len), count)?;
        check_optional_len("values2", self.values2.map(<[_]>::len), count)?;
        check_optional_len("notes", self.notes.map(<[_]>::len), count)?;

        if vertical_grid && self.vertical.is_none() {
            return Err(RegridError::invalid_input(
                "vertical locations are required on a layered grid",
            ));
        }

        Ok(())
    }
}

/// Unprojected samples, for [`Grid::regrid`].
#[derive(Debug, Clone, Copy)]
pub struct Samples<'a> {
    /// WGS84 longitudes (degrees).
    pub longitudes: &'a [f64],
    /// WGS84 latitudes (degrees).
    pub latitudes: &'a [f64],
    /// Sample elevations (m AMSL); required on a layered grid.
    pub elevations: Option<&'a [f64]>,
    /// Terrain height under each sample (m AMSL).
    pub surface_elevations: Option<&'a [f64]>,
    pub values: &'a [f64],
    pub values2: Option<&'a [f64]>,
    pub notes: Option<&'a [String]>,
}

impl<'a> Samples<'a> {
    pub fn new(longitudes: &'a [f64], latitudes: &'a [f64], values: &'a [f64]) -> Self {
        Self {
            longitudes,
            latitudes,
            elevations: None,
            surface_elevations: None,
            values,
            values2: None,
            notes: None,
        }
    }

    /// Sample elevations, with the terrain height under each sample used to
    /// derive that sample's own layer boundaries.
    pub fn with_elevations(mut self, elevations: &'a [f64], surface_elevations: &'a [f64]) -> Self {
        self.elevations = Some(elevations);
        self.surface_elevations = Some(surface_elevations);
        self
    }

    /// Sample elevations located against the grid's sea-level boundaries.
    pub fn with_elevations_only(mut self, elevations: &'a [f64]) -> Self {
        self.elevations = Some(elevations);
        self
    }

    pub fn with_values2(mut self, values2: &'a [f64]) -> Self {
        self.values2 = Some(values2);
        self
    }

    pub fn with_notes(mut self, notes: &'a [String]) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn validate(&self, vertical_grid: bool) -> Result<()> {
        let count = self.values.len();
        check_len("longitudes", self.longitudes.len(), count)?;
        check_len("latitudes", self.latitudes.len(), count)?;
        check_optional_len("elevations", self.elevations.map(<[_]>::len), count)?;
        check_optional_len(
            "surface_elevations",
            self.surface_elevations.map(<[_]>::len),
            count,
        )?;
        check_optional_len("values2", self.values2.map(<[_]>::len), count)?;
        check_optional_len("notes", self.notes.map(<[_]>::len), count)?;

        if vertical_grid && self.elevations.is_none() {
            return Err(RegridError::invalid_input(
                "elevations are required on a layered grid",
            ));
        }

        Ok(())
    }
}

fn check_len(name: &str, len: usize, expected: usize) -> Result<()> {
    if len == expected {
        Ok(())
    } else {
        Err(RegridError::invalid_input(format!(
            "{name} has {len} entries, expected {expected}"
        )))
    }
}

fn check_optional_len(name: &str, len: Option<usize>, expected: usize) -> Result<()> {
    len.map_or(Ok(()), |len| check_len(name, len, expected))
}

fn check_range(name: &str, first: usize, last: usize, extent: usize) -> Result<()> {
    if first >= 1 && first <= last && last <= extent {
        Ok(())
    } else {
        Err(RegridError::invalid_subset(format!(
            "{name} range [{first}, {last}] is not within [1, {extent}]"
        )))
    }
}

/// 1-based bin and [-1, 1] center offset of `distance` along one axis.
fn bin(distance: f64, size: f64, count: usize) -> (usize, f64) {
    let position = distance / size;
    let index = position.floor();

    // The far edge belongs to the last cell.
    if index >= count as f64 {
        return (count, 1.0);
    }

    let fraction = position - index;
    (index as usize + 1, (2.0 * fraction - 1.0).clamp(-1.0, 1.0))
}

/// Where one input lands: the cell index plus what to combine into it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Contribution<'a> {
    pub cell: usize,
    pub site: CellSite,
    pub sample: Sample<'a>,
}

/// A regular lattice in a cartographic projection, with optional vertical
/// layers, holding one aggregation cell per lattice point.
#[derive(Debug, Clone)]
pub struct Grid {
    pub(crate) columns: usize,
    pub(crate) rows: usize,
    /// Lattice layers; 1 on a 2D grid.
    pub(crate) layers: usize,
    /// Whether the caller asked for vertical layers.
    pub(crate) vertical: bool,
    pub(crate) west_edge: f64,
    pub(crate) south_edge: f64,
    pub(crate) cell_width: f64,
    pub(crate) cell_height: f64,
    pub(crate) projector: Option<Box<dyn Projector>>,
    pub(crate) vertical_spec: VerticalSpec,
    pub(crate) config: RegridConfig,
    /// Cell-center longitudes, `rows * columns`.
    pub(crate) longitudes: Vec<f64>,
    /// Cell-center latitudes on the WGS84 spheroid, `rows * columns`.
    pub(crate) latitudes: Vec<f64>,
    /// Layer boundaries for a sea-level surface, `layers + 1`.
    pub(crate) z: Vec<f64>,
    /// One per worker.
    pub(crate) scratch: Vec<VerticalScratch>,
    /// `rows * columns * layers`.
    pub(crate) cells: Vec<Cell>,
    pub(crate) method: AggregationMethod,
    pub(crate) has_data2: bool,
}

impl Grid {
    /// Build a grid. The projector is moved into the grid; `None` means the
    /// lattice is defined directly in longitude/latitude degrees.
    pub fn new(
        projector: Option<Box<dyn Projector>>,
        definition: &GridDefinition,
        config: RegridConfig,
    ) -> Result<Self> {
        config.validate().map_err(RegridError::InvalidConfig)?;

        if let Some(projector) = &projector {
            if !projector.invariant() {
                return Err(RegridError::invalid_grid(format!(
                    "{} projector is not valid",
                    projector.name()
                )));
            }
        }

        definition.validate(projector.is_some())?;

        let vertical = definition.vertical.is_some();
        let vertical_spec = definition
            .vertical
            .clone()
            .unwrap_or_else(VerticalSpec::trivial);
        let layers = vertical_spec.layers();
        let points = definition.columns * definition.rows;

        let mut z = try_filled(layers + 1, 0.0, "layer boundaries")?;
        vertical_spec.elevations(0.0, &mut z);

        if !vertical::is_strictly_increasing(&z) {
            return Err(RegridError::invalid_vertical(format!(
                "layer boundaries are not increasing: {z:?}"
            )));
        }

        let longitudes = try_filled(points, 0.0, "cell-center longitudes")?;
        let latitudes = try_filled(points, 0.0, "cell-center latitudes")?;
        let scratch = try_filled(
            config.workers,
            VerticalScratch::new(z.clone()),
            "vertical scratch buffers",
        )?;
        let cells = try_filled(points * layers, Cell::default(), "cells")?;

        let mut grid = Self {
            columns: definition.columns,
            rows: definition.rows,
            layers,
            vertical,
            west_edge: definition.west_edge,
            south_edge: definition.south_edge,
            cell_width: definition.cell_width,
            cell_height: definition.cell_height,
            projector,
            vertical_spec,
            config,
            longitudes,
            latitudes,
            z,
            scratch,
            cells,
            method: AggregationMethod::default(),
            has_data2: false,
        };

        grid.compute_cell_centers();

        info!(
            columns = grid.columns,
            rows = grid.rows,
            layers = if vertical { layers } else { 0 },
            projection = grid.projector.as_ref().map_or("lonlat", |p| p.name()),
            workers = grid.config.workers,
            "created grid"
        );

        Ok(grid)
    }

    /// Fill the cell-center longitude/latitude cache.
    fn compute_cell_centers(&mut self) {
        let columns = self.columns;
        let (west, south) = (self.west_edge, self.south_edge);
        let (width, height) = (self.cell_width, self.cell_height);
        let projector = self.projector.as_deref();
        let sphere = self.uses_sphere();

        self.longitudes
            .par_chunks_mut(columns)
            .zip(self.latitudes.par_chunks_mut(columns))
            .enumerate()
            .for_each(|(row, (longitudes, latitudes))| {
                let y = south + (row as f64 + 0.5) * height;

                for column in 0..columns {
                    let x = west + (column as f64 + 0.5) * width;

                    let (longitude, latitude) = match projector {
                        Some(projector) => {
                            let (longitude, latitude) = projector.unproject(x, y);
                            if sphere {
                                (longitude, sphere_to_spheroid(latitude))
                            } else {
                                (longitude, latitude)
                            }
                        }
                        // Lattice latitudes are spherical, like projected input.
                        None => (x, sphere_to_spheroid(y)),
                    };

                    longitudes[column] = longitude;
                    latitudes[column] = latitude;
                }
            });
    }

    /// A new grid over a contiguous 1-based, inclusive sub-range of this
    /// one's layers, rows and columns. The projector is cloned.
    pub fn subset(
        &self,
        first_layer: usize,
        last_layer: usize,
        first_row: usize,
        last_row: usize,
        first_column: usize,
        last_column: usize,
    ) -> Result<Self> {
        check_range("layer", first_layer, last_layer, self.layers)?;
        check_range("row", first_row, last_row, self.rows)?;
        check_range("column", first_column, last_column, self.columns)?;

        let mut definition = GridDefinition::new(
            last_column - first_column + 1,
            last_row - first_row + 1,
            self.west_edge + (first_column - 1) as f64 * self.cell_width,
            self.south_edge + (first_row - 1) as f64 * self.cell_height,
            self.cell_width,
            self.cell_height,
        );

        if self.vertical {
            let mut spec = self.vertical_spec.clone();
            spec.levels = spec.levels[first_layer - 1..=last_layer].to_vec();
            definition.vertical = Some(spec);
        }

        debug!(
            first_layer,
            last_layer, first_row, last_row, first_column, last_column, "subsetting grid"
        );

        Self::new(self.projector.clone(), &definition, self.config.clone())
    }

    /// Duplicate the grid, cells included, reporting allocation failure.
    pub fn try_clone(&self) -> Result<Self> {
        let mut grid = Self::new(self.projector.clone(), &self.definition(), self.config.clone())?;
        grid.cells.clone_from_slice(&self.cells);
        grid.method = self.method;
        grid.has_data2 = self.has_data2;
        Ok(grid)
    }

    /// The definition this grid was built from.
    pub fn definition(&self) -> GridDefinition {
        GridDefinition {
            columns: self.columns,
            rows: self.rows,
            west_edge: self.west_edge,
            south_edge: self.south_edge,
            cell_width: self.cell_width,
            cell_height: self.cell_height,
            vertical: self.vertical.then(|| self.vertical_spec.clone()),
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Lattice layers (1 on a 2D grid).
    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Whether the grid was built with vertical layers.
    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    pub fn west_edge(&self) -> f64 {
        self.west_edge
    }

    pub fn south_edge(&self) -> f64 {
        self.south_edge
    }

    pub fn east_edge(&self) -> f64 {
        self.west_edge + self.columns as f64 * self.cell_width
    }

    pub fn north_edge(&self) -> f64 {
        self.south_edge + self.rows as f64 * self.cell_height
    }

    pub fn cell_width(&self) -> f64 {
        self.cell_width
    }

    pub fn cell_height(&self) -> f64 {
        self.cell_height
    }

    pub fn projector(&self) -> Option<&dyn Projector> {
        self.projector.as_deref()
    }

    pub fn vertical_spec(&self) -> &VerticalSpec {
        &self.vertical_spec
    }

    pub fn config(&self) -> &RegridConfig {
        &self.config
    }

    /// Layer boundaries (m AMSL) for a sea-level surface.
    pub fn z(&self) -> &[f64] {
        &self.z
    }

    /// Cell-center longitudes, row-major.
    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    /// Cell-center latitudes, row-major.
    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    /// All cells in `row, column, layer` order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Policy of the last aggregation call.
    pub fn method(&self) -> AggregationMethod {
        self.method
    }

    /// Linear index of 0-based `(row, column, layer)`.
    #[inline]
    pub fn index(&self, row: usize, column: usize, layer: usize) -> usize {
        row * self.columns * self.layers + column * self.layers + layer
    }

    /// The cell at 1-based `(column, row, layer)`.
    pub fn cell(&self, column: usize, row: usize, layer: usize) -> Option<&Cell> {
        if column == 0 || row == 0 || layer == 0 {
            return None;
        }
        if column > self.columns || row > self.rows || layer > self.layers {
            return None;
        }
        self.cells.get(self.index(row - 1, column - 1, layer - 1))
    }

    /// Cell-center longitude/latitude of 1-based `(column, row)`.
    pub fn cell_center(&self, column: usize, row: usize) -> Option<(f64, f64)> {
        if column == 0 || row == 0 || column > self.columns || row > self.rows {
            return None;
        }
        let point = (row - 1) * self.columns + column - 1;
        Some((self.longitudes[point], self.latitudes[point]))
    }

    /// Whether input latitudes need the spheroid-to-sphere correction.
    fn uses_sphere(&self) -> bool {
        self.projector
            .as_ref()
            .map_or(true, |projector| projector.ellipsoid().is_sphere())
    }

    /// Project a WGS84 longitude/latitude into the grid's plane.
    pub fn project_point(&self, longitude: f64, latitude: f64) -> (f64, f64) {
        let latitude = if self.uses_sphere() {
            spheroid_to_sphere(latitude)
        } else {
            latitude
        };

        match &self.projector {
            Some(projector) => projector.project(longitude, latitude),
            None => (longitude, latitude),
        }
    }

    /// Cell and center offset of a point already in the grid's plane.
    pub fn locate_xy(&self, x: f64, y: f64) -> HorizontalLocation {
        let inside = x >= self.west_edge
            && x <= self.east_edge()
            && y >= self.south_edge
            && y <= self.north_edge();

        if !inside {
            return HorizontalLocation::default();
        }

        let (column, x_offset) = bin(x - self.west_edge, self.cell_width, self.columns);
        let (row, y_offset) = bin(y - self.south_edge, self.cell_height, self.rows);

        HorizontalLocation {
            column,
            row,
            x_offset,
            y_offset,
        }
    }

    /// Cell and center offset of a WGS84 longitude/latitude.
    pub fn locate(&self, longitude: f64, latitude: f64) -> HorizontalLocation {
        let (x, y) = self.project_point(longitude, latitude);
        self.locate_xy(x, y)
    }

    /// Project WGS84 points onto the lattice.
    pub fn project_xy(&self, longitudes: &[f64], latitudes: &[f64]) -> Result<ProjectedPoints> {
        check_len("latitudes", latitudes.len(), longitudes.len())?;

        let locations: Vec<HorizontalLocation> = longitudes
            .par_iter()
            .zip(latitudes.par_iter())
            .map(|(&longitude, &latitude)| self.locate(longitude, latitude))
            .collect();

        let gridded = locations.iter().filter(|location| location.is_inside()).count();

        debug!(points = locations.len(), gridded, "projected points");

        Ok(ProjectedPoints { locations, gridded })
    }

    /// Layer and in-layer offset of each elevation (m AMSL) against the
    /// grid's sea-level boundaries.
    pub fn project_z(&self, elevations: &[f64]) -> Result<Vec<VerticalLocation>> {
        if !self.vertical {
            return Err(RegridError::NotVertical);
        }

        Ok(elevations
            .par_iter()
            .map(|&elevation| vertical::locate(&self.z, elevation))
            .collect())
    }

    /// Reset every cell for a new aggregation run.
    fn reset(&mut self, minimum_valid_value: f64) {
        self.cells
            .par_iter_mut()
            .for_each(|cell| cell.reset(minimum_valid_value));
    }

    /// Number of cells holding an aggregate.
    pub fn populated(&self) -> usize {
        self.cells.par_iter().filter(|cell| cell.is_populated()).count()
    }

    /// Build the contribution of one point sample.
    pub(crate) fn point_contribution<'a>(
        &self,
        horizontal: HorizontalLocation,
        vertical: VerticalLocation,
        z: &[f64],
        surface_elevation: f64,
        mut sample: Sample<'a>,
    ) -> Contribution<'a> {
        let (column, row) = (horizontal.column - 1, horizontal.row - 1);
        let point = row * self.columns + column;

        let (layer, z_offset, elevation) = if self.vertical {
            let layer = vertical.layer - 1;
            (layer, vertical.offset, 0.5 * (z[layer] + z[layer + 1]))
        } else {
            (0, 0.0, 0.0)
        };

        let radius = (horizontal.x_offset * horizontal.x_offset
            + horizontal.y_offset * horizontal.y_offset
            + z_offset * z_offset)
            .max(self.config.minimum_radius);

        sample.radius = radius;
        sample.weight = 1.0 / radius;

        Contribution {
            cell: self.index(row, column, layer),
            site: CellSite {
                column: column + 1,
                row: row + 1,
                layer: layer + 1,
                longitude: self.longitudes[point],
                latitude: self.latitudes[point],
                elevation,
                surface_elevation,
            },
            sample,
        }
    }

    /// Run one aggregation pass.
    ///
    /// `contribute` is called once per input index with the worker's scratch
    /// buffer and pushes zero or more contributions; each is combined under
    /// its cell's lock.
    pub(crate) fn run<'a, F>(
        &mut self,
        method: AggregationMethod,
        minimum_valid_value: f64,
        count: usize,
        has_data2: bool,
        contribute: F,
    ) -> Result<usize>
    where
        F: Fn(&Grid, usize, &mut VerticalScratch, &mut Vec<Contribution<'a>>) + Sync,
    {
        self.reset(minimum_valid_value);
        self.method = method;
        self.has_data2 = has_data2;

        let mut locked: Vec<Mutex<Cell>> = Vec::new();
        if locked.try_reserve_exact(self.cells.len()).is_err() {
            error!(cells = self.cells.len(), "failed to allocate cell locks");
            return Err(RegridError::Allocation {
                what: "cell locks",
                count: self.cells.len(),
            });
        }
        locked.extend(std::mem::take(&mut self.cells).into_iter().map(Mutex::new));

        let mut scratch = std::mem::take(&mut self.scratch);
        let chunk = count.div_ceil(scratch.len().max(1)).max(1);

        {
            let grid = &*self;
            let cells = &locked;
            let contribute = &contribute;

            scratch
                .par_iter_mut()
                .enumerate()
                .for_each(|(worker, buffer)| {
                    let start = (worker * chunk).min(count);
                    let end = (start + chunk).min(count);
                    let mut contributions = Vec::new();

                    for index in start..end {
                        contribute(grid, index, buffer, &mut contributions);

                        for contribution in contributions.drain(..) {
                            let mut cell = cells[contribution.cell]
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner);
                            method.combine(&mut cell, &contribution.site, &contribution.sample);
                        }
                    }
                });
        }

        self.scratch = scratch;
        self.cells = locked
            .into_iter()
            .map(|cell| cell.into_inner().unwrap_or_else(PoisonError::into_inner))
            .collect();

        self.cells
            .par_iter_mut()
            .filter(|cell| cell.is_populated())
            .for_each(|cell| method.finish(cell));

        let populated = self.populated();

        if count > 0 && populated == 0 {
            warn!(count, %method, "no input landed in the grid");
        }

        debug!(count, populated, %method, "aggregated");

        Ok(populated)
    }

    /// Aggregate pre-projected points (see [`Grid::project_xy`] and
    /// [`Grid::project_z`]). Several variables can share one projection
    /// pass this way.
    ///
    /// Returns the number of populated cells.
    pub fn aggregate(
        &mut self,
        method: AggregationMethod,
        minimum_valid_value: f64,
        batch: &PointBatch<'_>,
    ) -> Result<usize> {
        batch.validate(self.vertical)?;

        let surface = VerticalLocation {
            layer: 1,
            offset: 0.0,
        };

        self.run(
            method,
            minimum_valid_value,
            batch.values.len(),
            batch.values2.is_some(),
            |grid, index, _scratch, out| {
                let value = batch.values[index];
                let horizontal = batch.locations[index];

                if !(value >= minimum_valid_value) || !horizontal.is_inside() {
                    return;
                }

                let vertical = match batch.vertical {
                    Some(vertical) if grid.vertical => vertical[index],
                    _ => surface,
                };

                if !vertical.is_inside() || vertical.layer > grid.layers {
                    return;
                }

                if horizontal.column > grid.columns || horizontal.row > grid.rows {
                    return;
                }

                let sample = Sample {
                    index,
                    value,
                    value2: batch.values2.map_or(0.0, |values2| values2[index]),
                    radius: 0.0,
                    weight: 0.0,
                    note: batch.notes.map(|notes| notes[index].as_str()),
                };

                out.push(grid.point_contribution(horizontal, vertical, &grid.z, 0.0, sample));
            },
        )
    }

    /// Project and aggregate one variable.
    ///
    /// On a layered grid every sample is placed in the vertical column
    /// derived from its own surface elevation. A worker reuses the column it
    /// derived last while the surface elevation stays within
    /// [`RegridConfig::surface_elevation_tolerance`] of it, so layer
    /// assignment only matches across worker counts when that tolerance
    /// is zero.
    ///
    /// Returns the number of populated cells.
    pub fn regrid(
        &mut self,
        method: AggregationMethod,
        minimum_valid_value: f64,
        samples: &Samples<'_>,
    ) -> Result<usize> {
        samples.validate(self.vertical)?;

        let tolerance = self.config.surface_elevation_tolerance;
        let surface = VerticalLocation {
            layer: 1,
            offset: 0.0,
        };

        self.run(
            method,
            minimum_valid_value,
            samples.len(),
            samples.values2.is_some(),
            |grid, index, scratch, out| {
                let value = samples.values[index];

                if !(value >= minimum_valid_value) {
                    return;
                }

                let horizontal = grid.locate(samples.longitudes[index], samples.latitudes[index]);

                if !horizontal.is_inside() {
                    return;
                }

                let surface_elevation = samples
                    .surface_elevations
                    .map_or(0.0, |surfaces| surfaces[index]);

                let sample = Sample {
                    index,
                    value,
                    value2: samples.values2.map_or(0.0, |values2| values2[index]),
                    radius: 0.0,
                    weight: 0.0,
                    note: samples.notes.map(|notes| notes[index].as_str()),
                };

                match samples.elevations.filter(|_| grid.vertical) {
                    Some(elevations) => {
                        let z = match samples.surface_elevations {
                            Some(_) => scratch.boundaries(
                                &grid.vertical_spec,
                                surface_elevation,
                                tolerance,
                            ),
                            None => &grid.z[..],
                        };

                        let vertical = vertical::locate(z, elevations[index]);

                        if vertical.is_inside() {
                            out.push(grid.point_contribution(
                                horizontal,
                                vertical,
                                z,
                                surface_elevation,
                                sample,
                            ));
                        }
                    }
                    None => {
                        out.push(grid.point_contribution(
                            horizontal,
                            surface,
                            &grid.z,
                            surface_elevation,
                            sample,
                        ));
                    }
                }
            },
        )
    }
}
