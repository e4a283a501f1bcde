//! Satellite swath support: deriving pixel footprints from pixel centers and
//! binning each footprint into the grid by overlap area.
//!
//! A footprint is the quadrilateral whose corners sit halfway between a
//! pixel center and its neighbors:
//!
//! ```text
//!   3 ─────────── 2        corner 0: (row - ½, column - ½)
//!   │             │        corner 1: (row - ½, column + ½)
//!   │   center    │        corner 2: (row + ½, column + ½)
//!   │             │        corner 3: (row + ½, column - ½)
//!   0 ─────────── 1
//! ```
//!
//! Each corner is the mean of the four surrounding centers. Along the swath
//! border, missing neighbors are linearly extrapolated from the two nearest
//! centers of the same row or column.

use rayon::prelude::*;
use tracing::debug;

use crate::aggregate::{AggregationMethod, Sample};
use crate::cell::CellSite;
use crate::error::{RegridError, Result};
use crate::grid::{Contribution, Grid};

/// Footprint area (in cells²) below which a footprint is binned as a point.
const DEGENERATE_AREA: f64 = 1e-12;

/// Weight of a footprint binned as a point.
const DEGENERATE_WEIGHT: f64 = 1e-6;

/// The four footprint corners of every pixel in a swath.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwathCorners {
    /// Corner longitudes, indexed `[corner][pixel]`.
    pub longitudes: [Vec<f64>; 4],
    /// Corner latitudes, indexed `[corner][pixel]`.
    pub latitudes: [Vec<f64>; 4],
}

impl SwathCorners {
    /// Use footprint corners supplied with the data.
    pub fn from_corners(longitudes: [Vec<f64>; 4], latitudes: [Vec<f64>; 4]) -> Result<Self> {
        let len = longitudes[0].len();

        if longitudes.iter().chain(latitudes.iter()).any(|c| c.len() != len) {
            return Err(RegridError::invalid_input(
                "every corner array must have one entry per pixel",
            ));
        }

        Ok(Self {
            longitudes,
            latitudes,
        })
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.longitudes[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Longitudes and latitudes of the corners of one pixel.
    pub fn corners(&self, pixel: usize) -> [(f64, f64); 4] {
        std::array::from_fn(|corner| {
            (
                self.longitudes[corner][pixel],
                self.latitudes[corner][pixel],
            )
        })
    }
}

/// Shift `longitude` by whole turns to within 180° of `reference`.
fn unwrap_longitude(longitude: f64, reference: f64) -> f64 {
    let delta = longitude - reference;
    if delta > 180.0 {
        longitude - 360.0
    } else if delta < -180.0 {
        longitude + 360.0
    } else {
        longitude
    }
}

/// Pixel centers of a `rows x columns` swath, with out-of-range neighbors
/// extrapolated.
struct CenterField<'a> {
    rows: usize,
    columns: usize,
    longitudes: &'a [f64],
    latitudes: &'a [f64],
}

impl CenterField<'_> {
    fn center(&self, row: usize, column: usize, reference: f64) -> (f64, f64) {
        let pixel = row * self.columns + column;
        (
            unwrap_longitude(self.longitudes[pixel], reference),
            self.latitudes[pixel],
        )
    }

    /// Edge index and its inward neighbor for a possibly out-of-range index.
    fn anchors(index: isize, extent: usize) -> (usize, usize) {
        let last = extent - 1;
        if index < 0 {
            (0, 1.min(last))
        } else if index as usize > last {
            (last, last.saturating_sub(1))
        } else {
            (index as usize, index as usize)
        }
    }

    /// Center at `(row, column)`, extrapolated by one step past the border.
    fn extended(&self, row: isize, column: isize, reference: f64) -> (f64, f64) {
        let (row0, row1) = Self::anchors(row, self.rows);
        let (column0, column1) = Self::anchors(column, self.columns);

        let along_row = |column: usize| {
            let (lon0, lat0) = self.center(row0, column, reference);
            if row0 == row1 {
                (lon0, lat0)
            } else {
                let (lon1, lat1) = self.center(row1, column, reference);
                (2.0 * lon0 - lon1, 2.0 * lat0 - lat1)
            }
        };

        let (lon0, lat0) = along_row(column0);
        if column0 == column1 {
            (lon0, lat0)
        } else {
            let (lon1, lat1) = along_row(column1);
            (2.0 * lon0 - lon1, 2.0 * lat0 - lat1)
        }
    }

    fn footprint(&self, row: usize, column: usize, bogus_degrees: f64) -> [(f64, f64); 4] {
        let pixel = row * self.columns + column;
        let (center_lon, center_lat) = (self.longitudes[pixel], self.latitudes[pixel]);
        let collapsed = [(center_lon, center_lat); 4];

        if !center_lon.is_finite() || !center_lat.is_finite() {
            return collapsed;
        }

        let (r, c) = (row as isize, column as isize);
        // Row/column steps from the center to the four neighbors sharing a corner.
        let quadrants: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, 1), (1, -1)];
        let mut corners = collapsed;

        for (corner, (dr, dc)) in corners.iter_mut().zip(quadrants) {
            let neighbors = [(r, c), (r + dr, c), (r, c + dc), (r + dr, c + dc)];
            let (mut lon, mut lat) = (0.0, 0.0);

            for (nr, nc) in neighbors {
                let (nlon, nlat) = self.extended(nr, nc, center_lon);
                lon += nlon;
                lat += nlat;
            }

            let (lon, lat) = (0.25 * lon, 0.25 * lat);

            if !lon.is_finite()
                || !lat.is_finite()
                || (lon - center_lon).abs() > bogus_degrees
                || (lat - center_lat).abs() > bogus_degrees
            {
                return collapsed;
            }

            *corner = (lon, lat.clamp(-90.0, 90.0));
        }

        corners
    }
}

/// Derive footprint corners from the row-major pixel centers of a
/// `rows x columns` swath.
///
/// A pixel whose corners would lie more than `bogus_degrees` from its
/// center, or whose neighborhood holds non-finite coordinates, gets all four
/// corners collapsed onto its center.
pub fn derive_corners(
    rows: usize,
    columns: usize,
    longitudes: &[f64],
    latitudes: &[f64],
    bogus_degrees: f64,
) -> Result<SwathCorners> {
    let pixels = rows.checked_mul(columns).ok_or_else(|| {
        RegridError::invalid_input(format!("{rows} x {columns} swath overflows"))
    })?;

    if rows == 0 || columns == 0 {
        return Err(RegridError::invalid_input("swath must have rows and columns"));
    }

    if longitudes.len() != pixels || latitudes.len() != pixels {
        return Err(RegridError::invalid_input(format!(
            "{rows} x {columns} swath needs {pixels} centers, got {} longitudes and {} latitudes",
            longitudes.len(),
            latitudes.len()
        )));
    }

    let field = CenterField {
        rows,
        columns,
        longitudes,
        latitudes,
    };

    let footprints: Vec<[(f64, f64); 4]> = (0..pixels)
        .into_par_iter()
        .map(|pixel| field.footprint(pixel / columns, pixel % columns, bogus_degrees))
        .collect();

    let mut corners = SwathCorners {
        longitudes: std::array::from_fn(|_| Vec::with_capacity(pixels)),
        latitudes: std::array::from_fn(|_| Vec::with_capacity(pixels)),
    };

    for footprint in &footprints {
        for (corner, &(lon, lat)) in footprint.iter().enumerate() {
            corners.longitudes[corner].push(lon);
            corners.latitudes[corner].push(lat);
        }
    }

    debug!(rows, columns, "derived swath corners");

    Ok(corners)
}

/// A swath of pixel values with their footprints.
#[derive(Debug, Clone, Copy)]
pub struct Swath<'a> {
    pub corners: &'a SwathCorners,
    pub values: &'a [f64],
    pub notes: Option<&'a [String]>,
}

impl<'a> Swath<'a> {
    pub fn new(corners: &'a SwathCorners, values: &'a [f64]) -> Self {
        Self {
            corners,
            values,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: &'a [String]) -> Self {
        self.notes = Some(notes);
        self
    }

    fn validate(&self) -> Result<()> {
        let count = self.values.len();

        if self.corners.len() != count {
            return Err(RegridError::invalid_input(format!(
                "{} footprints for {count} values",
                self.corners.len()
            )));
        }

        if self.notes.is_some_and(|notes| notes.len() != count) {
            return Err(RegridError::invalid_input("notes must have one entry per value"));
        }

        Ok(())
    }
}

/// Shoelace area of a simple polygon.
fn polygon_area(polygon: &[(f64, f64)]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }

    let twice: f64 = (0..n)
        .map(|i| {
            let (x0, y0) = polygon[i];
            let (x1, y1) = polygon[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum();

    0.5 * twice.abs()
}

/// Clip `polygon` to the half plane where `inside` holds, writing into `out`.
fn clip_half_plane(
    polygon: &[(f64, f64)],
    out: &mut Vec<(f64, f64)>,
    inside: impl Fn((f64, f64)) -> bool,
    intersect: impl Fn((f64, f64), (f64, f64)) -> (f64, f64),
) {
    out.clear();
    let n = polygon.len();

    for i in 0..n {
        let current = polygon[i];
        let previous = polygon[(i + n - 1) % n];

        match (inside(previous), inside(current)) {
            (true, true) => out.push(current),
            (true, false) => out.push(intersect(previous, current)),
            (false, true) => {
                out.push(intersect(previous, current));
                out.push(current);
            }
            (false, false) => {}
        }
    }
}

/// Overlap area of `quad` with the unit square `[column, column + 1] x
/// [row, row + 1]`.
fn overlap_area(quad: &[(f64, f64); 4], column: f64, row: f64) -> f64 {
    let mut a: Vec<(f64, f64)> = quad.to_vec();
    let mut b = Vec::with_capacity(8);

    let at_x = |edge: f64| {
        move |p: (f64, f64), q: (f64, f64)| {
            let t = (edge - p.0) / (q.0 - p.0);
            (edge, p.1 + t * (q.1 - p.1))
        }
    };
    let at_y = |edge: f64| {
        move |p: (f64, f64), q: (f64, f64)| {
            let t = (edge - p.1) / (q.1 - p.1);
            (p.0 + t * (q.0 - p.0), edge)
        }
    };

    let (left, right, bottom, top) = (column, column + 1.0, row, row + 1.0);

    clip_half_plane(&a, &mut b, |p| p.0 >= left, at_x(left));
    clip_half_plane(&b, &mut a, |p| p.0 <= right, at_x(right));
    clip_half_plane(&a, &mut b, |p| p.1 >= bottom, at_y(bottom));
    clip_half_plane(&b, &mut a, |p| p.1 <= top, at_y(top));

    polygon_area(&a)
}

impl Grid {
    /// Bin a swath by footprint overlap: every pixel contributes its value to
    /// each cell its footprint overlaps, weighted by the overlap area.
    /// Collapsed footprints are binned at their center with a tiny weight.
    ///
    /// Swath values land in the first layer of a layered grid. Returns the
    /// number of populated cells.
    pub fn regrid_swath(&mut self, minimum_valid_value: f64, swath: &Swath<'_>) -> Result<usize> {
        swath.validate()?;

        let (columns, rows) = (self.columns as f64, self.rows as f64);

        self.run(
            AggregationMethod::Weighted,
            minimum_valid_value,
            swath.values.len(),
            false,
            |grid, index, _scratch, out| {
                let value = swath.values[index];

                if !(value >= minimum_valid_value) {
                    return;
                }

                // Footprint in lattice units: cell (c, r) spans [c, c+1] x [r, r+1].
                let mut quad = [(0.0, 0.0); 4];
                for (vertex, (longitude, latitude)) in
                    quad.iter_mut().zip(swath.corners.corners(index))
                {
                    let (x, y) = grid.project_point(longitude, latitude);
                    if !x.is_finite() || !y.is_finite() {
                        return;
                    }
                    *vertex = (
                        (x - grid.west_edge) / grid.cell_width,
                        (y - grid.south_edge) / grid.cell_height,
                    );
                }

                let note = swath.notes.map(|notes| notes[index].as_str());
                let area = polygon_area(&quad);

                if area <= DEGENERATE_AREA {
                    let (u, v) = quad[0];
                    if u >= 0.0 && u <= columns && v >= 0.0 && v <= rows {
                        let column = (u.floor() as usize).min(grid.columns - 1);
                        let row = (v.floor() as usize).min(grid.rows - 1);
                        out.push(grid.swath_contribution(
                            row,
                            column,
                            (u, v),
                            DEGENERATE_WEIGHT,
                            Sample::of_value(index, value, note),
                        ));
                    }
                    return;
                }

                let (mut u_min, mut u_max) = (f64::INFINITY, f64::NEG_INFINITY);
                let (mut v_min, mut v_max) = (f64::INFINITY, f64::NEG_INFINITY);
                for &(u, v) in &quad {
                    u_min = u_min.min(u);
                    u_max = u_max.max(u);
                    v_min = v_min.min(v);
                    v_max = v_max.max(v);
                }

                if u_max <= 0.0 || u_min >= columns || v_max <= 0.0 || v_min >= rows {
                    return;
                }

                let first_column = u_min.max(0.0).floor() as usize;
                let last_column = (u_max.min(columns).ceil() as usize).min(grid.columns);
                let first_row = v_min.max(0.0).floor() as usize;
                let last_row = (v_max.min(rows).ceil() as usize).min(grid.rows);
                let centroid = (
                    0.25 * quad.iter().map(|p| p.0).sum::<f64>(),
                    0.25 * quad.iter().map(|p| p.1).sum::<f64>(),
                );

                for row in first_row..last_row {
                    for column in first_column..last_column {
                        let overlap = overlap_area(&quad, column as f64, row as f64);
                        if overlap > 0.0 {
                            out.push(grid.swath_contribution(
                                row,
                                column,
                                centroid,
                                overlap,
                                Sample::of_value(index, value, note),
                            ));
                        }
                    }
                }
            },
        )
    }

    /// Contribution of a footprint to 0-based `(row, column)` in layer 1.
    fn swath_contribution<'a>(
        &self,
        row: usize,
        column: usize,
        (u, v): (f64, f64),
        weight: f64,
        mut sample: Sample<'a>,
    ) -> Contribution<'a> {
        let point = row * self.columns + column;
        let (du, dv) = (2.0 * (u - column as f64) - 1.0, 2.0 * (v - row as f64) - 1.0);

        sample.radius = (du * du + dv * dv).max(self.config.minimum_radius);
        sample.weight = weight;

        Contribution {
            cell: self.index(row, column, 0),
            site: CellSite {
                column: column + 1,
                row: row + 1,
                layer: 1,
                longitude: self.longitudes[point],
                latitude: self.latitudes[point],
                elevation: if self.vertical {
                    0.5 * (self.z[0] + self.z[1])
                } else {
                    0.0
                },
                surface_elevation: 0.0,
            },
            sample,
        }
    }
}
