//! Regridding engine: projects scattered point, profile and swath samples
//! onto a regular 2D or 3D lattice and aggregates them per cell.
//!
//! # Overview
//!
//! A [`Grid`] pairs a horizontal lattice in some cartographic projection
//! (any [`projection::Projector`], or none for plain longitude/latitude)
//! with optional vertical layers described by a [`VerticalSpec`]. Samples
//! are binned into cells and combined by an [`AggregationMethod`]; the
//! populated cells can then be gathered into dense arrays with
//! [`Grid::compact`].
//!
//! # Example
//!
//! ```
//! use regrid::{AggregationMethod, Grid, GridDefinition, RegridConfig, Samples};
//!
//! let definition = GridDefinition::new(3, 3, -2.0, -2.0, 1.0, 1.0);
//! let mut grid = Grid::new(None, &definition, RegridConfig::default()).unwrap();
//!
//! let longitudes = [0.0, 0.1, -1.5];
//! let latitudes = [0.0, 0.0, -1.5];
//! let values = [1.0, 2.0, 5.0];
//! let samples = Samples::new(&longitudes, &latitudes, &values);
//!
//! let populated = grid.regrid(AggregationMethod::Mean, 0.0, &samples).unwrap();
//! assert_eq!(populated, 2);
//!
//! let cells = grid.compact().unwrap();
//! assert_eq!(cells.data[..2], [5.0, 1.5]);
//! ```

pub mod aggregate;
pub mod cell;
pub mod compact;
pub mod config;
pub mod definition;
pub mod error;
pub mod grid;
pub mod sphere;
pub mod swath;
pub mod vertical;

pub use aggregate::{AggregationMethod, Sample};
pub use cell::{Cell, CellSite, BAD_VALUE};
pub use compact::{CellRecord, CompactedCells, FullOutput};
pub use config::RegridConfig;
pub use definition::{GridDefinition, GridFile};
pub use error::{RegridError, Result};
pub use grid::{Grid, HorizontalLocation, PointBatch, ProjectedPoints, Samples};
pub use swath::{derive_corners, Swath, SwathCorners};
pub use vertical::{VerticalLocation, VerticalScratch, VerticalSpec, VerticalType};
