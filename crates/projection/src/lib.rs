//! Coordinate reference system transformations.
//!
//! Defines the [`Projector`] capability consumed by the regridding engine and
//! implements the map projections used by model and analysis grids from
//! scratch, without external projection libraries.

pub mod ellipsoid;
pub mod error;
pub mod lambert;
pub mod mercator;
pub mod projector;
pub mod spec;
pub mod stereographic;

pub use ellipsoid::Ellipsoid;
pub use error::{ProjectionError, Result};
pub use lambert::LambertConformal;
pub use mercator::Mercator;
pub use projector::Projector;
pub use spec::ProjectionSpec;
pub use stereographic::Stereographic;
