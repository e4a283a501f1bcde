//! The capability every cartographic projection offers to a grid.

use std::fmt;

use crate::ellipsoid::Ellipsoid;

/// Converts between geographic longitude/latitude (degrees) and projected
/// planar coordinates (meters).
///
/// Implementations are immutable after construction, so a projector can be
/// shared by worker threads while a grid is being populated. Grids take
/// ownership of a boxed projector and use [`Projector::clone_box`] whenever a
/// grid is duplicated or subset.
pub trait Projector: fmt::Debug + Send + Sync {
    /// Short lowercase name, e.g. `"lambert"`.
    fn name(&self) -> &'static str;

    /// The ellipsoid the projection formulas are evaluated on.
    fn ellipsoid(&self) -> Ellipsoid;

    /// Defining parameters in a fixed order (used for equality).
    fn parameters(&self) -> Vec<f64>;

    /// Project longitude/latitude (degrees) to x/y (meters).
    fn project(&self, longitude: f64, latitude: f64) -> (f64, f64);

    /// Unproject x/y (meters) to longitude/latitude (degrees).
    ///
    /// Longitudes are returned in [-180, 180].
    fn unproject(&self, x: f64, y: f64) -> (f64, f64);

    /// Heap copy of this projector.
    fn clone_box(&self) -> Box<dyn Projector>;

    /// Class invariant: a valid ellipsoid and finite parameters.
    fn invariant(&self) -> bool {
        self.ellipsoid().is_valid() && self.parameters().iter().all(|p| p.is_finite())
    }

    /// Same projection family, ellipsoid and parameters.
    fn equal(&self, other: &dyn Projector) -> bool {
        self.name() == other.name()
            && self.ellipsoid() == other.ellipsoid()
            && self.parameters() == other.parameters()
    }
}

impl Clone for Box<dyn Projector> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl PartialEq for dyn Projector {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}
