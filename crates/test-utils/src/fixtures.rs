//! Common test fixtures for regridding tests.
//!
//! Kept as plain numbers so any crate in the workspace can build its own
//! types from them.

/// Common bounding boxes as `(min_lon, min_lat, max_lon, max_lat)`.
pub mod bbox {
    /// Continental United States
    pub const CONUS: (f64, f64, f64, f64) = (-130.0, 20.0, -60.0, 55.0);

    /// A small box around the origin
    pub const ORIGIN: (f64, f64, f64, f64) = (-2.0, -2.0, 1.0, 1.0);

    /// Southeastern US, inside the CONUS Lambert grids
    pub const SOUTHEAST: (f64, f64, f64, f64) = (-90.0, 30.0, -80.0, 36.0);
}

/// Common lattice specifications for testing.
pub mod lattice {
    /// A regular lattice: edges and cell sizes in the grid's own units.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct LatticeSpec {
        pub columns: usize,
        pub rows: usize,
        pub west_edge: f64,
        pub south_edge: f64,
        pub cell_width: f64,
        pub cell_height: f64,
    }

    impl LatticeSpec {
        /// Returns the total number of lattice points.
        pub fn size(&self) -> usize {
            self.columns * self.rows
        }

        /// Returns the extent as (west, south, east, north).
        pub fn extent(&self) -> (f64, f64, f64, f64) {
            (
                self.west_edge,
                self.south_edge,
                self.west_edge + self.columns as f64 * self.cell_width,
                self.south_edge + self.rows as f64 * self.cell_height,
            )
        }
    }

    /// 3 x 3 one-degree cells over [-2, 1] x [-2, 1]
    pub const ORIGIN_3X3: LatticeSpec = LatticeSpec {
        columns: 3,
        rows: 3,
        west_edge: -2.0,
        south_edge: -2.0,
        cell_width: 1.0,
        cell_height: 1.0,
    };

    /// 12 km CONUS Lambert lattice, in meters (see [`super::projection::CONUS_LAMBERT`])
    pub const CONUS_12KM: LatticeSpec = LatticeSpec {
        columns: 459,
        rows: 299,
        west_edge: -2556000.0,
        south_edge: -1728000.0,
        cell_width: 12000.0,
        cell_height: 12000.0,
    };
}

/// Common projection parameters.
pub mod projection {
    /// Lambert Conformal Conic parameters.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct LambertParams {
        pub lower_latitude: f64,
        pub upper_latitude: f64,
        pub central_longitude: f64,
        pub central_latitude: f64,
    }

    /// The classic CONUS Lambert setup (secant at 33 and 45 N)
    pub const CONUS_LAMBERT: LambertParams = LambertParams {
        lower_latitude: 33.0,
        upper_latitude: 45.0,
        central_longitude: -97.0,
        central_latitude: 40.0,
    };

    /// Same as [`CONUS_LAMBERT`] as a projection string
    pub const CONUS_LAMBERT_STR: &str = "lambert:33,45,-97,40";
}

/// Common vertical coordinate setups.
pub mod vertical {
    /// A 13-layer sigma-pressure column, surface first.
    pub const SIGMA_LEVELS: [f64; 14] = [
        1.0, 0.995, 0.99, 0.98, 0.96, 0.93, 0.89, 0.84, 0.77, 0.7, 0.5, 0.3, 0.1, 0.0,
    ];

    /// Model-top pressure for [`SIGMA_LEVELS`] (Pa)
    pub const SIGMA_TOP_PRESSURE: f64 = 10000.0;

    /// Mandatory pressure levels from 1000 hPa upward (Pa)
    pub const PRESSURE_LEVELS: [f64; 8] = [
        100000.0, 92500.0, 85000.0, 70000.0, 50000.0, 30000.0, 20000.0, 10000.0,
    ];

    /// Height boundaries every kilometer up to 5 km (m)
    pub const HEIGHT_LEVELS: [f64; 6] = [0.0, 1000.0, 2000.0, 3000.0, 4000.0, 5000.0];
}
