//! Common test fixtures for swath-regrid tests.
//!
//! This module provides pre-defined extents and stack sizes that represent
//! common regridding scenarios.

/// Common bounding box definitions for testing, as
/// `(min_lon, min_lat, max_lon, max_lat)`.
pub mod bbox {
    /// Global bounding box (-180 to 180, -90 to 90)
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Europe bounding box
    pub const EUROPE: (f64, f64, f64, f64) = (-15.0, 35.0, 45.0, 72.0);

    /// A small target tile, 4 x 4 degrees at the origin
    pub const UNIT_TILE: (f64, f64, f64, f64) = (0.0, 0.0, 4.0, 4.0);

    /// Far from every other fixture
    pub const SOUTH_PACIFIC: (f64, f64, f64, f64) = (-150.0, -50.0, -140.0, -40.0);
}

/// Common stack specifications for testing.
pub mod stack {
    /// A small stack that still spans several worker chunks
    pub const SMALL: StackSpec = StackSpec {
        rows: 12,
        cols: 9,
        layers: 10,
    };

    /// One leap year of daily layers on a tiny grid
    pub const DAILY_LEAP_YEAR: StackSpec = StackSpec {
        rows: 2,
        cols: 3,
        layers: 367,
    };

    /// Stack dimensions.
    #[derive(Debug, Clone, Copy)]
    pub struct StackSpec {
        pub rows: usize,
        pub cols: usize,
        pub layers: usize,
    }

    impl StackSpec {
        /// Total number of samples.
        pub fn size(&self) -> usize {
            self.rows * self.cols * self.layers
        }

        /// Shape of a single layer.
        pub fn layer_shape(&self) -> (usize, usize) {
            (self.rows, self.cols)
        }
    }
}

/// Smoothing windows worth exercising (odd, even, degenerate).
pub const SMOOTHING_WINDOWS: [usize; 4] = [1, 2, 3, 7];
