//! Shared test utilities for the swath-regrid workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Coordinate and field generators
//! - Common test fixtures
//! - Approximate-equality assertions
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, regular_coords};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro asserting two grids hold the same values, treating NaN as equal to NaN.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_grids_eq;
///
/// assert_grids_eq!(parallel, sequential);
/// ```
#[macro_export]
macro_rules! assert_grids_eq {
    ($left:expr, $right:expr) => {{
        let left = &$left;
        let right = &$right;
        assert_eq!(left.shape(), right.shape(), "grid shapes differ");
        for (i, (a, b)) in left.iter().zip(right.iter()).enumerate() {
            if !(a == b || (a.is_nan() && b.is_nan())) {
                panic!(
                    "assertion failed: grids differ at flat index {}\n  left: `{:?}`,\n right: `{:?}`",
                    i, a, b
                );
            }
        }
    }};
}
