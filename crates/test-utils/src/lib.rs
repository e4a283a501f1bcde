//! Shared test utilities for the regridding workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Seeded generators for scattered points, profiles and swaths
//! - Common grid and vertical-coordinate fixtures
//! - Scratch files for job and input round trips
//! - Approximate-equality assertion macros
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
//! use test_utils::{assert_approx_eq, fixtures, scattered_points};
//! ```

pub mod fixtures;
pub mod generators;
pub mod scratch;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use scratch::*;

/// Approximate floating-point equality.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(cell.data, 1.5, 1e-9);
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

/// Element-wise approximate equality of two float slices of equal length.
///
/// ```ignore
/// use test_utils::assert_slices_approx_eq;
///
/// assert_slices_approx_eq!(&[1.0, 2.0], &[1.0, 2.0000001], 1e-6);
/// ```
#[macro_export]
macro_rules! assert_slices_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: &[f64] = &$left[..];
        let right: &[f64] = &$right[..];
        assert_eq!(left.len(), right.len(), "slice lengths differ");
        for (index, (a, b)) in left.iter().zip(right).enumerate() {
            if (a - b).abs() > $epsilon {
                panic!(
                    "assertion failed: slices differ at index {}: `{:?}` vs `{:?}` (epsilon `{:?}`)",
                    index, a, b, $epsilon
                );
            }
        }
    }};
}
