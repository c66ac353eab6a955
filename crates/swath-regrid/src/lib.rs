//! Swath Regridding onto Latitude/Longitude Grids
//!
//! This crate moves values observed on irregular satellite swaths onto a
//! target latitude/longitude grid. Many source samples can land in one
//! target cell; they are reduced with an aggregation rule (mean, median,
//! mode, diversity, ...). It provides:
//!
//! - **Two assignment paths**: a fast separable-axis path for rectilinear
//!   targets and a k-d tree nearest-point path for arbitrary targets
//! - **Magnification**: optional densification of sparse swaths before
//!   assignment
//! - **Stack fan-out**: many layers regridded on a worker pool with results
//!   reassembled in layer order
//! - **Temporal smoothing**: NaN-aware moving average along the layer axis
//!
//! # Architecture
//!
//! ```text
//! (rows, cols, layers) stack
//!      │
//!      ▼
//! resample_stack()
//!      │
//!      ├─► partition layers into contiguous chunks
//!      │
//!      └─► per layer: resample(target, source, field)
//!               │
//!               ├─► magnify source (optional)
//!               │
//!               ├─► separable target ─► AxisIndexResampler
//!               │
//!               └─► otherwise ────────► CoordinateIndex (k-d tree)
//!                        │
//!                        ▼
//!                 aggregate + scatter (NaN = no data)
//!      │
//!      ▼
//! smooth_temporal(window)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use swath_regrid::{resample_stack, smooth_temporal, BoundingBox, LatLonGrid, ResampleParams};
//!
//! let target = LatLonGrid::regular(&BoundingBox::new(-10.0, 30.0, 10.0, 50.0), 0.25)?;
//! let daily = resample_stack(&target, &swath, stack.view(), &ResampleParams::default(), true)?;
//! let smoothed = smooth_temporal(daily.view(), 7)?;
//! ```

pub mod aggregate;
pub mod axis;
pub mod config;
pub mod error;
pub mod fanout;
pub mod index;
pub mod interpolation;
pub mod magnify;
pub mod resample;
pub mod stack;
pub mod temporal;
pub mod types;

// Re-export commonly used types at crate root
pub use aggregate::{aggregate, reduce, scatter};
pub use axis::AxisIndexResampler;
pub use config::RegridConfig;
pub use error::{RegridError, Result};
pub use fanout::{
    fan_out, partition_layers, resample_stack, resample_stack_with, FailurePolicy, FanoutOptions,
    LayerFailure, StackOutcome,
};
pub use index::CoordinateIndex;
pub use interpolation::{bilinear_interpolate, nearest_interpolate, AxisInterpolator};
pub use magnify::magnify;
pub use resample::{resample, resample_nearest_index};
pub use stack::{assemble_doy_stack, count_observations, days_in_year, extract_region, spatial_mean};
pub use temporal::smooth_temporal;
pub use types::{
    AggregationRule, BoundingBox, LatLonGrid, ResampleParams, ResampleStrategy, SamplingMethod,
};
