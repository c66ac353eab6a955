//! Error types for regridding.

use thiserror::Error;

/// Errors that can occur while regridding.
#[derive(Error, Debug)]
pub enum RegridError {
    /// Coordinate or field arrays are malformed (mismatched or empty shapes).
    #[error("invalid grid shape: {0}")]
    InvalidGridShape(String),

    /// Target axes are not separable and strictly monotonic.
    #[error("target grid is not separable: {0}")]
    NonSeparableTargetGrid(String),

    /// Unknown aggregation rule name.
    #[error("unsupported aggregation rule: {0}")]
    UnsupportedAggregationRule(String),

    /// Unknown sampling (1-D interpolation) method name.
    #[error("unsupported sampling method: {0}")]
    UnsupportedSamplingMethod(String),

    /// Magnification factor below 1.
    #[error("invalid magnification factor {0}, must be >= 1")]
    InvalidMagnification(usize),

    /// Moving-average window of zero layers.
    #[error("invalid smoothing window {0}, must be >= 1")]
    InvalidWindow(usize),

    /// Day-of-year outside the year being assembled.
    #[error("day of year {doy} is outside 1..={days} for {year}")]
    InvalidDayOfYear { year: i32, doy: u32, days: u32 },

    /// A single layer failed inside the fan-out.
    #[error("layer {layer} failed: {source}")]
    WorkerFailure {
        layer: usize,
        #[source]
        source: Box<RegridError>,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RegridError {
    /// Create an InvalidGridShape error.
    pub fn invalid_shape(msg: impl Into<String>) -> Self {
        Self::InvalidGridShape(msg.into())
    }

    /// Create a NonSeparableTargetGrid error.
    pub fn non_separable(msg: impl Into<String>) -> Self {
        Self::NonSeparableTargetGrid(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap a per-layer error with the layer it came from.
    pub fn worker_failure(layer: usize, source: RegridError) -> Self {
        Self::WorkerFailure {
            layer,
            source: Box::new(source),
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for RegridError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::Config(format!("failed to build worker pool: {err}"))
    }
}

/// Result type for regridding operations.
pub type Result<T> = std::result::Result<T, RegridError>;
