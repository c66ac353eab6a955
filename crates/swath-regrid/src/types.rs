//! Core types for regridding.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{RegridError, Result};

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Check if this bounding box intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(self.max_lon < other.min_lon
            || self.min_lon > other.max_lon
            || self.max_lat < other.min_lat
            || self.min_lat > other.max_lat)
    }

    /// Get the width in degrees.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Get the height in degrees.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Check if a point is contained within this bounding box (edges inclusive).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Tile-edge membership test used by the separable resampler.
    ///
    /// Latitude is accepted on `(min_lat, max_lat]` and longitude on
    /// `[min_lon, max_lon)`, so a sample on an edge shared by two adjacent
    /// tiles is counted by exactly one of them.
    pub fn contains_half_open(&self, lon: f64, lat: f64) -> bool {
        lat > self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon < self.max_lon
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        // Global coverage
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }
}

/// A pair of co-registered 2-D latitude and longitude arrays.
///
/// Row 0 is the northern edge for north-up products; nothing here requires
/// that except [`LatLonGrid::is_separable`].
#[derive(Debug, Clone, PartialEq)]
pub struct LatLonGrid {
    lat: Array2<f64>,
    lon: Array2<f64>,
}

impl LatLonGrid {
    /// Create a grid, rejecting mismatched or empty coordinate arrays.
    pub fn new(lat: Array2<f64>, lon: Array2<f64>) -> Result<Self> {
        if lat.dim() != lon.dim() {
            return Err(RegridError::invalid_shape(format!(
                "latitude shape {:?} does not match longitude shape {:?}",
                lat.dim(),
                lon.dim()
            )));
        }
        if lat.is_empty() {
            return Err(RegridError::invalid_shape("coordinate arrays are empty"));
        }
        Ok(Self { lat, lon })
    }

    /// Build a regular north-up grid of cell centres covering `bbox`.
    ///
    /// Cell `(row, col)` is centred at
    /// `(max_lat - (row + 0.5) * res, min_lon + (col + 0.5) * res)`.
    pub fn regular(bbox: &BoundingBox, resolution: f64) -> Result<Self> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(RegridError::invalid_shape(format!(
                "resolution must be positive, got {resolution}"
            )));
        }
        let rows = (bbox.height() / resolution).round() as usize;
        let cols = (bbox.width() / resolution).round() as usize;
        if rows == 0 || cols == 0 {
            return Err(RegridError::invalid_shape(format!(
                "bounding box {bbox:?} is smaller than one {resolution} degree cell"
            )));
        }

        let lat = Array2::from_shape_fn((rows, cols), |(row, _)| {
            bbox.max_lat - (row as f64 + 0.5) * resolution
        });
        let lon = Array2::from_shape_fn((rows, cols), |(_, col)| {
            bbox.min_lon + (col as f64 + 0.5) * resolution
        });
        Self::new(lat, lon)
    }

    /// Latitude array.
    pub fn lat(&self) -> &Array2<f64> {
        &self.lat
    }

    /// Longitude array.
    pub fn lon(&self) -> &Array2<f64> {
        &self.lon
    }

    /// Grid shape as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        self.lat.dim()
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.lat.len()
    }

    /// Always false for a constructed grid; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.lat.is_empty()
    }

    /// Latitude of each row, read from the first column.
    pub fn lat_axis(&self) -> ArrayView1<'_, f64> {
        self.lat.column(0)
    }

    /// Longitude of each column, read from the first row.
    pub fn lon_axis(&self) -> ArrayView1<'_, f64> {
        self.lon.row(0)
    }

    /// Decompose into (lat, lon).
    pub fn into_parts(self) -> (Array2<f64>, Array2<f64>) {
        (self.lat, self.lon)
    }

    /// Extent of all finite coordinates.
    pub fn bounds(&self) -> BoundingBox {
        let (min_lat, max_lat) = finite_extent(self.lat.iter().copied());
        let (min_lon, max_lon) = finite_extent(self.lon.iter().copied());
        BoundingBox::new(min_lon, min_lat, max_lon, max_lat)
    }

    /// Check whether latitude varies only by row (strictly decreasing) and
    /// longitude only by column (strictly increasing).
    pub fn is_separable(&self) -> bool {
        self.check_separable().is_ok()
    }

    /// Like [`is_separable`](Self::is_separable) but says which condition failed.
    pub fn check_separable(&self) -> Result<()> {
        let lat_axis = self.lat_axis().to_vec();
        let lon_axis = self.lon_axis().to_vec();

        if lat_axis.iter().chain(lon_axis.iter()).any(|v| !v.is_finite()) {
            return Err(RegridError::non_separable("axes contain non-finite coordinates"));
        }
        if !lat_axis.windows(2).all(|w| w[0] > w[1]) {
            return Err(RegridError::non_separable(
                "latitude is not strictly decreasing down the rows",
            ));
        }
        if !lon_axis.windows(2).all(|w| w[0] < w[1]) {
            return Err(RegridError::non_separable(
                "longitude is not strictly increasing across the columns",
            ));
        }

        let lat_rows_constant = self
            .lat
            .rows()
            .into_iter()
            .zip(lat_axis.iter())
            .all(|(row, &axis)| row.iter().all(|&v| v == axis));
        if !lat_rows_constant {
            return Err(RegridError::non_separable("latitude varies along a row"));
        }

        let lon_columns_constant = self
            .lon
            .columns()
            .into_iter()
            .zip(lon_axis.iter())
            .all(|(column, &axis)| column.iter().all(|&v| v == axis));
        if !lon_columns_constant {
            return Err(RegridError::non_separable("longitude varies along a column"));
        }

        Ok(())
    }
}

fn finite_extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}

/// Reduction applied to all source samples that land in one target cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationRule {
    /// Arithmetic mean - continuous fields (soil moisture, brightness temperature)
    #[default]
    Mean,
    /// Middle value; mean of the two middle values for even counts
    Median,
    /// Smallest value
    Min,
    /// Largest value
    Max,
    /// Most frequent value, smallest value wins ties
    Mode,
    /// Number of samples
    Count,
    /// Gini-Simpson index `1 - sum(p_i^2)` over distinct values (categorical flags)
    #[serde(alias = "gini_simpson")]
    Diversity,
}

impl AggregationRule {
    /// All rules, in declaration order.
    pub const ALL: [AggregationRule; 7] = [
        Self::Mean,
        Self::Median,
        Self::Min,
        Self::Max,
        Self::Mode,
        Self::Count,
        Self::Diversity,
    ];

    /// Get the rule name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Min => "min",
            Self::Max => "max",
            Self::Mode => "mode",
            Self::Count => "count",
            Self::Diversity => "diversity",
        }
    }
}

impl FromStr for AggregationRule {
    type Err = RegridError;

    /// Parse from string (case-insensitive).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "mode" => Ok(Self::Mode),
            "count" => Ok(Self::Count),
            "diversity" | "gini_simpson" => Ok(Self::Diversity),
            _ => Err(RegridError::UnsupportedAggregationRule(s.to_string())),
        }
    }
}

impl fmt::Display for AggregationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 1-D interpolation family used to turn a coordinate into a fractional
/// row or column index on a separable target grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMethod {
    /// Index of the closest axis node
    #[default]
    Nearest,
    /// Index of the closest node at or below the coordinate (step function)
    Zero,
    /// Same as `Zero`
    Previous,
    /// Index of the closest node at or above the coordinate
    Next,
    /// Piecewise linear
    Linear,
    /// Piecewise linear (first-order spline)
    Slinear,
    /// Piecewise quadratic through the three nearest nodes
    Quadratic,
    /// Natural cubic spline
    Cubic,
}

impl SamplingMethod {
    /// Get the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Zero => "zero",
            Self::Previous => "previous",
            Self::Next => "next",
            Self::Linear => "linear",
            Self::Slinear => "slinear",
            Self::Quadratic => "quadratic",
            Self::Cubic => "cubic",
        }
    }
}

impl FromStr for SamplingMethod {
    type Err = RegridError;

    /// Parse from string (case-insensitive).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "zero" => Ok(Self::Zero),
            "previous" => Ok(Self::Previous),
            "next" => Ok(Self::Next),
            "linear" => Ok(Self::Linear),
            "slinear" => Ok(Self::Slinear),
            "quadratic" => Ok(Self::Quadratic),
            "cubic" => Ok(Self::Cubic),
            _ => Err(RegridError::UnsupportedSamplingMethod(s.to_string())),
        }
    }
}

impl fmt::Display for SamplingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How source samples are assigned to target cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleStrategy {
    /// Axis interpolation when the target is separable, nearest-index otherwise.
    #[default]
    Auto,
    /// Always use the kd-tree nearest-index path.
    NearestIndex,
}

/// Parameters shared by every layer of a regridding call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResampleParams {
    /// Interpolation family for the separable path.
    pub sampling: SamplingMethod,
    /// Reduction applied per target cell.
    pub aggregation: AggregationRule,
    /// Source upsampling factor applied before assignment (1 = off).
    pub magnification: usize,
    /// Id-assignment strategy.
    pub strategy: ResampleStrategy,
}

impl Default for ResampleParams {
    fn default() -> Self {
        Self {
            sampling: SamplingMethod::Nearest,
            aggregation: AggregationRule::Mean,
            magnification: 1,
            strategy: ResampleStrategy::Auto,
        }
    }
}

impl ResampleParams {
    /// Parameters with the given sampling method and aggregation rule.
    pub fn new(sampling: SamplingMethod, aggregation: AggregationRule) -> Self {
        Self {
            sampling,
            aggregation,
            ..Self::default()
        }
    }

    /// Set the magnification factor.
    pub fn with_magnification(mut self, factor: usize) -> Self {
        self.magnification = factor;
        self
    }

    /// Set the id-assignment strategy.
    pub fn with_strategy(mut self, strategy: ResampleStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
