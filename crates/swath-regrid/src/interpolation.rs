//! Interpolation kernels.
//!
//! Two families live here: 2-D kernels that read a grid at a fractional
//! (col, row) position, used by magnification, and a 1-D interpolator that
//! maps a coordinate onto a fractional axis index, used by the separable
//! resampler.

use ndarray::ArrayView2;

use crate::error::{RegridError, Result};
use crate::types::SamplingMethod;

/// Nearest neighbor interpolation.
///
/// Returns the value of the nearest grid point, or `None` outside the grid.
pub fn nearest_interpolate<T: Copy>(data: ArrayView2<'_, T>, x: f64, y: f64) -> Option<T> {
    let (height, width) = data.dim();
    if x < 0.0 || y < 0.0 {
        return None;
    }
    let col = x.round() as usize;
    let row = y.round() as usize;

    if col >= width || row >= height {
        return None;
    }

    Some(data[[row, col]])
}

/// Bilinear interpolation.
///
/// Smoothly interpolates between the four nearest grid points. Returns NaN
/// outside the grid or when any corner is NaN.
pub fn bilinear_interpolate(data: ArrayView2<'_, f64>, x: f64, y: f64) -> f64 {
    let (height, width) = data.dim();
    if x < 0.0 || y < 0.0 {
        return f64::NAN;
    }

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    if x0 >= width || y0 >= height {
        return f64::NAN;
    }
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let xf = x - x0 as f64;
    let yf = y - y0 as f64;

    let v00 = data[[y0, x0]];
    let v10 = data[[y0, x1]];
    let v01 = data[[y1, x0]];
    let v11 = data[[y1, x1]];

    if v00.is_nan() || v10.is_nan() || v01.is_nan() || v11.is_nan() {
        return f64::NAN;
    }

    let top = v00 * (1.0 - xf) + v10 * xf;
    let bottom = v01 * (1.0 - xf) + v11 * xf;
    top * (1.0 - yf) + bottom * yf
}

/// 1-D interpolator over a strictly monotonic axis.
///
/// Nodes are sorted ascending on construction, so decreasing axes such as
/// north-up latitude work unchanged. Queries outside `[x_min, x_max]` have no
/// value.
#[derive(Debug, Clone)]
pub struct AxisInterpolator {
    x: Vec<f64>,
    y: Vec<f64>,
    method: SamplingMethod,
    /// Second derivatives for the natural cubic spline; empty otherwise.
    curvature: Vec<f64>,
}

impl AxisInterpolator {
    /// Build an interpolator through the points `(x[i], y[i])`.
    pub fn new(x: &[f64], y: &[f64], method: SamplingMethod) -> Result<Self> {
        if x.len() != y.len() {
            return Err(RegridError::invalid_shape(format!(
                "axis has {} nodes but {} values",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(RegridError::invalid_shape("axis has no nodes"));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(RegridError::invalid_shape("axis contains non-finite nodes"));
        }

        let mut nodes: Vec<(f64, f64)> = x.iter().copied().zip(y.iter().copied()).collect();
        nodes.sort_by(|a, b| a.0.total_cmp(&b.0));
        if nodes.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(RegridError::invalid_shape("axis nodes are not distinct"));
        }
        let (x, y): (Vec<f64>, Vec<f64>) = nodes.into_iter().unzip();

        let curvature = if method == SamplingMethod::Cubic && x.len() >= 3 {
            natural_spline_curvature(&x, &y)
        } else {
            Vec::new()
        };

        Ok(Self {
            x,
            y,
            method,
            curvature,
        })
    }

    /// Interpolator returning the fractional index of `axis[i]`, i.e. `i`.
    pub fn for_axis(axis: &[f64], method: SamplingMethod) -> Result<Self> {
        let index: Vec<f64> = (0..axis.len()).map(|i| i as f64).collect();
        Self::new(axis, &index, method)
    }

    /// The interpolation family in use.
    pub fn method(&self) -> SamplingMethod {
        self.method
    }

    /// Evaluate at `xq`, or `None` outside the interpolation domain.
    pub fn eval(&self, xq: f64) -> Option<f64> {
        let n = self.x.len();
        if !xq.is_finite() || xq < self.x[0] || xq > self.x[n - 1] {
            return None;
        }
        if n == 1 {
            return Some(self.y[0]);
        }

        // Segment [i, i + 1] containing xq; the last node folds into the last segment
        let i = (self.x.partition_point(|&v| v <= xq) - 1).min(n - 2);
        let (x0, x1) = (self.x[i], self.x[i + 1]);
        let (y0, y1) = (self.y[i], self.y[i + 1]);
        let t = (xq - x0) / (x1 - x0);

        let value = match self.method {
            // Midpoints resolve to the lower node
            SamplingMethod::Nearest => {
                if t <= 0.5 {
                    y0
                } else {
                    y1
                }
            }
            SamplingMethod::Zero | SamplingMethod::Previous => {
                if t >= 1.0 {
                    y1
                } else {
                    y0
                }
            }
            SamplingMethod::Next => {
                if t > 0.0 {
                    y1
                } else {
                    y0
                }
            }
            SamplingMethod::Linear | SamplingMethod::Slinear => y0 + t * (y1 - y0),
            SamplingMethod::Quadratic => {
                if n < 3 {
                    y0 + t * (y1 - y0)
                } else {
                    let s = i.min(n - 3);
                    lagrange_quadratic(&self.x[s..s + 3], &self.y[s..s + 3], xq)
                }
            }
            SamplingMethod::Cubic => {
                if self.curvature.is_empty() {
                    y0 + t * (y1 - y0)
                } else {
                    let h = x1 - x0;
                    let a = (x1 - xq) / h;
                    let b = (xq - x0) / h;
                    a * y0
                        + b * y1
                        + ((a * a * a - a) * self.curvature[i] + (b * b * b - b) * self.curvature[i + 1])
                            * (h * h)
                            / 6.0
                }
            }
        };

        Some(value)
    }
}

fn lagrange_quadratic(x: &[f64], y: &[f64], xq: f64) -> f64 {
    let l0 = (xq - x[1]) * (xq - x[2]) / ((x[0] - x[1]) * (x[0] - x[2]));
    let l1 = (xq - x[0]) * (xq - x[2]) / ((x[1] - x[0]) * (x[1] - x[2]));
    let l2 = (xq - x[0]) * (xq - x[1]) / ((x[2] - x[0]) * (x[2] - x[1]));
    y[0] * l0 + y[1] * l1 + y[2] * l2
}

/// Second derivatives of the natural cubic spline through ascending nodes.
fn natural_spline_curvature(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut m = vec![0.0; n];
    let mut u = vec![0.0; n];

    for i in 1..n - 1 {
        let sig = (x[i] - x[i - 1]) / (x[i + 1] - x[i - 1]);
        let p = sig * m[i - 1] + 2.0;
        m[i] = (sig - 1.0) / p;
        let slope_diff = (y[i + 1] - y[i]) / (x[i + 1] - x[i]) - (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
        u[i] = (6.0 * slope_diff / (x[i + 1] - x[i - 1]) - sig * u[i - 1]) / p;
    }

    m[n - 1] = 0.0;
    for k in (0..n - 1).rev() {
        m[k] = m[k] * m[k + 1] + u[k];
    }
    m
}
