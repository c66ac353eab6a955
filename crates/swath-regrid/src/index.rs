//! Nearest-neighbour index over lat/lon points.
//!
//! Distances are planar Euclidean in (lat, lon) degrees, not geodesic.
//! Callers that need geodesic accuracy must project their points first.

use kd_tree::KdTree2;
use ordered_float::OrderedFloat;

use crate::types::LatLonGrid;

/// Static 2-D kd-tree answering 1-nearest-neighbour queries.
///
/// Each indexed point keeps the flat row-major index it had in the grid it
/// was built from; queries return that index. Points with non-finite
/// coordinates are left out of the tree and can never be returned.
pub struct CoordinateIndex {
    tree: KdTree2<(usize, [f64; 2])>,
    points: usize,
    shape: (usize, usize),
}

impl CoordinateIndex {
    /// Index every grid point of `grid`.
    pub fn build(grid: &LatLonGrid) -> Self {
        let points = grid
            .lat()
            .iter()
            .zip(grid.lon().iter())
            .map(|(&lat, &lon)| [lat, lon]);
        Self::with_shape(points, grid.shape())
    }

    /// Index an arbitrary list of `[lat, lon]` points.
    ///
    /// The list is treated as a single-row grid for [`locate`](Self::locate).
    pub fn from_points(points: &[[f64; 2]]) -> Self {
        Self::with_shape(points.iter().copied(), (1, points.len()))
    }

    fn with_shape(points: impl Iterator<Item = [f64; 2]>, shape: (usize, usize)) -> Self {
        let items: Vec<(usize, [f64; 2])> = points
            .enumerate()
            .filter(|(_, p)| p[0].is_finite() && p[1].is_finite())
            .collect();
        let points = items.len();
        let tree = KdTree2::build_by_key(items, |item, k| OrderedFloat(item.1[k]));
        Self {
            tree,
            points,
            shape,
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points
    }

    /// Whether no point was indexed.
    pub fn is_empty(&self) -> bool {
        self.points == 0
    }

    /// Shape of the grid the index was built from.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Flat index of the indexed point closest to `(lat, lon)`.
    pub fn nearest(&self, lat: f64, lon: f64) -> Option<usize> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        self.tree
            .nearest_by(&[lat, lon], |item, k| item.1[k])
            .map(|found| found.item.0)
    }

    /// [`nearest`](Self::nearest) for a batch of `[lat, lon]` queries.
    pub fn nearest_batch(&self, queries: &[[f64; 2]]) -> Vec<Option<usize>> {
        queries.iter().map(|q| self.nearest(q[0], q[1])).collect()
    }

    /// (row, col) of the grid point closest to `(lat, lon)`.
    pub fn locate(&self, lat: f64, lon: f64) -> Option<(usize, usize)> {
        let cols = self.shape.1;
        self.nearest(lat, lon).map(|idx| (idx / cols, idx % cols))
    }
}

impl std::fmt::Debug for CoordinateIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateIndex")
            .field("points", &self.len())
            .field("shape", &self.shape)
            .finish()
    }
}
