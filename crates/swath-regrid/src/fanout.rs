//! Layer fan-out for 3-D stacks.
//!
//! A stack is split along its layer axis into contiguous chunks, one per
//! worker. Each worker regrids its layers in order and returns them tagged
//! with their layer index; the dispatcher scatters the results into a
//! pre-allocated output, so the result never depends on completion order.

use std::ops::Range;

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{RegridError, Result};
use crate::resample::{resample, validate};
use crate::types::{LatLonGrid, ResampleParams};

/// What to do when some layers fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any failed layer fails the whole call.
    #[default]
    AllOrNothing,
    /// Failed layers are left NaN and reported alongside the result.
    Partial,
}

/// How a stack is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanoutOptions {
    /// Run chunks on a worker pool instead of the calling thread.
    pub parallel: bool,
    /// Maximum number of workers (0 = one per available core).
    pub workers: usize,
    /// Failure handling.
    pub policy: FailurePolicy,
}

impl Default for FanoutOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            workers: 0,
            policy: FailurePolicy::AllOrNothing,
        }
    }
}

impl FanoutOptions {
    /// Sequential dispatch on the calling thread.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Parallel dispatch on up to `workers` workers.
    pub fn parallel(workers: usize) -> Self {
        Self {
            parallel: true,
            workers,
            ..Self::default()
        }
    }

    /// Set the failure policy.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// A layer that could not be computed.
#[derive(Debug)]
pub struct LayerFailure {
    /// Index along the layer axis.
    pub layer: usize,
    /// Why it failed.
    pub error: RegridError,
}

/// Stacked result plus any per-layer failures.
#[derive(Debug)]
pub struct StackOutcome {
    /// Output stack (rows, cols, layers); failed layers are NaN.
    pub data: Array3<f32>,
    /// Failures in ascending layer order.
    pub failures: Vec<LayerFailure>,
}

impl StackOutcome {
    /// Whether every layer succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Return the data, or the lowest failing layer as an error.
    pub fn into_result(self) -> Result<Array3<f32>> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(RegridError::worker_failure(failure.layer, failure.error)),
            None => Ok(self.data),
        }
    }
}

/// Split `layers` into at most `workers` contiguous, near-equal ranges.
pub fn partition_layers(layers: usize, workers: usize) -> Vec<Range<usize>> {
    if layers == 0 {
        return Vec::new();
    }
    let chunks = workers.clamp(1, layers);
    let chunk_len = (layers + chunks - 1) / chunks;
    (0..layers)
        .step_by(chunk_len)
        .map(|start| start..(start + chunk_len).min(layers))
        .collect()
}

/// Apply `per_layer` to every layer of `stack` and reassemble the results.
///
/// `per_layer` receives the layer index and a view of that layer and must
/// return a grid of `out_shape`. Under [`FailurePolicy::AllOrNothing`] the
/// first failing layer (lowest index) is returned as
/// [`RegridError::WorkerFailure`].
pub fn fan_out<F>(
    stack: ArrayView3<'_, f32>,
    out_shape: (usize, usize),
    options: &FanoutOptions,
    per_layer: F,
) -> Result<StackOutcome>
where
    F: Fn(usize, ArrayView2<'_, f32>) -> Result<Array2<f32>> + Sync,
{
    let layers = stack.len_of(Axis(2));
    let run_chunk = |range: Range<usize>| -> Vec<(usize, Result<Array2<f32>>)> {
        range
            .map(|layer| (layer, per_layer(layer, stack.index_axis(Axis(2), layer))))
            .collect()
    };

    let results: Vec<(usize, Result<Array2<f32>>)> = if options.parallel && layers > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers)
            .build()?;
        let chunks = partition_layers(layers, pool.current_num_threads());
        debug!(
            layers,
            chunks = chunks.len(),
            workers = pool.current_num_threads(),
            "Dispatching layer chunks"
        );
        pool.install(|| {
            chunks
                .into_par_iter()
                .map(run_chunk)
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect()
        })
    } else {
        run_chunk(0..layers)
    };

    let mut data = Array3::from_elem((out_shape.0, out_shape.1, layers), f32::NAN);
    let mut failures = Vec::new();
    for (layer, result) in results {
        match result {
            Ok(grid) if grid.dim() == out_shape => {
                data.index_axis_mut(Axis(2), layer).assign(&grid);
            }
            Ok(grid) => failures.push(LayerFailure {
                layer,
                error: RegridError::invalid_shape(format!(
                    "layer produced shape {:?}, expected {:?}",
                    grid.dim(),
                    out_shape
                )),
            }),
            Err(error) => failures.push(LayerFailure { layer, error }),
        }
    }
    failures.sort_by_key(|f| f.layer);

    for failure in &failures {
        warn!(layer = failure.layer, error = %failure.error, "Layer failed");
    }

    if options.policy == FailurePolicy::AllOrNothing && !failures.is_empty() {
        let first = failures.swap_remove(0);
        return Err(RegridError::worker_failure(first.layer, first.error));
    }
    Ok(StackOutcome { data, failures })
}

/// Regrid every layer of a (rows, cols, layers) stack.
///
/// `parallel` chooses between the worker pool and a sequential loop; both
/// produce bit-identical output.
pub fn resample_stack(
    target: &LatLonGrid,
    source: &LatLonGrid,
    stack: ArrayView3<'_, f32>,
    params: &ResampleParams,
    parallel: bool,
) -> Result<Array3<f32>> {
    let options = if parallel {
        FanoutOptions::default()
    } else {
        FanoutOptions::sequential()
    };
    resample_stack_with(target, source, stack, params, &options)?.into_result()
}

/// [`resample_stack`] with explicit dispatch and failure options.
#[instrument(skip_all, fields(
    layers = stack.len_of(Axis(2)),
    parallel = options.parallel,
    rule = %params.aggregation,
))]
pub fn resample_stack_with(
    target: &LatLonGrid,
    source: &LatLonGrid,
    stack: ArrayView3<'_, f32>,
    params: &ResampleParams,
    options: &FanoutOptions,
) -> Result<StackOutcome> {
    let (rows, cols, layers) = stack.dim();
    if (rows, cols) != source.shape() {
        return Err(RegridError::invalid_shape(format!(
            "stack layer shape {:?} does not match source grid shape {:?}",
            (rows, cols),
            source.shape()
        )));
    }
    if layers > 0 {
        validate(source, stack.index_axis(Axis(2), 0), params)?;
    }

    let started = std::time::Instant::now();
    let outcome = fan_out(stack, target.shape(), options, |_, layer| {
        resample(target, source, layer, params)
    })?;

    info!(
        layers,
        failed = outcome.failures.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Regridded stack"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_stack(layers: usize) -> Array3<f32> {
        Array3::from_shape_fn((2, 3, layers), |(r, c, l)| (l * 100 + r * 10 + c) as f32)
    }

    #[test]
    fn test_partition_layers() {
        assert_eq!(partition_layers(10, 3), vec![0..4, 4..8, 8..10]);
        assert_eq!(partition_layers(2, 8), vec![0..1, 1..2]);
        assert_eq!(partition_layers(5, 0), vec![0..5]);
        assert!(partition_layers(0, 4).is_empty());

        let ranges = partition_layers(17, 4);
        assert!(ranges.len() <= 4);
        assert_eq!(ranges.iter().map(|r| r.len()).sum::<usize>(), 17);
    }

    #[test]
    fn test_fan_out_preserves_layer_order() {
        let stack = numbered_stack(9);
        let double = |_: usize, layer: ArrayView2<'_, f32>| Ok(layer.mapv(|v| v * 2.0));

        let parallel = fan_out(stack.view(), (2, 3), &FanoutOptions::parallel(4), double).unwrap();
        let sequential = fan_out(stack.view(), (2, 3), &FanoutOptions::sequential(), double).unwrap();

        assert!(parallel.is_complete());
        assert_eq!(parallel.data, sequential.data);
        assert_eq!(parallel.data, stack.mapv(|v| v * 2.0));
    }

    #[test]
    fn test_fan_out_all_or_nothing_reports_lowest_layer() {
        let stack = numbered_stack(6);
        let failing = |layer: usize, view: ArrayView2<'_, f32>| {
            if layer == 2 || layer == 4 {
                Err(RegridError::invalid_shape(format!("bad layer {layer}")))
            } else {
                Ok(view.to_owned())
            }
        };

        let err = fan_out(stack.view(), (2, 3), &FanoutOptions::parallel(3), failing).unwrap_err();
        match err {
            RegridError::WorkerFailure { layer, .. } => assert_eq!(layer, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fan_out_partial_keeps_good_layers() {
        let stack = numbered_stack(5);
        let failing = |layer: usize, view: ArrayView2<'_, f32>| {
            if layer == 3 {
                Err(RegridError::InvalidWindow(0))
            } else {
                Ok(view.to_owned())
            }
        };
        let options = FanoutOptions::parallel(2).with_policy(FailurePolicy::Partial);

        let outcome = fan_out(stack.view(), (2, 3), &options, failing).unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].layer, 3);
        assert!(outcome.data.index_axis(Axis(2), 3).iter().all(|v| v.is_nan()));
        assert_eq!(outcome.data.index_axis(Axis(2), 4), stack.index_axis(Axis(2), 4));
    }

    #[test]
    fn test_fan_out_rejects_wrong_output_shape() {
        let stack = numbered_stack(2);
        let wrong = |_: usize, _: ArrayView2<'_, f32>| Ok(Array2::<f32>::zeros((1, 1)));

        let outcome = fan_out(
            stack.view(),
            (2, 3),
            &FanoutOptions::sequential().with_policy(FailurePolicy::Partial),
            wrong,
        )
        .unwrap();

        assert_eq!(outcome.failures.len(), 2);
        assert!(matches!(outcome.failures[0].error, RegridError::InvalidGridShape(_)));
    }

    #[test]
    fn test_fan_out_empty_stack() {
        let stack = Array3::<f32>::zeros((2, 3, 0));
        let outcome = fan_out(stack.view(), (4, 4), &FanoutOptions::default(), |_, v| {
            Ok(v.to_owned())
        })
        .unwrap();
        assert_eq!(outcome.data.dim(), (4, 4, 0));
    }
}
