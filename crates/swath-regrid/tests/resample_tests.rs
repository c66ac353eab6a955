//! Behavioural tests for single-layer regridding.

use ndarray::{array, Array2};
use swath_regrid::{
    magnify, resample, AggregationRule, AxisIndexResampler, BoundingBox, LatLonGrid,
    ResampleParams, ResampleStrategy, SamplingMethod,
};
use test_utils::{
    assert_approx_eq, assert_grids_eq, bbox, create_categorical_field, create_temperature_field,
    create_test_field, regular_coords, tilted_swath,
};

const STRATEGIES: [ResampleStrategy; 2] = [ResampleStrategy::Auto, ResampleStrategy::NearestIndex];

/// 8x8 target with 0.5 degree cells over the unit tile.
fn unit_target() -> LatLonGrid {
    let (lat, lon) = regular_coords(bbox::UNIT_TILE, 0.5);
    LatLonGrid::new(lat, lon).unwrap()
}

/// 30x30 tilted swath that overhangs every edge of the unit tile.
fn tilted_source() -> LatLonGrid {
    let (lat, lon) = tilted_swath(30, 30, (4.2, -0.2), 0.15, 0.1);
    LatLonGrid::new(lat, lon).unwrap()
}

fn source_field() -> Array2<f32> {
    let mut field = create_temperature_field(30, 30);
    field[[10, 10]] = f32::NAN;
    field[[15, 3]] = f32::NAN;
    field
}

fn params(rule: AggregationRule, strategy: ResampleStrategy) -> ResampleParams {
    ResampleParams::new(SamplingMethod::Nearest, rule).with_strategy(strategy)
}

fn valid_total(grid: &Array2<f32>) -> f64 {
    grid.iter().filter(|v| !v.is_nan()).map(|&v| v as f64).sum()
}

// ============================================================================
// Identity and shape
// ============================================================================

#[test]
fn test_identity_preserves_field_and_missing_values() {
    let target = unit_target();
    let mut field = create_test_field(8, 8);
    field[[2, 3]] = f32::NAN;

    for strategy in STRATEGIES {
        let out = resample(
            &target,
            &target.clone(),
            field.view(),
            &params(AggregationRule::Median, strategy),
        )
        .unwrap();
        assert_grids_eq!(out, field);
    }
}

#[test]
fn test_output_has_target_shape_for_every_rule() {
    let target = unit_target();
    let source = tilted_source();
    let field = source_field();

    for strategy in STRATEGIES {
        for rule in AggregationRule::ALL {
            let out = resample(&target, &source, field.view(), &params(rule, strategy)).unwrap();
            assert_eq!(out.dim(), target.shape(), "rule {rule} strategy {strategy:?}");
            assert!(out.iter().any(|v| !v.is_nan()));
        }
    }
}

// ============================================================================
// Aggregation properties
// ============================================================================

#[test]
fn test_count_matches_samples_inside_target_bounds() {
    let target = unit_target();
    let source = tilted_source();
    let field = source_field();

    let valid_points: Vec<(f64, f64)> = source
        .lat()
        .iter()
        .zip(source.lon().iter())
        .zip(field.iter())
        .filter(|(_, v)| !v.is_nan())
        .map(|((&lat, &lon), _)| (lat, lon))
        .collect();

    // Generic path keeps samples inside the closed extent of the target
    let closed = target.bounds();
    let expected = valid_points.iter().filter(|(lat, lon)| closed.contains(*lon, *lat)).count();
    let out = resample(
        &target,
        &source,
        field.view(),
        &params(AggregationRule::Count, ResampleStrategy::NearestIndex),
    )
    .unwrap();
    assert_eq!(valid_total(&out), expected as f64);

    // Separable path keeps samples inside the half-open axis extent
    let half_open = AxisIndexResampler::new(&target, SamplingMethod::Nearest).unwrap().bounds();
    let expected = valid_points
        .iter()
        .filter(|(lat, lon)| half_open.contains_half_open(*lon, *lat))
        .count();
    let out = resample(
        &target,
        &source,
        field.view(),
        &params(AggregationRule::Count, ResampleStrategy::Auto),
    )
    .unwrap();
    assert_eq!(valid_total(&out), expected as f64);
}

#[test]
fn test_count_total_independent_of_sampling_method() {
    let target = unit_target();
    let source = tilted_source();
    let field = source_field();

    let nearest = resample(
        &target,
        &source,
        field.view(),
        &ResampleParams::new(SamplingMethod::Nearest, AggregationRule::Count),
    )
    .unwrap();

    for method in [
        SamplingMethod::Zero,
        SamplingMethod::Previous,
        SamplingMethod::Next,
        SamplingMethod::Linear,
        SamplingMethod::Slinear,
        SamplingMethod::Quadratic,
        SamplingMethod::Cubic,
    ] {
        let out = resample(
            &target,
            &source,
            field.view(),
            &ResampleParams::new(method, AggregationRule::Count),
        )
        .unwrap();
        assert_eq!(valid_total(&out), valid_total(&nearest), "method {method}");
    }
}

#[test]
fn test_mean_and_median_lie_between_min_and_max() {
    let target = unit_target();
    let source = tilted_source();
    let field = source_field();

    for strategy in STRATEGIES {
        let run = |rule| resample(&target, &source, field.view(), &params(rule, strategy)).unwrap();
        let min = run(AggregationRule::Min);
        let max = run(AggregationRule::Max);
        let mean = run(AggregationRule::Mean);
        let median = run(AggregationRule::Median);

        for (((&lo, &hi), &avg), &mid) in min.iter().zip(max.iter()).zip(mean.iter()).zip(median.iter()) {
            if lo.is_nan() {
                assert!(hi.is_nan() && avg.is_nan() && mid.is_nan());
                continue;
            }
            assert!(lo <= hi);
            assert!(avg >= lo - 1e-4 && avg <= hi + 1e-4, "mean {avg} outside [{lo}, {hi}]");
            assert!(mid >= lo && mid <= hi, "median {mid} outside [{lo}, {hi}]");
        }
    }
}

#[test]
fn test_single_cell_group_rules() {
    // Four samples that all land in target cell (0, 0)
    let target = unit_target();
    let source = LatLonGrid::new(array![[3.7, 3.7], [3.6, 3.6]], array![[0.3, 0.4], [0.3, 0.4]]).unwrap();
    let field = array![[1.0f32, 2.0], [2.0, 1.0]];

    for strategy in STRATEGIES {
        let run = |rule| resample(&target, &source, field.view(), &params(rule, strategy)).unwrap();

        // Tied mode resolves to the smallest value
        assert_eq!(run(AggregationRule::Mode)[[0, 0]], 1.0);
        assert_eq!(run(AggregationRule::Count)[[0, 0]], 4.0);
        assert_eq!(run(AggregationRule::Median)[[0, 0]], 1.5);
        assert_approx_eq!(run(AggregationRule::Diversity)[[0, 0]], 0.5, 1e-6);
        assert_approx_eq!(run(AggregationRule::Mean)[[0, 0]], 1.5, 1e-6);

        let out = run(AggregationRule::Max);
        assert_eq!(out[[0, 0]], 2.0);
        assert_eq!(out.iter().filter(|v| !v.is_nan()).count(), 1);
    }
}

#[test]
fn test_diversity_bounded_by_class_count() {
    let target = unit_target();
    let source = tilted_source();
    let classes = create_categorical_field(30, 30, 4, 7);

    for strategy in STRATEGIES {
        let diversity = resample(
            &target,
            &source,
            classes.view(),
            &params(AggregationRule::Diversity, strategy),
        )
        .unwrap();
        let counts = resample(
            &target,
            &source,
            classes.view(),
            &params(AggregationRule::Count, strategy),
        )
        .unwrap();

        for (&d, &n) in diversity.iter().zip(counts.iter()) {
            if d.is_nan() {
                continue;
            }
            // 1 - 1/k is the ceiling for k classes
            assert!((0.0..=0.75 + 1e-6).contains(&d), "diversity {d}");
            if n == 1.0 {
                assert_eq!(d, 0.0);
            }
        }
    }
}

// ============================================================================
// Coverage
// ============================================================================

#[test]
fn test_disjoint_source_yields_all_missing() {
    let target = unit_target();
    let (lat, lon) = regular_coords(bbox::SOUTH_PACIFIC, 1.0);
    let source = LatLonGrid::new(lat, lon).unwrap();
    let field = create_test_field(10, 10);

    for strategy in STRATEGIES {
        for rule in [AggregationRule::Mean, AggregationRule::Count] {
            let out = resample(&target, &source, field.view(), &params(rule, strategy)).unwrap();
            assert_eq!(out.dim(), (8, 8));
            assert!(out.iter().all(|v| v.is_nan()));
        }
    }
}

#[test]
fn test_non_separable_target_matches_nearest_index() {
    let (lat, lon) = tilted_swath(6, 6, (4.0, 0.0), 0.7, 0.05);
    let target = LatLonGrid::new(lat, lon).unwrap();
    assert!(!target.is_separable());

    let source = tilted_source();
    let field = source_field();

    let auto = resample(&target, &source, field.view(), &params(AggregationRule::Mean, ResampleStrategy::Auto)).unwrap();
    let generic = resample(
        &target,
        &source,
        field.view(),
        &params(AggregationRule::Mean, ResampleStrategy::NearestIndex),
    )
    .unwrap();

    assert_eq!(auto.dim(), (6, 6));
    assert_grids_eq!(auto, generic);
}

#[test]
fn test_regular_target_from_bounding_box() {
    let target = LatLonGrid::regular(&BoundingBox::new(-15.0, 35.0, 45.0, 72.0), 1.0).unwrap();
    assert_eq!(target.shape(), (37, 60));
    assert!(target.is_separable());
}

// ============================================================================
// Magnification
// ============================================================================

#[test]
fn test_magnify_factor_one_is_identity() {
    let source = tilted_source();
    let field = source_field();

    let (grid, values) = magnify(&source, field.view(), 1).unwrap();

    assert_eq!(grid, source);
    assert_grids_eq!(values, field);
}

#[test]
fn test_magnify_keeps_corners() {
    let source = tilted_source();
    let field = create_test_field(30, 30);

    let (grid, values) = magnify(&source, field.view(), 3).unwrap();

    assert_eq!(grid.shape(), (90, 90));
    assert_eq!(values.dim(), (90, 90));
    assert_approx_eq!(grid.lat()[[0, 0]], source.lat()[[0, 0]], 1e-9);
    assert_approx_eq!(grid.lon()[[89, 89]], source.lon()[[29, 29]], 1e-9);
    assert_eq!(values[[0, 0]], field[[0, 0]]);
    assert_eq!(values[[89, 89]], field[[29, 29]]);
}
