//! Group-by-cell aggregation shared by every id-assignment strategy.
//!
//! Both resampling paths reduce to a flat list of `(cell id, value)` pairs.
//! The engine sorts the pairs by id, reduces each run of equal ids with the
//! selected [`AggregationRule`] and writes the results into a NaN-filled
//! output grid.

use std::collections::BTreeMap;

use ndarray::Array2;

use crate::types::AggregationRule;

/// Group `(cell id, value)` pairs by id and reduce each group with `rule`.
///
/// NaN values are dropped before grouping, so every group in the returned
/// map holds at least one sample.
pub fn aggregate<I>(pairs: I, rule: AggregationRule) -> BTreeMap<usize, f32>
where
    I: IntoIterator<Item = (usize, f32)>,
{
    let mut pairs: Vec<(usize, f32)> = pairs.into_iter().filter(|(_, v)| !v.is_nan()).collect();
    pairs.sort_unstable_by_key(|&(id, _)| id);

    let mut result = BTreeMap::new();
    let mut values: Vec<f32> = Vec::new();
    let mut start = 0;
    while start < pairs.len() {
        let id = pairs[start].0;
        let end = start + pairs[start..].iter().take_while(|(i, _)| *i == id).count();

        values.clear();
        values.extend(pairs[start..end].iter().map(|&(_, v)| v));
        result.insert(id, reduce(&mut values, rule));

        start = end;
    }
    result
}

/// Write aggregated cells into a NaN-initialised grid of `shape`.
///
/// Ids beyond the grid are ignored.
pub fn scatter(cells: &BTreeMap<usize, f32>, shape: (usize, usize)) -> Array2<f32> {
    let mut output = Array2::from_elem(shape, f32::NAN);
    if let Some(flat) = output.as_slice_mut() {
        for (&id, &value) in cells {
            if let Some(slot) = flat.get_mut(id) {
                *slot = value;
            }
        }
    }
    output
}

/// Reduce one non-empty group. `values` may be reordered.
pub fn reduce(values: &mut [f32], rule: AggregationRule) -> f32 {
    if values.is_empty() {
        return f32::NAN;
    }
    match rule {
        AggregationRule::Mean => mean(values),
        AggregationRule::Median => median(values),
        AggregationRule::Min => values.iter().copied().fold(f32::INFINITY, f32::min),
        AggregationRule::Max => values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        AggregationRule::Mode => mode(values),
        AggregationRule::Count => values.len() as f32,
        AggregationRule::Diversity => gini_simpson(values),
    }
}

#[inline]
fn mean(values: &[f32]) -> f32 {
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    (sum / values.len() as f64) as f32
}

fn median(values: &mut [f32]) -> f32 {
    values.sort_unstable_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        ((values[mid - 1] as f64 + values[mid] as f64) / 2.0) as f32
    }
}

/// Sizes of the runs of equal values, in ascending value order.
fn value_runs(values: &mut [f32]) -> Vec<(f32, usize)> {
    values.sort_unstable_by(f32::total_cmp);
    let mut runs: Vec<(f32, usize)> = Vec::new();
    for &v in values.iter() {
        match runs.last_mut() {
            Some((last, count)) if *last == v => *count += 1,
            _ => runs.push((v, 1)),
        }
    }
    runs
}

/// Most frequent value. Runs are visited in ascending order and only a
/// strictly larger count replaces the current best, so the smallest of the
/// tied values wins.
fn mode(values: &mut [f32]) -> f32 {
    let mut best = (f32::NAN, 0usize);
    for (value, count) in value_runs(values) {
        if count > best.1 {
            best = (value, count);
        }
    }
    best.0
}

/// `1 - sum(p_i^2)` over the distinct values of the group.
fn gini_simpson(values: &mut [f32]) -> f32 {
    let total = values.len() as f64;
    let sum_sq: f64 = value_runs(values)
        .into_iter()
        .map(|(_, count)| {
            let p = count as f64 / total;
            p * p
        })
        .sum();
    (1.0 - sum_sq) as f32
}
