//! Synthetic regridding driver.
//!
//! Builds a tilted swath with a multi-layer field, regrids it onto a regular
//! grid sequentially and on the worker pool, checks that both agree, then
//! smooths the result along the layer axis.

use std::time::Instant;

use anyhow::{bail, Result};
use clap::Parser;
use ndarray::{Array2, Array3};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use swath_regrid::{
    count_observations, resample_stack, resample_stack_with, smooth_temporal, spatial_mean,
    LatLonGrid, RegridConfig,
};

#[derive(Parser, Debug)]
#[command(name = "regrid-synthetic")]
#[command(about = "Regrid a synthetic swath stack and report timings")]
struct Args {
    /// Swath rows (along-track)
    #[arg(long, default_value_t = 200)]
    rows: usize,

    /// Swath columns (across-track)
    #[arg(long, default_value_t = 150)]
    cols: usize,

    /// Number of layers in the stack
    #[arg(long, default_value_t = 16)]
    layers: usize,

    /// Target grid resolution in degrees
    #[arg(long, default_value_t = 0.1)]
    resolution: f64,

    /// Aggregation rule (overrides REGRID_AGGREGATION)
    #[arg(long)]
    aggregation: Option<String>,

    /// Sampling method (overrides REGRID_SAMPLING_METHOD)
    #[arg(long)]
    sampling: Option<String>,

    /// Magnification factor (overrides REGRID_MAG_FACTOR)
    #[arg(long)]
    mag_factor: Option<usize>,

    /// Worker count, 0 = one per core (overrides REGRID_WORKERS)
    #[arg(long)]
    workers: Option<usize>,

    /// Smoothing window in layers (overrides REGRID_SMOOTHING_WINDOW)
    #[arg(long)]
    window: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit JSON logs
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);
    if args.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let config = load_config(&args)?;
    info!(?config, "Loaded configuration");

    let swath = synthetic_swath(args.rows, args.cols)?;
    let stack = synthetic_stack(&swath, args.layers);
    let target = LatLonGrid::regular(&swath.bounds(), args.resolution)?;
    info!(
        swath_shape = ?swath.shape(),
        target_shape = ?target.shape(),
        layers = args.layers,
        "Generated synthetic inputs"
    );

    let params = config.params();

    let started = Instant::now();
    let sequential = resample_stack(&target, &swath, stack.view(), &params, false)?;
    let sequential_ms = started.elapsed().as_millis() as u64;

    let started = Instant::now();
    let outcome = resample_stack_with(&target, &swath, stack.view(), &params, &config.fanout_options())?;
    let parallel_ms = started.elapsed().as_millis() as u64;

    for failure in &outcome.failures {
        warn!(layer = failure.layer, error = %failure.error, "Layer left empty");
    }

    let identical = sequential
        .iter()
        .zip(outcome.data.iter())
        .all(|(a, b)| a.to_bits() == b.to_bits());
    if outcome.is_complete() && !identical {
        bail!("parallel and sequential stacks differ");
    }
    info!(sequential_ms, parallel_ms, identical, "Regridded stack");

    let started = Instant::now();
    let smoothed = smooth_temporal(outcome.data.view(), config.smoothing_window)?;
    info!(
        window = config.smoothing_window,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Smoothed stack"
    );

    let means = spatial_mean(smoothed.view());
    let counts = count_observations(&target, std::slice::from_ref(&swath));
    let covered = counts.iter().filter(|&&n| n > 0).count();
    info!(
        covered_cells = covered,
        total_cells = target.len(),
        first_mean = means.first().copied().unwrap_or(f32::NAN),
        last_mean = means.last().copied().unwrap_or(f32::NAN),
        "Summary"
    );

    Ok(())
}

/// Environment configuration with command-line overrides applied.
fn load_config(args: &Args) -> Result<RegridConfig> {
    let mut config = RegridConfig::from_env()?;

    if let Some(rule) = &args.aggregation {
        config.aggregation = rule.parse()?;
    }
    if let Some(method) = &args.sampling {
        config.sampling_method = method.parse()?;
    }
    if let Some(factor) = args.mag_factor {
        config.magnification = factor;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(window) = args.window {
        config.smoothing_window = window;
    }

    config.validate()?;
    Ok(config)
}

/// A swath tilted against the meridians, so its coordinates are not separable.
fn synthetic_swath(rows: usize, cols: usize) -> Result<LatLonGrid> {
    let lat = Array2::from_shape_fn((rows, cols), |(r, c)| 45.0 - r as f64 * 0.05 + c as f64 * 0.01);
    let lon = Array2::from_shape_fn((rows, cols), |(r, c)| -10.0 + c as f64 * 0.06 + r as f64 * 0.02);
    Ok(LatLonGrid::new(lat, lon)?)
}

/// Smooth field that drifts by layer, with scattered missing samples.
fn synthetic_stack(swath: &LatLonGrid, layers: usize) -> Array3<f32> {
    let (rows, cols) = swath.shape();
    Array3::from_shape_fn((rows, cols, layers), |(r, c, l)| {
        if (r * 7 + c * 3 + l) % 23 == 0 {
            return f32::NAN;
        }
        let lat = swath.lat()[[r, c]];
        let lon = swath.lon()[[r, c]];
        (280.0 + 10.0 * (lat.to_radians() * 4.0).sin() + 5.0 * (lon.to_radians() * 3.0).cos()
            + l as f64 * 0.25) as f32
    })
}
