//! Configuration for regridding runs.

use serde::{Deserialize, Serialize};

use crate::error::{RegridError, Result};
use crate::fanout::{FailurePolicy, FanoutOptions};
use crate::types::{AggregationRule, ResampleParams, ResampleStrategy, SamplingMethod};

/// Configuration for a regridding run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegridConfig {
    /// 1-D interpolation family for separable targets.
    pub sampling_method: SamplingMethod,

    /// Reduction applied per target cell.
    pub aggregation: AggregationRule,

    /// Source magnification factor (1 = off).
    pub magnification: usize,

    /// Force the nearest-index path even for separable targets.
    pub force_nearest_index: bool,

    /// Regrid stack layers on a worker pool.
    pub parallel: bool,

    /// Worker count for stack fan-out (0 = one per core).
    pub workers: usize,

    /// Keep successful layers when some layers fail.
    pub partial_results: bool,

    /// Moving-average window for temporal smoothing (layers).
    pub smoothing_window: usize,
}

impl Default for RegridConfig {
    fn default() -> Self {
        Self {
            sampling_method: SamplingMethod::Nearest,
            aggregation: AggregationRule::Mean,
            magnification: 1,
            force_nearest_index: false,
            parallel: true,
            workers: 0,
            partial_results: false,
            smoothing_window: 1,
        }
    }
}

impl RegridConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unset keys keep their defaults. Unknown method names and unparseable
    /// numbers are errors rather than silent fallbacks.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("REGRID_SAMPLING_METHOD") {
            config.sampling_method = val.parse()?;
        }

        if let Some(val) = lookup("REGRID_AGGREGATION") {
            config.aggregation = val.parse()?;
        }

        if let Some(val) = lookup("REGRID_MAG_FACTOR") {
            config.magnification = parse_number("REGRID_MAG_FACTOR", &val)?;
        }

        if let Some(val) = lookup("REGRID_FORCE_NEAREST_INDEX") {
            config.force_nearest_index = parse_flag(&val);
        }

        if let Some(val) = lookup("REGRID_PARALLEL") {
            config.parallel = parse_flag(&val);
        }

        if let Some(val) = lookup("REGRID_WORKERS") {
            config.workers = parse_number("REGRID_WORKERS", &val)?;
        }

        if let Some(val) = lookup("REGRID_PARTIAL_RESULTS") {
            config.partial_results = parse_flag(&val);
        }

        if let Some(val) = lookup("REGRID_SMOOTHING_WINDOW") {
            config.smoothing_window = parse_number("REGRID_SMOOTHING_WINDOW", &val)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.magnification == 0 {
            return Err(RegridError::config("magnification must be >= 1"));
        }

        if self.smoothing_window == 0 {
            return Err(RegridError::config("smoothing_window must be >= 1"));
        }

        Ok(())
    }

    /// Per-layer parameters for this configuration.
    pub fn params(&self) -> ResampleParams {
        let strategy = if self.force_nearest_index {
            ResampleStrategy::NearestIndex
        } else {
            ResampleStrategy::Auto
        };
        ResampleParams::new(self.sampling_method, self.aggregation)
            .with_magnification(self.magnification)
            .with_strategy(strategy)
    }

    /// Stack dispatch options for this configuration.
    pub fn fanout_options(&self) -> FanoutOptions {
        let policy = if self.partial_results {
            FailurePolicy::Partial
        } else {
            FailurePolicy::AllOrNothing
        };
        FanoutOptions {
            parallel: self.parallel,
            workers: self.workers,
            policy,
        }
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

fn parse_number(key: &str, val: &str) -> Result<usize> {
    val.trim()
        .parse()
        .map_err(|_| RegridError::config(format!("{key} must be a non-negative integer, got {val:?}")))
}
