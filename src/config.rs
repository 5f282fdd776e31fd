//! Run configuration.

use std::io::Read;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lp::SolveOptions;

/// Limits applied to every solver call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Wall-clock budget per solve, in seconds.
    pub time_limit_secs: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 600.0,
        }
    }
}

impl SolverConfig {
    /// Per-call solver options.
    pub fn options(&self) -> SolveOptions {
        SolveOptions {
            time_limit: Duration::try_from_secs_f64(self.time_limit_secs).ok(),
        }
    }
}

/// Column generation settings.
///
/// # Examples
///
/// ```
/// use u_cvrptw::config::Config;
///
/// let config = Config::from_json_reader(r#"{"max_iterations": 5}"#.as_bytes()).unwrap();
/// assert_eq!(config.max_iterations, 5);
/// assert_eq!(config.reduced_cost_threshold, 0.0);
/// assert_eq!(config.solver.time_limit_secs, 600.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of productive pricing iterations.
    pub max_iterations: usize,
    /// A priced route is added only if its reduced cost is strictly below
    /// this value.
    pub reduced_cost_threshold: f64,
    /// Price vehicle classes concurrently.
    pub parallel_pricing: bool,
    pub solver: SolverConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            reduced_cost_threshold: 0.0,
            parallel_pricing: true,
            solver: SolverConfig::default(),
        }
    }
}

impl Config {
    /// Reads a JSON document; absent fields keep their defaults.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let config: Config = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values no run can use.
    pub fn validate(&self) -> Result<()> {
        if !self.reduced_cost_threshold.is_finite() {
            return Err(Error::Format("reduced_cost_threshold must be finite".into()));
        }
        if !(self.solver.time_limit_secs.is_finite() && self.solver.time_limit_secs > 0.0) {
            return Err(Error::Format("solver.time_limit_secs must be positive".into()));
        }
        Ok(())
    }

    /// Sets the iteration limit.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the reduced-cost threshold.
    pub fn with_reduced_cost_threshold(mut self, threshold: f64) -> Self {
        self.reduced_cost_threshold = threshold;
        self
    }

    /// Enables or disables concurrent pricing.
    pub fn with_parallel_pricing(mut self, parallel: bool) -> Self {
        self.parallel_pricing = parallel;
        self
    }

    /// Sets the per-solve time budget in seconds.
    pub fn with_time_limit_secs(mut self, secs: f64) -> Self {
        self.solver.time_limit_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.max_iterations, 100);
        assert!(c.parallel_pricing);
        assert_eq!(c.solver.time_limit_secs, 600.0);
        assert_eq!(c.solver.options().time_limit, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_nested_partial_json() {
        let c = Config::from_json_reader(r#"{"solver": {"time_limit_secs": 2.5}}"#.as_bytes()).expect("valid");
        assert_eq!(c.solver.options().time_limit, Some(Duration::from_millis(2500)));
        assert_eq!(c.max_iterations, 100);
        assert!(c.parallel_pricing);
    }

    #[test]
    fn test_validate_rejects() {
        assert!(Config::default().with_time_limit_secs(0.0).validate().is_err());
        assert!(Config::default().with_reduced_cost_threshold(f64::NAN).validate().is_err());
        let err = Config::from_json_reader(r#"{"solver": {"time_limit_secs": -1}}"#.as_bytes()).expect_err("invalid");
        assert_eq!(err.kind(), "FormatError");
    }

    #[test]
    fn test_builders() {
        let c = Config::default()
            .with_max_iterations(3)
            .with_reduced_cost_threshold(-1.0)
            .with_parallel_pricing(false)
            .with_time_limit_secs(5.0);
        assert_eq!(c.max_iterations, 3);
        assert_eq!(c.reduced_cost_threshold, -1.0);
        assert!(!c.parallel_pricing);
        assert_eq!(c.solver.options().time_limit, Some(Duration::from_secs(5)));
    }
}
