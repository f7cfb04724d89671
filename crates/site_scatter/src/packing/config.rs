//! Configuration for the packing loop.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sampling::priority_scan::DEFAULT_MAX_ATTEMPTS;

/// Configuration for running the packing loop.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PackingConfig {
    /// Minimum distance between any two accepted points, in working units.
    pub min_distance: f64,
    /// Optional reach limit: every point after the first must lie within this distance of
    /// an already accepted point.
    pub max_distance: Option<f64>,
    /// Rejection draws per polygon per sampling step.
    pub max_attempts: usize,
    /// Stop after this many points; `None` runs until the region is used up.
    pub target_point_count: Option<usize>,
    /// Safety cap on sampling steps.
    pub max_iterations: Option<usize>,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            min_distance: 0.0,
            max_distance: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            target_point_count: None,
            max_iterations: None,
        }
    }
}

impl PackingConfig {
    /// Creates a new [`PackingConfig`] with the specified minimum distance.
    pub fn new(min_distance: f64) -> Self {
        Self {
            min_distance,
            ..Default::default()
        }
    }

    /// Sets the reach limit.
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    /// Sets the per-polygon draw budget.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the number of points to place.
    pub fn with_target_point_count(mut self, target: usize) -> Self {
        self.target_point_count = Some(target);
        self
    }

    /// Sets the sampling step cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.min_distance.is_finite() || self.min_distance <= 0.0 {
            return Err(Error::InvalidConfig(
                "min_distance must be finite and > 0".into(),
            ));
        }
        if let Some(max) = self.max_distance {
            if !max.is_finite() || max <= self.min_distance {
                return Err(Error::InvalidConfig(
                    "max_distance must be finite and > min_distance".into(),
                ));
            }
        }
        if self.max_attempts == 0 {
            return Err(Error::InvalidConfig("max_attempts must be > 0".into()));
        }
        Ok(())
    }
}
