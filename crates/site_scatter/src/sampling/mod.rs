//! Candidate point sampling from a [`FeasibilityRegion`].
//!
//! This module defines the [`RegionSampler`] trait used by the packing loop and the
//! default [`PriorityScanSampler`]. Randomness is always injected by the caller.
use geo::Coord;
use rand::RngCore;

use crate::geometry::GeometryEngine;
use crate::region::FeasibilityRegion;

pub mod priority_scan;

pub use priority_scan::PriorityScanSampler;

/// A candidate point drawn from a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Position in the working reference system.
    pub position: Coord<f64>,
    /// Index of the region layer the point was drawn from.
    pub layer: usize,
    /// Random draws spent to find the point, across all polygons scanned.
    pub attempts: usize,
}

/// Outcome of one sampling call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    Found(Sample),
    /// No point found within the attempt budget; carries the draws spent.
    Exhausted { attempts: usize },
}

impl SampleOutcome {
    pub fn sample(self) -> Option<Sample> {
        match self {
            SampleOutcome::Found(s) => Some(s),
            SampleOutcome::Exhausted { .. } => None,
        }
    }

    pub fn attempts(&self) -> usize {
        match self {
            SampleOutcome::Found(s) => s.attempts,
            SampleOutcome::Exhausted { attempts } => *attempts,
        }
    }
}

/// Trait for drawing one candidate point from a region.
pub trait RegionSampler {
    fn sample(
        &self,
        engine: &dyn GeometryEngine,
        region: &FeasibilityRegion,
        rng: &mut dyn RngCore,
    ) -> SampleOutcome;
}

/// Generate a random float in the range [0, 1).
#[inline]
pub(crate) fn rand01(rng: &mut dyn RngCore) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}
