//! Priority-scan sampling with bounded rejection per polygon.
use geo::Coord;
use rand::RngCore;
use tracing::trace;

use crate::geometry::GeometryEngine;
use crate::region::FeasibilityRegion;
use crate::sampling::{rand01, RegionSampler, Sample, SampleOutcome};

/// Default number of rejection draws per polygon.
pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

/// Scans layers in priority order and polygons in document order, returning the first
/// point that lands inside the current polygon.
///
/// Each polygon gets at most `max_attempts` uniform draws inside its bounding box. A point
/// is never drawn from a lower-priority layer while an earlier polygon still yields one,
/// so higher-priority area is always used up first.
#[derive(Debug, Clone)]
pub struct PriorityScanSampler {
    /// Rejection draws per polygon.
    pub max_attempts: usize,
}

impl Default for PriorityScanSampler {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PriorityScanSampler {
    /// Create a sampler with the given per-polygon draw budget.
    pub fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }
}

impl RegionSampler for PriorityScanSampler {
    fn sample(
        &self,
        engine: &dyn GeometryEngine,
        region: &FeasibilityRegion,
        rng: &mut dyn RngCore,
    ) -> SampleOutcome {
        let mut attempts = 0usize;

        for (layer_idx, layer) in region.layers().iter().enumerate() {
            for polygon in &layer.polygons {
                let Some(bounds) = engine.bounds_of(polygon) else {
                    continue;
                };
                let min = bounds.min();
                let w = bounds.width();
                let h = bounds.height();

                for _ in 0..self.max_attempts {
                    attempts += 1;
                    let candidate = Coord {
                        x: min.x + rand01(rng) * w,
                        y: min.y + rand01(rng) * h,
                    };
                    if engine.contains(polygon, candidate) {
                        return SampleOutcome::Found(Sample {
                            position: candidate,
                            layer: layer_idx,
                            attempts,
                        });
                    }
                }
                trace!(
                    "Polygon in layer {} exhausted its {} draws.",
                    layer_idx,
                    self.max_attempts
                );
            }
        }

        SampleOutcome::Exhausted { attempts }
    }
}
