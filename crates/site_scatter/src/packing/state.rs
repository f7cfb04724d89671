//! Packing loop state: accepted points, the current region, and the phase machine.
use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::region::FeasibilityRegion;

/// A point accepted by the packing loop. Never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptedPoint {
    /// Zero-based acceptance order.
    pub id: usize,
    /// Position in the working reference system.
    pub position: Coord<f64>,
    /// Priority of the preference layer the point was drawn from; `None` for the
    /// remainder layer.
    pub priority: Option<i32>,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Termination {
    /// The configured target count was reached.
    TargetReached,
    /// No feasible area remains.
    RegionEmpty,
    /// The sampler found no point within its attempt budget.
    SamplingExhausted,
    /// The caller-imposed step cap was hit.
    IterationLimit,
}

/// Phase of the packing state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackingState {
    Sampling,
    Accepted,
    /// Terminal: target reached, region empty or step cap hit.
    Done(Termination),
    /// Terminal: the sampler gave up; accepted points are a partial result.
    Exhausted,
}

impl PackingState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PackingState::Done(_) | PackingState::Exhausted)
    }

    pub fn termination(&self) -> Option<Termination> {
        match self {
            PackingState::Done(t) => Some(*t),
            PackingState::Exhausted => Some(Termination::SamplingExhausted),
            _ => None,
        }
    }
}

/// Accepted points plus the region still available for sampling.
///
/// Owned by the packing loop. `accepted` only grows and `region` only shrinks.
#[derive(Debug, Clone, Default)]
pub struct GenerationState {
    pub accepted: Vec<AcceptedPoint>,
    pub region: FeasibilityRegion,
}

impl GenerationState {
    pub fn new(region: FeasibilityRegion) -> Self {
        Self {
            accepted: Vec::new(),
            region,
        }
    }
}
