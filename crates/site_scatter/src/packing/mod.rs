//! Greedy minimum-distance packing over a [`crate::region::FeasibilityRegion`].
//!
//! The loop samples a candidate, accepts it, removes a disk of `min_distance` around it
//! from every layer, and repeats until the target count is reached, the region is empty,
//! or the sampler gives up. Because every acceptance removes the disk before the next
//! draw, any two accepted points are at least `min_distance` apart.
pub mod config;
pub mod events;
pub mod runner;
pub mod state;

pub use config::PackingConfig;
pub use events::{EventSink, FnSink, PackingEvent, PackingEventKind, VecSink};
pub use runner::{pack_constraints, run_packing, PackingLoop, PackingOutcome};
pub use state::{AcceptedPoint, GenerationState, PackingState, Termination};
