#![forbid(unsafe_code)]
//! site_scatter: Constraint-driven site selection by greedy minimum-distance packing.
//!
//! Modules:
//! - geometry: polygon algebra behind the [`geometry::GeometryEngine`] seam, disks and buffers
//! - constraint: must-within, must-outside and prefer-within rules
//! - region: priority-layered feasibility regions and their construction
//! - sampling: candidate draws from a region (priority scan rejection sampling)
//! - packing: the packing loop, its configuration, state and events
//! - enrich: typed output fields and spatial attribute lookups
//! - projection: geographic to working coordinates and back
//! - io, pipeline: GeoJSON datasets and the end-to-end run (feature `io`)
//!
//! For examples and docs, see README and docs.rs.
pub mod constraint;
pub mod enrich;
pub mod error;
pub mod geometry;
#[cfg(feature = "io")]
pub mod io;
pub mod packing;
#[cfg(feature = "io")]
pub mod pipeline;
pub mod projection;
pub mod region;
pub mod sampling;

/// Convenient re-exports for common types. Import with `use site_scatter::prelude::*;`.
pub mod prelude {
    pub use crate::constraint::{ConstraintKind, ConstraintSet, SpatialConstraint};
    pub use crate::enrich::{
        AttributeLookup, Enricher, FeatureLookup, FieldRole, FieldSpec, FieldType, FieldValue,
        OutputRecord,
    };
    pub use crate::error::{Error, Result};
    pub use crate::geometry::shapes::{disk, rectangle};
    pub use crate::geometry::{GeoEngine, Geometry, GeometryEngine};
    #[cfg(feature = "io")]
    pub use crate::io::{
        AttributePredicate, DatasetQuery, GeoJsonDataset, ValueQuery, VectorDataset,
    };
    pub use crate::packing::{
        pack_constraints, run_packing, AcceptedPoint, EventSink, FnSink, PackingConfig,
        PackingEvent, PackingEventKind, PackingLoop, PackingOutcome, PackingState, Termination,
        VecSink,
    };
    #[cfg(feature = "io")]
    pub use crate::pipeline::{LonLat, RunSummary, SiteSelectionConfig};
    pub use crate::projection::{Identity, Projection, ProjectionKind, WebMercator};
    pub use crate::region::{FeasibilityRegion, RegionBuilder, RegionLayer};
    pub use crate::sampling::{PriorityScanSampler, RegionSampler, Sample, SampleOutcome};
}
