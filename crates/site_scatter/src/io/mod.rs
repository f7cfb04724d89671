//! Vector dataset input and output.
//!
//! [`VectorDataset`] is the seam the pipeline reads constraints through; the bundled
//! implementation is [`GeoJsonDataset`]. Attribute filters use [`AttributePredicate`].
pub mod dataset;
pub mod geojson;
pub mod predicate;

pub use dataset::{DatasetQuery, ValueQuery, VectorDataset};
pub use geojson::{write_disks, write_points, write_region, GeoJsonDataset};
pub use predicate::AttributePredicate;
