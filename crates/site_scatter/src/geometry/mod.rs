//! Planar geometry capability used by the region algebra and the packing loop.
//!
//! All geometry lives in one projected reference system with linear units (meters for
//! Web Mercator). Boolean algebra, containment and area are delegated to a
//! [`GeometryEngine`]; the default [`GeoEngine`] is backed by the `geo` crate.
//!
//! Comparisons never assume exact equality: areas below [`DEFAULT_SLIVER_AREA`] are
//! treated as empty and distance checks use [`EPSILON`].
use geo::{Coord, MultiLineString, MultiPolygon, Polygon, Rect};

use crate::error::Result;

pub mod engine;
pub mod shapes;

pub use engine::GeoEngine;

/// Polygon or multi-polygon value in the working reference system.
pub type Geometry = MultiPolygon<f64>;

/// Absolute tolerance for length comparisons in working units.
pub const EPSILON: f64 = 1e-9;

/// Polygons with a smaller area are dropped when a geometry is exploded.
pub const DEFAULT_SLIVER_AREA: f64 = 1e-6;

/// Default number of vertices used to approximate a disk.
pub const DEFAULT_DISK_SEGMENTS: usize = 64;

/// Primitive geometry operations required by the feasibility region and the sampler.
///
/// Implementations must tolerate degenerate input: boolean operations never panic and
/// return (possibly empty) geometry, while [`GeometryEngine::validate`] reports problems
/// as typed errors and [`GeometryEngine::repair`] salvages what it can.
pub trait GeometryEngine {
    fn intersect(&self, a: &Geometry, b: &Geometry) -> Geometry;

    fn difference(&self, a: &Geometry, b: &Geometry) -> Geometry;

    fn union(&self, a: &Geometry, b: &Geometry) -> Geometry;

    /// Unions an arbitrary number of parts into one normalized geometry.
    fn union_all(&self, parts: Vec<Geometry>) -> Geometry;

    /// Disk of `radius` around `center`. The polygon covers the exact circle.
    fn buffer_point(&self, center: Coord<f64>, radius: f64) -> Polygon<f64>;

    /// Disk of `radius` around `center` lying entirely inside the exact circle.
    fn inner_disk(&self, center: Coord<f64>, radius: f64) -> Polygon<f64>;

    /// Grows areal geometry outward by `distance`.
    fn buffer(&self, geometry: &Geometry, distance: f64) -> Result<Geometry>;

    /// Turns linework into areal geometry of half-width `distance`.
    fn buffer_lines(&self, lines: &MultiLineString<f64>, distance: f64) -> Result<Geometry>;

    /// Strict interior containment; boundary points are not contained.
    fn contains(&self, polygon: &Polygon<f64>, point: Coord<f64>) -> bool;

    fn bounds_of(&self, polygon: &Polygon<f64>) -> Option<Rect<f64>>;

    fn area(&self, geometry: &Geometry) -> f64;

    /// Splits a geometry into its connected simple polygons, dropping slivers.
    fn explode(&self, geometry: Geometry) -> Vec<Polygon<f64>>;

    /// Reports the first problem that would make boolean operations unreliable.
    fn validate(&self, geometry: &Geometry) -> Result<()>;

    /// Drops unusable parts and re-normalizes the rest.
    fn repair(&self, geometry: &Geometry) -> Geometry;
}

/// Returns an empty geometry.
#[inline]
pub fn empty() -> Geometry {
    MultiPolygon::new(Vec::new())
}
