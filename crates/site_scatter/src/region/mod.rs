//! Feasibility region: the ordered, disjoint polygon layers candidates are drawn from.
//!
//! Layer 0 is the most preferred. Layers are pairwise disjoint and the polygons of a
//! layer are mutually disjoint simple polygons. Regions are built and shrunk by
//! [`builder::RegionBuilder`]; every shrink yields a new snapshot.
use geo::{Area, BoundingRect, Contains, Coord, MultiPolygon, Point, Polygon, Rect};

pub mod builder;

pub use builder::RegionBuilder;

/// One priority tier of a [`FeasibilityRegion`].
#[derive(Debug, Clone, PartialEq)]
pub struct RegionLayer {
    /// Priority of the preference that produced this layer; `None` for the remainder.
    pub priority: Option<i32>,
    /// Disjoint simple polygons in document order.
    pub polygons: Vec<Polygon<f64>>,
}

impl RegionLayer {
    pub fn new(priority: Option<i32>, polygons: Vec<Polygon<f64>>) -> Self {
        Self { priority, polygons }
    }

    pub fn area(&self) -> f64 {
        self.polygons.iter().map(|p| p.unsigned_area()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn contains(&self, point: Coord<f64>) -> bool {
        let p = Point::from(point);
        self.polygons.iter().any(|poly| poly.contains(&p))
    }

    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        MultiPolygon::new(self.polygons.clone())
    }
}

/// Ordered sequence of disjoint layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeasibilityRegion {
    layers: Vec<RegionLayer>,
}

impl FeasibilityRegion {
    /// Creates a region from layers, dropping empty ones.
    pub fn new(layers: Vec<RegionLayer>) -> Self {
        Self {
            layers: layers.into_iter().filter(|l| !l.is_empty()).collect(),
        }
    }

    /// A region with a single layer holding `polygons`.
    pub fn single(polygons: Vec<Polygon<f64>>) -> Self {
        Self::new(vec![RegionLayer::new(None, polygons)])
    }

    pub fn layers(&self) -> &[RegionLayer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn polygon_count(&self) -> usize {
        self.layers.iter().map(|l| l.polygons.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Total area over all layers.
    pub fn area(&self) -> f64 {
        self.layers.iter().map(RegionLayer::area).sum()
    }

    pub fn contains(&self, point: Coord<f64>) -> bool {
        self.layers.iter().any(|l| l.contains(point))
    }

    /// Index of the layer containing `point`, if any.
    pub fn layer_of(&self, point: Coord<f64>) -> Option<usize> {
        self.layers.iter().position(|l| l.contains(point))
    }

    /// Bounding rectangle of the whole region.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.to_multi_polygon().bounding_rect()
    }

    /// Flattens all layers into one multi-polygon (layer order is lost).
    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        MultiPolygon::new(
            self.layers
                .iter()
                .flat_map(|l| l.polygons.iter().cloned())
                .collect(),
        )
    }
}
