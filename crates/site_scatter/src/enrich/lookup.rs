//! Spatial attribute lookups against caller-supplied features.
use geo::{BoundingRect, Contains, Coord, Distance, Euclidean, Intersects, Point, Polygon, Rect};

use crate::geometry::EPSILON;

/// Looks up a scalar attribute for a position.
pub trait AttributeLookup {
    /// Returns `None` when no feature matches.
    fn lookup(&self, position: Coord<f64>) -> Option<f64>;
}

struct Feature {
    polygon: Polygon<f64>,
    bounds: Option<Rect<f64>>,
    value: f64,
}

/// Containing-feature lookup with an optional nearest-feature fallback.
///
/// The first feature (in insertion order) containing the position wins. When none
/// contains it and `max_search_distance > 0`, the nearest feature within that distance
/// is used instead.
pub struct FeatureLookup {
    features: Vec<Feature>,
    max_search_distance: f64,
}

impl FeatureLookup {
    pub fn new(features: impl IntoIterator<Item = (Polygon<f64>, f64)>) -> Self {
        Self {
            features: features
                .into_iter()
                .map(|(polygon, value)| Feature {
                    bounds: polygon.bounding_rect(),
                    polygon,
                    value,
                })
                .collect(),
            max_search_distance: 0.0,
        }
    }

    /// Enables the nearest-feature fallback within `distance`.
    pub fn with_max_search_distance(mut self, distance: f64) -> Self {
        self.max_search_distance = distance.max(0.0);
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl AttributeLookup for FeatureLookup {
    fn lookup(&self, position: Coord<f64>) -> Option<f64> {
        let point = Point::from(position);
        let reach = self.max_search_distance + EPSILON;
        let window = Rect::new(
            Coord {
                x: position.x - reach,
                y: position.y - reach,
            },
            Coord {
                x: position.x + reach,
                y: position.y + reach,
            },
        );
        let mut nearest: Option<(f64, f64)> = None;
        for feature in &self.features {
            if !feature.bounds.is_some_and(|b| b.intersects(&window)) {
                continue;
            }
            if feature.polygon.contains(&point) {
                return Some(feature.value);
            }
            if self.max_search_distance <= 0.0 {
                continue;
            }
            let d = Euclidean.distance(&point, &feature.polygon);
            if d <= self.max_search_distance && nearest.is_none_or(|(best, _)| d < best) {
                nearest = Some((d, feature.value));
            }
        }
        nearest.map(|(_, value)| value)
    }
}
