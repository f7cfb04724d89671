//! Polygon constructors.
use std::f64::consts::{PI, TAU};

use geo::{Coord, LineString, Polygon};

/// Fewer vertices than this make a disk approximation too coarse to be useful.
pub const MIN_DISK_SEGMENTS: usize = 8;

/// Regular polygon around `center` whose edges are tangent to the circle of `radius`.
///
/// The polygon circumscribes the circle, so every point within `radius` of `center`
/// lies inside it. Removing such a disk from a region therefore removes the whole
/// exact circle.
pub fn disk(center: Coord<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let n = segments.max(MIN_DISK_SEGMENTS);
    regular_polygon(center, radius / (PI / n as f64).cos(), n)
}

/// Regular polygon around `center` with its vertices on the circle of `radius`.
///
/// Every point of the polygon lies within `radius` of `center`, which makes it the
/// right shape for an upper distance bound.
pub fn inscribed_disk(center: Coord<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    regular_polygon(center, radius, segments.max(MIN_DISK_SEGMENTS))
}

fn regular_polygon(center: Coord<f64>, vertex_radius: f64, n: usize) -> Polygon<f64> {
    let ring: Vec<Coord<f64>> = (0..n)
        .map(|i| {
            let angle = TAU * i as f64 / n as f64;
            Coord {
                x: center.x + vertex_radius * angle.cos(),
                y: center.y + vertex_radius * angle.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::from(ring), Vec::new())
}

/// Axis-aligned rectangle polygon.
pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![
            Coord { x: min_x, y: min_y },
            Coord { x: max_x, y: min_y },
            Coord { x: max_x, y: max_y },
            Coord { x: min_x, y: max_y },
        ]),
        Vec::new(),
    )
}

#[cfg(test)]
mod tests {
    use geo::{coord, Area, Contains, Distance, Euclidean, Point};

    use super::*;
    use crate::geometry::EPSILON;

    fn radius_of(center: Coord<f64>, c: Coord<f64>) -> f64 {
        Euclidean.distance(Point::from(center), Point::from(c))
    }

    #[test]
    fn disk_circumscribes_the_circle() {
        let center = coord! { x: 10.0, y: -5.0 };
        let poly = disk(center, 50.0, 16);
        for c in poly.exterior().coords() {
            assert!(radius_of(center, *c) >= 50.0 - EPSILON);
        }
        // Points on the true circle, including edge midpoints, are covered.
        for i in 0..360 {
            let a = (i as f64).to_radians();
            let p = coord! { x: center.x + 49.999 * a.cos(), y: center.y + 49.999 * a.sin() };
            assert!(poly.contains(&Point::from(p)), "angle {i} not covered");
        }
    }

    #[test]
    fn inscribed_disk_stays_inside_the_circle() {
        let center = coord! { x: -3.0, y: 7.0 };
        let poly = inscribed_disk(center, 100.0, 8);
        for c in poly.exterior().coords() {
            assert!((radius_of(center, *c) - 100.0).abs() < 1e-9);
        }
        // Edge midpoints are the closest boundary points; they sit at r * cos(pi / n).
        let apothem = 100.0 * (PI / 8.0).cos();
        for i in 0..360 {
            let a = (i as f64).to_radians();
            let (dx, dy) = (a.cos(), a.sin());
            let outside = coord! { x: center.x + 100.001 * dx, y: center.y + 100.001 * dy };
            assert!(!poly.contains(&Point::from(outside)), "angle {i} reaches past the radius");
            let r = 0.999 * apothem;
            let inside = coord! { x: center.x + r * dx, y: center.y + r * dy };
            assert!(poly.contains(&Point::from(inside)));
        }
    }

    #[test]
    fn disk_area_approaches_circle_area() {
        let exact = PI * 100.0;
        let outer = disk(coord! { x: 0.0, y: 0.0 }, 10.0, 128).unsigned_area();
        let inner = inscribed_disk(coord! { x: 0.0, y: 0.0 }, 10.0, 128).unsigned_area();
        assert!(outer >= exact);
        assert!(outer < exact * 1.01);
        assert!(inner <= exact);
        assert!(inner > exact * 0.99);
    }

    #[test]
    fn disk_clamps_segment_count() {
        let poly = disk(coord! { x: 0.0, y: 0.0 }, 1.0, 3);
        // Closed ring repeats the first vertex.
        assert_eq!(poly.exterior().0.len(), MIN_DISK_SEGMENTS + 1);
        let inner = inscribed_disk(coord! { x: 0.0, y: 0.0 }, 1.0, 0);
        assert_eq!(inner.exterior().0.len(), MIN_DISK_SEGMENTS + 1);
    }
}
