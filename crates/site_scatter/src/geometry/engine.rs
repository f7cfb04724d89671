//! [`GeometryEngine`] implementation backed by the `geo` crate.
use geo::{
    Area, BooleanOps, BoundingRect, Buffer, Contains, CoordsIter, Coord, MultiLineString,
    MultiPolygon, Point, Polygon, Rect,
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::shapes::{disk, inscribed_disk};
use crate::geometry::{
    empty, Geometry, GeometryEngine, DEFAULT_DISK_SEGMENTS, DEFAULT_SLIVER_AREA,
};

/// Geometry engine using `geo`'s boolean operations.
#[derive(Debug, Clone)]
pub struct GeoEngine {
    /// Vertex count for disks around points. Areal and line buffers use `geo`'s round style.
    pub disk_segments: usize,
    /// Polygons smaller than this are discarded on explode and repair.
    pub sliver_area: f64,
}

impl Default for GeoEngine {
    fn default() -> Self {
        Self {
            disk_segments: DEFAULT_DISK_SEGMENTS,
            sliver_area: DEFAULT_SLIVER_AREA,
        }
    }
}

impl GeoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the vertex count for disks.
    pub fn with_disk_segments(mut self, disk_segments: usize) -> Self {
        self.disk_segments = disk_segments;
        self
    }

    /// Sets the sliver area threshold.
    pub fn with_sliver_area(mut self, sliver_area: f64) -> Self {
        self.sliver_area = sliver_area;
        self
    }

    fn is_usable(&self, polygon: &Polygon<f64>) -> bool {
        polygon.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite())
            && polygon.exterior().0.len() >= 4
            && polygon.unsigned_area() >= self.sliver_area
    }
}

impl GeometryEngine for GeoEngine {
    fn intersect(&self, a: &Geometry, b: &Geometry) -> Geometry {
        if a.0.is_empty() || b.0.is_empty() {
            return empty();
        }
        a.intersection(b)
    }

    fn difference(&self, a: &Geometry, b: &Geometry) -> Geometry {
        if a.0.is_empty() {
            return empty();
        }
        if b.0.is_empty() {
            return a.clone();
        }
        a.difference(b)
    }

    fn union(&self, a: &Geometry, b: &Geometry) -> Geometry {
        a.union(b)
    }

    fn union_all(&self, parts: Vec<Geometry>) -> Geometry {
        let mut parts: Vec<Geometry> = parts.into_iter().filter(|p| !p.0.is_empty()).collect();
        match parts.len() {
            0 => return empty(),
            // A lone part may still overlap itself; a union with nothing normalizes it.
            1 => return parts[0].union(&empty()),
            _ => {}
        }
        while parts.len() > 1 {
            let mut next = Vec::with_capacity(parts.len().div_ceil(2));
            let mut iter = parts.into_iter();
            while let Some(a) = iter.next() {
                match iter.next() {
                    Some(b) => next.push(a.union(&b)),
                    None => next.push(a),
                }
            }
            parts = next;
        }
        parts.pop().unwrap_or_else(empty)
    }

    fn buffer_point(&self, center: Coord<f64>, radius: f64) -> Polygon<f64> {
        disk(center, radius, self.disk_segments)
    }

    fn inner_disk(&self, center: Coord<f64>, radius: f64) -> Polygon<f64> {
        inscribed_disk(center, radius, self.disk_segments)
    }

    fn buffer(&self, geometry: &Geometry, distance: f64) -> Result<Geometry> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(Error::Geometry(format!(
                "buffer distance must be finite and >= 0, got {distance}"
            )));
        }
        let base = self.repair(geometry);
        if distance == 0.0 || base.0.is_empty() {
            return Ok(base);
        }
        Ok(base.buffer(distance))
    }

    fn buffer_lines(&self, lines: &MultiLineString<f64>, distance: f64) -> Result<Geometry> {
        if !distance.is_finite() || distance <= 0.0 {
            return Err(Error::Geometry(format!(
                "line buffer distance must be finite and > 0, got {distance}"
            )));
        }
        let (usable, skipped): (Vec<_>, Vec<_>) = lines.0.iter().cloned().partition(|ls| {
            ls.coords().all(|c| c.x.is_finite() && c.y.is_finite())
        });
        if !skipped.is_empty() {
            debug!(
                "Skipping {} line string(s) with non-finite coordinates.",
                skipped.len()
            );
        }
        if usable.is_empty() {
            return Ok(empty());
        }
        Ok(MultiLineString::new(usable).buffer(distance))
    }

    fn contains(&self, polygon: &Polygon<f64>, point: Coord<f64>) -> bool {
        polygon.contains(&Point::from(point))
    }

    fn bounds_of(&self, polygon: &Polygon<f64>) -> Option<Rect<f64>> {
        polygon.bounding_rect()
    }

    fn area(&self, geometry: &Geometry) -> f64 {
        geometry.unsigned_area()
    }

    fn explode(&self, geometry: Geometry) -> Vec<Polygon<f64>> {
        geometry
            .0
            .into_iter()
            .filter(|p| p.unsigned_area() >= self.sliver_area)
            .collect()
    }

    fn validate(&self, geometry: &Geometry) -> Result<()> {
        for (idx, polygon) in geometry.0.iter().enumerate() {
            if polygon
                .coords_iter()
                .any(|c| !c.x.is_finite() || !c.y.is_finite())
            {
                return Err(Error::Geometry(format!(
                    "polygon {idx} has non-finite coordinates"
                )));
            }
            if polygon.exterior().0.len() < 4 {
                return Err(Error::Geometry(format!(
                    "polygon {idx} exterior has fewer than 3 vertices"
                )));
            }
        }
        Ok(())
    }

    fn repair(&self, geometry: &Geometry) -> Geometry {
        let parts: Vec<Geometry> = geometry
            .0
            .iter()
            .filter(|p| self.is_usable(p))
            .map(|p| MultiPolygon::new(vec![p.clone()]))
            .collect();
        let dropped = geometry.0.len() - parts.len();
        if dropped > 0 {
            debug!("Repair dropped {} unusable polygon(s).", dropped);
        }
        self.union_all(parts)
    }
}
