//! Composition of spatial constraints into a [`FeasibilityRegion`].
//!
//! Typical usage:
//! - Collect constraints in a [`crate::constraint::ConstraintSet`].
//! - Call [`RegionBuilder::build`] once to obtain the layered region.
//! - Call [`RegionBuilder::shrink`] after each accepted point; it returns a new region.
//!
//! The incremental operations ([`RegionBuilder::apply_must_within`],
//! [`RegionBuilder::apply_must_outside`], [`RegionBuilder::build_layers`]) are public so
//! callers can compose regions step by step.
use geo::{BoundingRect, Intersects};
use tracing::{debug, warn};

use crate::constraint::{ConstraintKind, SpatialConstraint};
use crate::error::{Error, Result};
use crate::geometry::{empty, Geometry, GeometryEngine};
use crate::region::{FeasibilityRegion, RegionLayer};

/// Builds and shrinks feasibility regions through a [`GeometryEngine`].
pub struct RegionBuilder<'e> {
    engine: &'e dyn GeometryEngine,
}

impl<'e> RegionBuilder<'e> {
    pub fn new(engine: &'e dyn GeometryEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &'e dyn GeometryEngine {
        self.engine
    }

    /// Intersects `base` with `geometry`, or starts the base from `geometry`.
    pub fn apply_must_within(&self, base: Option<Geometry>, geometry: &Geometry) -> Geometry {
        match base {
            None => geometry.clone(),
            Some(base) => self.engine.intersect(&base, geometry),
        }
    }

    /// Removes `geometry` from `base`. Fails when no base region exists yet.
    pub fn apply_must_outside(
        &self,
        base: Option<&Geometry>,
        geometry: &Geometry,
    ) -> Result<Geometry> {
        let base = base.ok_or(Error::NoBaseRegion)?;
        Ok(self.engine.difference(base, geometry))
    }

    /// Splits `base` into priority layers.
    ///
    /// Preferences are sorted by ascending priority (stable, so ties keep their order).
    /// Each preference takes its share of the area not yet claimed by an earlier one; the
    /// unclaimed remainder becomes the final layer.
    pub fn build_layers(
        &self,
        base: Option<&Geometry>,
        preferences: &[SpatialConstraint],
    ) -> Result<FeasibilityRegion> {
        let base = base.ok_or(Error::NoBaseRegion)?;

        let mut ordered: Vec<&SpatialConstraint> = preferences.iter().collect();
        ordered.sort_by_key(|c| c.priority());

        let mut remaining = base.clone();
        let mut layers = Vec::with_capacity(ordered.len() + 1);
        for pref in ordered {
            let geometry = self.prepare(pref);
            let layer = self.engine.intersect(&remaining, &geometry);
            remaining = self.engine.difference(&remaining, &geometry);
            let polygons = self.engine.explode(layer);
            debug!(
                "Preference '{}' (priority {}) yields {} polygon(s).",
                pref.name(),
                pref.priority(),
                polygons.len()
            );
            if !polygons.is_empty() {
                layers.push(RegionLayer::new(Some(pref.priority()), polygons));
            }
        }
        let rest = self.engine.explode(remaining);
        if !rest.is_empty() {
            layers.push(RegionLayer::new(None, rest));
        }

        Ok(FeasibilityRegion::new(layers))
    }

    /// Composes a whole constraint list into a region.
    ///
    /// MUST_WITHIN constraints are applied first, then MUST_OUTSIDE, then preferences are
    /// layered. Declaration order across kinds does not matter: a MUST_OUTSIDE listed
    /// before the first MUST_WITHIN still subtracts from the finished base. Without any
    /// MUST_WITHIN constraint there is no bounded universe and the build fails with
    /// [`Error::NoBaseRegion`]. Use [`RegionBuilder::apply_must_outside`] directly for
    /// strict step-by-step composition.
    pub fn build(&self, constraints: &[SpatialConstraint]) -> Result<FeasibilityRegion> {
        let mut base: Option<Geometry> = None;
        for c in constraints
            .iter()
            .filter(|c| c.kind() == ConstraintKind::MustWithin)
        {
            base = Some(self.apply_must_within(base, &self.prepare(c)));
        }
        for c in constraints
            .iter()
            .filter(|c| c.kind() == ConstraintKind::MustOutside)
        {
            base = Some(self.apply_must_outside(base.as_ref(), &self.prepare(c))?);
        }
        let preferences: Vec<SpatialConstraint> = constraints
            .iter()
            .filter(|c| c.kind() == ConstraintKind::PreferWithin)
            .cloned()
            .collect();

        let region = self.build_layers(base.as_ref(), &preferences)?;
        debug!(
            "Built region: {} layer(s), {} polygon(s), area {:.3}.",
            region.layer_count(),
            region.polygon_count(),
            region.area()
        );
        Ok(region)
    }

    /// Returns `region` with `excluded` removed from every layer.
    ///
    /// Layer order is preserved and layers that become empty are dropped. Polygons whose
    /// bounds do not touch `excluded` are carried over untouched.
    pub fn shrink(&self, region: &FeasibilityRegion, excluded: &Geometry) -> FeasibilityRegion {
        self.map_layers(
            region,
            excluded,
            |engine, part, excluded| engine.difference(part, excluded),
            true,
        )
    }

    /// Returns `region` restricted to `mask`, layer by layer.
    pub fn clip(&self, region: &FeasibilityRegion, mask: &Geometry) -> FeasibilityRegion {
        self.map_layers(
            region,
            mask,
            |engine, part, mask| engine.intersect(part, mask),
            false,
        )
    }

    fn map_layers(
        &self,
        region: &FeasibilityRegion,
        other: &Geometry,
        op: impl Fn(&dyn GeometryEngine, &Geometry, &Geometry) -> Geometry,
        keep_disjoint: bool,
    ) -> FeasibilityRegion {
        let other_bounds = match other.bounding_rect() {
            Some(bounds) => bounds,
            None if keep_disjoint => return region.clone(),
            None => return FeasibilityRegion::default(),
        };

        let layers = region
            .layers()
            .iter()
            .map(|layer| {
                let mut polygons = Vec::with_capacity(layer.polygons.len());
                for polygon in &layer.polygons {
                    let touches = self
                        .engine
                        .bounds_of(polygon)
                        .is_some_and(|b| b.intersects(&other_bounds));
                    if !touches {
                        if keep_disjoint {
                            polygons.push(polygon.clone());
                        }
                        continue;
                    }
                    let part = Geometry::new(vec![polygon.clone()]);
                    polygons.extend(self.engine.explode(op(self.engine, &part, other)));
                }
                RegionLayer::new(layer.priority, polygons)
            })
            .collect();

        FeasibilityRegion::new(layers)
    }

    fn prepare(&self, constraint: &SpatialConstraint) -> Geometry {
        if let Err(e) = self.engine.validate(constraint.geometry()) {
            warn!(
                "Constraint '{}' has invalid geometry ({}); repairing.",
                constraint.name(),
                e
            );
        }
        let repaired = self.engine.repair(constraint.geometry());
        if repaired.0.is_empty() && !constraint.geometry().0.is_empty() {
            warn!(
                "Constraint '{}' has no usable geometry after repair.",
                constraint.name()
            );
            return empty();
        }
        repaired
    }
}
