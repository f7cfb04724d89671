//! Spatial admissibility rules fed into the feasibility region.
//!
//! A [`SpatialConstraint`] pairs a geometry with a [`ConstraintKind`]:
//! - [`ConstraintKind::MustWithin`]: accepted points must lie inside the geometry.
//! - [`ConstraintKind::MustOutside`]: accepted points must avoid the geometry.
//! - [`ConstraintKind::PreferWithin`]: sampling prefers the geometry, ranked by priority
//!   (lower value means higher priority). Preferences order sampling, they never filter.
//!
//! Constraints are immutable once created. Collect them in a [`ConstraintSet`] and hand
//! the set to [`crate::region::builder::RegionBuilder::build`].
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::Geometry;

/// Role of a constraint in region composition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConstraintKind {
    MustWithin,
    MustOutside,
    PreferWithin,
}

/// A named geometry with a kind and a priority.
#[derive(Debug, Clone)]
pub struct SpatialConstraint {
    name: String,
    geometry: Geometry,
    kind: ConstraintKind,
    priority: i32,
}

impl SpatialConstraint {
    pub fn new(
        name: impl Into<String>,
        geometry: impl Into<Geometry>,
        kind: ConstraintKind,
        priority: i32,
    ) -> Self {
        Self {
            name: name.into(),
            geometry: geometry.into(),
            kind,
            priority,
        }
    }

    /// Hard constraint: points must lie inside `geometry`.
    pub fn must_within(name: impl Into<String>, geometry: impl Into<Geometry>) -> Self {
        Self::new(name, geometry, ConstraintKind::MustWithin, 0)
    }

    /// Hard constraint: points must lie outside `geometry`.
    pub fn must_outside(name: impl Into<String>, geometry: impl Into<Geometry>) -> Self {
        Self::new(name, geometry, ConstraintKind::MustOutside, 0)
    }

    /// Soft preference ranked by `priority` (lower is preferred).
    pub fn prefer_within(
        name: impl Into<String>,
        geometry: impl Into<Geometry>,
        priority: i32,
    ) -> Self {
        Self::new(name, geometry, ConstraintKind::PreferWithin, priority)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }
}

/// Ordered collection of constraints, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    pub constraints: Vec<SpatialConstraint>,
}

impl ConstraintSet {
    /// Create a new empty set.
    pub fn new() -> Self {
        Self {
            constraints: Vec::new(),
        }
    }

    /// Add a single constraint.
    pub fn with(mut self, constraint: SpatialConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Add multiple constraints.
    pub fn with_many(mut self, constraints: impl IntoIterator<Item = SpatialConstraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    pub fn push(&mut self, constraint: SpatialConstraint) {
        self.constraints.push(constraint);
    }

    /// Constraints of one kind, in declaration order.
    pub fn of_kind(&self, kind: ConstraintKind) -> impl Iterator<Item = &SpatialConstraint> {
        self.constraints.iter().filter(move |c| c.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl FromIterator<SpatialConstraint> for ConstraintSet {
    fn from_iter<I: IntoIterator<Item = SpatialConstraint>>(iter: I) -> Self {
        Self {
            constraints: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::shapes::rectangle;

    #[test]
    fn constructors_set_kind_and_priority() {
        let c = SpatialConstraint::prefer_within("parks", rectangle(0.0, 0.0, 1.0, 1.0), 3);
        assert_eq!(c.name(), "parks");
        assert_eq!(c.kind(), ConstraintKind::PreferWithin);
        assert_eq!(c.priority(), 3);
        assert_eq!(c.geometry().0.len(), 1);

        let m = SpatialConstraint::must_outside("water", vec![rectangle(0.0, 0.0, 1.0, 1.0)]);
        assert_eq!(m.kind(), ConstraintKind::MustOutside);
        assert_eq!(m.priority(), 0);
    }

    #[test]
    fn set_filters_by_kind_in_declaration_order() {
        let set = ConstraintSet::new()
            .with(SpatialConstraint::must_within("a", rectangle(0.0, 0.0, 1.0, 1.0)))
            .with(SpatialConstraint::must_outside("b", rectangle(0.0, 0.0, 1.0, 1.0)))
            .with(SpatialConstraint::must_within("c", rectangle(0.0, 0.0, 1.0, 1.0)));
        let names: Vec<_> = set
            .of_kind(ConstraintKind::MustWithin)
            .map(|c| c.name().to_owned())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(set.len(), 3);
    }
}
