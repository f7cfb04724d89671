//! Read-side seam between vector data sources and constraint construction.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::predicate::AttributePredicate;
use crate::error::Result;
use crate::geometry::Geometry;

/// Selects features from a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetQuery {
    /// Named layer; `None` selects every feature.
    pub layer: Option<String>,
    pub predicate: AttributePredicate,
    /// Buffer distance in working units applied to the selected features. Required for
    /// line and point features, which have no area on their own.
    pub buffer: Option<f64>,
}

impl DatasetQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn with_predicate(mut self, predicate: AttributePredicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn with_buffer(mut self, buffer: f64) -> Self {
        self.buffer = Some(buffer);
        self
    }
}

/// Feature geometry paired with one numeric attribute, used for attribute lookups.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValueQuery {
    pub layer: Option<String>,
    /// Property holding the value. Features where it is missing or non-numeric are
    /// skipped.
    pub attribute: String,
}

/// A source of areal features in the working reference system.
pub trait VectorDataset {
    /// Returns the union of the selected features as one geometry. An empty result is
    /// an empty geometry, not an error.
    fn query(&self, query: &DatasetQuery) -> Result<Geometry>;
}
