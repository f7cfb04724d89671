//! Attribute enrichment of accepted points into output records.
//!
//! Each output field has an explicit [`FieldRole`] assigned at configuration time:
//! sequential identifiers, geographic coordinates, a spatially looked-up scalar, or a
//! constant default. Lookup misses produce [`FieldValue::Null`], never an error.
use std::collections::HashSet;

use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::packing::AcceptedPoint;
use crate::projection::Projection;

pub mod lookup;

pub use lookup::{AttributeLookup, FeatureLookup};

/// Declared type of an output field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FieldType {
    Integer,
    Float,
    Text,
}

/// Attribute value of an output record.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    #[default]
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Whether the value can be stored in a field of type `ty`.
    pub fn fits(&self, ty: FieldType) -> bool {
        matches!(
            (self, ty),
            (FieldValue::Null, _)
                | (FieldValue::Integer(_), FieldType::Integer | FieldType::Float)
                | (FieldValue::Float(_), FieldType::Float)
                | (FieldValue::Text(_), FieldType::Text)
        )
    }

    fn from_scalar(value: f64, ty: FieldType) -> Self {
        match ty {
            FieldType::Integer => FieldValue::Integer(value.round() as i64),
            FieldType::Float => FieldValue::Float(value),
            FieldType::Text => FieldValue::Text(value.to_string()),
        }
    }
}

/// How a field gets its value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FieldRole {
    /// Sequential identifier starting at `start`.
    Identifier { start: i64 },
    /// Longitude in degrees.
    Longitude,
    /// Latitude in degrees.
    Latitude,
    /// Scalar from the enricher's [`AttributeLookup`].
    Lookup,
    /// The field's default value.
    Constant,
}

/// One output field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldSpec {
    pub name: String,
    pub role: FieldRole,
    pub field_type: FieldType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub default: FieldValue,
}

impl FieldSpec {
    pub fn new(
        name: impl Into<String>,
        role: FieldRole,
        field_type: FieldType,
        default: FieldValue,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            field_type,
            default,
        }
    }

    pub fn identifier(name: impl Into<String>, start: i64) -> Self {
        Self::new(
            name,
            FieldRole::Identifier { start },
            FieldType::Integer,
            FieldValue::Null,
        )
    }

    pub fn longitude(name: impl Into<String>) -> Self {
        Self::new(name, FieldRole::Longitude, FieldType::Float, FieldValue::Null)
    }

    pub fn latitude(name: impl Into<String>) -> Self {
        Self::new(name, FieldRole::Latitude, FieldType::Float, FieldValue::Null)
    }

    pub fn lookup(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, FieldRole::Lookup, field_type, FieldValue::Null)
    }

    pub fn constant(name: impl Into<String>, field_type: FieldType, value: FieldValue) -> Self {
        Self::new(name, FieldRole::Constant, field_type, value)
    }
}

/// A point ready to be written, with its attributes in field order.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub id: usize,
    /// Position in the working reference system.
    pub position: Coord<f64>,
    pub longitude: f64,
    pub latitude: f64,
    pub attributes: Vec<(String, FieldValue)>,
}

impl OutputRecord {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Assigns configured fields to accepted points.
pub struct Enricher {
    fields: Vec<FieldSpec>,
    lookup: Option<Box<dyn AttributeLookup>>,
}

impl Enricher {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            lookup: None,
        }
    }

    /// Sets the lookup backing [`FieldRole::Lookup`] fields.
    pub fn with_lookup<L: AttributeLookup + 'static>(mut self, lookup: L) -> Self {
        self.lookup = Some(Box::new(lookup));
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Checks for empty or duplicate names and defaults that do not fit their type.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(Error::InvalidConfig("field name must not be empty".into()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
            if !field.default.fits(field.field_type) {
                return Err(Error::InvalidConfig(format!(
                    "default of field '{}' does not fit type {:?}",
                    field.name, field.field_type
                )));
            }
        }
        Ok(())
    }

    /// Produces one record per point, in acceptance order.
    pub fn enrich(
        &self,
        points: &[AcceptedPoint],
        projection: &dyn Projection,
    ) -> Vec<OutputRecord> {
        if self.lookup.is_none() && self.fields.iter().any(|f| f.role == FieldRole::Lookup) {
            warn!("Lookup fields configured without a lookup source; values will be null.");
        }

        points
            .iter()
            .enumerate()
            .map(|(idx, point)| {
                let geographic = projection.inverse(point.position);
                let looked_up = self
                    .lookup
                    .as_ref()
                    .and_then(|l| l.lookup(point.position));
                let attributes = self
                    .fields
                    .iter()
                    .map(|field| {
                        let value = match &field.role {
                            FieldRole::Identifier { start } => {
                                FieldValue::Integer(start + idx as i64)
                            }
                            FieldRole::Longitude => {
                                FieldValue::from_scalar(geographic.x, field.field_type)
                            }
                            FieldRole::Latitude => {
                                FieldValue::from_scalar(geographic.y, field.field_type)
                            }
                            FieldRole::Lookup => looked_up
                                .map(|v| FieldValue::from_scalar(v, field.field_type))
                                .unwrap_or(FieldValue::Null),
                            FieldRole::Constant => field.default.clone(),
                        };
                        (field.name.clone(), value)
                    })
                    .collect();

                OutputRecord {
                    id: point.id,
                    position: point.position,
                    longitude: geographic.x,
                    latitude: geographic.y,
                    attributes,
                }
            })
            .collect()
    }
}
