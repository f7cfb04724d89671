//! GeoJSON FeatureCollection input and output.
//!
//! Input coordinates are geographic (longitude, latitude) and pass through a
//! [`Projection`] into the working system on load. Output is written back in WGS84.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use geo::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use super::dataset::{DatasetQuery, ValueQuery, VectorDataset};
use crate::enrich::{FieldValue, OutputRecord};
use crate::error::{Error, Result};
use crate::geometry::{GeoEngine, Geometry, GeometryEngine};
use crate::packing::AcceptedPoint;
use crate::projection::Projection;
use crate::region::FeasibilityRegion;

#[derive(Debug, Clone)]
enum Shape {
    Areal(MultiPolygon<f64>),
    Lines(MultiLineString<f64>),
    Points(Vec<Coord<f64>>),
}

#[derive(Debug, Clone)]
struct Feature {
    layer: Option<String>,
    properties: Map<String, Value>,
    shape: Shape,
}

/// An in-memory GeoJSON FeatureCollection, reprojected into the working system.
///
/// A feature belongs to the layer named by its `layer` property, or else to the
/// collection's top-level `name`.
pub struct GeoJsonDataset {
    name: Option<String>,
    features: Vec<Feature>,
    engine: GeoEngine,
}

impl GeoJsonDataset {
    /// Loads a FeatureCollection file.
    pub fn open(path: impl AsRef<Path>, projection: &dyn Projection) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingInputFile {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path)?;
        let dataset = Self::from_str_with(&text, projection)?;
        info!(
            "Loaded {} features from '{}'.",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Parses a FeatureCollection document.
    pub fn from_str_with(text: &str, projection: &dyn Projection) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value, projection)
    }

    pub fn from_value(value: &Value, projection: &dyn Projection) -> Result<Self> {
        if value.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
            return Err(Error::Parse("expected a GeoJSON FeatureCollection".into()));
        }
        let name = value.get("name").and_then(Value::as_str).map(str::to_owned);
        let raw = value
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Parse("FeatureCollection has no 'features' array".into()))?;

        let mut features = Vec::with_capacity(raw.len());
        let mut skipped = 0usize;
        for (idx, feature) in raw.iter().enumerate() {
            let properties = feature
                .get("properties")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            let geometry = match feature.get("geometry") {
                Some(Value::Null) | None => {
                    skipped += 1;
                    continue;
                }
                Some(geometry) => geometry,
            };
            match parse_shape(geometry, projection) {
                Ok(Some(shape)) => features.push(Feature {
                    layer: properties
                        .get("layer")
                        .and_then(Value::as_str)
                        .map(str::to_owned),
                    properties,
                    shape,
                }),
                Ok(None) => skipped += 1,
                Err(e) => {
                    debug!("Skipping feature {idx}: {e}.");
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            warn!("Skipped {skipped} features with missing, unsupported or invalid geometry.");
        }

        Ok(Self {
            name,
            features,
            engine: GeoEngine::default(),
        })
    }

    /// Engine used to buffer and merge selected features.
    pub fn with_engine(mut self, engine: GeoEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    fn in_layer(&self, feature: &Feature, layer: Option<&str>) -> bool {
        match layer {
            None => true,
            Some(layer) => match &feature.layer {
                Some(own) => own == layer,
                None => self.name.as_deref() == Some(layer),
            },
        }
    }

    /// Areal features of `query.layer` carrying a numeric `query.attribute`.
    pub fn query_values(&self, query: &ValueQuery) -> Vec<(Polygon<f64>, f64)> {
        let mut out = Vec::new();
        for feature in &self.features {
            if !self.in_layer(feature, query.layer.as_deref()) {
                continue;
            }
            let Shape::Areal(mp) = &feature.shape else {
                continue;
            };
            let Some(value) = feature.properties.get(&query.attribute).and_then(numeric) else {
                continue;
            };
            out.extend(mp.0.iter().cloned().map(|p| (p, value)));
        }
        out
    }
}

impl VectorDataset for GeoJsonDataset {
    fn query(&self, query: &DatasetQuery) -> Result<Geometry> {
        let buffer = query.buffer.filter(|d| *d > 0.0);
        let mut parts = Vec::new();
        let mut unbuffered = 0usize;
        for feature in &self.features {
            if !self.in_layer(feature, query.layer.as_deref())
                || !query.predicate.matches(&feature.properties)
            {
                continue;
            }
            match (&feature.shape, buffer) {
                (Shape::Areal(mp), None) => parts.push(self.engine.repair(mp)),
                (Shape::Areal(mp), Some(d)) => parts.push(self.engine.buffer(mp, d)?),
                (Shape::Lines(lines), Some(d)) => parts.push(self.engine.buffer_lines(lines, d)?),
                (Shape::Points(points), Some(d)) => parts.push(MultiPolygon::new(
                    points
                        .iter()
                        .map(|c| self.engine.buffer_point(*c, d))
                        .collect(),
                )),
                (Shape::Lines(_) | Shape::Points(_), None) => unbuffered += 1,
            }
        }
        if unbuffered > 0 {
            warn!(
                "Ignored {unbuffered} line or point features in query '{}' without a buffer.",
                query.predicate
            );
        }
        debug!("Query '{}' selected {} features.", query.predicate, parts.len());
        Ok(self.engine.union_all(parts))
    }
}

fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn parse_position(value: &Value, projection: &dyn Projection) -> Result<Coord<f64>> {
    let pair = value
        .as_array()
        .filter(|a| a.len() >= 2)
        .ok_or_else(|| Error::Parse("position must be an array of two numbers".into()))?;
    let (Some(lon), Some(lat)) = (pair[0].as_f64(), pair[1].as_f64()) else {
        return Err(Error::Parse("position must be an array of two numbers".into()));
    };
    Ok(projection.forward(Coord { x: lon, y: lat }))
}

fn parse_line(value: &Value, projection: &dyn Projection) -> Result<LineString<f64>> {
    let coords = value
        .as_array()
        .ok_or_else(|| Error::Parse("expected an array of positions".into()))?
        .iter()
        .map(|p| parse_position(p, projection))
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString::new(coords))
}

fn parse_polygon(value: &Value, projection: &dyn Projection) -> Result<Polygon<f64>> {
    let mut rings = value
        .as_array()
        .ok_or_else(|| Error::Parse("expected an array of rings".into()))?
        .iter()
        .map(|r| parse_line(r, projection));
    let exterior = rings
        .next()
        .ok_or_else(|| Error::Parse("polygon has no exterior ring".into()))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn each<'v>(value: &'v Value, what: &str) -> Result<&'v Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| Error::Parse(format!("expected an array of {what}")))
}

/// Returns `Ok(None)` for geometry types that carry no usable shape.
fn parse_shape(geometry: &Value, projection: &dyn Projection) -> Result<Option<Shape>> {
    let kind = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Parse("geometry has no type".into()))?;
    let coordinates = || {
        geometry
            .get("coordinates")
            .ok_or_else(|| Error::Parse(format!("{kind} has no coordinates")))
    };

    let shape = match kind {
        "Polygon" => Shape::Areal(MultiPolygon::new(vec![parse_polygon(
            coordinates()?,
            projection,
        )?])),
        "MultiPolygon" => Shape::Areal(MultiPolygon::new(
            each(coordinates()?, "polygons")?
                .iter()
                .map(|p| parse_polygon(p, projection))
                .collect::<Result<_>>()?,
        )),
        "LineString" => Shape::Lines(MultiLineString::new(vec![parse_line(
            coordinates()?,
            projection,
        )?])),
        "MultiLineString" => Shape::Lines(MultiLineString::new(
            each(coordinates()?, "lines")?
                .iter()
                .map(|l| parse_line(l, projection))
                .collect::<Result<_>>()?,
        )),
        "Point" => Shape::Points(vec![parse_position(coordinates()?, projection)?]),
        "MultiPoint" => Shape::Points(
            each(coordinates()?, "points")?
                .iter()
                .map(|p| parse_position(p, projection))
                .collect::<Result<_>>()?,
        ),
        _ => return Ok(None),
    };
    Ok(Some(shape))
}

fn position_json(c: Coord<f64>, projection: &dyn Projection) -> Value {
    let g = projection.inverse(c);
    json!([g.x, g.y])
}

fn ring_json(ring: &LineString<f64>, projection: &dyn Projection) -> Value {
    Value::Array(ring.0.iter().map(|c| position_json(*c, projection)).collect())
}

fn polygon_json(polygon: &Polygon<f64>, projection: &dyn Projection) -> Value {
    let mut rings = vec![ring_json(polygon.exterior(), projection)];
    rings.extend(polygon.interiors().iter().map(|r| ring_json(r, projection)));
    Value::Array(rings)
}

fn field_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Integer(i) => json!(i),
        FieldValue::Float(f) => json!(f),
        FieldValue::Text(s) => Value::String(s.clone()),
    }
}

fn write_collection(path: &Path, name: &str, features: Vec<Value>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let count = features.len();
    let collection = json!({
        "type": "FeatureCollection",
        "name": name,
        "features": features,
    });
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &collection)?;
    writer.flush()?;
    info!("Wrote {count} features to '{}'.", path.display());
    Ok(())
}

/// Writes enriched points as a `points` FeatureCollection in WGS84.
pub fn write_points(path: impl AsRef<Path>, records: &[OutputRecord]) -> Result<()> {
    let features = records
        .iter()
        .map(|record| {
            let properties: Map<String, Value> = record
                .attributes
                .iter()
                .map(|(name, value)| (name.clone(), field_json(value)))
                .collect();
            json!({
                "type": "Feature",
                "properties": properties,
                "geometry": {
                    "type": "Point",
                    "coordinates": [record.longitude, record.latitude],
                },
            })
        })
        .collect();
    write_collection(path.as_ref(), "points", features)
}

/// Writes the remaining feasibility region, one feature per priority layer.
pub fn write_region(
    path: impl AsRef<Path>,
    region: &FeasibilityRegion,
    projection: &dyn Projection,
) -> Result<()> {
    let features = region
        .layers()
        .iter()
        .map(|layer| {
            json!({
                "type": "Feature",
                "properties": { "priority": layer.priority, "area": layer.area() },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": layer
                        .polygons
                        .iter()
                        .map(|p| polygon_json(p, projection))
                        .collect::<Vec<_>>(),
                },
            })
        })
        .collect();
    write_collection(path.as_ref(), "region", features)
}

/// Writes the exclusion disk of radius `radius` around each accepted point.
pub fn write_disks(
    path: impl AsRef<Path>,
    points: &[AcceptedPoint],
    radius: f64,
    engine: &dyn GeometryEngine,
    projection: &dyn Projection,
) -> Result<()> {
    let features = points
        .iter()
        .map(|point| {
            json!({
                "type": "Feature",
                "properties": { "id": point.id, "radius": radius },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": polygon_json(
                        &engine.buffer_point(point.position, radius),
                        projection,
                    ),
                },
            })
        })
        .collect();
    write_collection(path.as_ref(), "disks", features)
}
