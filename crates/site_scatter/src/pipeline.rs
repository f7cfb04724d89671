//! End-to-end site selection: datasets in, enriched points out.
//!
//! A [`SiteSelectionConfig`] names the input datasets and the constraint each query
//! contributes, the packing parameters, the output fields, and where to write results.
//! [`run`] fails fast on configuration problems (missing inputs, invalid parameters, no
//! base region) and otherwise always writes whatever points were accepted.
use std::fs;
use std::path::{Path, PathBuf};

use geo::Coord;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constraint::{ConstraintKind, SpatialConstraint};
use crate::enrich::{Enricher, FeatureLookup, FieldSpec, OutputRecord};
use crate::error::{Error, Result};
use crate::geometry::{GeoEngine, Geometry, GeometryEngine, DEFAULT_DISK_SEGMENTS};
use crate::io::{
    write_disks, write_points, write_region, AttributePredicate, DatasetQuery, GeoJsonDataset,
    ValueQuery, VectorDataset,
};
use crate::packing::{EventSink, PackingConfig, PackingLoop, Termination};
use crate::projection::ProjectionKind;
use crate::region::RegionBuilder;

pub const POINTS_FILE: &str = "points.geojson";
pub const REGION_FILE: &str = "region.geojson";
pub const DISKS_FILE: &str = "disks.geojson";

/// One query against a dataset.
///
/// Queries sharing a `name`, within one dataset or across several, are unioned into a
/// single constraint. That is how a site can be required to lie inside one kind of
/// feature or another, for example a building or a park from different layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintQuery {
    pub name: String,
    pub kind: ConstraintKind,
    /// Ranking for `prefer_within`; lower is sampled first.
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub layer: Option<String>,
    /// Attribute filter such as `building IS NOT NULL`; empty matches everything.
    #[serde(default)]
    pub predicate: String,
    /// Buffer distance in working units.
    #[serde(default)]
    pub buffer: Option<f64>,
}

/// A dataset file and the constraints drawn from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub path: PathBuf,
    pub constraints: Vec<ConstraintQuery>,
}

/// Source of the values behind `lookup` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightSource {
    pub path: PathBuf,
    #[serde(default)]
    pub layer: Option<String>,
    pub attribute: String,
    /// Nearest-feature fallback radius in working units; 0 requires containment.
    #[serde(default)]
    pub max_search_distance: f64,
}

/// Geographic coordinates in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    fn coord(self) -> Coord<f64> {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

/// Configuration for [`run`], usually loaded from JSON with [`SiteSelectionConfig::from_path`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSelectionConfig {
    pub packing: PackingConfig,
    pub seed: u64,
    /// Accepted as the first point when it is feasible; the reach area grows from it.
    pub start_point: Option<LonLat>,
    pub projection: ProjectionKind,
    /// Segments used to approximate disks.
    pub disk_segments: usize,
    pub datasets: Vec<DatasetConfig>,
    pub fields: Vec<FieldSpec>,
    pub height_source: Option<HeightSource>,
    pub output_directory: PathBuf,
    /// Also write the leftover region for inspection.
    pub write_region: bool,
    /// Also write the exclusion disk around each point.
    pub write_disks: bool,
    /// Relative paths resolve against this directory.
    #[serde(skip)]
    pub base_directory: Option<PathBuf>,
}

impl Default for SiteSelectionConfig {
    fn default() -> Self {
        Self {
            packing: PackingConfig::default(),
            seed: 0,
            start_point: None,
            projection: ProjectionKind::default(),
            disk_segments: DEFAULT_DISK_SEGMENTS,
            datasets: Vec::new(),
            fields: Vec::new(),
            height_source: None,
            output_directory: PathBuf::from("output"),
            write_region: false,
            write_disks: false,
            base_directory: None,
        }
    }
}

impl SiteSelectionConfig {
    pub fn new(packing: PackingConfig) -> Self {
        Self {
            packing,
            ..Default::default()
        }
    }

    /// Loads a JSON configuration. Relative paths inside it resolve against the file's
    /// directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingInputFile {
                path: path.to_path_buf(),
            });
        }
        let mut config: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        config.base_directory = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_start_point(mut self, start: LonLat) -> Self {
        self.start_point = Some(start);
        self
    }

    pub fn with_projection(mut self, projection: ProjectionKind) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_dataset(mut self, dataset: DatasetConfig) -> Self {
        self.datasets.push(dataset);
        self
    }

    pub fn with_fields(mut self, fields: Vec<FieldSpec>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_height_source(mut self, source: HeightSource) -> Self {
        self.height_source = Some(source);
        self
    }

    pub fn with_output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = dir.into();
        self
    }

    pub fn with_write_region(mut self, write_region: bool) -> Self {
        self.write_region = write_region;
        self
    }

    pub fn with_write_disks(mut self, write_disks: bool) -> Self {
        self.write_disks = write_disks;
        self
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_directory {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Validates parameters and fields. Does not touch the filesystem.
    pub fn validate(&self) -> Result<()> {
        self.packing.validate()?;
        if self.disk_segments < crate::geometry::shapes::MIN_DISK_SEGMENTS {
            return Err(Error::InvalidConfig(format!(
                "disk_segments must be >= {}",
                crate::geometry::shapes::MIN_DISK_SEGMENTS
            )));
        }
        Enricher::new(self.fields.clone()).validate()?;
        if let Some(start) = self.start_point {
            if !start.lon.is_finite() || !start.lat.is_finite() {
                return Err(Error::InvalidConfig(
                    "start_point coordinates must be finite".into(),
                ));
            }
        }
        let mut declared: Vec<&ConstraintQuery> = Vec::new();
        for query in self.datasets.iter().flat_map(|d| &d.constraints) {
            query.predicate.parse::<AttributePredicate>()?;
            if let Some(b) = query.buffer {
                if !b.is_finite() || b < 0.0 {
                    return Err(Error::InvalidConfig(format!(
                        "buffer of constraint '{}' must be finite and >= 0",
                        query.name
                    )));
                }
            }
            match declared.iter().find(|q| q.name == query.name) {
                Some(first) if first.kind != query.kind || first.priority != query.priority => {
                    return Err(Error::InvalidConfig(format!(
                        "constraint '{}' is declared with conflicting kind or priority",
                        query.name
                    )));
                }
                Some(_) => {}
                None => declared.push(query),
            }
        }
        Ok(())
    }

    fn check_inputs(&self) -> Result<()> {
        let inputs = self
            .datasets
            .iter()
            .map(|d| &d.path)
            .chain(self.height_source.iter().map(|h| &h.path));
        for path in inputs {
            let resolved = self.resolve(path);
            if !resolved.exists() {
                return Err(Error::MissingInputFile { path: resolved });
            }
        }
        Ok(())
    }
}

/// Files and counts produced by [`run`].
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub records: Vec<OutputRecord>,
    pub termination: Termination,
    pub iterations: usize,
    pub points_path: PathBuf,
    pub region_path: Option<PathBuf>,
    pub disks_path: Option<PathBuf>,
}

impl RunSummary {
    pub fn accepted(&self) -> usize {
        self.records.len()
    }
}

/// Runs the full pipeline.
pub fn run(config: &SiteSelectionConfig) -> Result<RunSummary> {
    run_with_events(config, None)
}

/// Runs the full pipeline, forwarding packing events to `sink`.
pub fn run_with_events(
    config: &SiteSelectionConfig,
    sink: Option<&mut dyn EventSink>,
) -> Result<RunSummary> {
    config.validate()?;
    config.check_inputs()?;

    let projection = config.projection.projection();
    let engine = GeoEngine::default().with_disk_segments(config.disk_segments);

    // Selections per constraint name, in first-declaration order.
    let mut selections: Vec<(&ConstraintQuery, Vec<Geometry>)> = Vec::new();
    for dataset_config in &config.datasets {
        let path = config.resolve(&dataset_config.path);
        let dataset = GeoJsonDataset::open(path, projection.as_ref())?.with_engine(engine.clone());
        for query in &dataset_config.constraints {
            let geometry = dataset.query(&DatasetQuery {
                layer: query.layer.clone(),
                predicate: query.predicate.parse()?,
                buffer: query.buffer,
            })?;
            match selections.iter_mut().find(|(q, _)| q.name == query.name) {
                Some((_, parts)) => parts.push(geometry),
                None => selections.push((query, vec![geometry])),
            }
        }
    }
    let constraints: Vec<SpatialConstraint> = selections
        .into_iter()
        .map(|(query, parts)| {
            let geometry = engine.union_all(parts);
            if geometry.0.is_empty() {
                warn!("Constraint '{}' selected no features.", query.name);
            }
            SpatialConstraint::new(query.name.clone(), geometry, query.kind, query.priority)
        })
        .collect();

    let region = RegionBuilder::new(&engine).build(&constraints)?;
    let mut packing = PackingLoop::try_new(config.packing.clone(), &engine, region)?;
    if let Some(start) = config.start_point {
        packing = packing.with_start_point(projection.forward(start.coord()));
    }
    let mut rng = StdRng::seed_from_u64(config.seed);
    let outcome = match sink {
        Some(sink) => packing.run_with_events(&mut rng, sink),
        None => packing.run(&mut rng),
    };
    if outcome.is_partial() {
        warn!(
            "Packing stopped early ({:?}) with {} points.",
            outcome.termination,
            outcome.len()
        );
    }

    let mut enricher = Enricher::new(config.fields.clone());
    if let Some(source) = &config.height_source {
        let dataset = GeoJsonDataset::open(config.resolve(&source.path), projection.as_ref())?;
        let values = dataset.query_values(&ValueQuery {
            layer: source.layer.clone(),
            attribute: source.attribute.clone(),
        });
        enricher = enricher.with_lookup(
            FeatureLookup::new(values).with_max_search_distance(source.max_search_distance),
        );
    }
    let records = enricher.enrich(&outcome.accepted, projection.as_ref());

    let output_directory = config.resolve(&config.output_directory);
    let points_path = output_directory.join(POINTS_FILE);
    write_points(&points_path, &records)?;

    let region_path = if config.write_region {
        let path = output_directory.join(REGION_FILE);
        write_region(&path, &outcome.region, projection.as_ref())?;
        Some(path)
    } else {
        None
    };
    let disks_path = if config.write_disks {
        let path = output_directory.join(DISKS_FILE);
        write_disks(
            &path,
            &outcome.accepted,
            config.packing.min_distance,
            &engine,
            projection.as_ref(),
        )?;
        Some(path)
    } else {
        None
    };

    info!(
        "Site selection finished: {} points written to '{}'.",
        records.len(),
        points_path.display()
    );

    Ok(RunSummary {
        records,
        termination: outcome.termination,
        iterations: outcome.iterations,
        points_path,
        region_path,
        disks_path,
    })
}
