//! Conversions between geographic coordinates and the planar working system.
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Earth radius of the spherical Web Mercator model, in meters.
pub const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

/// Latitudes beyond this are clamped; Web Mercator diverges at the poles.
pub const WEB_MERCATOR_MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Maps longitude/latitude (degrees, `x` = longitude) to working coordinates and back.
pub trait Projection {
    fn forward(&self, lon_lat: Coord<f64>) -> Coord<f64>;

    fn inverse(&self, xy: Coord<f64>) -> Coord<f64>;
}

/// Spherical Web Mercator (EPSG:3857).
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl Projection for WebMercator {
    fn forward(&self, lon_lat: Coord<f64>) -> Coord<f64> {
        let lat = lon_lat
            .y
            .clamp(-WEB_MERCATOR_MAX_LATITUDE, WEB_MERCATOR_MAX_LATITUDE)
            .to_radians();
        Coord {
            x: WEB_MERCATOR_RADIUS * lon_lat.x.to_radians(),
            y: WEB_MERCATOR_RADIUS * (FRAC_PI_4 + lat / 2.0).tan().ln(),
        }
    }

    fn inverse(&self, xy: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (xy.x / WEB_MERCATOR_RADIUS).to_degrees(),
            y: (2.0 * (xy.y / WEB_MERCATOR_RADIUS).exp().atan() - FRAC_PI_2).to_degrees(),
        }
    }
}

/// Pass-through for data already in the working system.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Projection for Identity {
    fn forward(&self, lon_lat: Coord<f64>) -> Coord<f64> {
        lon_lat
    }

    fn inverse(&self, xy: Coord<f64>) -> Coord<f64> {
        xy
    }
}

/// Named projection for configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ProjectionKind {
    #[default]
    WebMercator,
    Identity,
}

impl ProjectionKind {
    pub fn projection(self) -> Box<dyn Projection> {
        match self {
            ProjectionKind::WebMercator => Box::new(WebMercator),
            ProjectionKind::Identity => Box::new(Identity),
        }
    }
}
