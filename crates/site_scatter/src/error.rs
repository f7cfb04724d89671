//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid configuration, missing input datasets, constraint sets without a bounded base region,
//! unrepairable geometry, dataset parsing, IO, and generic errors.
//!
//! Running out of samplable area is not an error; see [`crate::packing::Termination`].
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("input file not found: '{}'", path.display())]
    MissingInputFile { path: PathBuf },

    #[error("no base region: a MUST_WITHIN constraint is required before exclusions or preferences")]
    NoBaseRegion,

    #[error("geometry operation failed: {0}")]
    Geometry(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "io")]
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_messages_become_other() {
        assert!(matches!(Error::from("issue"), Error::Other(ref msg) if msg == "issue"));
        assert!(matches!(Error::from(String::from("boom")), Error::Other(_)));
    }

    #[test]
    fn missing_input_file_names_the_path() {
        let err = Error::MissingInputFile {
            path: PathBuf::from("data/city.geojson"),
        };
        assert!(err.to_string().contains("data/city.geojson"));
    }

    #[test]
    fn no_base_region_points_at_must_within() {
        assert!(Error::NoBaseRegion.to_string().contains("MUST_WITHIN"));
    }

    #[cfg(feature = "io")]
    #[test]
    fn json_errors_convert() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .map_err(Error::from)
            .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
