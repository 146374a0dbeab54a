//! Error types for source-level failures.
//!
//! Per-record problems (unknown labels, missing images, bad lines) are not
//! errors: they are counted as [`SkipReason`](crate::types::SkipReason)s.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NormalizeError>;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error at {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("json parse error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("yaml parse error at {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid glob pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("image at {path} has zero width or height")]
    EmptyImage { path: PathBuf },
    #[error("{path} is missing required columns: {}", .missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },
    #[error("no class names found in {path}")]
    NoClassNames { path: PathBuf },
    #[error("class index {index} in {path} exceeds the supported maximum of {max}")]
    ClassIndexTooLarge {
        path: PathBuf,
        index: usize,
        max: usize,
    },
}

impl NormalizeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the image bytes were read but could not be turned into pixels.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::Image { .. } | Self::EmptyImage { .. })
    }
}
