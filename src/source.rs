//! Shared interface of the format parsers.
//!
//! A parser turns one split of its source into [`RawAnnotation`]s: label
//! already canonicalized, geometry still in the source encoding. Image
//! statistics and normalization happen afterwards in [`crate::normalize`],
//! identically for every format.

use std::path::PathBuf;

use crate::config::ImageFailurePolicy;
use crate::conversion::SourceBox;
use crate::error::Result;
use crate::types::{Split, SplitStats};

/// Which source encoding a parser reads.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    /// Corner-coordinate CSV table (`filename,class,xmin,ymin,xmax,ymax`).
    VocCsv,
    /// `labels/*.txt` with normalized boxes plus a class list.
    Yolo,
    /// One `_annotations.coco.json` per split.
    Coco,
}

impl SourceFormat {
    /// What to do with a record whose image cannot be decoded, unless overridden.
    pub fn default_image_policy(&self) -> ImageFailurePolicy {
        match self {
            SourceFormat::VocCsv | SourceFormat::Yolo => ImageFailurePolicy::Degrade,
            SourceFormat::Coco => ImageFailurePolicy::Drop,
        }
    }

    /// Whether output rows carry a `split` column.
    pub fn tags_split(&self) -> bool {
        matches!(self, SourceFormat::Yolo)
    }
}

/// One annotation as found in the source, before image statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAnnotation {
    pub image_path: PathBuf,
    pub class_name: String,
    pub bbox: SourceBox,
}

/// Everything a parser found in one split, with the skips it already counted.
#[derive(Debug, Default)]
pub struct ParsedSplit {
    pub annotations: Vec<RawAnnotation>,
    pub stats: SplitStats,
}

impl ParsedSplit {
    pub fn push(&mut self, annotation: RawAnnotation) {
        self.annotations.push(annotation);
    }
}

pub trait AnnotationParser {
    fn format(&self) -> SourceFormat;

    /// Splits in output order.
    fn splits(&self) -> Vec<Split>;

    /// Human-readable name of the source of `split`, used in summaries.
    fn describe(&self, split: Split) -> String;

    fn parse_split(&self, split: Split) -> Result<ParsedSplit>;
}
