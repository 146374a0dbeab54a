//! COCO object-detection parser
//!
//! Each split folder holds `_annotations.coco.json` plus the images it names.
//! Categories are canonicalized once, up front; annotations pointing at a
//! category without a card symbol are dropped with it.

use log::warn;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::conversion::SourceBox;
use crate::error::Result;
use crate::labels::category_to_symbol;
use crate::source::{AnnotationParser, ParsedSplit, RawAnnotation, SourceFormat};
use crate::types::{SkipReason, Split};
use crate::utils::read_and_parse_json;

pub const COCO_ANNOTATION_FILE: &str = "_annotations.coco.json";

/// The subset of a COCO file this tool reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CocoFile {
    #[serde(default)]
    pub images: Vec<CocoImage>,
    #[serde(default)]
    pub categories: Vec<CocoCategory>,
    #[serde(default)]
    pub annotations: Vec<CocoAnnotation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CocoImage {
    pub id: u64,
    pub file_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CocoCategory {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CocoAnnotation {
    pub image_id: u64,
    pub category_id: u64,
    // [x, y, width, height] in pixels
    #[serde(default)]
    pub bbox: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct CocoParser {
    dataset_dir: PathBuf,
    convert_labels: bool,
}

impl CocoParser {
    pub fn new(dataset_dir: impl Into<PathBuf>, convert_labels: bool) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            convert_labels,
        }
    }

    fn split_dir(&self, split: Split) -> PathBuf {
        self.dataset_dir.join(split.as_str())
    }

    fn annotation_file(&self, split: Split) -> PathBuf {
        self.split_dir(split).join(COCO_ANNOTATION_FILE)
    }

    /// category id -> class name, leaving out categories that are not cards.
    fn category_lookup(&self, coco: &CocoFile, source: &str) -> HashMap<u64, String> {
        let mut lookup = HashMap::new();
        for category in &coco.categories {
            if !self.convert_labels {
                lookup.insert(category.id, category.name.clone());
                continue;
            }
            match category_to_symbol(&category.name) {
                Some(symbol) => {
                    lookup.insert(category.id, symbol.to_string());
                }
                None => warn!("Skipping category '{}' in {}", category.name, source),
            }
        }
        lookup
    }

    /// Turn a parsed COCO file into raw annotations relative to `split_dir`.
    pub fn collect_annotations(&self, coco: &CocoFile, split_dir: &Path, source: &str) -> ParsedSplit {
        let categories = self.category_lookup(coco, source);
        let images: HashMap<u64, &str> = coco
            .images
            .iter()
            .map(|image| (image.id, image.file_name.as_str()))
            .collect();

        let mut parsed = ParsedSplit::default();
        for annotation in &coco.annotations {
            parsed.stats.increment_source();

            let Some(class_name) = categories.get(&annotation.category_id) else {
                parsed.stats.record_skip(SkipReason::UnknownLabel);
                continue;
            };
            let Some(file_name) = images.get(&annotation.image_id) else {
                warn!(
                    "Annotation references unknown image id {} in {}",
                    annotation.image_id, source
                );
                parsed.stats.record_skip(SkipReason::MissingImage);
                continue;
            };
            let Ok(bbox) = <[f64; 4]>::try_from(annotation.bbox.as_slice()) else {
                warn!(
                    "Invalid bbox with {} values for {} in {}",
                    annotation.bbox.len(),
                    file_name,
                    source
                );
                parsed.stats.record_skip(SkipReason::Malformed);
                continue;
            };

            let bbox = SourceBox::OriginSize(bbox);
            if !bbox.has_valid_size() {
                warn!(
                    "Skipping bbox with negative size {:?} for {} in {}",
                    annotation.bbox, file_name, source
                );
                parsed.stats.record_skip(SkipReason::Malformed);
                continue;
            }

            parsed.push(RawAnnotation {
                image_path: split_dir.join(file_name),
                class_name: class_name.clone(),
                bbox,
            });
        }
        parsed
    }
}

impl AnnotationParser for CocoParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Coco
    }

    // Same order as the upstream export folders
    fn splits(&self) -> Vec<Split> {
        vec![Split::Train, Split::Test, Split::Valid]
    }

    fn describe(&self, split: Split) -> String {
        self.annotation_file(split).display().to_string()
    }

    fn parse_split(&self, split: Split) -> Result<ParsedSplit> {
        let coco_path = self.annotation_file(split);
        if !coco_path.is_file() {
            warn!("Missing {}", coco_path.display());
            return Ok(ParsedSplit::default());
        }

        let coco: CocoFile = read_and_parse_json(&coco_path)?;
        Ok(self.collect_annotations(
            &coco,
            &self.split_dir(split),
            &coco_path.display().to_string(),
        ))
    }
}
