//! Corner-coordinate CSV parser.
//!
//! One table per split with columns `filename,class,xmin,ymin,xmax,ymax`
//! (extra columns are ignored). Filenames are resolved against the split's
//! image directory.

use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::conversion::SourceBox;
use crate::error::{NormalizeError, Result};
use crate::labels::map_full_to_short;
use crate::source::{AnnotationParser, ParsedSplit, RawAnnotation, SourceFormat};
use crate::types::{SkipReason, Split};

const REQUIRED_COLUMNS: &[&str] = &["filename", "class", "xmin", "ymin", "xmax", "ymax"];

#[derive(Debug, Deserialize)]
struct VocRow {
    filename: String,
    #[serde(rename = "class")]
    class_name: String,
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
}

/// A CSV table and the folder its filenames are relative to.
#[derive(Debug, Clone)]
pub struct VocCsvSource {
    pub csv_path: PathBuf,
    pub image_dir: PathBuf,
}

impl VocCsvSource {
    pub fn new(csv_path: impl Into<PathBuf>, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            image_dir: image_dir.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VocCsvParser {
    train: VocCsvSource,
    test: VocCsvSource,
    convert_labels: bool,
}

impl VocCsvParser {
    pub fn new(train: VocCsvSource, test: VocCsvSource, convert_labels: bool) -> Self {
        Self {
            train,
            test,
            convert_labels,
        }
    }

    fn source(&self, split: Split) -> Option<&VocCsvSource> {
        match split {
            Split::Train => Some(&self.train),
            Split::Test => Some(&self.test),
            Split::Valid => None,
        }
    }
}

impl AnnotationParser for VocCsvParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::VocCsv
    }

    fn splits(&self) -> Vec<Split> {
        vec![Split::Train, Split::Test]
    }

    fn describe(&self, split: Split) -> String {
        match self.source(split) {
            Some(source) => source.csv_path.display().to_string(),
            None => split.to_string(),
        }
    }

    fn parse_split(&self, split: Split) -> Result<ParsedSplit> {
        match self.source(split) {
            Some(source) => parse_voc_csv(source, self.convert_labels),
            None => Ok(ParsedSplit::default()),
        }
    }
}

/// Read every row of one corner CSV into raw annotations.
///
/// Rows whose corners give a negative width or height are malformed. Label
/// conversion (when enabled) is checked before image existence, so a row
/// failing both counts as an unknown label.
pub fn parse_voc_csv(source: &VocCsvSource, convert_labels: bool) -> Result<ParsedSplit> {
    let csv_path = &source.csv_path;
    let csv_err = |e: csv::Error| NormalizeError::Csv {
        path: csv_path.clone(),
        source: e,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)
        .map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();
    check_columns(csv_path, &headers)?;

    let mut parsed = ParsedSplit::default();
    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(csv_err(e)),
            Err(e) => {
                parsed.stats.increment_source();
                warn!(
                    "Skipping unreadable row {} in {}: {}",
                    line + 1,
                    csv_path.display(),
                    e
                );
                parsed.stats.record_skip(SkipReason::Malformed);
                continue;
            }
        };
        parsed.stats.increment_source();

        let row: VocRow = match record.deserialize(Some(&headers)) {
            Ok(row) => row,
            Err(e) => {
                warn!(
                    "Skipping malformed row {} in {}: {}",
                    line + 1,
                    csv_path.display(),
                    e
                );
                parsed.stats.record_skip(SkipReason::Malformed);
                continue;
            }
        };

        match row_to_annotation(&row, &source.image_dir, convert_labels) {
            Ok(annotation) => parsed.push(annotation),
            Err(reason) => parsed.stats.record_skip(reason),
        }
    }

    Ok(parsed)
}

fn check_columns(path: &Path, headers: &csv::StringRecord) -> Result<()> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|&&column| !headers.iter().any(|h| h == column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(NormalizeError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        })
    }
}

fn row_to_annotation(
    row: &VocRow,
    image_dir: &Path,
    convert_labels: bool,
) -> std::result::Result<RawAnnotation, SkipReason> {
    let file_name = row.filename.trim();
    let label = row.class_name.trim();

    let bbox = SourceBox::Corners([row.xmin, row.ymin, row.xmax, row.ymax]);
    if !bbox.has_valid_size() {
        warn!(
            "Skipping box with negative size ({}, {}, {}, {}) in {}",
            row.xmin, row.ymin, row.xmax, row.ymax, file_name
        );
        return Err(SkipReason::Malformed);
    }

    let class_name = if convert_labels {
        match map_full_to_short(label, file_name) {
            Some(symbol) => symbol.to_string(),
            None => {
                warn!("Skipping unknown label '{}' in {}", label, file_name);
                return Err(SkipReason::UnknownLabel);
            }
        }
    } else {
        label.to_string()
    };

    let image_path = image_dir.join(file_name);
    if !image_path.exists() {
        warn!("Missing image {}", image_path.display());
        return Err(SkipReason::MissingImage);
    }

    Ok(RawAnnotation {
        image_path,
        class_name,
        bbox,
    })
}
