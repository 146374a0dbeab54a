use std::collections::BTreeMap;
use std::fmt;

// Extensions tried, in order, when pairing a label file with its image
pub const IMG_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

// Header of the canonical table, without the optional split column
pub const TABLE_COLUMNS: &[&str] = &[
    "image",
    "class_name",
    "bbox_x_center",
    "bbox_y_center",
    "bbox_width",
    "bbox_height",
    "image_width",
    "image_height",
    "brightness",
    "contrast",
];

pub const SPLIT_COLUMN: &str = "split";

/// A named partition of the dataset.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class index -> name from a YOLO class list. Indices may have gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassNames(BTreeMap<usize, String>);

impl ClassNames {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest class index present, if any.
    pub fn max_index(&self) -> Option<usize> {
        self.0.keys().next_back().copied()
    }
}

impl From<Vec<String>> for ClassNames {
    fn from(names: Vec<String>) -> Self {
        Self(names.into_iter().enumerate().collect())
    }
}

impl From<BTreeMap<usize, String>> for ClassNames {
    fn from(names: BTreeMap<usize, String>) -> Self {
        Self(names)
    }
}

/// One row of the canonical annotation table.
///
/// The image-derived fields are `None` when the image could not be decoded
/// and the record was kept in degraded form.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub image_path: String,
    pub class_name: String,
    pub bbox_x_center: f64,
    pub bbox_y_center: f64,
    pub bbox_width: f64,
    pub bbox_height: f64,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    pub brightness: Option<f64>,
    pub contrast: Option<f64>,
    pub split: Option<Split>,
}

impl AnnotationRecord {
    /// Cells in table order. Absent values become empty cells.
    pub fn to_fields(&self, include_split: bool) -> Vec<String> {
        fn opt<T: ToString>(value: Option<T>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }

        let mut fields = vec![
            self.image_path.clone(),
            self.class_name.clone(),
            self.bbox_x_center.to_string(),
            self.bbox_y_center.to_string(),
            self.bbox_width.to_string(),
            self.bbox_height.to_string(),
            opt(self.image_width),
            opt(self.image_height),
            opt(self.brightness),
            opt(self.contrast),
        ];
        if include_split {
            fields.push(opt(self.split));
        }
        fields
    }
}

/// Why an annotation did not make it into the table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The referenced image file does not exist.
    MissingImage,
    /// The image exists but could not be decoded, and the policy drops such rows.
    ImageFailure,
    /// The raw label or category has no canonical symbol.
    UnknownLabel,
    /// Wrong field count or field type.
    Malformed,
    /// Class index beyond the end of the class-name list.
    ClassOutOfRange,
}

// Per-split bookkeeping, every skip condition counted on its own
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SplitStats {
    pub source_annotations: usize,
    pub kept: usize,
    pub degraded: usize,
    pub unnormalized: usize,
    pub skipped_missing_image: usize,
    pub skipped_image_failure: usize,
    pub skipped_unknown_label: usize,
    pub skipped_malformed: usize,
    pub skipped_class_out_of_range: usize,
    pub orphan_label_files: usize,
}

impl SplitStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_source(&mut self) {
        self.source_annotations += 1;
    }

    pub fn increment_kept(&mut self) {
        self.kept += 1;
    }

    pub fn increment_degraded(&mut self) {
        self.degraded += 1;
    }

    pub fn increment_unnormalized(&mut self) {
        self.unnormalized += 1;
    }

    pub fn increment_orphan_label_files(&mut self) {
        self.orphan_label_files += 1;
    }

    pub fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingImage => self.skipped_missing_image += 1,
            SkipReason::ImageFailure => self.skipped_image_failure += 1,
            SkipReason::UnknownLabel => self.skipped_unknown_label += 1,
            SkipReason::Malformed => self.skipped_malformed += 1,
            SkipReason::ClassOutOfRange => self.skipped_class_out_of_range += 1,
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped_missing_image
            + self.skipped_image_failure
            + self.skipped_unknown_label
            + self.skipped_malformed
            + self.skipped_class_out_of_range
    }

    /// Every source annotation is either kept or skipped for exactly one reason.
    pub fn is_balanced(&self) -> bool {
        self.kept + self.skipped() == self.source_annotations
    }

    pub fn merge(&mut self, other: &SplitStats) {
        self.source_annotations += other.source_annotations;
        self.kept += other.kept;
        self.degraded += other.degraded;
        self.unnormalized += other.unnormalized;
        self.skipped_missing_image += other.skipped_missing_image;
        self.skipped_image_failure += other.skipped_image_failure;
        self.skipped_unknown_label += other.skipped_unknown_label;
        self.skipped_malformed += other.skipped_malformed;
        self.skipped_class_out_of_range += other.skipped_class_out_of_range;
        self.orphan_label_files += other.orphan_label_files;
    }

    pub fn print_summary(&self, source: &str) {
        log::info!(
            "{}: {} valid annotations, skipped {} (of {}).",
            source,
            self.kept,
            self.skipped(),
            self.source_annotations
        );

        if self.skipped() > 0 {
            log::info!(
                "  skipped: missing image {}, image failure {}, unknown label {}, malformed {}, class out of range {}",
                self.skipped_missing_image,
                self.skipped_image_failure,
                self.skipped_unknown_label,
                self.skipped_malformed,
                self.skipped_class_out_of_range
            );
        }
        if self.orphan_label_files > 0 {
            log::warn!(
                "  {} label files had no matching image",
                self.orphan_label_files
            );
        }
        if self.degraded > 0 {
            log::warn!(
                "  {} annotations kept without image statistics ({} with pixel-scale boxes)",
                self.degraded,
                self.unnormalized
            );
        }
    }
}
