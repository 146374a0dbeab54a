use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::source::SourceFormat;

/// Convert a VOC-style corner CSV playing-card dataset into one flat table.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct VocArgs {
    /// Path to train_labels.csv
    #[arg(long = "train_csv")]
    pub train_csv: PathBuf,

    /// Path to test_labels.csv
    #[arg(long = "test_csv")]
    pub test_csv: PathBuf,

    /// Folder holding the train images
    #[arg(long = "train_dir")]
    pub train_dir: PathBuf,

    /// Folder holding the test images
    #[arg(long = "test_dir")]
    pub test_dir: PathBuf,

    /// Output directory for dataset_converted.csv
    #[arg(long = "output_dir")]
    pub output_dir: PathBuf,

    /// Convert full labels ("ace of spades") to short symbols ("As")
    #[arg(long = "convert_labels")]
    pub convert_labels: bool,

    /// What to do with annotations whose image cannot be decoded
    #[arg(long = "on_image_failure", value_enum)]
    pub on_image_failure: Option<ImageFailurePolicy>,
}

/// Convert a YOLO playing-card dataset (train/valid/test) into one flat table.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct YoloArgs {
    /// YOLO dataset base folder containing train/, valid/ and test/
    #[arg(short = 'd', long = "dataset")]
    pub dataset: PathBuf,

    /// data.yaml holding the class names
    #[arg(long = "yaml")]
    pub yaml: PathBuf,

    /// Output directory for dataset_converted.csv, defaults to the dataset folder
    #[arg(long = "output_dir")]
    pub output_dir: Option<PathBuf>,

    /// Canonicalize class names into short card symbols
    #[arg(long = "convert_labels")]
    pub convert_labels: bool,

    /// What to do with annotations whose image cannot be decoded
    #[arg(long = "on_image_failure", value_enum)]
    pub on_image_failure: Option<ImageFailurePolicy>,
}

/// Convert a COCO playing-card dataset (train/test/valid) into one flat table.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct CocoArgs {
    /// Folder containing train/, test/ and valid/, each with _annotations.coco.json
    #[arg(short = 'd', long = "dataset")]
    pub dataset: PathBuf,

    /// Output directory for dataset_converted.csv, defaults to the dataset folder
    #[arg(long = "output_dir")]
    pub output_dir: Option<PathBuf>,

    /// Keep category names as they are instead of converting them to card symbols
    #[arg(long = "raw_labels")]
    pub raw_labels: bool,

    /// What to do with annotations whose image cannot be decoded
    #[arg(long = "on_image_failure", value_enum)]
    pub on_image_failure: Option<ImageFailurePolicy>,
}

impl YoloArgs {
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| self.dataset.clone())
    }
}

impl CocoArgs {
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| self.dataset.clone())
    }
}

/// Handling of annotations whose image exists but cannot be decoded.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum ImageFailurePolicy {
    /// Keep the annotation without image statistics; pixel boxes stay unnormalized
    Degrade,
    /// Drop the annotation
    Drop,
}

impl ImageFailurePolicy {
    pub fn resolve(requested: Option<ImageFailurePolicy>, format: SourceFormat) -> Self {
        requested.unwrap_or_else(|| format.default_image_policy())
    }
}
