//! Playing-card annotation normalizer
//!
//! Reads card-detection datasets in corner CSV (VOC), box-per-line (YOLO) or
//! COCO JSON form and writes one flat table of normalized boxes, canonical card
//! symbols and per-image brightness/contrast.

pub mod coco;
pub mod config;
pub mod conversion;
pub mod dataset;
pub mod error;
pub mod image_stats;
pub mod io;
pub mod labels;
pub mod normalize;
pub mod source;
pub mod types;
pub mod utils;
pub mod voc;
pub mod yolo;

// Re-export commonly used types and functions
pub use config::{CocoArgs, ImageFailurePolicy, VocArgs, YoloArgs};
pub use dataset::{process_dataset, DatasetOutcome, OUTPUT_FILE_NAME};
pub use error::{NormalizeError, Result};
pub use source::{AnnotationParser, SourceFormat};
pub use types::{AnnotationRecord, ClassNames, Split, SplitStats};

pub use coco::CocoParser;
pub use voc::{VocCsvParser, VocCsvSource};
pub use yolo::YoloParser;
