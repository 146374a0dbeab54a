use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{NormalizeError, Result};
use crate::types::{AnnotationRecord, ClassNames, IMG_EXTENSIONS, SPLIT_COLUMN, TABLE_COLUMNS};

/// Write the canonical table as CSV, header first.
pub fn write_annotation_table(
    path: &Path,
    records: &[AnnotationRecord],
    include_split: bool,
) -> Result<()> {
    let csv_err = |source: csv::Error| NormalizeError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(|e| NormalizeError::io(path, e))?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    let mut header: Vec<&str> = TABLE_COLUMNS.to_vec();
    if include_split {
        header.push(SPLIT_COLUMN);
    }
    writer.write_record(&header).map_err(csv_err)?;

    for record in records {
        writer
            .write_record(record.to_fields(include_split))
            .map_err(csv_err)?;
    }

    writer
        .into_inner()
        .map_err(|e| NormalizeError::io(path, e.into_error()))?
        .flush()
        .map_err(|e| NormalizeError::io(path, e))
}

#[derive(Debug, Deserialize)]
struct DataYaml {
    names: DataYamlNames,
}

// `names:` is either a list or an index -> name mapping
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

// Largest class index accepted from a data.yaml mapping
pub const MAX_CLASS_INDEX: usize = 65_535;

/// Read the class names from a YOLO data.yaml.
///
/// A mapping may leave gaps; indices in a gap have no name.
pub fn read_class_names(path: &Path) -> Result<ClassNames> {
    let data = fs::read_to_string(path).map_err(|e| NormalizeError::io(path, e))?;
    let parsed: DataYaml = serde_yaml::from_str(&data).map_err(|source| NormalizeError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    let names = match parsed.names {
        DataYamlNames::Sequence(names) => ClassNames::from(names),
        DataYamlNames::Mapping(mapping) => ClassNames::from(mapping),
    };

    if names.is_empty() {
        return Err(NormalizeError::NoClassNames {
            path: path.to_path_buf(),
        });
    }
    if let Some(index) = names.max_index().filter(|&index| index > MAX_CLASS_INDEX) {
        return Err(NormalizeError::ClassIndexTooLarge {
            path: path.to_path_buf(),
            index,
            max: MAX_CLASS_INDEX,
        });
    }
    Ok(names)
}

/// First existing `<stem>.<ext>` in `images_dir`, trying extensions in order.
pub fn find_image(images_dir: &Path, stem: &str) -> Option<PathBuf> {
    IMG_EXTENSIONS
        .iter()
        .map(|ext| images_dir.join(format!("{stem}.{ext}")))
        .find(|path| path.is_file())
}

/// `*.txt` files directly inside `labels_dir`, sorted by path.
pub fn list_label_files(labels_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.txt",
        glob::Pattern::escape(&labels_dir.to_string_lossy())
    );
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|source| NormalizeError::Pattern {
            pattern: pattern.clone(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}
