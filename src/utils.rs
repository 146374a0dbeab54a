use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::BufReader;
use std::path::Path;

use crate::error::{NormalizeError, Result};

/// Parse a JSON file straight from a buffered file stream.
pub fn read_and_parse_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = fs::File::open(path).map_err(|e| NormalizeError::io(path, e))?;

    serde_json::from_reader(BufReader::new(file)).map_err(|source| NormalizeError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Create the output directory if needed. Existing contents are left alone.
pub fn ensure_output_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        log::info!("Creating output directory {}", path.display());
    }
    fs::create_dir_all(path).map_err(|e| NormalizeError::io(path, e))
}
