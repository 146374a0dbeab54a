//! Box-per-line (YOLO) dataset parser.
//!
//! Layout per split: `<dataset>/<split>/labels/<stem>.txt` next to
//! `<dataset>/<split>/images/<stem>.{jpg,jpeg,png}`. Each label line is
//! `class_index x_center y_center width height`, already normalized.

use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::conversion::{NormalizedBox, SourceBox};
use crate::error::Result;
use crate::io::{find_image, list_label_files};
use crate::labels::canonicalize_any;
use crate::source::{AnnotationParser, ParsedSplit, RawAnnotation, SourceFormat};
use crate::types::{ClassNames, SkipReason, Split};

#[derive(Debug, Clone)]
pub struct YoloParser {
    dataset_dir: PathBuf,
    class_names: ClassNames,
    convert_labels: bool,
}

impl YoloParser {
    pub fn new(
        dataset_dir: impl Into<PathBuf>,
        class_names: impl Into<ClassNames>,
        convert_labels: bool,
    ) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            class_names: class_names.into(),
            convert_labels,
        }
    }

    fn split_dir(&self, split: Split) -> PathBuf {
        self.dataset_dir.join(split.as_str())
    }

    // Class name for an index, canonicalized when requested
    fn class_name(
        &self,
        class_id: usize,
        file_name: &str,
    ) -> std::result::Result<String, SkipReason> {
        let name = self
            .class_names
            .get(class_id)
            .ok_or(SkipReason::ClassOutOfRange)?;

        if !self.convert_labels {
            return Ok(name.to_string());
        }
        match canonicalize_any(name, file_name) {
            Some(symbol) => Ok(symbol.to_string()),
            None => {
                warn!("Skipping unknown label '{}' in {}", name, file_name);
                Err(SkipReason::UnknownLabel)
            }
        }
    }

    // Pair a label file with its image; unpaired files count as orphans
    fn parse_label_path(&self, label_path: &Path, images_dir: &Path, parsed: &mut ParsedSplit) {
        let Some(stem) = label_path.file_stem().and_then(|s| s.to_str()) else {
            debug!("Label file name is not valid UTF-8: {}", label_path.display());
            parsed.stats.increment_orphan_label_files();
            return;
        };
        match find_image(images_dir, stem) {
            Some(image_path) => self.parse_label_file(label_path, &image_path, parsed),
            None => {
                debug!("No image for {}", label_path.display());
                parsed.stats.increment_orphan_label_files();
            }
        }
    }

    fn parse_label_file(&self, label_path: &Path, image_path: &Path, parsed: &mut ParsedSplit) {
        let content = match fs::read_to_string(label_path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {}: {}", label_path.display(), e);
                return;
            }
        };
        let file_name = image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        for line in content.lines().filter(|line| !line.trim().is_empty()) {
            parsed.stats.increment_source();

            let Some((class_id, bbox)) = parse_yolo_line(line) else {
                debug!("Malformed line in {}: {:?}", label_path.display(), line);
                parsed.stats.record_skip(SkipReason::Malformed);
                continue;
            };

            match self.class_name(class_id, &file_name) {
                Ok(class_name) => parsed.push(RawAnnotation {
                    image_path: image_path.to_path_buf(),
                    class_name,
                    bbox: SourceBox::Normalized(bbox),
                }),
                Err(reason) => parsed.stats.record_skip(reason),
            }
        }
    }
}

impl AnnotationParser for YoloParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Yolo
    }

    fn splits(&self) -> Vec<Split> {
        vec![Split::Train, Split::Valid, Split::Test]
    }

    fn describe(&self, split: Split) -> String {
        split.to_string()
    }

    fn parse_split(&self, split: Split) -> Result<ParsedSplit> {
        let split_dir = self.split_dir(split);
        let labels_dir = split_dir.join("labels");
        let images_dir = split_dir.join("images");

        let mut parsed = ParsedSplit::default();
        if !labels_dir.is_dir() {
            warn!("No labels directory at {}", labels_dir.display());
            return Ok(parsed);
        }

        for label_path in list_label_files(&labels_dir)? {
            self.parse_label_path(&label_path, &images_dir, &mut parsed);
        }

        Ok(parsed)
    }
}

/// Parse `class_index x_center y_center width height`.
///
/// Exactly five whitespace-separated fields: a non-negative integer followed
/// by four numbers, the last two (width, height) non-negative.
pub fn parse_yolo_line(line: &str) -> Option<(usize, NormalizedBox)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let [class_id, x_center, y_center, width, height] = parts.as_slice() else {
        return None;
    };

    let class_id = class_id.parse::<usize>().ok()?;
    let mut values = [0.0f64; 4];
    for (slot, raw) in values.iter_mut().zip([x_center, y_center, width, height]) {
        *slot = raw.parse::<f64>().ok()?;
    }
    let [x_center, y_center, width, height] = values;

    let bbox = NormalizedBox::new(x_center, y_center, width, height);
    SourceBox::Normalized(bbox)
        .has_valid_size()
        .then_some((class_id, bbox))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_yolo_line() {
        let (class_id, bbox) = parse_yolo_line("3 0.5 0.25 0.1 0.2").unwrap();
        assert_eq!(class_id, 3);
        assert_eq!(bbox, NormalizedBox::new(0.5, 0.25, 0.1, 0.2));

        assert!(parse_yolo_line("  7\t0.1 0.1   0.2 0.2 ").is_some());
    }

    #[test]
    fn test_parse_yolo_line_rejects_malformed() {
        assert!(parse_yolo_line("3 0.5 0.25 0.1").is_none());
        assert!(parse_yolo_line("3 0.5 0.25 0.1 0.2 0.9").is_none());
        assert!(parse_yolo_line("-1 0.5 0.25 0.1 0.2").is_none());
        assert!(parse_yolo_line("1.0 0.5 0.25 0.1 0.2").is_none());
        assert!(parse_yolo_line("1 0.5 abc 0.1 0.2").is_none());
    }

    #[test]
    fn test_parse_yolo_line_rejects_negative_size() {
        assert!(parse_yolo_line("0 0.5 0.5 -0.1 0.2").is_none());
        assert!(parse_yolo_line("0 0.5 0.5 0.1 -0.2").is_none());
        assert!(parse_yolo_line("0 0.5 0.5 0 0").is_some());
    }

    #[test]
    fn test_negative_size_lines_counted_as_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let images_dir = dir.path().join("images");
        fs::create_dir_all(&images_dir).unwrap();
        fs::write(images_dir.join("c.jpg"), b"").unwrap();
        let label_path = dir.path().join("c.txt");
        fs::write(&label_path, "0 0.5 0.5 -0.1 0.1\n0 0.5 0.5 0.1 0.1\n").unwrap();

        let parser = YoloParser::new("unused", vec!["As".to_string()], false);
        let mut parsed = ParsedSplit::default();
        parser.parse_label_path(&label_path, &images_dir, &mut parsed);

        assert_eq!(parsed.stats.source_annotations, 2);
        assert_eq!(parsed.stats.skipped_malformed, 1);
        assert_eq!(parsed.annotations.len(), 1);
    }

    #[test]
    fn test_gap_in_class_names_is_out_of_range() {
        let names = std::collections::BTreeMap::from([
            (0, "As".to_string()),
            (2, "Kh".to_string()),
        ]);
        let parser = YoloParser::new("unused", names, false);
        assert_eq!(parser.class_name(0, "a.jpg"), Ok("As".to_string()));
        assert_eq!(parser.class_name(1, "a.jpg"), Err(SkipReason::ClassOutOfRange));
        assert_eq!(parser.class_name(2, "a.jpg"), Ok("Kh".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_label_name_counted_as_orphan() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let label_path = dir.path().join(OsStr::from_bytes(b"card\xff.txt"));
        let parser = YoloParser::new("unused", vec!["As".to_string()], false);
        let mut parsed = ParsedSplit::default();
        parser.parse_label_path(&label_path, dir.path(), &mut parsed);

        assert_eq!(parsed.stats.orphan_label_files, 1);
        assert_eq!(parsed.stats.source_annotations, 0);
        assert!(parsed.annotations.is_empty());
    }

    #[test]
    fn test_class_name_lookup() {
        let parser = YoloParser::new(
            "unused",
            vec!["ace of hearts".to_string(), "Joker".to_string()],
            true,
        );
        assert_eq!(parser.class_name(0, "h1.jpg"), Ok("Ah".to_string()));
        assert_eq!(parser.class_name(1, "h1.jpg"), Err(SkipReason::UnknownLabel));
        assert_eq!(parser.class_name(2, "h1.jpg"), Err(SkipReason::ClassOutOfRange));

        let raw = YoloParser::new("unused", vec!["Joker".to_string()], false);
        assert_eq!(raw.class_name(0, "h1.jpg"), Ok("Joker".to_string()));
    }
}
