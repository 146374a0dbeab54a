//! Raw annotations of one split to canonical records.
//!
//! Statistics are computed once per distinct image. Images are processed in
//! parallel, records are assembled sequentially in source order.

use log::warn;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::config::ImageFailurePolicy;
use crate::image_stats::{get_image_stats, ImageStats};
use crate::source::ParsedSplit;
use crate::types::{AnnotationRecord, SkipReason, Split, SplitStats};
use crate::utils::create_progress_bar;

/// Outcome of looking at one referenced image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageLookup {
    Decoded(ImageStats),
    Missing,
    Failed,
}

fn lookup_image(path: &Path) -> ImageLookup {
    if !path.is_file() {
        warn!("Missing image {}", path.display());
        return ImageLookup::Missing;
    }
    match get_image_stats(path) {
        Ok(stats) => ImageLookup::Decoded(stats),
        Err(e) if e.is_decode_failure() => {
            warn!("Could not decode {}: {}", path.display(), e);
            ImageLookup::Failed
        }
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            ImageLookup::Failed
        }
    }
}

/// Statistics for every distinct image referenced by `parsed`, keyed by path.
pub fn collect_image_stats(parsed: &ParsedSplit, label: &str) -> HashMap<PathBuf, ImageLookup> {
    let mut seen = HashSet::new();
    let distinct: Vec<&PathBuf> = parsed
        .annotations
        .iter()
        .map(|annotation| &annotation.image_path)
        .filter(|path| seen.insert(*path))
        .collect();

    let pb = create_progress_bar(distinct.len() as u64, label);
    let lookups = distinct
        .into_par_iter()
        .map(|path| {
            let lookup = lookup_image(path);
            pb.inc(1);
            (path.clone(), lookup)
        })
        .collect();
    pb.finish_and_clear();
    lookups
}

/// Build the records of one split, updating its stats with kept/dropped counts.
///
/// Missing images are always dropped. Undecodable images follow `policy`:
/// degraded records keep their geometry, normalized by 1 where dimensions
/// would have been needed, and are counted as `unnormalized`.
pub fn normalize_split(
    parsed: ParsedSplit,
    split: Option<Split>,
    policy: ImageFailurePolicy,
    label: &str,
) -> (Vec<AnnotationRecord>, SplitStats) {
    let lookups = collect_image_stats(&parsed, label);
    let ParsedSplit {
        annotations,
        mut stats,
    } = parsed;

    let mut records = Vec::with_capacity(annotations.len());
    for annotation in annotations {
        let image_stats = match lookups.get(&annotation.image_path) {
            Some(ImageLookup::Decoded(image_stats)) => Some(*image_stats),
            Some(ImageLookup::Failed) if policy == ImageFailurePolicy::Degrade => None,
            Some(ImageLookup::Failed) => {
                stats.record_skip(SkipReason::ImageFailure);
                continue;
            }
            Some(ImageLookup::Missing) | None => {
                stats.record_skip(SkipReason::MissingImage);
                continue;
            }
        };

        let dims = image_stats.map(|s| (s.width, s.height));
        let bbox = annotation.bbox.normalize(dims);
        if image_stats.is_none() {
            stats.increment_degraded();
            if annotation.bbox.needs_dimensions() {
                stats.increment_unnormalized();
            }
        }

        records.push(AnnotationRecord {
            image_path: annotation.image_path.to_string_lossy().into_owned(),
            class_name: annotation.class_name,
            bbox_x_center: bbox.x_center,
            bbox_y_center: bbox.y_center,
            bbox_width: bbox.width,
            bbox_height: bbox.height,
            image_width: image_stats.map(|s| s.width),
            image_height: image_stats.map(|s| s.height),
            brightness: image_stats.map(|s| s.brightness),
            contrast: image_stats.map(|s| s.contrast),
            split,
        });
        stats.increment_kept();
    }

    if stats.unnormalized > 0 {
        warn!(
            "{}: {} boxes kept in pixel units because their image could not be decoded",
            label, stats.unnormalized
        );
    }

    (records, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::{NormalizedBox, SourceBox};
    use crate::source::RawAnnotation;
    use image::{Rgb, RgbImage};
    use std::fs;

    fn raw(image_path: &Path, bbox: SourceBox) -> RawAnnotation {
        RawAnnotation {
            image_path: image_path.to_path_buf(),
            class_name: "As".to_string(),
            bbox,
        }
    }

    fn split_with(annotations: Vec<RawAnnotation>) -> ParsedSplit {
        let mut parsed = ParsedSplit::default();
        for annotation in annotations {
            parsed.stats.increment_source();
            parsed.push(annotation);
        }
        parsed
    }

    #[test]
    fn test_decoded_images_normalize_boxes() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("card.png");
        RgbImage::from_pixel(100, 100, Rgb([200, 200, 200]))
            .save(&image)
            .unwrap();

        let parsed = split_with(vec![
            raw(&image, SourceBox::Corners([10.0, 10.0, 50.0, 50.0])),
            raw(&image, SourceBox::OriginSize([0.0, 0.0, 100.0, 50.0])),
        ]);
        let (records, stats) =
            normalize_split(parsed, Some(Split::Train), ImageFailurePolicy::Degrade, "Train");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bbox_x_center, 0.3);
        assert_eq!(records[0].bbox_width, 0.4);
        assert_eq!(records[0].image_width, Some(100));
        assert_eq!(records[1].bbox_y_center, 0.25);
        assert_eq!(records[1].split, Some(Split::Train));
        assert_eq!(stats.kept, 2);
        assert_eq!(stats.degraded, 0);
        assert!(stats.is_balanced());
    }

    #[test]
    fn test_failed_images_follow_policy() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.jpg");
        fs::write(&broken, b"garbage").unwrap();
        let annotations = vec![
            raw(&broken, SourceBox::Corners([10.0, 10.0, 50.0, 50.0])),
            raw(
                &broken,
                SourceBox::Normalized(NormalizedBox::new(0.5, 0.5, 0.1, 0.1)),
            ),
        ];

        let (records, stats) = normalize_split(
            split_with(annotations.clone()),
            None,
            ImageFailurePolicy::Degrade,
            "Train",
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bbox_x_center, 30.0);
        assert_eq!(records[0].brightness, None);
        assert_eq!(records[1].bbox_x_center, 0.5);
        assert_eq!(stats.degraded, 2);
        assert_eq!(stats.unnormalized, 1);
        assert!(stats.is_balanced());

        let (records, stats) = normalize_split(
            split_with(annotations),
            None,
            ImageFailurePolicy::Drop,
            "Train",
        );
        assert!(records.is_empty());
        assert_eq!(stats.skipped_image_failure, 2);
        assert!(stats.is_balanced());
    }

    #[test]
    fn test_missing_images_always_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.png");
        let parsed = split_with(vec![raw(&absent, SourceBox::OriginSize([0.0, 0.0, 1.0, 1.0]))]);

        let (records, stats) = normalize_split(parsed, None, ImageFailurePolicy::Degrade, "Test");
        assert!(records.is_empty());
        assert_eq!(stats.skipped_missing_image, 1);
        assert!(stats.is_balanced());
    }

    #[test]
    fn test_each_image_looked_up_once() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("card.png");
        RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])).save(&image).unwrap();

        let parsed = split_with(vec![
            raw(&image, SourceBox::Corners([0.0, 0.0, 1.0, 1.0])),
            raw(&image, SourceBox::Corners([1.0, 1.0, 2.0, 2.0])),
            raw(&dir.path().join("other.png"), SourceBox::Corners([0.0, 0.0, 1.0, 1.0])),
        ]);
        let lookups = collect_image_stats(&parsed, "Train");
        assert_eq!(lookups.len(), 2);
        assert_eq!(lookups[&dir.path().join("other.png")], ImageLookup::Missing);
    }
}
