use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::config::ImageFailurePolicy;
use crate::error::Result;
use crate::io::write_annotation_table;
use crate::normalize::normalize_split;
use crate::source::AnnotationParser;
use crate::types::{AnnotationRecord, Split, SplitStats};
use crate::utils::ensure_output_directory;

pub const OUTPUT_FILE_NAME: &str = "dataset_converted.csv";

/// Records of every split, concatenated in split order, plus per-split counts.
#[derive(Debug, Default)]
pub struct DatasetTable {
    pub records: Vec<AnnotationRecord>,
    pub per_split: Vec<(Split, SplitStats)>,
}

impl DatasetTable {
    pub fn totals(&self) -> SplitStats {
        let mut totals = SplitStats::new();
        for (_, stats) in &self.per_split {
            totals.merge(stats);
        }
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetOutcome {
    Written { path: PathBuf, rows: usize },
    NoData,
}

/// Run `parser` over all of its splits and concatenate the results.
///
/// A split whose source cannot be read contributes no rows; the run goes on.
pub fn collect_dataset(parser: &dyn AnnotationParser, policy: ImageFailurePolicy) -> DatasetTable {
    let tag_split = parser.format().tags_split();
    let mut table = DatasetTable::default();

    for split in parser.splits() {
        let source = parser.describe(split);
        let (records, stats) = match parser.parse_split(split) {
            Ok(parsed) => {
                let label = capitalize(split.as_str());
                normalize_split(parsed, tag_split.then_some(split), policy, &label)
            }
            Err(e) => {
                warn!("Skipping {} split ({}): {}", split, source, e);
                (Vec::new(), SplitStats::new())
            }
        };

        stats.print_summary(&source);
        table.records.extend(records);
        table.per_split.push((split, stats));
    }

    table
}

/// Collect the whole dataset and write it to `<output_dir>/dataset_converted.csv`.
///
/// Nothing is written when no split produced a row.
pub fn process_dataset(
    parser: &dyn AnnotationParser,
    policy: ImageFailurePolicy,
    output_dir: &Path,
) -> Result<DatasetOutcome> {
    let table = collect_dataset(parser, policy);
    write_dataset(&table, parser.format().tags_split(), output_dir)
}

pub fn write_dataset(
    table: &DatasetTable,
    include_split: bool,
    output_dir: &Path,
) -> Result<DatasetOutcome> {
    if table.records.is_empty() {
        info!("No data found in any split");
        return Ok(DatasetOutcome::NoData);
    }

    ensure_output_directory(output_dir)?;
    let out_path = output_dir.join(OUTPUT_FILE_NAME);
    write_annotation_table(&out_path, &table.records, include_split)?;

    let totals = table.totals();
    info!(
        "All: {} rows -> {} (skipped {})",
        table.records.len(),
        out_path.display(),
        totals.skipped()
    );

    Ok(DatasetOutcome::Written {
        path: out_path,
        rows: table.records.len(),
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
