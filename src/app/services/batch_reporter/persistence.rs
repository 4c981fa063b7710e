//! Writing and reading the partition and summary files
//!
//! Partition files hold a JSON list of single-key mappings, one per bulletin with a
//! non-empty group. The summary file carries the overall and per-bulletin counts.

use crate::app::models::{ClassificationCounts, ClassificationLabel};
use crate::app::services::evidence_matcher::MatchOutcome;
use crate::constants::{
    BAD_OUTPUT_FILENAME, GOOD_OUTPUT_FILENAME, NULL_OUTPUT_FILENAME, SUMMARY_OUTPUT_FILENAME,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::report::{AggregateReport, BulletinGroup};

const JSON_INDENT: &[u8] = b"    ";

/// Contents of the summary file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// `[total, good, bad, null]` across all bulletins
    pub overall: ClassificationCounts,
    /// Number of bulletins classified
    pub bulletins_processed: usize,
    /// Per-bulletin counts keyed by bulletin label
    pub bulletins: serde_json::Map<String, serde_json::Value>,
    pub outcomes: BTreeMap<MatchOutcome, usize>,
    pub generated_at: DateTime<Utc>,
}

impl ReportSummary {
    pub fn from_report(report: &AggregateReport) -> Result<Self> {
        let mut bulletins = serde_json::Map::new();
        for (label, counts) in report.bulletin_counts() {
            bulletins.insert(label.to_string(), serde_json::to_value(counts)?);
        }

        Ok(Self {
            overall: report.counts,
            bulletins_processed: report.bulletin_count(),
            bulletins,
            outcomes: report.outcomes.clone(),
            generated_at: Utc::now(),
        })
    }
}

/// Paths of the files written for one report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFiles {
    pub good: PathBuf,
    pub bad: PathBuf,
    pub null: PathBuf,
    pub summary: PathBuf,
}

impl ReportFiles {
    /// Standard file layout under `output_dir`
    pub fn in_directory(output_dir: &Path) -> Self {
        Self {
            good: output_dir.join(GOOD_OUTPUT_FILENAME),
            bad: output_dir.join(BAD_OUTPUT_FILENAME),
            null: output_dir.join(NULL_OUTPUT_FILENAME),
            summary: output_dir.join(SUMMARY_OUTPUT_FILENAME),
        }
    }

    pub fn partition(&self, label: ClassificationLabel) -> &Path {
        match label {
            ClassificationLabel::Good => &self.good,
            ClassificationLabel::Bad => &self.bad,
            ClassificationLabel::Null => &self.null,
        }
    }

    pub fn all(&self) -> [&Path; 4] {
        [&self.good, &self.bad, &self.null, &self.summary]
    }
}

/// Write the three partition files and the summary file into `output_dir`
///
/// The directory is created if missing. Existing files are overwritten.
pub fn write_report(report: &AggregateReport, output_dir: &Path) -> Result<ReportFiles> {
    std::fs::create_dir_all(output_dir).map_err(|e| {
        Error::io(
            format!("Failed to create output directory {}", output_dir.display()),
            e,
        )
    })?;

    let files = ReportFiles::in_directory(output_dir);
    for label in ClassificationLabel::ALL {
        write_json(files.partition(label), report.groups(label))?;
        debug!(
            "Wrote {} {} groups to {}",
            report.groups(label).len(),
            label,
            files.partition(label).display()
        );
    }
    write_json(&files.summary, &ReportSummary::from_report(report)?)?;

    info!("Wrote classification report to {}", output_dir.display());
    Ok(files)
}

/// Write bulletin groups in the partition file layout
pub fn write_groups(path: &Path, groups: &[BulletinGroup]) -> Result<()> {
    write_json(path, groups)?;
    debug!("Wrote {} groups to {}", groups.len(), path.display());
    Ok(())
}

/// Read a partition file back into bulletin groups
pub fn read_groups(path: &Path) -> Result<Vec<BulletinGroup>> {
    read_json(path)
}

/// Read a summary file
pub fn read_summary(path: &Path) -> Result<ReportSummary> {
    read_json(path)
}

/// Write `value` as JSON indented with four spaces
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| Error::io(format!("Failed to create {}", path.display()), e))?;
    let mut writer = BufWriter::new(file);

    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(JSON_INDENT));
    value.serialize(&mut serializer).map_err(|e| {
        Error::json_parsing(path.display().to_string(), "failed to encode", Some(e))
    })?;

    writer
        .flush()
        .map_err(|e| Error::io(format!("Failed to write {}", path.display()), e))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::file_not_found(path.display().to_string()));
    }
    let file =
        File::open(path).map_err(|e| Error::io(format!("Failed to open {}", path.display()), e))?;

    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        Error::json_parsing(path.display().to_string(), e.to_string(), Some(e))
    })
}
