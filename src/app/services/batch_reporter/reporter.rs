//! Corpus-level classification driver
//!
//! Classifies each bulletin's entries in input order and folds the results into
//! an [`AggregateReport`].

use crate::Result;
use crate::app::models::{Bulletin, CandidateEntry};
use crate::app::services::entry_classifier::classify;
use indicatif::ProgressBar;
use tracing::{debug, info};

use super::report::AggregateReport;

/// Classify every bulletin and aggregate the results
///
/// # Errors
///
/// Returns `Error::InvalidBulletinId` if a bulletin id carries no number.
pub fn run<I>(bulletins: I) -> Result<AggregateReport>
where
    I: IntoIterator<Item = (Bulletin, Vec<CandidateEntry>)>,
{
    run_with_progress(bulletins, None)
}

/// Same as [`run`], advancing `progress` once per bulletin
pub fn run_with_progress<I>(bulletins: I, progress: Option<&ProgressBar>) -> Result<AggregateReport>
where
    I: IntoIterator<Item = (Bulletin, Vec<CandidateEntry>)>,
{
    let mut report = AggregateReport::new();

    for (bulletin, entries) in bulletins {
        let batch = classify(&bulletin.id, &bulletin.body, entries)?;
        debug!("{}", batch.summary());
        report.push(batch);

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    info!("{}", report.summary());
    Ok(report)
}

/// Merge partial reports in the order given
///
/// Reports produced from contiguous chunks of the input, merged in chunk order,
/// equal the report of a single sequential run.
pub fn merge_reports<I>(reports: I) -> AggregateReport
where
    I: IntoIterator<Item = AggregateReport>,
{
    reports
        .into_iter()
        .fold(AggregateReport::new(), AggregateReport::merge)
}
