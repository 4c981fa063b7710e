//! Entry classification for one bulletin
//!
//! Assigns GOOD, BAD or NULL to each extracted entry by consulting the evidence
//! matcher, and collects the results into a [`ClassifiedBatch`].

use crate::Result;
use crate::app::models::{CandidateEntry, ClassificationLabel, bulletin_label};
use crate::app::services::evidence_matcher::{MatchOutcome, explain};
use tracing::{debug, trace};

use super::batch::ClassifiedBatch;

/// Classify every entry extracted from one bulletin
///
/// Entries are processed in input order and none is dropped: each lands in
/// exactly one of the three partitions and is counted once.
///
/// # Arguments
///
/// * `bulletin_id` - Identifier of the bulletin (e.g. "ATel #123")
/// * `bulletin_text` - Raw bulletin body the entries were extracted from
/// * `entries` - Extracted entries for this bulletin
///
/// # Errors
///
/// Returns `Error::InvalidBulletinId` if no bulletin number can be read from
/// `bulletin_id`.
pub fn classify(
    bulletin_id: &str,
    bulletin_text: &str,
    entries: Vec<CandidateEntry>,
) -> Result<ClassifiedBatch> {
    let mut batch = ClassifiedBatch::new(bulletin_id, bulletin_label(bulletin_id)?);

    for entry in entries {
        let (label, outcome) = classify_entry(bulletin_text, &entry);
        trace!(
            "{}: {:?} ({}) -> {} via {}",
            batch.label,
            entry.name(),
            entry.coordinates().kind(),
            label,
            outcome
        );
        batch.push(entry, label, outcome);
    }

    debug!("Classified {}", batch.summary());
    Ok(batch)
}

/// Label a single entry against the bulletin text
pub fn classify_entry(
    bulletin_text: &str,
    entry: &CandidateEntry,
) -> (ClassificationLabel, MatchOutcome) {
    let outcome = explain(bulletin_text, entry.coordinates());
    let label = match outcome {
        MatchOutcome::NotApplicable => ClassificationLabel::Null,
        outcome if outcome.is_match() => ClassificationLabel::Good,
        _ => ClassificationLabel::Bad,
    };
    (label, outcome)
}
