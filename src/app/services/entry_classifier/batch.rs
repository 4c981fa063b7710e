//! Per-bulletin classification result
//!
//! A `ClassifiedBatch` holds one bulletin's entries partitioned by label, in the
//! order they were classified, together with the bulletin's count vector.

use crate::app::models::{CandidateEntry, ClassificationCounts, ClassificationLabel};
use crate::app::services::evidence_matcher::MatchOutcome;
use serde::Serialize;
use std::collections::BTreeMap;

/// Classification result for one bulletin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedBatch {
    /// Bulletin identifier as found in the corpus
    pub bulletin_id: String,
    /// Zero-padded partition key (e.g. "ATEL00123")
    pub label: String,
    pub good: Vec<CandidateEntry>,
    pub bad: Vec<CandidateEntry>,
    pub null: Vec<CandidateEntry>,
    /// `[total, good, bad, null]` for this bulletin
    pub counts: ClassificationCounts,
    /// How many entries each evidence rule decided
    pub outcomes: BTreeMap<MatchOutcome, usize>,
}

impl ClassifiedBatch {
    pub fn new(bulletin_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            bulletin_id: bulletin_id.into(),
            label: label.into(),
            good: Vec::new(),
            bad: Vec::new(),
            null: Vec::new(),
            counts: ClassificationCounts::new(),
            outcomes: BTreeMap::new(),
        }
    }

    /// Append an entry under `label`, recording the rule that decided it
    pub fn push(&mut self, entry: CandidateEntry, label: ClassificationLabel, outcome: MatchOutcome) {
        match label {
            ClassificationLabel::Good => self.good.push(entry),
            ClassificationLabel::Bad => self.bad.push(entry),
            ClassificationLabel::Null => self.null.push(entry),
        }
        self.counts.record(label);
        *self.outcomes.entry(outcome).or_insert(0) += 1;
    }

    /// Entries classified with `label`
    pub fn entries(&self, label: ClassificationLabel) -> &[CandidateEntry] {
        match label {
            ClassificationLabel::Good => &self.good,
            ClassificationLabel::Bad => &self.bad,
            ClassificationLabel::Null => &self.null,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.total
    }

    /// Counts agree with the partition sizes and with each other
    pub fn is_consistent(&self) -> bool {
        self.counts.is_consistent()
            && self.counts.good == self.good.len()
            && self.counts.bad == self.bad.len()
            && self.counts.null == self.null.len()
    }

    /// Get summary string for logging
    pub fn summary(&self) -> String {
        format!(
            "{} ({}): {} entries | good {} | bad {} | null {}",
            self.label,
            self.bulletin_id,
            self.counts.total,
            self.counts.good,
            self.counts.bad,
            self.counts.null
        )
    }
}
