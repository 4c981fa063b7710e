//! Aggregated classification results across a bulletin corpus
//!
//! This module defines the grouped partition collections and the aggregate report
//! that the batch reporter builds and the persistence layer writes out.

use crate::app::models::{CandidateEntry, ClassificationCounts, ClassificationLabel};
use crate::app::services::entry_classifier::ClassifiedBatch;
use crate::app::services::evidence_matcher::MatchOutcome;
use crate::{Error, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// One bulletin's entries for a single label
///
/// Serialized as a single-key mapping `{"ATEL00123": [entries]}`, the element
/// type of the partition files.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<CandidateEntry>>")]
pub struct BulletinGroup {
    pub label: String,
    pub entries: Vec<CandidateEntry>,
}

impl BulletinGroup {
    pub fn new(label: impl Into<String>, entries: Vec<CandidateEntry>) -> Self {
        Self {
            label: label.into(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for BulletinGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.label, &self.entries)?;
        map.end()
    }
}

impl TryFrom<BTreeMap<String, Vec<CandidateEntry>>> for BulletinGroup {
    type Error = Error;

    fn try_from(map: BTreeMap<String, Vec<CandidateEntry>>) -> Result<Self> {
        if map.len() != 1 {
            return Err(Error::json_parsing(
                "bulletin group",
                format!("expected exactly one bulletin label, found {}", map.len()),
                None,
            ));
        }
        let (label, entries) = map.into_iter().next().ok_or_else(|| {
            Error::json_parsing("bulletin group", "empty bulletin group", None)
        })?;
        Ok(Self { label, entries })
    }
}

/// Classification results for a whole run
///
/// Batches are kept in processing order and can be looked up by bulletin id.
/// The three global collections hold one group per bulletin that produced at
/// least one entry with that label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateReport {
    batches: Vec<ClassifiedBatch>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    pub good: Vec<BulletinGroup>,
    pub bad: Vec<BulletinGroup>,
    pub null: Vec<BulletinGroup>,
    /// Running `[total, good, bad, null]` across every batch
    pub counts: ClassificationCounts,
    /// Entries decided by each evidence rule across every batch
    pub outcomes: BTreeMap<MatchOutcome, usize>,
}

impl AggregateReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one bulletin's batch into the report
    ///
    /// A repeated bulletin id is recorded again and its lookup points to the
    /// latest batch.
    pub fn push(&mut self, batch: ClassifiedBatch) {
        for label in ClassificationLabel::ALL {
            let entries = batch.entries(label);
            if !entries.is_empty() {
                self.groups_mut(label)
                    .push(BulletinGroup::new(batch.label.clone(), entries.to_vec()));
            }
        }

        self.counts += batch.counts;
        for (outcome, count) in &batch.outcomes {
            *self.outcomes.entry(*outcome).or_insert(0) += count;
        }

        self.index
            .insert(batch.bulletin_id.clone(), self.batches.len());
        self.batches.push(batch);
    }

    /// Combine two reports, `self` first
    ///
    /// Concatenates batches and groups and sums counts, so
    /// `a.merge(b).merge(c) == a.merge(b.merge(c))`.
    pub fn merge(mut self, other: AggregateReport) -> AggregateReport {
        let offset = self.batches.len();
        for (id, position) in other.index {
            self.index.insert(id, position + offset);
        }
        self.batches.extend(other.batches);
        self.good.extend(other.good);
        self.bad.extend(other.bad);
        self.null.extend(other.null);
        self.counts += other.counts;
        for (outcome, count) in other.outcomes {
            *self.outcomes.entry(outcome).or_insert(0) += count;
        }
        self
    }

    /// Look up the batch for a bulletin id
    pub fn batch(&self, bulletin_id: &str) -> Option<&ClassifiedBatch> {
        self.index.get(bulletin_id).map(|&i| &self.batches[i])
    }

    /// Batches in processing order
    pub fn batches(&self) -> &[ClassifiedBatch] {
        &self.batches
    }

    pub fn bulletin_count(&self) -> usize {
        self.batches.len()
    }

    /// Global grouped collection for `label`
    pub fn groups(&self, label: ClassificationLabel) -> &[BulletinGroup] {
        match label {
            ClassificationLabel::Good => &self.good,
            ClassificationLabel::Bad => &self.bad,
            ClassificationLabel::Null => &self.null,
        }
    }

    fn groups_mut(&mut self, label: ClassificationLabel) -> &mut Vec<BulletinGroup> {
        match label {
            ClassificationLabel::Good => &mut self.good,
            ClassificationLabel::Bad => &mut self.bad,
            ClassificationLabel::Null => &mut self.null,
        }
    }

    /// Per-bulletin counts keyed by bulletin label, in processing order
    pub fn bulletin_counts(&self) -> Vec<(&str, ClassificationCounts)> {
        self.batches
            .iter()
            .map(|batch| (batch.label.as_str(), batch.counts))
            .collect()
    }

    /// Counts agree with the batches and with the grouped collections
    pub fn is_consistent(&self) -> bool {
        let batch_sum: ClassificationCounts = self.batches.iter().map(|b| b.counts).sum();
        let grouped =
            |groups: &[BulletinGroup]| -> usize { groups.iter().map(BulletinGroup::len).sum() };

        self.counts.is_consistent()
            && batch_sum == self.counts
            && self.batches.iter().all(ClassifiedBatch::is_consistent)
            && grouped(&self.good) == self.counts.good
            && grouped(&self.bad) == self.counts.bad
            && grouped(&self.null) == self.counts.null
    }

    /// Get summary string for logging
    pub fn summary(&self) -> String {
        format!(
            "Classification Summary: {} bulletins, {} entries | good {} ({:.1}%) | bad {} | null {}",
            self.batches.len(),
            self.counts.total,
            self.counts.good,
            self.counts.good_rate(),
            self.counts.bad,
            self.counts.null
        )
    }
}
