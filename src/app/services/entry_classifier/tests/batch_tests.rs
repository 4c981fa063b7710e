//! Tests for the per-bulletin result structure

use super::*;
use crate::app::models::ClassificationLabel;
use crate::app::services::entry_classifier::ClassifiedBatch;
use crate::app::services::evidence_matcher::MatchOutcome;

#[test]
fn test_batch_new_is_empty() {
    let batch = ClassifiedBatch::new(TEST_BULLETIN_ID, "ATEL00123");

    assert_eq!(batch.total(), 0);
    assert!(batch.is_consistent());
    for label in ClassificationLabel::ALL {
        assert!(batch.entries(label).is_empty());
    }
}

#[test]
fn test_batch_push_tracks_outcomes() {
    let mut batch = ClassifiedBatch::new(TEST_BULLETIN_ID, "ATEL00123");
    batch.push(
        create_null_entry("a"),
        ClassificationLabel::Null,
        MatchOutcome::NotApplicable,
    );
    batch.push(
        create_null_entry("b"),
        ClassificationLabel::Null,
        MatchOutcome::NotApplicable,
    );
    batch.push(
        create_list_entry("c"),
        ClassificationLabel::Good,
        MatchOutcome::StructuredTrusted,
    );

    assert_eq!(batch.counts.to_array(), [3, 1, 0, 2]);
    assert_eq!(batch.outcomes[&MatchOutcome::NotApplicable], 2);
    assert_eq!(batch.outcomes[&MatchOutcome::StructuredTrusted], 1);
    assert_eq!(batch.entries(ClassificationLabel::Null).len(), 2);
    assert!(batch.is_consistent());
}

#[test]
fn test_batch_summary() {
    let mut batch = ClassifiedBatch::new(TEST_BULLETIN_ID, "ATEL00123");
    batch.push(
        create_list_entry("c"),
        ClassificationLabel::Good,
        MatchOutcome::StructuredTrusted,
    );

    assert_eq!(
        batch.summary(),
        "ATEL00123 (ATel #123): 1 entries | good 1 | bad 0 | null 0"
    );
}
