//! Entry classification module for extracted bulletin coordinates
//!
//! This module decides, for every object record extracted from a bulletin, whether
//! its coordinates can be trusted. The decision is rule-based and deterministic.
//!
//! # Architecture
//!
//! - [`classifier`] - Per-entry labelling and per-bulletin orchestration
//! - [`batch`] - The per-bulletin result structure and its counts
//!
//! # Labels
//!
//! - **NULL**: RA or Dec is absent
//! - **GOOD**: the evidence check passed, or the RA is a list/mapping and is trusted as-is
//! - **BAD**: the evidence check failed or a structural heuristic flagged the extraction
//!
//! # Example Usage
//!
//! ```rust
//! use atel_processor::app::services::entry_classifier::classify;
//! use atel_processor::CandidateEntry;
//!
//! # fn example() -> atel_processor::Result<()> {
//! let record = serde_json::json!({"Name": "BL Lac", "RA": 330.68, "Dec": 42.28});
//! let entry = CandidateEntry::from_record(record.as_object().cloned().unwrap_or_default())?;
//!
//! let batch = classify("ATel #123", "BL Lac at 330.68, 42.28", vec![entry])?;
//! assert_eq!(batch.counts.to_array(), [1, 1, 0, 0]);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod classifier;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use batch::ClassifiedBatch;
pub use classifier::{classify, classify_entry};
