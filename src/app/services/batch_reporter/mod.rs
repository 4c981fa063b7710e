//! Batch reporting for classification runs over a bulletin corpus
//!
//! This module drives the entry classifier over many bulletins and aggregates the
//! results into the three global partitions plus a running count vector.
//!
//! # Architecture
//!
//! - [`reporter`] - Iterates bulletins, classifies and folds results
//! - [`report`] - The aggregate report and its single-key bulletin groups
//! - [`persistence`] - Partition and summary files on disk
//!
//! # Reduction
//!
//! [`AggregateReport::merge`] concatenates and sums, so reports classified from
//! contiguous chunks can be merged in chunk order to reproduce the sequential result.
//!
//! # Example Usage
//!
//! ```rust
//! use atel_processor::app::services::batch_reporter::run;
//! use atel_processor::{Bulletin, CandidateEntry};
//!
//! # fn example(entries: Vec<CandidateEntry>) -> atel_processor::Result<()> {
//! let bulletin = Bulletin::new("ATel #123", "BL Lac at 330.68, 42.28");
//! let report = run(vec![(bulletin, entries)])?;
//!
//! println!("{}", report.summary());
//! assert!(report.is_consistent());
//! # Ok(())
//! # }
//! ```

pub mod persistence;
pub mod report;
pub mod reporter;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use persistence::{
    ReportFiles, ReportSummary, read_groups, read_summary, write_groups, write_report,
};
pub use report::{AggregateReport, BulletinGroup};
pub use reporter::{merge_reports, run, run_with_progress};
