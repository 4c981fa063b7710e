//! Tests for the entry classifier module
//!
//! Shared fixtures for building entries of each coordinate shape.

pub mod batch_tests;

use crate::app::models::CandidateEntry;
use serde_json::{Value, json};

/// Bulletin id used by most fixtures
pub const TEST_BULLETIN_ID: &str = "ATel #123";

/// Bulletin text quoting BL Lac's decimal and sexagesimal coordinates
pub const BL_LAC_TEXT: &str = "We report optical flaring of BL Lac (RA=330.68, Dec=42.28; \
     22h02m43.291s +42d16m39.63s) observed with the Liverpool Telescope.";

/// Build an entry from a JSON object literal
pub fn create_entry(value: Value) -> CandidateEntry {
    let record = value
        .as_object()
        .cloned()
        .expect("test entry must be a JSON object");
    CandidateEntry::from_record(record).expect("test entry must have a supported shape")
}

pub fn create_numeric_entry(name: &str, ra: f64, dec: f64) -> CandidateEntry {
    create_entry(json!({"Name": name, "RA": ra, "Dec": dec, "redshift": null}))
}

pub fn create_textual_entry(name: &str, ra: &str, dec: &str) -> CandidateEntry {
    create_entry(json!({"Name": name, "RA": ra, "Dec": dec, "redshift": null}))
}

pub fn create_null_entry(name: &str) -> CandidateEntry {
    create_entry(json!({"Name": name, "RA": null, "Dec": null}))
}

pub fn create_list_entry(name: &str) -> CandidateEntry {
    create_entry(json!({"Name": name, "RA": ["12:34", "56:78"], "Dec": ["+01:02", "+03:04"]}))
}
