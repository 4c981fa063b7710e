//! Tests for the batch reporter module
//!
//! Fixtures build a small corpus covering every label.


use crate::app::models::{Bulletin, CandidateEntry};
use serde_json::{Value, json};

pub fn create_entry(value: Value) -> CandidateEntry {
    serde_json::from_value(value).expect("test entry must have a supported shape")
}

/// Three bulletins: mixed labels, all null, and all good
pub fn create_corpus() -> Vec<(Bulletin, Vec<CandidateEntry>)> {
    vec![
        (
            Bulletin::new(
                "ATel #123",
                "BL Lac brightened at RA=330.68, Dec=42.28 (22h02m43s +42d16m40s).",
            ),
            vec![
                create_entry(json!({"Name": "BL Lac", "RA": 330.68, "Dec": 42.28})),
                create_entry(json!({"Name": "BL Lac", "RA": "22h02m43s", "Dec": "+42d16m40s"})),
                create_entry(json!({"Name": "ghost", "RA": "J220243+421640", "Dec": "+42:16"})),
                create_entry(json!({"Name": "GRB", "RA": null, "Dec": null})),
            ],
        ),
        (
            Bulletin::new("ATel #7", "No positions reported."),
            vec![create_entry(json!({"Name": "SN", "RA": null, "Dec": 1.0}))],
        ),
        (
            Bulletin::new("ATel #16543", "Two candidates."),
            vec![create_entry(json!({"Name": "pair", "RA": [1.0, 2.0], "Dec": [3.0, 4.0]}))],
        ),
    ]
}
