//! Integration tests for the classification pipeline over a temporary corpus
//!
//! A bulletin CSV and a directory of extraction documents are written to a temp
//! directory, classified end to end, persisted and read back.

use atel_processor::app::services::batch_reporter::{
    read_groups, read_summary, run, write_report,
};
use atel_processor::app::services::bulletin_loader::{
    BulletinCorpus, discover_extraction_files, load_bulletin_entries,
};
use atel_processor::constants::{EXTRACTION_FILE_PATTERN, fields};
use atel_processor::{ClassificationCounts, Error};
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BULLETIN_CSV: &str = "\
atelno,body
ATel #123,\"Swift observed BL Lac at RA=330.68, Dec=42.28 during the flare.\"
ATel #124,Two candidate counterparts are reported.
ATel #125,No position was given for this transient.
";

/// Write the corpus CSV and extraction documents, returning (csv, extraction dir)
fn create_corpus(root: &Path) -> (PathBuf, PathBuf) {
    let csv_path = root.join("Processed_Atels.csv");
    std::fs::write(&csv_path, BULLETIN_CSV).unwrap();

    let extraction_dir = root.join("gpt_output");
    std::fs::create_dir_all(&extraction_dir).unwrap();

    let documents = [
        (
            "ATel-#123.json",
            json!({
                "Celestial Object": [
                    {"Name": "BL Lac", "RA": 330.68, "Dec": 42.28, "Telescope": "guess"},
                    {"Name": "ghost", "RA": 10.5, "Dec": -3.25},
                    {"Name": "GRB", "RA": null, "Dec": null}
                ],
                "Telescope": "Swift",
                "Event Type": "flare"
            }),
        ),
        (
            "ATel-#124.json",
            json!({"Celestial Object": [{"Name": "pair", "RA": [1.0, 2.0], "Dec": [3.0, 4.0]}]}),
        ),
        ("ATel-#125.json", json!({"Celestial Object": null})),
        (
            "ATel-#999.json",
            json!({"Celestial Object": [{"Name": "orphan", "RA": 1.0, "Dec": 2.0}]}),
        ),
    ];
    for (file_name, document) in documents {
        std::fs::write(
            extraction_dir.join(file_name),
            serde_json::to_string_pretty(&document).unwrap(),
        )
        .unwrap();
    }
    std::fs::write(extraction_dir.join("notes.txt"), "not an extraction").unwrap();

    (csv_path, extraction_dir)
}

#[test]
fn test_classify_corpus_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let (csv_path, extraction_dir) = create_corpus(temp_dir.path());

    let corpus = BulletinCorpus::load(&csv_path).unwrap();
    assert_eq!(corpus.len(), 3);

    let files = discover_extraction_files(&extraction_dir, EXTRACTION_FILE_PATTERN).unwrap();
    assert_eq!(files.len(), 4, "notes.txt must not match");

    let mut inputs = Vec::new();
    let mut missing = Vec::new();
    for path in &files {
        match load_bulletin_entries(&corpus, path, fields::CELESTIAL_OBJECTS) {
            Ok(input) => inputs.push(input),
            Err(Error::BulletinNotFound { id }) => missing.push(id),
            Err(e) => panic!("Unexpected error for {}: {}", path.display(), e),
        }
    }
    assert_eq!(missing, vec!["ATel #999"]);

    let report = run(inputs).unwrap();
    assert!(report.is_consistent());
    assert_eq!(report.bulletin_count(), 3);
    assert_eq!(report.counts.to_array(), [4, 2, 1, 1]);

    let output_dir = temp_dir.path().join("output");
    let written = write_report(&report, &output_dir).unwrap();

    let good = read_groups(&written.good).unwrap();
    let labels: Vec<&str> = good.iter().map(|g| g.label.as_str()).collect();
    assert_eq!(labels, vec!["ATEL00123", "ATEL00124"]);
    // Bulletin-level fields overwrite the object's own value
    assert_eq!(good[0].entries[0].get(fields::TELESCOPE), Some(&json!("Swift")));
    assert_eq!(good[0].entries[0].get(fields::EVENT_TYPE), Some(&json!("flare")));

    let bad = read_groups(&written.bad).unwrap();
    assert_eq!(bad.len(), 1);
    assert_eq!(bad[0].entries[0].name(), Some("ghost"));

    let null = read_groups(&written.null).unwrap();
    assert_eq!(null.len(), 1);
    assert_eq!(null[0].label, "ATEL00123");

    let summary = read_summary(&written.summary).unwrap();
    assert_eq!(summary.overall, ClassificationCounts::from([4, 2, 1, 1]));
    assert_eq!(summary.bulletins_processed, 3);
    assert_eq!(summary.bulletins["ATEL00124"], json!([1, 1, 0, 0]));
    assert_eq!(summary.bulletins["ATEL00125"], json!([0, 0, 0, 0]));
}

#[test]
fn test_rewriting_report_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let (csv_path, extraction_dir) = create_corpus(temp_dir.path());

    let corpus = BulletinCorpus::load(&csv_path).unwrap();
    let inputs: Vec<_> = discover_extraction_files(&extraction_dir, "ATel-#12?.json")
        .unwrap()
        .iter()
        .map(|path| load_bulletin_entries(&corpus, path, fields::CELESTIAL_OBJECTS).unwrap())
        .collect();

    let output_dir = temp_dir.path().join("output");
    let first = write_report(&run(inputs.clone()).unwrap(), &output_dir).unwrap();
    let good_before = std::fs::read_to_string(&first.good).unwrap();
    let bad_before = std::fs::read_to_string(&first.bad).unwrap();

    let second = write_report(&run(inputs).unwrap(), &output_dir).unwrap();
    assert_eq!(std::fs::read_to_string(&second.good).unwrap(), good_before);
    assert_eq!(std::fs::read_to_string(&second.bad).unwrap(), bad_before);
}

#[test]
fn test_partition_files_use_four_space_indent() {
    let temp_dir = TempDir::new().unwrap();
    let (csv_path, extraction_dir) = create_corpus(temp_dir.path());

    let corpus = BulletinCorpus::load(&csv_path).unwrap();
    let path = extraction_dir.join("ATel-#124.json");
    let input = load_bulletin_entries(&corpus, &path, fields::CELESTIAL_OBJECTS).unwrap();

    let written = write_report(&run(vec![input]).unwrap(), temp_dir.path()).unwrap();
    let text = std::fs::read_to_string(&written.good).unwrap();

    assert!(text.starts_with("[\n    {\n        \"ATEL00124\": ["));
}

#[test]
fn test_missing_extraction_directory() {
    let temp_dir = TempDir::new().unwrap();
    let result = discover_extraction_files(&temp_dir.path().join("missing"), "*.json");
    assert!(matches!(result, Err(Error::FileNotFound { .. })));
}
