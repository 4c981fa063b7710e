//! Integration tests chaining extraction, classification and name collection
//!
//! The extractor is replaced by a fixed model response, so the tests run
//! offline against a temporary directory.

use atel_processor::app::services::batch_reporter::run;
use atel_processor::app::services::bulletin_loader::{
    BulletinCorpus, ReferenceSources, discover_extraction_files, load_bulletin_entries,
    load_extraction_file,
};
use atel_processor::app::services::catalog::{NameCollection, NameCounts};
use atel_processor::app::services::extraction::{FixedResponseExtractor, extract_all};
use atel_processor::constants::{EXTRACTION_FILE_PATTERN, fields};
use atel_processor::{Bulletin, ClassificationLabel};
use tempfile::TempDir;

const MODEL_RESPONSE: &str = r#"```json
{
    "Celestial Object": [
        {"Name": "BL Lac", "RA": "22h02m43.3s", "Dec": "+42d16m40s", "redshift": 0.069},
        {"Name": "Swift J2202.7+4216", "RA": null, "Dec": null}
    ],
    "References": null,
    "Event Type": "flare",
    "Telescope": "Swift"
}
```"#;

fn bulletins() -> Vec<Bulletin> {
    vec![
        Bulletin::new(
            "ATel #16001",
            "BL Lac (22h02m43.3s +42d16m40s) is in a bright optical state.",
        ),
        Bulletin::new("ATel #16002", "A new transient unrelated to BL Lac."),
    ]
}

#[tokio::test]
async fn test_extracted_documents_classify_against_their_bulletins() {
    let temp_dir = TempDir::new().unwrap();
    let extraction_dir = temp_dir.path().join("gpt_output");
    let extractor = FixedResponseExtractor::new(MODEL_RESPONSE);

    let stats = extract_all(&extractor, &bulletins(), &extraction_dir, None)
        .await
        .unwrap();
    assert_eq!(stats.written, 2);
    assert_eq!(stats.failed, 0);

    let corpus: BulletinCorpus = bulletins().into_iter().collect();
    let inputs: Vec<_> = discover_extraction_files(&extraction_dir, EXTRACTION_FILE_PATTERN)
        .unwrap()
        .iter()
        .map(|path| load_bulletin_entries(&corpus, path, fields::CELESTIAL_OBJECTS).unwrap())
        .collect();
    assert_eq!(inputs.len(), 2);

    let report = run(inputs).unwrap();
    assert_eq!(report.counts.to_array(), [4, 1, 1, 2]);

    let first = report.batch("ATel #16001").unwrap();
    assert_eq!(first.entries(ClassificationLabel::Good).len(), 1);
    // The same coordinates are not quoted in the second bulletin
    let second = report.batch("ATel #16002").unwrap();
    assert_eq!(second.entries(ClassificationLabel::Bad).len(), 1);
    assert_eq!(
        second.entries(ClassificationLabel::Bad)[0].get(fields::TELESCOPE),
        Some(&serde_json::json!("Swift"))
    );
}

#[tokio::test]
async fn test_collect_names_from_extracted_documents() {
    let temp_dir = TempDir::new().unwrap();
    let extraction_dir = temp_dir.path().join("gpt_output");
    let extractor = FixedResponseExtractor::new(MODEL_RESPONSE);
    extract_all(&extractor, &bulletins(), &extraction_dir, None)
        .await
        .unwrap();

    let sources_path = temp_dir.path().join("ATEL_SOURCES.csv");
    std::fs::write(
        &sources_path,
        "ATELNO,Sources\nATel #16001,BL Lacertae\nATel #16001,\nATel #20000,Crab\n",
    )
    .unwrap();
    let sources = ReferenceSources::load(&sources_path).unwrap();
    assert_eq!(sources.total(), 2);

    let files: Vec<_> = discover_extraction_files(&extraction_dir, EXTRACTION_FILE_PATTERN)
        .unwrap()
        .iter()
        .map(|path| load_extraction_file(path).unwrap())
        .collect();
    let collection = NameCollection::collect(&files, &sources);

    assert_eq!(collection.extracted_counts(), NameCounts { raw: 4, unique: 2 });
    assert_eq!(collection.reference_counts(), NameCounts { raw: 1, unique: 1 });
    assert_eq!(
        collection.unique_extracted(),
        vec!["BL Lac".to_string(), "Swift J2202.7+4216".to_string()]
    );
}
