//! Loading bulletins, extraction documents and reference source lists
//!
//! The bulletin corpus is a CSV with `atelno` and `body` columns. Extraction
//! documents are one JSON file per bulletin, named after the bulletin id with
//! spaces replaced by hyphens. The reference source list is a CSV with one
//! `ATELNO`/`Sources` row per known source name.

use crate::app::models::{
    Bulletin, CandidateEntry, ExtractionDocument, bulletin_id_from_file_stem, bulletin_label,
};
use crate::constants::{
    BULLETIN_BODY_COLUMN, BULLETIN_ID_COLUMN, SOURCES_ID_COLUMN, SOURCES_NAME_COLUMN, fields,
};
use crate::{Error, Result};
use csv::StringRecord;
use glob::Pattern;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Bulletins indexed by id, in file order
///
/// When an id occurs more than once the first row wins.
#[derive(Debug, Clone, Default)]
pub struct BulletinCorpus {
    bulletins: Vec<Bulletin>,
    index: HashMap<String, usize>,
}

impl BulletinCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the bulletin CSV
    ///
    /// # Errors
    ///
    /// * `Error::FileNotFound` if the file does not exist
    /// * `Error::CsvParsing` if a required column is missing or a row is malformed
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::file_not_found(path.display().to_string()));
        }
        debug!("Loading bulletins from {}", path.display());

        let file_name = path.to_string_lossy().to_string();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| {
                Error::csv_parsing(&file_name, "Failed to open CSV file".to_string(), Some(e))
            })?;

        let headers = reader
            .headers()
            .map_err(|e| Error::csv_parsing(&file_name, "Failed to read CSV header", Some(e)))?
            .clone();
        let id_column = column_index(&headers, BULLETIN_ID_COLUMN, &file_name)?;
        let body_column = column_index(&headers, BULLETIN_BODY_COLUMN, &file_name)?;

        let mut corpus = Self::new();
        let mut record = StringRecord::new();
        while reader.read_record(&mut record).map_err(|e| {
            Error::csv_parsing(&file_name, "Failed to read CSV record", Some(e))
        })? {
            let Some(id) = record.get(id_column).map(str::trim).filter(|id| !id.is_empty()) else {
                warn!(
                    "Skipping bulletin row without an id at {:?}",
                    record.position().map(|p| p.line())
                );
                continue;
            };
            let body = record.get(body_column).unwrap_or_default();
            corpus.insert(Bulletin::new(id, body));
        }

        info!("Loaded {} bulletins from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    /// Add a bulletin, keeping the first one seen for a given id
    pub fn insert(&mut self, bulletin: Bulletin) {
        if self.index.contains_key(&bulletin.id) {
            debug!("Duplicate bulletin id '{}' ignored", bulletin.id);
            return;
        }
        self.index.insert(bulletin.id.clone(), self.bulletins.len());
        self.bulletins.push(bulletin);
    }

    pub fn get(&self, id: &str) -> Option<&Bulletin> {
        self.index.get(id).map(|&i| &self.bulletins[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bulletin> {
        self.bulletins.iter()
    }

    pub fn len(&self) -> usize {
        self.bulletins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bulletins.is_empty()
    }
}

impl FromIterator<Bulletin> for BulletinCorpus {
    fn from_iter<I: IntoIterator<Item = Bulletin>>(iter: I) -> Self {
        let mut corpus = Self::new();
        for bulletin in iter {
            corpus.insert(bulletin);
        }
        corpus
    }
}

fn column_index(headers: &StringRecord, column: &str, file_name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header.trim() == column)
        .ok_or_else(|| {
            Error::csv_parsing(file_name, format!("Missing required column '{}'", column), None)
        })
}

// =============================================================================
// Extraction Documents
// =============================================================================

/// An extraction document read from disk
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionFile {
    pub path: PathBuf,
    /// Bulletin id recovered from the file name
    pub bulletin_id: String,
    pub document: ExtractionDocument,
}

/// Find extraction files in `directory` whose names match `pattern`
///
/// Only the top level of the directory is scanned. Paths are returned sorted so
/// runs are reproducible.
pub fn discover_extraction_files(directory: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(Error::file_not_found(directory.display().to_string()));
    }
    let pattern = Pattern::new(pattern).map_err(|e| {
        Error::configuration(format!("Invalid extraction file pattern '{}': {}", pattern, e))
    })?;

    let mut files = Vec::new();
    for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file()
                    && path
                        .file_name()
                        .and_then(|name| name.to_str())
                        .is_some_and(|name| pattern.matches(name))
                {
                    files.push(path.to_path_buf());
                }
            }
            Err(e) => {
                warn!("Error walking extraction directory {}: {}", directory.display(), e);
            }
        }
    }

    files.sort();
    info!(
        "Found {} extraction files in {}",
        files.len(),
        directory.display()
    );
    Ok(files)
}

/// Bulletin id an extraction file belongs to, from its file name
pub fn bulletin_id_for_path(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(bulletin_id_from_file_stem)
        .ok_or_else(|| Error::invalid_bulletin_id(path.display().to_string()))
}

/// Read and split one extraction document
pub fn load_extraction_file(path: &Path) -> Result<ExtractionFile> {
    load_extraction_file_with_key(path, fields::CELESTIAL_OBJECTS)
}

/// Read one extraction document whose object list lives under `objects_key`
pub fn load_extraction_file_with_key(path: &Path, objects_key: &str) -> Result<ExtractionFile> {
    let bulletin_id = bulletin_id_for_path(path)?;
    let file = File::open(path)
        .map_err(|e| Error::io(format!("Failed to open {}", path.display()), e))?;
    let value: serde_json::Value = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        Error::json_parsing(path.display().to_string(), e.to_string(), Some(e))
    })?;
    let document =
        ExtractionDocument::from_value_with_key(value, objects_key, &path.display().to_string())?;

    Ok(ExtractionFile {
        path: path.to_path_buf(),
        bulletin_id,
        document,
    })
}

/// Load an extraction file and pair its entries with the bulletin text
///
/// # Errors
///
/// * `Error::BulletinNotFound` if the corpus has no bulletin for the file's id
/// * `Error::InvalidBulletinId` if the id carries no bulletin number
/// * `Error::JsonParsing` / `Error::UnsupportedShape` for malformed documents
pub fn load_bulletin_entries(
    corpus: &BulletinCorpus,
    path: &Path,
    objects_key: &str,
) -> Result<(Bulletin, Vec<CandidateEntry>)> {
    let extraction = load_extraction_file_with_key(path, objects_key)?;
    bulletin_label(&extraction.bulletin_id)?;

    let bulletin = corpus
        .get(&extraction.bulletin_id)
        .cloned()
        .ok_or_else(|| Error::bulletin_not_found(&extraction.bulletin_id))?;
    let entries = extraction.document.into_entries()?;

    debug!(
        "Loaded {} entries for {} from {}",
        entries.len(),
        bulletin.id,
        path.display()
    );
    Ok((bulletin, entries))
}

// =============================================================================
// Reference Sources
// =============================================================================

/// One known source name for a bulletin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSource {
    pub bulletin_id: String,
    pub name: String,
}

/// Reference source names grouped by bulletin id, in file order
#[derive(Debug, Clone, Default)]
pub struct ReferenceSources {
    by_bulletin: HashMap<String, Vec<String>>,
    total: usize,
}

impl ReferenceSources {
    /// Load the reference source CSV
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::file_not_found(path.display().to_string()));
        }
        let file_name = path.to_string_lossy().to_string();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| Error::csv_parsing(&file_name, "Failed to open CSV file", Some(e)))?;

        let headers = reader
            .headers()
            .map_err(|e| Error::csv_parsing(&file_name, "Failed to read CSV header", Some(e)))?
            .clone();
        let id_column = column_index(&headers, SOURCES_ID_COLUMN, &file_name)?;
        let name_column = column_index(&headers, SOURCES_NAME_COLUMN, &file_name)?;

        let mut sources = Self::default();
        for record in reader.records() {
            let record = record.map_err(|e| {
                Error::csv_parsing(&file_name, "Failed to read CSV record", Some(e))
            })?;
            match (record.get(id_column), record.get(name_column)) {
                (Some(id), Some(name)) if !name.trim().is_empty() => {
                    sources.push(ReferenceSource {
                        bulletin_id: id.trim().to_string(),
                        name: name.to_string(),
                    });
                }
                _ => continue,
            }
        }

        info!(
            "Loaded {} reference source names for {} bulletins",
            sources.total,
            sources.by_bulletin.len()
        );
        Ok(sources)
    }

    pub fn push(&mut self, source: ReferenceSource) {
        self.by_bulletin
            .entry(source.bulletin_id)
            .or_default()
            .push(source.name);
        self.total += 1;
    }

    /// Source names listed for a bulletin
    pub fn names_for(&self, bulletin_id: &str) -> &[String] {
        self.by_bulletin
            .get(bulletin_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

impl FromIterator<ReferenceSource> for ReferenceSources {
    fn from_iter<I: IntoIterator<Item = ReferenceSource>>(iter: I) -> Self {
        let mut sources = Self::default();
        for source in iter {
            sources.push(source);
        }
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_bulletin_csv(dir: &Path) -> PathBuf {
        let path = dir.join("Processed_Atels.csv");
        fs::write(
            &path,
            "atelno,title,body\n\
             ATel #123,Flare,\"BL Lac at 330.68, 42.28\"\n\
             ATel #7,Quiet,\"No positions, reported.\"\n\
             ATel #123,Duplicate,should be ignored\n",
        )
        .unwrap();
        path
    }

    fn write_extraction(dir: &Path, stem: &str, value: serde_json::Value) -> PathBuf {
        let path = dir.join(format!("{stem}.json"));
        fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_load_bulletin_corpus() {
        let temp_dir = TempDir::new().unwrap();
        let corpus = BulletinCorpus::load(&write_bulletin_csv(temp_dir.path())).unwrap();

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get("ATel #123").unwrap().body, "BL Lac at 330.68, 42.28");
        assert_eq!(corpus.get("ATel #7").unwrap().body, "No positions, reported.");
        assert!(corpus.get("ATel #8").is_none());
    }

    #[test]
    fn test_load_bulletin_corpus_missing_column() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.csv");
        fs::write(&path, "id,text\nATel #1,hello\n").unwrap();

        let result = BulletinCorpus::load(&path);
        assert!(matches!(result, Err(Error::CsvParsing { .. })));
    }

    #[test]
    fn test_load_bulletin_corpus_missing_file() {
        let result = BulletinCorpus::load(Path::new("/nonexistent/atels.csv"));
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_discover_extraction_files_sorted_and_filtered() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write_extraction(dir, "ATel-#7", json!({"Celestial Object": []}));
        write_extraction(dir, "ATel-#123", json!({"Celestial Object": []}));
        fs::write(dir.join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.join("nested")).unwrap();
        write_extraction(&dir.join("nested"), "ATel-#9", json!({"Celestial Object": []}));

        let files = discover_extraction_files(dir, "*.json").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["ATel-#123.json", "ATel-#7.json"]);
    }

    #[test]
    fn test_discover_extraction_files_missing_directory() {
        let result = discover_extraction_files(Path::new("/nonexistent/gpt_output"), "*.json");
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_load_bulletin_entries_merges_bulletin_fields() {
        let temp_dir = TempDir::new().unwrap();
        let corpus = BulletinCorpus::load(&write_bulletin_csv(temp_dir.path())).unwrap();
        let path = write_extraction(
            temp_dir.path(),
            "ATel-#123",
            json!({
                "Celestial Object": [
                    {"Name": "BL Lac", "RA": 330.68, "Dec": 42.28, "Telescope": "none"}
                ],
                "Telescope": "LT",
                "Event Type": "flare"
            }),
        );

        let (bulletin, entries) = load_bulletin_entries(&corpus, &path, fields::CELESTIAL_OBJECTS).unwrap();
        assert_eq!(bulletin.id, "ATel #123");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].get("Telescope"), Some(&json!("LT")));
        assert_eq!(entries[0].get("Event Type"), Some(&json!("flare")));
    }

    #[test]
    fn test_load_bulletin_entries_without_bulletin_text() {
        let temp_dir = TempDir::new().unwrap();
        let corpus = BulletinCorpus::load(&write_bulletin_csv(temp_dir.path())).unwrap();
        let path = write_extraction(temp_dir.path(), "ATel-#999", json!({"Celestial Object": []}));

        let result = load_bulletin_entries(&corpus, &path, fields::CELESTIAL_OBJECTS);
        assert!(matches!(result, Err(Error::BulletinNotFound { .. })));
    }

    #[test]
    fn test_load_extraction_file_malformed_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ATel-#5.json");
        fs::write(&path, "{\"Celestial Object\": [").unwrap();

        assert!(matches!(
            load_extraction_file(&path),
            Err(Error::JsonParsing { .. })
        ));
    }

    #[test]
    fn test_reference_sources() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ATEL_SOURCES.csv");
        fs::write(
            &path,
            "ATELNO,Sources\nATel #123,BL Lac\nATel #123,Mrk 421\nATel #7,\nATel #8,Sgr A*\n",
        )
        .unwrap();

        let sources = ReferenceSources::load(&path).unwrap();
        assert_eq!(sources.total(), 3);
        assert_eq!(sources.names_for("ATel #123"), ["BL Lac", "Mrk 421"]);
        assert!(sources.names_for("ATel #7").is_empty());
    }
}
