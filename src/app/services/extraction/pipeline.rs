//! Running an extractor over the bulletin corpus and writing its documents

use crate::app::models::Bulletin;
use crate::app::services::batch_reporter::persistence::write_json;
use crate::constants::{EXTRACTION_FILE_EXTENSION, PROGRESS_LOG_INTERVAL};
use crate::{Error, Result};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::client::Extractor;

/// Outcome counts for an extraction run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionStats {
    pub attempted: usize,
    pub written: usize,
    pub failed: usize,
    /// Bulletin ids whose extraction failed, with the reason
    pub failures: Vec<(String, String)>,
}

impl ExtractionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_failure(&mut self, bulletin_id: &str, message: String) {
        self.failed += 1;
        self.failures.push((bulletin_id.to_string(), message));
    }

    /// Calculate success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            100.0
        } else {
            (self.written as f64 / self.attempted as f64) * 100.0
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Extraction Summary: {} bulletins | {} written | {} failed ({:.1}% success)",
            self.attempted,
            self.written,
            self.failed,
            self.success_rate()
        )
    }
}

/// Path of the extraction document for `bulletin` under `output_dir`
pub fn extraction_output_path(output_dir: &Path, bulletin: &Bulletin) -> PathBuf {
    output_dir.join(format!(
        "{}.{}",
        bulletin.file_stem(),
        EXTRACTION_FILE_EXTENSION
    ))
}

/// Extract one bulletin and write its document
pub async fn extract_to_file<E: Extractor>(
    extractor: &E,
    bulletin: &Bulletin,
    output_dir: &Path,
) -> Result<PathBuf> {
    let document = extractor.extract(bulletin).await?;
    let path = extraction_output_path(output_dir, bulletin);
    write_json(&path, &document.to_value())?;
    Ok(path)
}

/// Extract every bulletin in order, skipping failures
///
/// Configuration errors abort the run, since every later request would fail the
/// same way. Any other per-bulletin error is logged and counted.
pub async fn extract_all<E: Extractor>(
    extractor: &E,
    bulletins: &[Bulletin],
    output_dir: &Path,
    progress: Option<&ProgressBar>,
) -> Result<ExtractionStats> {
    std::fs::create_dir_all(output_dir).map_err(|e| {
        Error::io(
            format!("Failed to create output directory {}", output_dir.display()),
            e,
        )
    })?;

    let mut stats = ExtractionStats::new();
    for (i, bulletin) in bulletins.iter().enumerate() {
        stats.attempted += 1;
        match extract_to_file(extractor, bulletin, output_dir).await {
            Ok(_) => stats.written += 1,
            Err(e @ Error::Configuration { .. }) => return Err(e),
            Err(e) => {
                warn!("Failed to extract {}: {}", bulletin.id, e);
                stats.add_failure(&bulletin.id, e.to_string());
            }
        }

        if let Some(pb) = progress {
            pb.inc(1);
        }
        if i % PROGRESS_LOG_INTERVAL == 0 {
            info!("Processed {} out of {} bulletins", i, bulletins.len());
        }
    }

    info!("{}", stats.summary());
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::extraction::FixedResponseExtractor;
    use tempfile::TempDir;

    const RESPONSE: &str = r#"```json
{"Celestial Object": [{"Name": "BL Lac", "RA": 330.68, "Dec": 42.28}], "Telescope": "LT"}
```"#;

    #[test]
    fn test_extraction_output_path_uses_hyphenated_id() {
        let bulletin = Bulletin::new("ATel #16543", "");
        assert_eq!(
            extraction_output_path(Path::new("/out"), &bulletin),
            PathBuf::from("/out/ATel-#16543.json")
        );
    }

    #[tokio::test]
    async fn test_extract_to_file_writes_document() {
        let temp_dir = TempDir::new().unwrap();
        let extractor = FixedResponseExtractor::new(RESPONSE);
        let bulletin = Bulletin::new("ATel #123", "BL Lac");

        let path = extract_to_file(&extractor, &bulletin, temp_dir.path())
            .await
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["Telescope"], "LT");
        assert_eq!(written["Celestial Object"][0]["Name"], "BL Lac");
    }

    #[tokio::test]
    async fn test_extract_all_counts_failures() {
        let temp_dir = TempDir::new().unwrap();
        let extractor = FixedResponseExtractor::new("not json at all");
        let bulletins = vec![Bulletin::new("ATel #1", "a"), Bulletin::new("ATel #2", "b")];

        let stats = extract_all(&extractor, &bulletins, temp_dir.path(), None)
            .await
            .unwrap();

        assert_eq!(stats.attempted, 2);
        assert_eq!(stats.written, 0);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.failures[0].0, "ATel #1");
    }

    #[tokio::test]
    async fn test_extract_all_success() {
        let temp_dir = TempDir::new().unwrap();
        let extractor = FixedResponseExtractor::new(RESPONSE);
        let bulletins = vec![Bulletin::new("ATel #1", "a"), Bulletin::new("ATel #2", "b")];

        let stats = extract_all(&extractor, &bulletins, temp_dir.path(), None)
            .await
            .unwrap();

        assert_eq!(stats.written, 2);
        assert_eq!(stats.success_rate(), 100.0);
        assert!(temp_dir.path().join("ATel-#2.json").exists());
    }
}
