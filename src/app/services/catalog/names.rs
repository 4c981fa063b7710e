//! Collecting object names to resolve against the reference catalog

use crate::app::services::bulletin_loader::{ExtractionFile, ReferenceSources};
use crate::constants::fields;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::info;

const REPLACEMENT_CHAR: char = '?';

/// Replace every non-ASCII character with `?`
pub fn to_ascii_lossy(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii() { c } else { REPLACEMENT_CHAR })
        .collect()
}

/// Deduplicate names, sorted for reproducible batching
pub fn unique_sorted(names: &[String]) -> Vec<String> {
    names
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Raw and deduplicated name counts for one source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NameCounts {
    pub raw: usize,
    pub unique: usize,
}

/// Names gathered from the extraction documents and the reference source list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameCollection {
    /// Every non-empty object name from the extraction documents, in file order
    pub extracted: Vec<String>,
    /// Reference source names for the bulletins that have an extraction document
    pub reference: Vec<String>,
}

impl NameCollection {
    /// Gather names from `files` and the matching reference sources
    pub fn collect(files: &[ExtractionFile], sources: &ReferenceSources) -> Self {
        let mut collection = Self::default();

        for file in files {
            for record in &file.document.objects {
                if let Some(name) = record
                    .get(fields::NAME)
                    .and_then(|value| value.as_str())
                    .filter(|name| !name.is_empty())
                {
                    collection.extracted.push(to_ascii_lossy(name));
                }
            }

            for name in sources.names_for(&file.bulletin_id) {
                collection.reference.push(to_ascii_lossy(name));
            }
        }

        info!(
            "Collected {} extracted names and {} reference names from {} documents",
            collection.extracted.len(),
            collection.reference.len(),
            files.len()
        );
        collection
    }

    pub fn unique_extracted(&self) -> Vec<String> {
        unique_sorted(&self.extracted)
    }

    pub fn unique_reference(&self) -> Vec<String> {
        unique_sorted(&self.reference)
    }

    pub fn extracted_counts(&self) -> NameCounts {
        NameCounts {
            raw: self.extracted.len(),
            unique: self.unique_extracted().len(),
        }
    }

    pub fn reference_counts(&self) -> NameCounts {
        NameCounts {
            raw: self.reference.len(),
            unique: self.unique_reference().len(),
        }
    }
}
