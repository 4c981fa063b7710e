//! Application constants for ATEL processor
//!
//! This module contains file layouts, field names, endpoint defaults and the
//! classification heuristics' fixed parameters used throughout the application.

// =============================================================================
// Bulletin Corpus Layout
// =============================================================================

/// Column holding the bulletin identifier (e.g. "ATel #12345") in the bulletin CSV
pub const BULLETIN_ID_COLUMN: &str = "atelno";

/// Column holding the raw bulletin text in the bulletin CSV
pub const BULLETIN_BODY_COLUMN: &str = "body";

/// Default bulletin CSV filename
pub const DEFAULT_BULLETIN_CSV: &str = "Processed_Atels.csv";

/// Reference source list columns (regex-mined names per bulletin)
pub const SOURCES_ID_COLUMN: &str = "ATELNO";
pub const SOURCES_NAME_COLUMN: &str = "Sources";

/// Default reference source list filename
pub const DEFAULT_SOURCES_CSV: &str = "ATEL_SOURCES.csv";

/// Extraction documents are named after the bulletin id with this file pattern
pub const EXTRACTION_FILE_PATTERN: &str = "*.json";

/// Extension of extraction documents
pub const EXTRACTION_FILE_EXTENSION: &str = "json";

/// Prefix of the zero-padded bulletin label used in partition outputs
pub const BULLETIN_LABEL_PREFIX: &str = "ATEL";

// =============================================================================
// Extraction Document Fields
// =============================================================================

/// Field names used in extraction documents
pub mod fields {
    /// Top-level key holding the per-object records
    pub const CELESTIAL_OBJECTS: &str = "Celestial Object";

    pub const NAME: &str = "Name";
    pub const RA: &str = "RA";
    pub const DEC: &str = "Dec";
    pub const REDSHIFT: &str = "redshift";
    pub const TYPE: &str = "Type";
    pub const TIME: &str = "Time";
    pub const DATE: &str = "Date";

    // Bulletin-level fields merged into every object record
    pub const REFERENCES: &str = "References";
    pub const EVENT_TYPE: &str = "Event Type";
    pub const TELESCOPE: &str = "Telescope";
    pub const INSTRUMENT: &str = "Instrument";
    pub const OBSERVATORY: &str = "Observatory";

    /// Bulletin-level fields requested from the extractor
    pub const BULLETIN_LEVEL: &[&str] = &[
        REFERENCES,
        EVENT_TYPE,
        TIME,
        DATE,
        TELESCOPE,
        INSTRUMENT,
        OBSERVATORY,
    ];
}

// =============================================================================
// Classification Heuristics
// =============================================================================

/// Fixed parameters of the textual evidence rules
pub mod evidence {
    /// RA strings starting with this character are compact J2000 designations
    pub const J2000_PREFIX: char = 'J';

    /// RA and Dec sharing this many leading characters indicates a mis-parse
    pub const MIRRORED_PREFIX_LEN: usize = 5;

    /// Leading characters of RA and Dec that must appear in the bulletin text
    pub const TEXT_PREFIX_LEN: usize = 3;
}

// =============================================================================
// Output Files
// =============================================================================

/// Partition output filenames
pub const GOOD_OUTPUT_FILENAME: &str = "ATEL_good.json";
pub const BAD_OUTPUT_FILENAME: &str = "ATEL_bad.json";
pub const NULL_OUTPUT_FILENAME: &str = "ATEL_null.json";

/// Summary counts output filename
pub const SUMMARY_OUTPUT_FILENAME: &str = "ATEL_summary.json";

/// Catalog resolution output filenames
pub const REFERENCE_CATALOG_OUTPUT_FILENAME: &str = "reference_sources_simbad.csv";
pub const EXTRACTED_CATALOG_OUTPUT_FILENAME: &str = "extracted_sources_simbad.csv";

// =============================================================================
// External Services
// =============================================================================

/// OpenAI-compatible chat completions endpoint
pub const DEFAULT_EXTRACTION_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Model used for structured extraction
pub const DEFAULT_EXTRACTION_MODEL: &str = "gpt-4o";

/// Environment variable holding the extraction API key
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// System message sent with every extraction request
pub const EXTRACTION_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

/// SIMBAD TAP synchronous query endpoint
pub const DEFAULT_SIMBAD_TAP_ENDPOINT: &str = "https://simbad.cds.unistra.fr/simbad/sim-tap/sync";

/// Names per SIMBAD query (the ADQL IN-list grows with each name)
pub const DEFAULT_CATALOG_BATCH_SIZE: usize = 500;

/// Concurrent SIMBAD queries in flight
pub const DEFAULT_CATALOG_CONCURRENCY: usize = 2;

/// Request timeout for external services in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// Processing Configuration Defaults
// =============================================================================

/// Default number of parallel classification workers
pub const DEFAULT_PARALLEL_WORKERS: usize = 4;

/// Log a progress line every this many bulletins
pub const PROGRESS_LOG_INTERVAL: usize = 100;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "ATEL_PROCESSOR_";

/// Application directory name under the user config directory
pub const CONFIG_DIR_NAME: &str = "atel-processor";

/// Configuration filename
pub const CONFIG_FILENAME: &str = "config.json";
