//! Reference catalog name resolution
//!
//! Object names from the extraction documents, and the curated source names for the
//! same bulletins, are deduplicated and looked up in SIMBAD so extracted names can be
//! compared against catalogued identifiers and object types.
//!
//! - [`names`] - Name collection, ASCII folding and deduplication
//! - [`simbad`] - The [`CatalogResolver`] seam, the TAP client and CSV output

pub mod names;
pub mod simbad;

pub use names::{NameCollection, NameCounts, to_ascii_lossy, unique_sorted};
pub use simbad::{
    CatalogResolver, CatalogRow, SimbadTapClient, build_query, resolve_all, write_catalog_csv,
};
