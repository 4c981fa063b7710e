//! SIMBAD TAP name resolution
//!
//! Names are sent in batches as ADQL `IN` lists to the synchronous TAP endpoint
//! with CSV output. Every queried name appears in the result: names SIMBAD does
//! not know get a row with empty catalog columns.

use crate::config::CatalogConfig;
use crate::{Error, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// One resolved (or unresolved) name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    /// SIMBAD main identifier, empty when unresolved
    pub main_id: String,
    /// Matching identifier as stored by SIMBAD, empty when unresolved
    pub id: String,
    /// Pipe-separated object types, empty when unknown
    pub otypes: String,
    /// Name that was queried
    pub queried_name: String,
}

impl CatalogRow {
    pub fn unresolved(queried_name: impl Into<String>) -> Self {
        Self {
            queried_name: queried_name.into(),
            ..Self::default()
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.main_id.is_empty()
    }
}

/// Row as returned by the TAP query
#[derive(Debug, Clone, Deserialize)]
struct TapRow {
    main_id: String,
    id: String,
    #[serde(default)]
    otypes: Option<String>,
}

/// Resolves batches of names against a reference catalog
pub trait CatalogResolver {
    /// Resolve one batch, returning rows in the order of `names`
    fn resolve_batch(&self, names: &[String]) -> impl Future<Output = Result<Vec<CatalogRow>>> + Send;
}

/// Build the ADQL query for one batch of names
pub fn build_query(names: &[String]) -> String {
    let quoted = names
        .iter()
        .map(|name| format!("'{}'", name.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT basic.\"main_id\", ident.\"id\", alltypes.\"otypes\" \
         FROM ident \
         JOIN basic ON basic.\"oid\" = ident.\"oidref\" \
         LEFT JOIN alltypes ON basic.\"oid\" = alltypes.\"oidref\" \
         WHERE ident.\"id\" IN ({})",
        quoted
    )
}

/// Decode a TAP CSV response
fn parse_tap_csv(body: &str) -> Result<Vec<TapRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<TapRow>, _>>()
        .map_err(|e| Error::csv_parsing("SIMBAD TAP response", "Malformed result row", Some(e)))
}

/// Attach TAP rows to the names that were queried, keeping unmatched names
fn left_join(names: &[String], rows: Vec<TapRow>) -> Vec<CatalogRow> {
    let mut joined = Vec::with_capacity(names.len().max(rows.len()));

    for name in names {
        let matches: Vec<_> = rows.iter().filter(|row| &row.id == name).collect();
        if matches.is_empty() {
            joined.push(CatalogRow::unresolved(name));
            continue;
        }
        for row in matches {
            joined.push(CatalogRow {
                main_id: row.main_id.clone(),
                id: row.id.clone(),
                otypes: row.otypes.clone().unwrap_or_default(),
                queried_name: name.clone(),
            });
        }
    }

    joined
}

/// SIMBAD synchronous TAP client
#[derive(Debug, Clone)]
pub struct SimbadTapClient {
    client: reqwest::Client,
    endpoint: String,
}

impl SimbadTapClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        Self::new(&config.tap_endpoint, Duration::from_secs(config.timeout_secs))
    }
}

impl CatalogResolver for SimbadTapClient {
    async fn resolve_batch(&self, names: &[String]) -> Result<Vec<CatalogRow>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let query = build_query(names);
        debug!("Querying SIMBAD for {} names", names.len());

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[
                ("REQUEST", "doQuery"),
                ("LANG", "ADQL"),
                ("FORMAT", "csv"),
                ("QUERY", query.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::catalog(format!(
                "TAP endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        Ok(left_join(names, parse_tap_csv(&body)?))
    }
}

/// Resolve `names` in batches of `batch_size`, keeping input order
///
/// Up to `concurrency` batches are in flight at once. The first failing batch
/// fails the whole run.
pub async fn resolve_all<R: CatalogResolver>(
    resolver: &R,
    names: &[String],
    batch_size: usize,
    concurrency: usize,
    progress: Option<&ProgressBar>,
) -> Result<Vec<CatalogRow>> {
    if batch_size == 0 {
        return Err(Error::configuration("catalog batch size must be greater than 0"));
    }

    let batches: Vec<Vec<CatalogRow>> = stream::iter(names.chunks(batch_size))
        .map(|chunk| async move {
            let rows = resolver.resolve_batch(chunk).await?;
            if let Some(pb) = progress {
                pb.inc(chunk.len() as u64);
            }
            Ok::<_, Error>(rows)
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let rows: Vec<CatalogRow> = batches.into_iter().flatten().collect();
    info!(
        "Resolved {} of {} names",
        rows.iter().filter(|row| row.is_resolved()).count(),
        names.len()
    );
    Ok(rows)
}

/// Write catalog rows as CSV with a `main_id,id,otypes,queried_name` header
pub fn write_catalog_csv(path: &Path, rows: &[CatalogRow]) -> Result<()> {
    let file_name = path.to_string_lossy().to_string();
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| Error::csv_parsing(&file_name, "Failed to create CSV file", Some(e)))?;

    if rows.is_empty() {
        writer
            .write_record(["main_id", "id", "otypes", "queried_name"])
            .map_err(|e| Error::csv_parsing(&file_name, "Failed to write CSV header", Some(e)))?;
    }
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| Error::csv_parsing(&file_name, "Failed to write CSV row", Some(e)))?;
    }

    writer
        .flush()
        .map_err(|e| Error::io(format!("Failed to write {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Resolver backed by a fixed name table, recording the batches it saw
    struct TableResolver {
        table: HashMap<String, (String, String)>,
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl TableResolver {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(name, main_id, otypes)| {
                        (name.to_string(), (main_id.to_string(), otypes.to_string()))
                    })
                    .collect(),
                batches: Mutex::new(Vec::new()),
            }
        }
    }

    impl CatalogResolver for TableResolver {
        async fn resolve_batch(&self, names: &[String]) -> Result<Vec<CatalogRow>> {
            self.batches.lock().unwrap().push(names.to_vec());
            Ok(names
                .iter()
                .map(|name| match self.table.get(name) {
                    Some((main_id, otypes)) => CatalogRow {
                        main_id: main_id.clone(),
                        id: name.clone(),
                        otypes: otypes.clone(),
                        queried_name: name.clone(),
                    },
                    None => CatalogRow::unresolved(name),
                })
                .collect())
        }
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_query_escapes_quotes() {
        let query = build_query(&names(&["BL Lac", "Barnard's Star"]));
        assert!(query.contains("WHERE ident.\"id\" IN ('BL Lac', 'Barnard''s Star')"));
        assert!(query.starts_with("SELECT basic.\"main_id\", ident.\"id\", alltypes.\"otypes\""));
        assert!(query.contains("LEFT JOIN alltypes"));
    }

    #[test]
    fn test_parse_tap_csv_and_left_join() {
        let body = "main_id,id,otypes\n\
                    \"BL Lac\",\"BL Lac\",\"BLL|QSO|*\"\n\
                    \"M  31\",\"M 31\",\n";
        let rows = parse_tap_csv(body).unwrap();
        assert_eq!(rows.len(), 2);

        let joined = left_join(&names(&["M 31", "nothing", "BL Lac"]), rows);
        assert_eq!(joined.len(), 3);
        assert_eq!(joined[0].main_id, "M  31");
        assert_eq!(joined[0].otypes, "");
        assert_eq!(joined[1], CatalogRow::unresolved("nothing"));
        assert_eq!(joined[2].otypes, "BLL|QSO|*");
        assert_eq!(joined[2].queried_name, "BL Lac");
    }

    #[test]
    fn test_left_join_keeps_multiple_matches() {
        let body = "main_id,id,otypes\nA,X,t1\nB,X,t2\n";
        let joined = left_join(&names(&["X"]), parse_tap_csv(body).unwrap());
        assert_eq!(joined.len(), 2);
        assert!(joined.iter().all(|row| row.queried_name == "X"));
    }

    #[tokio::test]
    async fn test_resolve_all_batches_in_order() {
        let resolver = TableResolver::new(&[("BL Lac", "BL Lac", "BLL"), ("Sgr A*", "Sgr A*", "X")]);
        let queried = names(&["BL Lac", "ghost", "Sgr A*", "other", "last"]);

        let rows = resolve_all(&resolver, &queried, 2, 2, None).await.unwrap();

        let order: Vec<_> = rows.iter().map(|r| r.queried_name.as_str()).collect();
        assert_eq!(order, vec!["BL Lac", "ghost", "Sgr A*", "other", "last"]);
        assert_eq!(rows.iter().filter(|r| r.is_resolved()).count(), 2);

        let batch_sizes: Vec<_> = resolver.batches.lock().unwrap().iter().map(Vec::len).collect();
        let mut sorted = batch_sizes.clone();
        sorted.sort();
        assert_eq!(sorted, vec![1, 2, 2]);
    }

    #[tokio::test]
    async fn test_resolve_all_rejects_zero_batch_size() {
        let resolver = TableResolver::new(&[]);
        let result = resolve_all(&resolver, &names(&["a"]), 0, 1, None).await;
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_write_catalog_csv() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");
        let rows = vec![
            CatalogRow {
                main_id: "BL Lac".to_string(),
                id: "BL Lac".to_string(),
                otypes: "BLL|QSO".to_string(),
                queried_name: "BL Lac".to_string(),
            },
            CatalogRow::unresolved("ghost"),
        ];

        write_catalog_csv(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "main_id,id,otypes,queried_name\nBL Lac,BL Lac,BLL|QSO,BL Lac\n,,,ghost\n"
        );
    }

    #[test]
    fn test_write_catalog_csv_empty_has_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.csv");
        write_catalog_csv(&path, &[]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "main_id,id,otypes,queried_name\n"
        );
    }
}
