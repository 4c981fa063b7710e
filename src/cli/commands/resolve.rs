//! Resolve command implementation
//!
//! Collects object names from the extraction documents and the reference source
//! list, reports raw and unique counts, and resolves both lists against SIMBAD.

use crate::app::services::bulletin_loader::{
    ExtractionFile, ReferenceSources, discover_extraction_files, load_extraction_file_with_key,
};
use crate::app::services::catalog::{
    CatalogResolver, CatalogRow, NameCollection, NameCounts, SimbadTapClient, resolve_all,
    write_catalog_csv,
};
use crate::cli::args::{OutputFormat, ResolveArgs};
use crate::config::{CatalogConfig, Config};
use crate::constants::{EXTRACTED_CATALOG_OUTPUT_FILENAME, REFERENCE_CATALOG_OUTPUT_FILENAME};
use crate::Result;
use colored::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use super::shared::{
    CommandStats, create_progress_bar, is_critical_error, load_configuration, setup_logging,
};

/// Catalog rows for one name list
#[derive(Debug, Clone)]
pub struct ResolvedNames {
    pub rows: Vec<CatalogRow>,
    pub output: PathBuf,
}

impl ResolvedNames {
    pub fn resolved_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_resolved()).count()
    }
}

/// Run the resolve command
pub async fn run_resolve(args: ResolveArgs) -> Result<CommandStats> {
    args.validate()?;
    let config = load_configuration(&args)?;
    setup_logging(&args.common, &config.logging.level)?;

    let start_time = Instant::now();
    info!("Starting SIMBAD name resolution");
    let mut stats = CommandStats::new();

    let files = load_documents(&config, &mut stats)?;
    let sources = ReferenceSources::load(&config.paths.sources_csv)?;
    let collection = NameCollection::collect(&files, &sources);
    stats.bulletins_processed = files.len();

    let extracted_counts = collection.extracted_counts();
    let reference_counts = collection.reference_counts();

    if args.dry_run {
        stats.processing_time = start_time.elapsed();
        print_counts(extracted_counts, reference_counts, args.common.output_format)?;
        return Ok(stats);
    }

    config.ensure_output_directory()?;
    let client = SimbadTapClient::from_config(&config.catalog)?;

    let reference = resolve_to_file(
        &client,
        &config.catalog,
        collection.unique_reference(),
        config.paths.output_dir.join(REFERENCE_CATALOG_OUTPUT_FILENAME),
        "Resolving reference names",
        args.common.show_progress(),
    )
    .await?;
    let extracted = resolve_to_file(
        &client,
        &config.catalog,
        collection.unique_extracted(),
        config.paths.output_dir.join(EXTRACTED_CATALOG_OUTPUT_FILENAME),
        "Resolving extracted names",
        args.common.show_progress(),
    )
    .await?;

    stats.entries_processed = reference.rows.len() + extracted.rows.len();
    stats.add_output_file(&reference.output);
    stats.add_output_file(&extracted.output);
    stats.processing_time = start_time.elapsed();

    match args.common.output_format {
        OutputFormat::Human => {
            print_counts(extracted_counts, reference_counts, OutputFormat::Human)?;
            print_resolution("Reference", &reference);
            print_resolution("Extracted", &extracted);
            println!(
                "   Processing time: {:.2}s\n",
                stats.processing_time.as_secs_f64()
            );
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "extracted": {
                    "counts": extracted_counts,
                    "resolved": extracted.resolved_count(),
                    "output": extracted.output,
                },
                "reference": {
                    "counts": reference_counts,
                    "resolved": reference.resolved_count(),
                    "output": reference.output,
                },
                "processing_time_seconds": stats.processing_time.as_secs_f64(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(stats)
}

/// Load every extraction document, skipping the ones that fail to parse
fn load_documents(config: &Config, stats: &mut CommandStats) -> Result<Vec<ExtractionFile>> {
    let paths = discover_extraction_files(
        &config.paths.extraction_dir,
        &config.classification.file_pattern,
    )?;

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        match load_extraction_file_with_key(path, &config.classification.objects_key) {
            Ok(file) => files.push(file),
            Err(e) if is_critical_error(&e) => return Err(e),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                stats.errors_encountered += 1;
            }
        }
    }
    Ok(files)
}

/// Resolve `names` and write the rows as CSV to `output`
pub async fn resolve_to_file<R: CatalogResolver>(
    resolver: &R,
    catalog: &CatalogConfig,
    names: Vec<String>,
    output: PathBuf,
    message: &str,
    show_progress: bool,
) -> Result<ResolvedNames> {
    let pb = create_progress_bar(names.len() as u64, message, show_progress);
    let rows = resolve_all(
        resolver,
        &names,
        catalog.batch_size,
        catalog.concurrency,
        Some(&pb),
    )
    .await?;
    pb.finish_and_clear();

    write_catalog_csv(&output, &rows)?;
    info!("Wrote {} catalog rows to {}", rows.len(), output.display());
    Ok(ResolvedNames { rows, output })
}

fn print_counts(extracted: NameCounts, reference: NameCounts, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            println!("\n{}", "Object Names".bright_green().bold());
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!(
                "   • Extracted: {} ({} unique)",
                extracted.raw,
                extracted.unique.to_string().bright_white().bold()
            );
            println!(
                "   • Reference: {} ({} unique)",
                reference.raw,
                reference.unique.to_string().bright_white().bold()
            );
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "extracted": extracted,
                "reference": reference,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_resolution(kind: &str, resolved: &ResolvedNames) {
    println!(
        "   • {} names resolved: {}/{} -> {}",
        kind,
        resolved.resolved_count().to_string().bright_white().bold(),
        resolved.rows.len(),
        resolved.output.display()
    );
}
