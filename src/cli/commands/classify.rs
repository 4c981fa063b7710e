//! Classify command implementation
//!
//! Loads the bulletin corpus and extraction documents, classifies every entry on
//! a pool of blocking workers and reports (and optionally writes) the partitions.

use crate::app::models::{Bulletin, CandidateEntry, ClassificationLabel};
use crate::app::services::batch_reporter::{
    AggregateReport, ReportSummary, merge_reports, run_with_progress, write_report,
};
use crate::app::services::bulletin_loader::{
    BulletinCorpus, discover_extraction_files, load_bulletin_entries,
};
use crate::cli::args::{ClassifyArgs, OutputFormat};
use crate::config::Config;
use crate::{Error, Result};
use colored::*;
use futures::future::try_join_all;
use indicatif::ProgressBar;
use std::time::Instant;
use tracing::{error, info, warn};

use super::shared::{
    CommandStats, create_progress_bar, is_critical_error, load_configuration, setup_logging,
};

type BulletinInput = (Bulletin, Vec<CandidateEntry>);

/// Run the classify command
pub async fn run_classify(args: ClassifyArgs) -> Result<CommandStats> {
    args.validate()?;
    let config = load_configuration(&args)?;
    setup_logging(&args.common, &config.logging.level)?;

    let start_time = Instant::now();
    info!("Starting ATEL coordinate classification");
    let mut stats = CommandStats::new();

    let inputs = load_inputs(&config, args.skip_malformed, &mut stats)?;
    let entry_count: usize = inputs.iter().map(|(_, entries)| entries.len()).sum();

    if args.dry_run {
        stats.bulletins_processed = inputs.len();
        stats.entries_processed = entry_count;
        stats.processing_time = start_time.elapsed();
        print_dry_run(&config, &stats, args.common.output_format);
        return Ok(stats);
    }

    let workers = config
        .classification
        .parallel_workers
        .min(num_cpus::get().max(1));
    let pb = create_progress_bar(
        inputs.len() as u64,
        "Classifying bulletins",
        args.common.show_progress(),
    );
    let report = classify_parallel(inputs, workers, &pb).await?;
    pb.finish_with_message("Classification complete");

    stats.bulletins_processed = report.bulletin_count();
    stats.entries_processed = report.counts.total;

    if args.write {
        config.ensure_output_directory()?;
        let files = write_report(&report, &config.paths.output_dir)?;
        for path in files.all() {
            stats.add_output_file(path);
        }
    }

    stats.processing_time = start_time.elapsed();
    match args.common.output_format {
        OutputFormat::Human => print_human_report(&report, &stats),
        OutputFormat::Json => print_json_report(&report, &stats)?,
    }

    Ok(stats)
}

/// Load every extraction document and pair it with its bulletin text
///
/// Documents that fail to load are logged and counted unless the error is
/// critical. An unsupported coordinate shape aborts the load unless
/// `skip_malformed` is set.
fn load_inputs(
    config: &Config,
    skip_malformed: bool,
    stats: &mut CommandStats,
) -> Result<Vec<BulletinInput>> {
    let corpus = BulletinCorpus::load(&config.paths.bulletin_csv)?;
    let files = discover_extraction_files(
        &config.paths.extraction_dir,
        &config.classification.file_pattern,
    )?;
    info!(
        "Found {} extraction documents for {} bulletins",
        files.len(),
        corpus.len()
    );

    let mut inputs = Vec::with_capacity(files.len());
    for path in &files {
        match load_bulletin_entries(&corpus, path, &config.classification.objects_key) {
            Ok(input) => inputs.push(input),
            Err(e @ Error::UnsupportedShape { .. }) if skip_malformed => {
                warn!("Skipping malformed {}: {}", path.display(), e);
                stats.errors_encountered += 1;
            }
            Err(e) if is_critical_error(&e) => {
                error!("Failed to load {}: {}", path.display(), e);
                return Err(e);
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                stats.errors_encountered += 1;
            }
        }
    }

    Ok(inputs)
}

/// Classify contiguous chunks on blocking workers and merge them in chunk order
///
/// The merged report equals the report of a sequential run over `inputs`.
pub async fn classify_parallel(
    inputs: Vec<BulletinInput>,
    workers: usize,
    progress: &ProgressBar,
) -> Result<AggregateReport> {
    if inputs.is_empty() {
        return Ok(AggregateReport::new());
    }

    let chunk_size = inputs.len().div_ceil(workers.max(1));
    info!(
        "Classifying {} bulletins on {} workers ({} per chunk)",
        inputs.len(),
        workers,
        chunk_size
    );

    let mut remaining = inputs;
    let mut handles = Vec::new();
    while !remaining.is_empty() {
        let rest = remaining.split_off(chunk_size.min(remaining.len()));
        let chunk = std::mem::replace(&mut remaining, rest);
        let pb = progress.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            run_with_progress(chunk, Some(&pb))
        }));
    }

    let partials = try_join_all(handles)
        .await
        .map_err(|e| Error::processing_interrupted(format!("Classification worker failed: {}", e)))?
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    Ok(merge_reports(partials))
}

fn print_dry_run(config: &Config, stats: &CommandStats, format: OutputFormat) {
    match format {
        OutputFormat::Human => {
            println!("\n{}", "Dry Run".bright_yellow().bold());
            println!("   • Bulletin CSV: {}", config.paths.bulletin_csv.display());
            println!(
                "   • Extraction directory: {}",
                config.paths.extraction_dir.display()
            );
            println!(
                "   • Bulletins ready: {}",
                stats.bulletins_processed.to_string().bright_white().bold()
            );
            println!(
                "   • Entries ready: {}",
                stats.entries_processed.to_string().bright_white().bold()
            );
            if stats.errors_encountered > 0 {
                println!(
                    "   • Documents skipped: {}",
                    stats.errors_encountered.to_string().bright_red().bold()
                );
            }
            println!();
        }
        OutputFormat::Json => {
            let plan = serde_json::json!({
                "dry_run": true,
                "bulletin_csv": config.paths.bulletin_csv,
                "extraction_dir": config.paths.extraction_dir,
                "bulletins": stats.bulletins_processed,
                "entries": stats.entries_processed,
                "skipped": stats.errors_encountered,
            });
            println!("{}", plan);
        }
    }
}

fn print_human_report(report: &AggregateReport, stats: &CommandStats) {
    let counts = &report.counts;

    println!("\n{}", "Classification Summary".bright_green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "   • Bulletins classified: {}",
        report.bulletin_count().to_string().bright_white().bold()
    );
    println!(
        "   • Entries: {}",
        counts.total.to_string().bright_white().bold()
    );
    println!(
        "   • {}: {} ({:.1}%)",
        ClassificationLabel::Good.as_str().green(),
        counts.good,
        counts.good_rate()
    );
    println!(
        "   • {}: {}",
        ClassificationLabel::Bad.as_str().red(),
        counts.bad
    );
    println!(
        "   • {}: {}",
        ClassificationLabel::Null.as_str().yellow(),
        counts.null
    );

    if !report.outcomes.is_empty() {
        println!("\n{}", "Evidence outcomes:".bright_white());
        for (outcome, count) in &report.outcomes {
            println!("   • {}: {}", outcome.as_str(), count);
        }
    }

    if stats.errors_encountered > 0 {
        println!(
            "\n⚠️  Documents skipped: {}",
            stats.errors_encountered.to_string().bright_red().bold()
        );
    }

    if !stats.output_files.is_empty() {
        println!("\n📁 Output Files:");
        for (path, size) in &stats.output_files {
            println!("   • {}: {}", path, CommandStats::format_size(*size));
        }
    }

    println!(
        "\n   Processing time: {:.2}s",
        stats.processing_time.as_secs_f64()
    );
    println!();
}

fn print_json_report(report: &AggregateReport, stats: &CommandStats) -> Result<()> {
    let summary = ReportSummary::from_report(report)?;
    let output = serde_json::json!({
        "summary": summary,
        "skipped": stats.errors_encountered,
        "processing_time_seconds": stats.processing_time.as_secs_f64(),
        "output_files": stats
            .output_files
            .iter()
            .map(|(path, size)| serde_json::json!({"path": path, "size_bytes": size}))
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
