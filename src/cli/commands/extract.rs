//! Extract command implementation
//!
//! Sends every bulletin of the corpus to the chat-completions endpoint and
//! writes one extraction document per bulletin.

use crate::app::models::Bulletin;
use crate::app::services::bulletin_loader::BulletinCorpus;
use crate::app::services::extraction::{
    ExtractionStats, OpenAiExtractor, extract_all, extraction_output_path,
};
use crate::cli::args::{ExtractArgs, OutputFormat};
use crate::Result;
use colored::*;
use std::path::Path;
use std::time::Instant;
use tracing::info;

use super::shared::{CommandStats, create_progress_bar, load_configuration, setup_logging};

/// Run the extract command
pub async fn run_extract(args: ExtractArgs) -> Result<CommandStats> {
    args.validate()?;
    let config = load_configuration(&args)?;
    setup_logging(&args.common, &config.logging.level)?;

    let start_time = Instant::now();
    info!("Starting ATEL bulletin extraction");
    let extractor = OpenAiExtractor::from_config(&config.extraction)?;
    info!("Using model {}", extractor.model());

    let corpus = BulletinCorpus::load(&config.paths.bulletin_csv)?;
    let bulletins = select_bulletins(
        &corpus,
        &config.paths.extraction_dir,
        args.limit,
        args.skip_existing,
    );
    info!(
        "Extracting {} of {} bulletins into {}",
        bulletins.len(),
        corpus.len(),
        config.paths.extraction_dir.display()
    );

    let pb = create_progress_bar(
        bulletins.len() as u64,
        "Extracting bulletins",
        args.common.show_progress(),
    );
    let extraction = extract_all(&extractor, &bulletins, &config.paths.extraction_dir, Some(&pb)).await?;
    pb.finish_with_message("Extraction complete");

    let stats = CommandStats {
        bulletins_processed: extraction.attempted,
        entries_processed: extraction.written,
        errors_encountered: extraction.failed,
        processing_time: start_time.elapsed(),
        output_files: Vec::new(),
    };

    match args.common.output_format {
        OutputFormat::Human => print_human_report(&extraction, &stats),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "attempted": extraction.attempted,
                "written": extraction.written,
                "failed": extraction.failed,
                "failures": extraction
                    .failures
                    .iter()
                    .map(|(id, message)| serde_json::json!({"bulletin": id, "error": message}))
                    .collect::<Vec<_>>(),
                "processing_time_seconds": stats.processing_time.as_secs_f64(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(stats)
}

/// Bulletins to extract, in corpus order
///
/// With `skip_existing`, bulletins whose document already exists in
/// `output_dir` are left out before `limit` is applied.
pub fn select_bulletins(
    corpus: &BulletinCorpus,
    output_dir: &Path,
    limit: Option<usize>,
    skip_existing: bool,
) -> Vec<Bulletin> {
    corpus
        .iter()
        .filter(|bulletin| !skip_existing || !extraction_output_path(output_dir, bulletin).exists())
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

fn print_human_report(extraction: &ExtractionStats, stats: &CommandStats) {
    println!("\n{}", "Extraction Summary".bright_green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "   • Documents written: {}",
        extraction.written.to_string().bright_white().bold()
    );
    println!("   • Success rate: {:.1}%", extraction.success_rate());
    if extraction.failed > 0 {
        println!(
            "   • Failed: {}",
            extraction.failed.to_string().bright_red().bold()
        );
        for (bulletin_id, message) in extraction.failures.iter().take(10) {
            println!("     - {}: {}", bulletin_id, message);
        }
    }
    println!(
        "   • Processing time: {:.2}s",
        stats.processing_time.as_secs_f64()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn corpus() -> BulletinCorpus {
        (1..=4)
            .map(|n| Bulletin::new(format!("ATel #{}", n), "text"))
            .collect()
    }

    #[test]
    fn test_select_bulletins_limit() {
        let temp_dir = TempDir::new().unwrap();
        let selected = select_bulletins(&corpus(), temp_dir.path(), Some(2), false);
        let ids: Vec<&str> = selected.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["ATel #1", "ATel #2"]);
    }

    #[test]
    fn test_select_bulletins_skips_existing() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("ATel-#1.json"), "{}").unwrap();
        std::fs::write(temp_dir.path().join("ATel-#3.json"), "{}").unwrap();

        let selected = select_bulletins(&corpus(), temp_dir.path(), None, true);
        let ids: Vec<&str> = selected.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["ATel #2", "ATel #4"]);

        let selected = select_bulletins(&corpus(), temp_dir.path(), Some(1), true);
        assert_eq!(selected[0].id, "ATel #2");
    }
}
