//! Normalize command implementation
//!
//! Converts a single RA/Dec pair, or every numeric and textual entry of a
//! partition file, to decimal degrees. With `--output` the partition is
//! written back with RA/Dec replaced by degrees.

use crate::app::models::{CandidateEntry, CoordinatePair};
use crate::app::services::batch_reporter::{BulletinGroup, read_groups, write_groups};
use crate::app::services::coordinate_normalizer::{
    NormalizedCoordinates, normalize, normalize_entry,
};
use crate::cli::args::{NormalizeArgs, OutputFormat};
use crate::constants::fields;
use crate::{Error, Result};
use colored::*;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::shared::{CommandStats, load_configuration, setup_logging};

/// One normalized entry of a partition file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEntry {
    /// Bulletin label of the group (e.g. `ATEL00123`)
    pub bulletin: String,
    pub name: Option<String>,
    #[serde(flatten)]
    pub coordinates: NormalizedCoordinates,
}

/// Run the normalize command
pub async fn run_normalize(args: NormalizeArgs) -> Result<CommandStats> {
    args.validate()?;
    let config = load_configuration(&args)?;
    setup_logging(&args.common, &config.logging.level)?;

    let start_time = Instant::now();
    let mut stats = CommandStats::new();

    match (&args.ra, &args.dec, &args.input) {
        (Some(ra), Some(dec), _) => {
            let coordinates = normalize(ra, dec)?;
            stats.entries_processed = 1;
            print_pair(ra, dec, &coordinates, args.common.output_format)?;
        }
        (_, _, Some(input)) => {
            info!("Normalizing entries from {}", input.display());
            let groups = read_groups(input)?;
            let (normalized, skipped) = normalize_groups(&groups);

            stats.bulletins_processed = groups.len();
            stats.entries_processed = normalized.len();
            stats.errors_encountered = skipped;
            print_entries(&normalized, skipped, args.common.output_format)?;

            if let Some(output) = &args.output {
                let (converted, _) = convert_groups(&groups)?;
                write_groups(output, &converted)?;
                stats.add_output_file(output);
                info!("Wrote degree coordinates to {}", output.display());
                if args.common.output_format == OutputFormat::Human {
                    println!("📁 Converted entries: {}", output.display());
                }
            }
        }
        _ => {
            return Err(Error::configuration(
                "Provide either --ra and --dec, or --input",
            ));
        }
    }

    stats.processing_time = start_time.elapsed();
    Ok(stats)
}

/// Normalize every numeric and textual entry of `groups`
///
/// Absent and structured coordinates are passed over silently; entries whose
/// strings cannot be parsed are logged and counted as skipped.
pub fn normalize_groups(groups: &[BulletinGroup]) -> (Vec<NormalizedEntry>, usize) {
    let mut normalized = Vec::new();
    let mut skipped = 0;

    for group in groups {
        for entry in &group.entries {
            if matches!(
                entry.coordinates(),
                CoordinatePair::Absent | CoordinatePair::Structured
            ) {
                debug!(
                    "Skipping {} coordinates in {}",
                    entry.coordinates().kind(),
                    group.label
                );
                continue;
            }

            match normalize_entry(entry) {
                Ok(coordinates) => normalized.push(NormalizedEntry {
                    bulletin: group.label.clone(),
                    name: entry.name().map(str::to_string),
                    coordinates,
                }),
                Err(e) => {
                    warn!("{}: {}", group.label, e);
                    skipped += 1;
                }
            }
        }
    }

    (normalized, skipped)
}

/// Rewrite RA/Dec of every numeric and textual entry as decimal degrees
///
/// All other fields are kept in place. Absent, structured and unparseable
/// coordinates are written unchanged; the number of unparseable entries is
/// returned alongside the groups.
pub fn convert_groups(groups: &[BulletinGroup]) -> Result<(Vec<BulletinGroup>, usize)> {
    let mut converted = Vec::with_capacity(groups.len());
    let mut skipped = 0;

    for group in groups {
        let mut entries = Vec::with_capacity(group.entries.len());
        for entry in &group.entries {
            if matches!(
                entry.coordinates(),
                CoordinatePair::Absent | CoordinatePair::Structured
            ) {
                entries.push(entry.clone());
                continue;
            }

            match normalize_entry(entry) {
                Ok(coordinates) => entries.push(with_degrees(entry, &coordinates)?),
                Err(e) => {
                    warn!("{}: keeping original coordinates: {}", group.label, e);
                    skipped += 1;
                    entries.push(entry.clone());
                }
            }
        }
        converted.push(BulletinGroup::new(group.label.clone(), entries));
    }

    Ok((converted, skipped))
}

fn with_degrees(
    entry: &CandidateEntry,
    coordinates: &NormalizedCoordinates,
) -> Result<CandidateEntry> {
    let mut record = entry.record().clone();
    record.insert(fields::RA.to_string(), degrees(coordinates.ra_deg)?);
    record.insert(fields::DEC.to_string(), degrees(coordinates.dec_deg)?);
    CandidateEntry::from_record(record)
}

fn degrees(value: f64) -> Result<Value> {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| Error::coordinate_parse(value.to_string(), "not a finite number"))
}

fn print_pair(
    ra: &str,
    dec: &str,
    coordinates: &NormalizedCoordinates,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Human => {
            println!(
                "{} {} -> RA {} Dec {} ({})",
                ra,
                dec,
                format!("{:.6}", coordinates.ra_deg).bright_white().bold(),
                format!("{:.6}", coordinates.dec_deg).bright_white().bold(),
                coordinates.format
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(coordinates)?),
    }
    Ok(())
}

fn print_entries(entries: &[NormalizedEntry], skipped: usize, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for entry in entries {
                println!(
                    "{}  {:<30} {:>12.6} {:>12.6}  {}",
                    entry.bulletin,
                    entry.name.as_deref().unwrap_or("-"),
                    entry.coordinates.ra_deg,
                    entry.coordinates.dec_deg,
                    entry.coordinates.format
                );
            }
            println!(
                "\n{} entries normalized",
                entries.len().to_string().bright_green().bold()
            );
            if skipped > 0 {
                println!(
                    "{} entries could not be parsed",
                    skipped.to_string().bright_red().bold()
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
    }
    Ok(())
}
