//! Command implementations for the ATEL processor CLI
//!
//! Each subcommand lives in its own module; [`shared`] holds logging setup,
//! configuration loading and the statistics every command returns.

pub mod classify;
pub mod extract;
pub mod normalize;
pub mod resolve;
pub mod shared;

pub use shared::CommandStats;

use crate::Result;
use crate::cli::args::{Args, Commands};

/// Dispatch to the handler for the parsed subcommand
///
/// - `classify`: partition extracted coordinates into good, bad and null
/// - `normalize`: convert coordinates to decimal degrees
/// - `extract`: request extraction documents from the LLM endpoint
/// - `resolve`: resolve object names against SIMBAD
pub async fn run(args: Args) -> Result<CommandStats> {
    match args.get_command() {
        Commands::Classify(classify_args) => classify::run_classify(classify_args).await,
        Commands::Normalize(normalize_args) => normalize::run_normalize(normalize_args).await,
        Commands::Extract(extract_args) => extract::run_extract(extract_args).await,
        Commands::Resolve(resolve_args) => resolve::run_resolve(resolve_args).await,
    }
}
