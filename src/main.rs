use atel_processor::cli::{args::Args, commands};
use clap::Parser;
use std::process;

fn main() {
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let shutdown_signal = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("Failed to listen for CTRL+C: {}", e);
                // Without a handler, never resolve and let the command finish
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = commands::run(args) => result,
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(atel_processor::Error::processing_interrupted(
                    "Processing interrupted by user",
                ))
            }
        }
    });

    match result {
        Ok(_stats) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("ATEL Processor - Astronomer's Telegram coordinate miner");
    println!("========================================================");
    println!();
    println!("Extract celestial object records from ATel bulletins, check the extracted");
    println!("coordinates against the bulletin text and resolve object names in SIMBAD.");
    println!();
    println!("USAGE:");
    println!("    atel-processor <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    classify    Partition extracted coordinates into good, bad and null");
    println!("    normalize   Convert RA/Dec pairs to decimal degrees");
    println!("    extract     Request extraction documents from the LLM endpoint");
    println!("    resolve     Resolve extracted and reference names against SIMBAD");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Classify and write ATEL_good.json, ATEL_bad.json, ATEL_null.json:");
    println!("    atel-processor classify --bulletins data/Processed_Atels.csv \\");
    println!("                            --extractions output/gpt_output --write");
    println!();
    println!("    # Convert a single pair:");
    println!("    atel-processor normalize --ra 22h02m43.29s --dec +42d16m39.6s");
    println!();
    println!("    # Extract the first 100 bulletins (needs OPENAI_API_KEY):");
    println!("    atel-processor extract --limit 100 --skip-existing");
    println!();
    println!("For detailed help on any command, use:");
    println!("    atel-processor <COMMAND> --help");
}
