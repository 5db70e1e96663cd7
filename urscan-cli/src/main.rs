use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use urscan_cli::commands;
use urscan_core::constants::PSBT_UR_TYPE;

#[derive(Parser)]
#[command(name = "urscan")]
#[command(about = "urscan - Reassemble animated-QR PSBT transfers", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reassemble UR parts (one per line) and print the txid
    Decode {
        /// Input file with one part per line, or - for stdin
        #[arg(short, long)]
        input: String,

        /// Output JSON file for the decode report
        #[arg(short, long)]
        output: Option<String>,

        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },

    /// Reassemble UR parts and dump the PSBT structure as JSON
    Inspect {
        /// Input file with one part per line, or - for stdin
        #[arg(short, long)]
        input: String,

        /// Output JSON file (stdout when absent)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Split a PSBT into animated UR parts
    Encode {
        /// PSBT file, raw or hex
        #[arg(short, long)]
        input: String,

        /// Output file, one part per line
        #[arg(short, long)]
        output: String,

        /// Maximum fragment length in bytes
        #[arg(long, default_value = "200")]
        max_fragment_len: usize,

        /// Mixed parts to emit beyond the pure ones
        #[arg(long, default_value = "0")]
        extra: u32,

        /// UR type
        #[arg(long = "type", default_value = PSBT_UR_TYPE)]
        ur_type: String,
    },

    /// Show the raw reassembled payload
    Debug {
        /// Input file with one part per line, or - for stdin
        #[arg(short, long)]
        input: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Decode {
            input,
            output,
            quiet,
        } => commands::decode::execute(&input, output.as_deref(), !quiet),

        Commands::Inspect { input, output } => commands::inspect::execute(&input, output.as_deref()),

        Commands::Encode {
            input,
            output,
            max_fragment_len,
            extra,
            ur_type,
        } => commands::encode::execute(&input, &output, &ur_type, max_fragment_len, extra),

        Commands::Debug { input } => commands::debug::execute(&input),
    }
}
