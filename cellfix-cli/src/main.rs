//! cellfix CLI - cell-id positioning daemon and dataset tools.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::common::TechnologyArg;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "cellfix")]
#[command(version, about = "Cell-id position determination engine", long_about = None)]
struct Cli {
    /// Config file (default: ~/.cellfix/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the position service as a single client and print events
    Run {
        /// Requested update interval in seconds
        #[arg(long)]
        interval: Option<u64>,

        /// JSON file of visible cells to watch
        #[arg(long)]
        cells: Option<PathBuf>,
    },

    /// Resolve one cell against the dataset
    Lookup {
        #[arg(long, value_enum)]
        tech: TechnologyArg,

        /// Cell id (CID or CI)
        #[arg(long)]
        cid: u32,

        /// Location area code (LAC or TAC)
        #[arg(long)]
        lac: u32,

        #[arg(long)]
        mcc: u16,

        #[arg(long)]
        mnc: u16,
    },

    /// Triangulate a JSON file of cell reports offline
    Estimate {
        /// JSON array of cell reports
        cells: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dataset maintenance
    Dataset {
        #[command(subcommand)]
        command: DatasetCommands,
    },

    /// Print the effective location settings
    Settings,
}

#[derive(Subcommand)]
enum DatasetCommands {
    /// Build shard files from a JSON list of cell entries
    Pack {
        /// JSON array of {tech, cid, lac, mcc, mnc, lat, lon}
        input: PathBuf,

        /// Output directory for <digit>/<file name> shards
        out_dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = CliRunner::new(cli.config.as_deref(), cli.verbose)
        .and_then(|runner| dispatch(&runner, cli.command));

    if let Err(e) = result {
        e.exit();
    }
}

fn dispatch(runner: &CliRunner, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Run { interval, cells } => {
            commands::run::run(runner, commands::run::RunArgs { interval, cells })
        }
        Commands::Lookup {
            tech,
            cid,
            lac,
            mcc,
            mnc,
        } => commands::lookup::run(
            runner,
            commands::lookup::LookupArgs {
                tech,
                cid,
                lac,
                mcc,
                mnc,
            },
        ),
        Commands::Estimate { cells, json } => commands::estimate::run(runner, &cells, json),
        Commands::Dataset {
            command: DatasetCommands::Pack { input, out_dir },
        } => commands::dataset::pack(runner, &input, &out_dir),
        Commands::Settings => commands::settings::run(runner),
    }
}
