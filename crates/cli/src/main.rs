// njgeo CLI - boundary reconciliation and consolidation maps

mod exit_codes;
mod fetch;
mod recon;
mod render;
mod report;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "njgeo")]
#[command(about = "Reconcile municipal boundary files with reference attributes and render consolidation maps")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Join boundaries to the reference table
    Recon {
        #[command(subcommand)]
        command: recon::ReconCommands,
    },

    /// Write HTML boundary maps for the region and each scenario
    #[command(after_help = "\
Examples:
  njgeo render northern-nj.toml
  njgeo render northern-nj.toml --output-dir /tmp/maps")]
    Render {
        /// Path to the TOML config file
        config: PathBuf,

        /// Directory for the HTML files (default: config's output_dir)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Download and extract the boundary layers named in the config
    #[command(after_help = "\
Examples:
  njgeo fetch northern-nj.toml
  RUST_LOG=debug njgeo fetch northern-nj.toml")]
    Fetch {
        /// Path to the TOML config file
        config: PathBuf,
    },

    /// Print a JSON table for the reference data or boundary quality
    #[command(after_help = "\
Examples:
  njgeo report northern-nj.toml --table counties
  njgeo report northern-nj.toml --table insights
  njgeo report northern-nj.toml --table comparisons --output comparisons.json")]
    Report {
        /// Path to the TOML config file
        config: PathBuf,

        /// Which table to produce
        #[arg(long, value_enum)]
        table: report::Table,

        /// Write JSON to file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  njgeo-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            eprintln!("Usage: njgeo <command> [options]");
            eprintln!("       njgeo --help for more information");
            Err(CliError { code: EXIT_USAGE, message: String::new(), hint: None })
        }
        Some(Commands::Recon { command }) => recon::cmd_recon(command),
        Some(Commands::Render { config, output_dir }) => render::cmd_render(config, output_dir),
        Some(Commands::Fetch { config }) => fetch::cmd_fetch(config),
        Some(Commands::Report { config, table, output }) => report::cmd_report(config, table, output),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}
