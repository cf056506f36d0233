//! Plume CLI - Command-line interface for the Plume compiler.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Plume - Resolve, linearize and dispatch over Pure-style models
#[derive(Parser)]
#[command(name = "plume")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Let arguments of unknown type match any parameter
    #[arg(long, global = true)]
    lenient: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile model files and report the first error
    Check {
        /// Input file(s)
        files: Vec<PathBuf>,
        /// Print the compiled graph as JSON
        #[arg(long)]
        snapshot: bool,
    },

    /// Show the linearized supertypes of a type
    Linearize {
        /// Input file(s)
        files: Vec<PathBuf>,
        /// Full path of the type, e.g. `my::pkg::Circle`
        #[arg(long = "type")]
        type_path: String,
    },

    /// Show the id of a function descriptor and look it up in the model
    Descriptor {
        /// Descriptor such as `pkg::f(String[1]):Boolean[1]`
        descriptor: String,
        /// Input file(s) to search
        files: Vec<PathBuf>,
    },

    /// Resolve a call against the functions of a model
    Resolve {
        /// Input file(s)
        files: Vec<PathBuf>,
        /// Function name, simple or qualified
        #[arg(long)]
        function: String,
        /// Argument as a typed value (`Integer[1]`), or `_` when unknown
        #[arg(long = "arg")]
        args: Vec<String>,
    },

    /// Show information about the Plume installation
    Info,
}

/// `RUST_LOG` when set, otherwise `debug` or `warn` depending on `-v`.
fn env_filter(verbose: bool) -> EnvFilter {
    let filter = if verbose { "debug" } else { "warn" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter))
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(cli.verbose))
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let options = commands::Options {
        verbose: cli.verbose,
        lenient: cli.lenient,
    };
    match cli.command {
        Commands::Check { files, snapshot } => commands::check::run(&files, snapshot, options),
        Commands::Linearize { files, type_path } => {
            commands::linearize::run(&files, &type_path, options)
        }
        Commands::Descriptor { descriptor, files } => {
            commands::descriptor::run(&descriptor, &files, options)
        }
        Commands::Resolve {
            files,
            function,
            args,
        } => commands::resolve::run(&files, &function, &args, options),
        Commands::Info => commands::info::run(),
    }
}
