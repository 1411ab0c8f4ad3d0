//! fireclass CLI - Command-line interface
//!
//! Commands:
//!   evaluate      - Run the full classification flow
//!   basic         - Run the condensed flow (use category to relevant annex)
//!   table         - Evaluate a single decision table
//!   requirements  - Collect the design requirements that apply
//!   explain       - Explain a full flow run
//!   schema        - Print the JSON Schema of an output type
//!   config check  - Validate an engine configuration file

mod cli;

use clap::{Parser, Subcommand};
use cli::*;
use fireclass::VERSION;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "fireclass", version = VERSION, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the decision model document
    #[arg(short, long, default_value = "model.json", global = true)]
    model: PathBuf,

    /// Path to an engine configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Context JSON file (default: stdin)
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full classification flow
    Evaluate,

    /// Run the condensed flow
    Basic,

    /// Evaluate a single decision table
    Table {
        /// Table name
        name: String,

        /// Return every matching rule instead of the first
        #[arg(long)]
        collect: bool,
    },

    /// Collect the design requirements that apply to the context
    Requirements {
        /// Requirements table name (default: from config)
        #[arg(long)]
        table: Option<String>,
    },

    /// Explain a full flow run
    Explain,

    /// Print the JSON Schema of an output type
    Schema {
        /// One of: flow, stage, match, hint, candidate, suggestion, requirements, explanation, config
        #[arg(default_value = "list")]
        name: String,
    },

    /// Engine configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Validate a configuration file
    Check {
        /// Configuration file (default: --config, else the built-in defaults)
        file: Option<PathBuf>,

        /// JSON output
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fireclass=info")),
        )
        .init();

    let cli = Cli::parse();
    let opts = Options {
        model: cli.model,
        config: cli.config,
        input: cli.input,
    };

    let result = match cli.command {
        Commands::Evaluate => cmd_evaluate(&opts),
        Commands::Basic => cmd_basic(&opts),
        Commands::Table { name, collect } => cmd_table(&opts, &name, collect),
        Commands::Requirements { table } => cmd_requirements(&opts, table.as_deref()),
        Commands::Explain => cmd_explain(&opts),
        Commands::Schema { name } => cmd_schema(&name),
        Commands::Config {
            command: ConfigCommands::Check { file, json },
        } => cmd_config_check(file.as_deref().or(opts.config.as_deref()), json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}
