//! Vitrine CLI - documentation pages with live component demos.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(about = "Documentation pages with live embedded component demos")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to vitrine.toml config file
    #[arg(short, long, default_value = "vitrine.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a config file and a sample page
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Compile the components of one snippet file
    Compile {
        /// Snippet file containing <template>/<script>/<style> blocks
        file: PathBuf,

        /// Write the collected style texts to this file
        #[arg(long)]
        styles: Option<PathBuf>,

        /// Print the component expression for bare template markup instead
        #[arg(long)]
        expression: bool,
    },

    /// Render every markdown page with its demos
    Build {
        /// Output directory (defaults to config or "dist")
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile every snippet and report diagnostics
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes)?;
        }
        Commands::Compile {
            file,
            styles,
            expression,
        } => {
            commands::compile::run(&cli.config, &file, styles.as_deref(), expression)?;
        }
        Commands::Build { output } => {
            commands::build::run(&cli.config, output)?;
        }
        Commands::Check => {
            commands::check::run(&cli.config)?;
        }
    }

    Ok(())
}
