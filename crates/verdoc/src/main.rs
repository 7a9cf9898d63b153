//! verdoc CLI - publish multi-version documentation sites from Git tags.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use verdoc_site::SiteError;

mod commands;
mod config;

use config::ConfigFile;

#[derive(Parser)]
#[command(name = "verdoc")]
#[command(about = "Publish versioned documentation sites from Git tags")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to verdoc.toml config file
    #[arg(short, long, default_value = "verdoc.toml", global = true)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean, generate and index the whole site
    Publish {
        /// Git reference to generate (defaults to the development branch)
        reference: Option<String>,

        /// Regenerate every release tag as well
        #[arg(long)]
        all_tags: bool,

        /// Branch holding the previously published site (defaults to config)
        #[arg(long, conflicts_with = "no_existing")]
        existing: Option<String>,

        /// Do not carry over previously published versions
        #[arg(long)]
        no_existing: bool,
    },

    /// Generate docs for one reference into the staging tree
    Generate {
        #[command(flatten)]
        target: GenerateTarget,
    },

    /// Render the master index from the current tags
    Index,

    /// Remove the staging tree and scratch checkouts
    Clean,

    /// Scaffold verdoc.toml and the page templates
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,

        /// Crate whose docs the redirect pages open (defaults to Cargo.toml)
        #[arg(long)]
        crate_name: Option<String>,
    },

    /// Preview the staging tree
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct GenerateTarget {
    /// Branch to generate
    #[arg(long)]
    branch: Option<String>,

    /// Release tag to generate
    #[arg(long)]
    version: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = report(&mut io::stderr(), &e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ConfigFile::load(&cli.config)?;

    // Execute command
    match cli.command {
        Commands::Publish {
            reference,
            all_tags,
            existing,
            no_existing,
        } => {
            let existing = if no_existing {
                None
            } else {
                Some(existing.unwrap_or_else(|| config.site.published_branch.clone()))
            };
            commands::publish::run(&config, reference, all_tags, existing)?;
        }
        Commands::Generate { target } => match (target.branch, target.version) {
            (Some(branch), _) => commands::generate::run_branch(&config, &branch)?,
            (None, Some(version)) => commands::generate::run_version(&config, &version)?,
            (None, None) => anyhow::bail!("Pass --branch or --version"),
        },
        Commands::Index => {
            commands::index::run(&config)?;
        }
        Commands::Clean => {
            commands::clean::run(&config)?;
        }
        Commands::Init { yes, crate_name } => {
            commands::init::run(&cli.config, yes, crate_name)?;
        }
        Commands::Serve { port, no_open } => {
            commands::serve::run(port, config.site.staging.clone(), !no_open).await?;
        }
    }

    Ok(())
}

/// Print a failure: a collaborator's captured stderr verbatim, anything else
/// as an error line.
fn report(out: &mut impl Write, err: &anyhow::Error) -> io::Result<()> {
    match err.downcast_ref::<SiteError>() {
        Some(SiteError::CommandFailed { stderr, .. }) => write!(out, "{stderr}"),
        _ => writeln!(out, "error: {err:#}"),
    }
}
