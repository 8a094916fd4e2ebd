//! CLI for the pagedrop bridge: a desktop host that drives each bridge operation.

mod commands;
mod platform;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pagedrop_core::config;
use std::path::PathBuf;

use commands::{
    run_classify, run_fetch, run_navigate, run_open, run_persist, run_script, run_serve,
};

/// Top-level CLI for the pagedrop download bridge.
#[derive(Debug, Parser)]
#[command(name = "pagedrop")]
#[command(about = "pagedrop: web view download interception and blob persistence", long_about = None)]
pub struct Cli {
    /// Save into this directory instead of the configured downloads directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub downloads_dir: Option<PathBuf>,

    /// Pretend to run on this platform API level (capability rules depend on it).
    #[arg(long, global = true, value_name = "LEVEL")]
    pub api_level: Option<u32>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Show how a navigation or download callback would be classified.
    Classify {
        /// Navigation target or download URL.
        url: String,
        /// Treat as a download-start callback with this MIME type.
        #[arg(long)]
        mime: Option<String>,
        /// Treat as a download-start callback with this Content-Disposition.
        #[arg(long)]
        disposition: Option<String>,
        /// Treat as a download-start callback even without metadata.
        #[arg(long)]
        download: bool,
    },

    /// Simulate a navigation: intercept it if it is a download, and wait for the transfer.
    Navigate {
        /// Navigation target.
        url: String,
    },

    /// Print the in-page script (install, or materialize for a blob locator).
    Script {
        /// Blob locator to materialize; without it the install script is printed.
        #[arg(long)]
        blob: Option<String>,
    },

    /// Persist a local file as if the page had materialized it from a blob.
    Persist {
        /// File whose bytes form the payload.
        path: PathBuf,
        /// Filename the page would suggest.
        #[arg(long)]
        name: Option<String>,
        /// Payload content type.
        #[arg(long, default_value = "application/pdf")]
        mime: String,
    },

    /// Enqueue a direct download and wait for it to finish.
    Fetch {
        /// HTTP/HTTPS URL.
        url: String,
        /// Explicit filename.
        #[arg(long)]
        name: Option<String>,
        /// User-Agent to forward.
        #[arg(long)]
        user_agent: Option<String>,
        /// MIME type reported by the page.
        #[arg(long)]
        mime: Option<String>,
    },

    /// Read JSON bridge messages (one per line) from stdin and dispatch them.
    Serve,

    /// Open a persisted file with the desktop viewer.
    Open {
        /// Filename inside the downloads directory.
        filename: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        if let Some(level) = cli.api_level {
            cfg.platform.api_level = level;
        }
        if let Some(dir) = cli.downloads_dir {
            cfg.downloads_dir = Some(dir);
        }
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Classify {
                url,
                mime,
                disposition,
                download,
            } => run_classify(&cfg, &url, mime, disposition, download)?,
            CliCommand::Navigate { url } => run_navigate(cfg, &url).await?,
            CliCommand::Script { blob } => run_script(&cfg, blob.as_deref())?,
            CliCommand::Persist { path, name, mime } => {
                run_persist(cfg, &path, name.as_deref(), &mime).await?
            }
            CliCommand::Fetch {
                url,
                name,
                user_agent,
                mime,
            } => run_fetch(cfg, &url, name.as_deref(), user_agent, mime).await?,
            CliCommand::Serve => run_serve(cfg).await?,
            CliCommand::Open { filename } => run_open(cfg, &filename)?,
        }

        Ok(())
    }
}
