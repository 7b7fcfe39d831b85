//! CLI commands implementation.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;

use crate::config::load_settings;
use crate::ocr::{LeadExtractor, OcrBackendType};
use crate::storage::LeadStore;

#[derive(Parser)]
#[command(name = "leadflow")]
#[command(about = "Lead management backend with OCR document extraction")]
#[command(version)]
pub struct Cli {
    /// Data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Extract contact fields from a local document
    Extract {
        /// Path to a .pdf, .png, .jpg, or .jpeg file
        file: PathBuf,
        /// OCR backend to use (overrides config: tesseract or vision)
        #[arg(short, long)]
        backend: Option<String>,
    },

    /// Show data directory status
    Status,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.data_dir.clone())?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            crate::server::serve(&settings).await
        }

        Commands::Extract { file, backend } => {
            if let Some(backend) = backend {
                if OcrBackendType::from_str(&backend).is_none() {
                    anyhow::bail!("unknown backend '{}'", backend);
                }
                settings.ocr.backend = backend;
            }

            let filename = file
                .file_name()
                .and_then(|n| n.to_str())
                .context("file has no name")?
                .to_string();
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;

            let extractor = LeadExtractor::new(settings.ocr.clone());
            let extraction =
                tokio::task::spawn_blocking(move || extractor.extract(&content, &filename))
                    .await?;

            if let Some(error) = &extraction.error {
                println!("{} {}", style("extraction failed:").red().bold(), error);
            } else if extraction.fallback.unwrap_or(false) {
                println!("{}", style("extraction timed out, manual entry required").yellow());
            } else {
                println!(
                    "{} (confidence {:.2})",
                    style("extracted").green().bold(),
                    extraction.confidence.unwrap_or(0.0)
                );
            }
            println!("{}", serde_json::to_string_pretty(&extraction)?);
            Ok(())
        }

        Commands::Status => {
            let store = LeadStore::open(settings.data_dir()).await?;
            println!(
                "data dir:  {}\nleads:     {}\nworkflows: {}",
                settings.data_dir().display(),
                store.leads().await.len(),
                store.workflows().await.len()
            );
            Ok(())
        }
    }
}
