//! CLI binary for quotedoc.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `RenderConfig` and either renders one quote or serves the HTTP API.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quotedoc::{generate, AppState, JsonDirStore, RenderConfig};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render one quote to ./quote_<ref>.pdf
  quotedoc render q-2026-0042 --store ./quotes

  # Render to an explicit path
  quotedoc render q-2026-0042 --store ./quotes -o proposal.pdf

  # Serve GET /quotes/{id}/document on port 8080
  quotedoc serve --store ./quotes --bind 0.0.0.0:8080

ENVIRONMENT VARIABLES:
  QUOTEDOC_STORE         Quote store directory (same as --store)
  QUOTEDOC_BROWSER_PATH  Chromium/Chrome executable to render with
  RUST_LOG               Tracing filter (overrides -v/-q)
"#;

/// Render travel quotes into paginated PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "quotedoc",
    version,
    about = "Render travel quotes into paginated PDF documents",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single quote to a PDF file.
    Render {
        /// The quote record id.
        quote_id: String,

        /// Directory of `<id>.json` quote records.
        #[arg(long, env = "QUOTEDOC_STORE")]
        store: PathBuf,

        /// Output path; defaults to `quote_<ref>.pdf` in the working directory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        knobs: Knobs,
    },

    /// Serve `GET /quotes/{id}/document` over HTTP.
    Serve {
        /// Directory of `<id>.json` quote records.
        #[arg(long, env = "QUOTEDOC_STORE")]
        store: PathBuf,

        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,

        #[command(flatten)]
        knobs: Knobs,
    },
}

/// Pipeline knobs shared by both subcommands.
#[derive(clap::Args, Debug)]
struct Knobs {
    /// Concurrent image fetches.
    #[arg(long, default_value_t = 8)]
    concurrency: usize,

    /// Per-image HTTP timeout in seconds.
    #[arg(long, default_value_t = 15)]
    fetch_timeout: u64,

    /// Whole-render timeout in seconds.
    #[arg(long, default_value_t = 90)]
    render_timeout: u64,

    /// JPEG quality for embedded photos (1-100).
    #[arg(long, default_value_t = 70)]
    jpeg_quality: u8,

    /// Chromium/Chrome executable to render with.
    #[arg(long, env = "QUOTEDOC_BROWSER_PATH")]
    browser_path: Option<PathBuf>,
}

impl Knobs {
    fn into_config(self) -> Result<RenderConfig> {
        let mut builder = RenderConfig::builder()
            .concurrency(self.concurrency)
            .fetch_timeout_secs(self.fetch_timeout)
            .render_timeout_secs(self.render_timeout)
            .image_jpeg_quality(self.jpeg_quality);
        if let Some(path) = self.browser_path {
            builder = builder.browser_path(path);
        }
        builder.build().context("Invalid configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    match cli.command {
        Command::Render {
            quote_id,
            store,
            output,
            knobs,
        } => {
            let config = knobs.into_config()?;
            let store = JsonDirStore::new(store);
            let artifact = generate(&store, &quote_id, &config)
                .await
                .with_context(|| format!("Rendering quote {quote_id} failed"))?;

            let path = output.unwrap_or_else(|| PathBuf::from(&artifact.filename));
            tokio::fs::write(&path, &artifact.bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;

            if !cli.quiet {
                eprintln!(
                    "{} bytes → {}  ({} images, {} degraded, {}ms)",
                    artifact.stats.pdf_bytes,
                    path.display(),
                    artifact.stats.image_count,
                    artifact.stats.degraded_images,
                    artifact.stats.total_duration_ms,
                );
            }
        }

        Command::Serve { store, bind, knobs } => {
            let config = knobs.into_config()?;
            let state = Arc::new(AppState {
                store: Arc::new(JsonDirStore::new(store)),
                config,
            });
            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("Failed to bind {bind}"))?;
            quotedoc::serve(listener, state)
                .await
                .context("Server failed")?;
        }
    }

    Ok(())
}
