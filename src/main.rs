//! # News Portal CLI (`portal`)
//!
//! The `portal` binary runs the HTTP server and exposes the same read
//! pipeline as one-shot commands that print JSON, which is handy for
//! checking a table or bucket without a browser.
//!
//! ## Usage
//!
//! ```bash
//! portal --config ./config/portal.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `portal serve` | Start the HTTP server |
//! | `portal articles` | Print all articles, optionally filtered |
//! | `portal article <id>` | Print one article |
//! | `portal sidebar` | Print the aggregated sidebar |
//! | `portal image <key>...` | Resolve image keys to presigned URLs |
//!
//! ## Examples
//!
//! ```bash
//! # Serve on the configured bind address
//! portal serve
//!
//! # Articles mentioning "election" in the politics category
//! portal articles --search election --category politics
//!
//! # Check that two images exist and get their URLs
//! portal image news/1.jpg news/2.jpg
//! ```
//!
//! Log verbosity is controlled with `RUST_LOG` (default `info`); logs go to
//! stderr so stdout stays valid JSON.

use anyhow::bail;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use news_portal::config;
use news_portal::resolver::resolve_all;
use news_portal::server;
use news_portal::service::ContentService;

/// News Portal: a read-only news site over DynamoDB and S3.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/portal.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "portal",
    about = "News portal over DynamoDB and S3",
    version,
    long_about = "Scans schema-less news and sidebar tables in DynamoDB, normalizes them into \
    articles and a sidebar, resolves article images in S3 to presigned URLs, and serves the \
    result over HTTP or prints it as JSON."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/portal.toml` when it exists; otherwise
    /// built-in defaults plus environment overrides apply.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind` (or `PORT`) and serves the portal routes.
    Serve,

    /// Print articles as JSON.
    Articles {
        /// Case-insensitive text matched against title, summary, author and tags.
        #[arg(long)]
        search: Option<String>,

        /// Case-insensitive text matched against tags.
        #[arg(long)]
        category: Option<String>,
    },

    /// Print one article as JSON.
    Article {
        /// Article id.
        id: String,
    },

    /// Print the aggregated sidebar as JSON.
    Sidebar,

    /// Resolve image keys to presigned URLs.
    ///
    /// Every key is resolved concurrently; a failed key is reported
    /// without affecting the others.
    Image {
        /// Object keys in the images bucket.
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

/// One line of `portal image` output.
#[derive(Serialize)]
struct ImageResult {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;
    let service = ContentService::connect(&cfg)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg, service).await?;
        }
        Commands::Articles { search, category } => {
            let (articles, _) = service
                .list_articles(search.as_deref(), category.as_deref())
                .await?;
            print_json(&articles)?;
        }
        Commands::Article { id } => match service.get_article_by_id(&id).await? {
            Some(article) => print_json(&article)?,
            None => bail!("article not found: {}", id),
        },
        Commands::Sidebar => {
            print_json(&service.fetch_sidebar().await?)?;
        }
        Commands::Image { keys } => {
            let results = resolve_all(service.resolver(), &keys).await;
            let report: Vec<ImageResult> = keys
                .into_iter()
                .zip(results)
                .map(|(key, result)| match result {
                    Ok(url) => ImageResult {
                        key,
                        url: Some(url),
                        error: None,
                    },
                    Err(err) => ImageResult {
                        key,
                        url: None,
                        error: Some(err.to_string()),
                    },
                })
                .collect();
            print_json(&report)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
