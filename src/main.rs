//! # flowdex CLI (`fdx`)
//!
//! The `fdx` binary is the operator interface for the template corpus
//! pipeline. It provides commands for corpus initialization, ingestion,
//! index rebuilds, querying, sanitization, retrieval context, and the HTTP
//! server.
//!
//! ## Usage
//!
//! ```bash
//! fdx --config ./config/fdx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fdx init` | Create the corpus directory layout |
//! | `fdx sources` | List all sources and their health status |
//! | `fdx ingest <source>` | Ingest from a source (bulk, api, cms) |
//! | `fdx reindex` | Rebuild the aggregated index artifact |
//! | `fdx query [TEXT]` | Search and page through the index |
//! | `fdx get <slug>` | Print a full document by slug |
//! | `fdx export <slug>` | Export a document's raw JSON |
//! | `fdx clean` | Write sanitized copies for prompt reuse |
//! | `fdx context <query>` | Print top-k retrieval context chunks |
//! | `fdx stats` | Corpus and index overview |
//! | `fdx serve` | Start the HTTP API server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use flowdex::{config, get, index, ingest, query, retrieval, server, sources, stats, store};

/// flowdex, a corpus pipeline for automation workflow templates.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/fdx.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "fdx",
    about = "flowdex — ingestion, indexing, search, and retrieval context for workflow templates",
    version,
    long_about = "flowdex ingests automation-workflow templates from heterogeneous sources, \
    sanitizes and slugs them into a one-file-per-document corpus, maintains a compact \
    rebuildable index for fast listing, and selects keyword-ranked context chunks for \
    generative-model prompts."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/fdx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the corpus directory layout.
    ///
    /// Creates the corpus and cleaned directories. Idempotent: running it
    /// multiple times is safe.
    Init,

    /// List configured sources and their status.
    ///
    /// Shows which sources are configured and whether their paths and
    /// credentials are in place. Useful before running an ingest.
    Sources,

    /// Ingest documents from a source.
    ///
    /// Fetches raw items from the source, normalizes them (name check, slug
    /// derivation, id), and writes them to the corpus store. The `cms`
    /// source merges field-level over existing documents and finishes with
    /// an index rebuild.
    Ingest {
        /// Source name: `bulk`, `api`, or `cms`.
        source: String,

        /// Show what would be written without touching the store.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of items to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Rebuild the aggregated index artifact from the corpus.
    ///
    /// Reads every document, skipping (and logging) malformed files, and
    /// atomically replaces the index. The query engine only picks the new
    /// artifact up on its next load or an explicit reload.
    Reindex,

    /// Search and page through the index.
    Query {
        /// Case-insensitive substring matched against name, description,
        /// and slug.
        text: Option<String>,

        /// 1-indexed page number.
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Records per page. Defaults to `query.default_page_size`.
        #[arg(long)]
        page_size: Option<usize>,

        /// Exact category filter. `All` disables the filter.
        #[arg(long)]
        category: Option<String>,

        /// Complexity tier filter: Beginner, Intermediate, or Advanced.
        #[arg(long)]
        complexity: Option<String>,
    },

    /// Print a full document by slug.
    Get {
        /// Document slug.
        slug: String,
    },

    /// Export a document's raw JSON, as stored.
    ///
    /// Writes to `--output` if given, otherwise prints to stdout for piping.
    Export {
        /// Document slug.
        slug: String,

        /// Output file path.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Write sanitized copies of every document into the cleaned directory.
    ///
    /// Cleaned copies have credential fields and webhook URLs replaced with
    /// placeholders; they are what the retrieval selector serves from.
    Clean,

    /// Print the top-k retrieval context chunks for a query.
    Context {
        /// Free-text query.
        query: String,

        /// Number of chunks to select. Defaults to `retrieval.context_k`.
        #[arg(long)]
        k: Option<usize>,
    },

    /// Show corpus and index statistics.
    Stats,

    /// Start the HTTP API server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// query, document, download, and context endpoints.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = store::CorpusStore::new(&cfg);
            store.ensure_layout()?;
            std::fs::create_dir_all(&cfg.corpus.cleaned_dir)?;
            println!("Corpus initialized at {}", store.dir().display());
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Ingest {
            source,
            dry_run,
            limit,
        } => {
            ingest::run_ingest(&cfg, &source, dry_run, limit).await?;
        }
        Commands::Reindex => {
            index::run_reindex(&cfg)?;
        }
        Commands::Query {
            text,
            page,
            page_size,
            category,
            complexity,
        } => {
            query::run_query(&cfg, text, page, page_size, category, complexity)?;
        }
        Commands::Get { slug } => {
            get::run_get(&cfg, &slug)?;
        }
        Commands::Export { slug, output } => {
            get::run_export(&cfg, &slug, output.as_deref())?;
        }
        Commands::Clean => {
            retrieval::run_clean(&cfg)?;
        }
        Commands::Context { query, k } => {
            retrieval::run_context(&cfg, &query, k)?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
