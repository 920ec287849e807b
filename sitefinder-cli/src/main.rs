//! Sitefinder CLI - search and grow a site catalog
//!
//! # Commands
//!
//! ```bash
//! # Find the sites closest to a description
//! sitefinder search "granite cliffs and waterfalls" -k 3
//!
//! # List every site in the catalog
//! sitefinder sites
//!
//! # Add a site
//! sitefinder submit --name "Zion" --description "Red rock canyons" \
//!     --latitude 37.2982 --longitude -113.0263
//!
//! # Add many sites from a JSON array of submissions
//! sitefinder import seed.json
//!
//! # Embed text and show vector stats
//! sitefinder embed "Who has the tallest waterfall?"
//! ```

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sitefinder_lib::{
    embed::{Embedder, EmbedderConfig, ModelKind, SentenceEmbedder},
    search::{list_catalog, SearchConfig, SearchEngine},
    site::SiteSubmission,
    store::JsonCatalog,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sitefinder")]
#[command(about = "Semantic search over a catalog of points of interest")]
#[command(version)]
struct Cli {
    /// Catalog file (JSON array of sites)
    #[arg(long, env = "SITEFINDER_CATALOG", default_value = "sites.json", global = true)]
    catalog: PathBuf,

    /// Embedding model
    #[arg(long, env = "SITEFINDER_MODEL", default_value = "all-mpnet-base-v2", global = true)]
    model: ModelKind,

    /// Where model files are cached
    #[arg(long, env = "SITEFINDER_CACHE_DIR", global = true)]
    cache_dir: Option<PathBuf>,

    /// Seconds a catalog read may take before the command fails
    #[arg(long, env = "SITEFINDER_FETCH_TIMEOUT_SECS", default_value_t = 10, global = true)]
    fetch_timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the sites most similar to a query
    Search {
        /// Free-text query
        query: String,

        /// Number of results to return
        #[arg(short, long)]
        k: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every site in the catalog
    Sites {
        /// Print sites as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a site to the catalog
    Submit {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        #[arg(long, allow_hyphen_values = true)]
        latitude: f64,

        #[arg(long, allow_hyphen_values = true)]
        longitude: f64,

        /// Photo to show with the site
        #[arg(long)]
        photo_url: Option<String>,
    },

    /// Add every site in a JSON file of submissions
    Import {
        /// JSON array of {name, description, latitude, longitude, photo_url?}
        input: PathBuf,
    },

    /// Embed text and show vector info
    Embed {
        /// Text to embed
        text: String,

        /// Treat as query (uses the model's query prompt, if any)
        #[arg(short, long)]
        query: bool,
    },
}

fn load_embedder(cli: &Cli) -> Result<Arc<SentenceEmbedder>> {
    println!("Loading {} (first run downloads the model)...", cli.model);
    let embedder = SentenceEmbedder::new(EmbedderConfig {
        model: cli.model,
        cache_dir: cli.cache_dir.clone(),
        show_download_progress: true,
    })?;
    Ok(Arc::new(embedder))
}

fn open_engine(cli: &Cli) -> Result<SearchEngine<SentenceEmbedder, JsonCatalog>> {
    let config = SearchConfig {
        fetch_timeout: Duration::from_secs(cli.fetch_timeout_secs),
        ..SearchConfig::default()
    };
    Ok(SearchEngine::new(load_embedder(cli)?, JsonCatalog::new(&cli.catalog)).with_config(config))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Search { query, k, json } => {
            let engine = open_engine(&cli)?;
            let results = engine
                .search(query, *k)
                .await
                .with_context(|| format!("search for '{query}' failed"))?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No matching sites found");
            } else {
                println!("\n=== Results for '{query}' ===\n");
                for (i, result) in results.iter().enumerate() {
                    let site = &result.site;
                    println!("#{} {} (score: {:.4})", i + 1, site.name, result.score);
                    println!("    at {:.4}, {:.4}", site.latitude, site.longitude);
                    if let Some(photo) = &site.photo_url {
                        println!("    photo: {photo}");
                    }
                    println!("    {}\n", site.description);
                }
            }
        }

        Commands::Sites { json } => {
            let store = JsonCatalog::new(&cli.catalog);
            let sites = list_catalog(&store, Duration::from_secs(cli.fetch_timeout_secs)).await?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&sites)?);
            } else {
                println!("{} sites in {}:\n", sites.len(), cli.catalog.display());
                for site in &sites {
                    println!("{} ({:.4}, {:.4})", site.name, site.latitude, site.longitude);
                }
            }
        }

        Commands::Submit {
            name,
            description,
            latitude,
            longitude,
            photo_url,
        } => {
            let engine = open_engine(&cli)?;
            let submitted = engine
                .submit(SiteSubmission {
                    name: name.clone(),
                    description: description.clone(),
                    latitude: *latitude,
                    longitude: *longitude,
                    photo_url: photo_url.clone(),
                })
                .await?;

            println!("Stored '{}' in {}", submitted.site.name, cli.catalog.display());
            if submitted.site.description != submitted.original_description {
                println!("  description: {}", submitted.site.description);
            }
            if let Some(photo) = &submitted.site.photo_url {
                println!("  photo: {photo}");
            }
        }

        Commands::Import { input } => {
            let text = fs::read_to_string(input)
                .with_context(|| format!("cannot read {}", input.display()))?;
            let submissions: Vec<SiteSubmission> = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a JSON array of sites", input.display()))?;
            println!("Importing {} sites from '{}'...", submissions.len(), input.display());

            let engine = open_engine(&cli)?;
            let report = engine.import(submissions).await?;

            println!(
                "Done! {} added, {} already present",
                report.inserted.len(),
                report.skipped.len()
            );
            for name in &report.skipped {
                println!("  skipped: {name}");
            }
        }

        Commands::Embed { text, query } => {
            let embedder = load_embedder(&cli)?;

            let embedding = if *query {
                println!("Embedding as query: {text}");
                embedder.embed_query(text)?
            } else {
                println!("Embedding as document: {text}");
                embedder
                    .embed_documents(&[text.as_str()])?
                    .into_iter()
                    .next()
                    .context("model returned no embedding")?
            };

            println!("\nEmbedding stats:");
            println!("  Model: {}", embedder.model_name());
            println!("  Dimensions: {}", embedding.len());
            println!("  First 5 values: {:?}", &embedding[..embedding.len().min(5)]);
            println!("  Min: {:.4}", embedding.iter().cloned().fold(f32::INFINITY, f32::min));
            println!("  Max: {:.4}", embedding.iter().cloned().fold(f32::NEG_INFINITY, f32::max));
        }
    }

    Ok(())
}
