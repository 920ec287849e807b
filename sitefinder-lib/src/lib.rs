//! Sitefinder - semantic search over a catalog of points of interest
//!
//! # Architecture
//!
//! ```text
//! Submission -> Enrich -> Embedder -> Store
//!                                       |
//! Query -> Embedder -> Ranker <---------+  (full snapshot per query)
//!                        |
//!                   ScoredSites
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sitefinder_lib::{
//!     embed::{EmbedderConfig, SentenceEmbedder},
//!     search::SearchEngine,
//!     store::JsonCatalog,
//! };
//!
//! let embedder = Arc::new(SentenceEmbedder::new(EmbedderConfig::default())?);
//! let engine = SearchEngine::new(embedder, JsonCatalog::new("sites.json"));
//!
//! // Add a site
//! engine.submit(submission).await?;
//!
//! // Search
//! let results = engine.search("granite cliffs and waterfalls", Some(3)).await?;
//! ```

pub mod embed;
pub mod enrich;
pub mod error;
pub mod rank;
pub mod search;
pub mod site;
pub mod store;

pub use error::{Error, Result};
