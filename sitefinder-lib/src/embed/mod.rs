//! Text embedding using local sentence-embedding models
//!
//! Uses the fastembed crate (ONNX runtime). The default model is
//! `sentence-transformers/all-mpnet-base-v2`, which the site catalog is
//! embedded with.
//!
//! # Model lifecycle
//!
//! A model is loaded once when the embedder is constructed and is never torn
//! down. Callers share one embedder through an `Arc`; every method takes
//! `&self`, so the same loaded model serves all concurrent searches.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use sitefinder_lib::embed::{Embedder, EmbedderConfig, SentenceEmbedder};
//!
//! let embedder = Arc::new(SentenceEmbedder::new(EmbedderConfig::default())?);
//!
//! // Embed site descriptions (for storing)
//! let doc_embeddings = embedder.embed_documents(&["Granite cliffs and waterfalls"])?;
//!
//! // Embed a query (for searching)
//! let query_embedding = embedder.embed_query("big waterfalls")?;
//! ```

use crate::Result;

/// A vector embedding - fixed size array of floats
pub type Embedding = Vec<f32>;

/// Trait for text embedding models
pub trait Embedder: Send + Sync {
    /// Embed multiple documents for storing in the catalog
    ///
    /// Documents may be batched for efficiency.
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a single query for searching
    ///
    /// Note: Some models (like BGE) use different prompts for queries vs documents.
    /// This method handles that distinction.
    fn embed_query(&self, text: &str) -> Result<Embedding>;

    /// Returns the embedding dimension
    fn dimension(&self) -> usize;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

pub mod codec;
mod sentence;

pub use codec::{decode_embedding, encode_embedding};
pub use sentence::*;
