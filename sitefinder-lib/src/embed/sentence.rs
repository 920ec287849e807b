use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

const BGE_QUERY_PROMPT: &str = "Represent this sentence for searching relevant passages: ";

/// Sentence-embedding models the embedder knows how to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelKind {
    /// sentence-transformers/all-mpnet-base-v2, 768 dimensions.
    #[default]
    AllMpnetBaseV2,
    /// sentence-transformers/all-MiniLM-L6-v2, 384 dimensions.
    AllMiniLmL6V2,
    /// BAAI/bge-small-en-v1.5, 384 dimensions.
    BgeSmallEnV15,
    /// BAAI/bge-base-en-v1.5, 768 dimensions.
    BgeBaseEnV15,
    /// BAAI/bge-large-en-v1.5, 1024 dimensions.
    BgeLargeEnV15,
}

impl ModelKind {
    /// Hugging Face identifier of the model.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::AllMpnetBaseV2 => "sentence-transformers/all-mpnet-base-v2",
            ModelKind::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            ModelKind::BgeSmallEnV15 => "BAAI/bge-small-en-v1.5",
            ModelKind::BgeBaseEnV15 => "BAAI/bge-base-en-v1.5",
            ModelKind::BgeLargeEnV15 => "BAAI/bge-large-en-v1.5",
        }
    }

    /// Output dimensionality of the model.
    #[must_use]
    pub fn dimension(self) -> usize {
        match self {
            ModelKind::AllMiniLmL6V2 | ModelKind::BgeSmallEnV15 => 384,
            ModelKind::AllMpnetBaseV2 | ModelKind::BgeBaseEnV15 => 768,
            ModelKind::BgeLargeEnV15 => 1024,
        }
    }

    /// Prompt prepended to queries, for models trained with one.
    #[must_use]
    pub fn query_prompt(self) -> Option<&'static str> {
        match self {
            ModelKind::BgeSmallEnV15 | ModelKind::BgeBaseEnV15 | ModelKind::BgeLargeEnV15 => {
                Some(BGE_QUERY_PROMPT)
            }
            ModelKind::AllMpnetBaseV2 | ModelKind::AllMiniLmL6V2 => None,
        }
    }

    fn fastembed_model(self) -> EmbeddingModel {
        match self {
            ModelKind::AllMpnetBaseV2 => EmbeddingModel::AllMpnetBaseV2,
            ModelKind::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
            ModelKind::BgeSmallEnV15 => EmbeddingModel::BGESmallENV15,
            ModelKind::BgeBaseEnV15 => EmbeddingModel::BGEBaseENV15,
            ModelKind::BgeLargeEnV15 => EmbeddingModel::BGELargeENV15,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    /// Accepts the full model identifier or its short name, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        let short = wanted.rsplit('/').next().unwrap_or(&wanted);
        match short {
            "all-mpnet-base-v2" => Ok(ModelKind::AllMpnetBaseV2),
            "all-minilm-l6-v2" => Ok(ModelKind::AllMiniLmL6V2),
            "bge-small-en-v1.5" => Ok(ModelKind::BgeSmallEnV15),
            "bge-base-en-v1.5" => Ok(ModelKind::BgeBaseEnV15),
            "bge-large-en-v1.5" => Ok(ModelKind::BgeLargeEnV15),
            _ => Err(Error::InvalidInput(format!("unknown embedding model '{s}'"))),
        }
    }
}

/// Settings used to load a [`SentenceEmbedder`].
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    /// Which model to load
    pub model: ModelKind,
    /// Where downloaded model files are cached (fastembed's default if `None`)
    pub cache_dir: Option<PathBuf>,
    /// Print a progress bar while the model downloads
    pub show_download_progress: bool,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            cache_dir: None,
            show_download_progress: true,
        }
    }
}

/// Sentence embedder backed by fastembed.
///
/// fastembed inference needs exclusive access to the ONNX session, so the
/// model sits behind a mutex. The embedder itself is `Send + Sync` and is
/// meant to be shared through an `Arc`.
pub struct SentenceEmbedder {
    kind: ModelKind,
    model: Mutex<TextEmbedding>,
}

impl SentenceEmbedder {
    /// Load the configured model.
    ///
    /// Downloads the model files on first use.
    pub fn new(config: EmbedderConfig) -> Result<Self> {
        let mut opts = InitOptions::new(config.model.fastembed_model())
            .with_show_download_progress(config.show_download_progress);
        if let Some(dir) = config.cache_dir {
            opts = opts.with_cache_dir(dir);
        }

        tracing::info!(model = config.model.name(), "loading embedding model");
        let model = TextEmbedding::try_new(opts).map_err(|e| Error::Embedding(e.to_string()))?;

        Ok(Self {
            kind: config.model,
            model: Mutex::new(model),
        })
    }

    /// The model this embedder was loaded with.
    #[must_use]
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    fn run(&self, texts: Vec<String>) -> Result<Vec<Embedding>> {
        let expected = texts.len();
        let embeddings = self
            .model
            .lock()
            .map_err(|_| Error::Embedding("embedding model lock poisoned".to_string()))?
            .embed(texts, None)
            .map_err(|e| Error::Embedding(e.to_string()))?;

        if embeddings.len() != expected {
            return Err(Error::Embedding(format!(
                "model returned {} embeddings for {expected} inputs",
                embeddings.len()
            )));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimension()) {
            return Err(Error::Embedding(format!(
                "model returned a {}-dimensional vector, expected {}",
                bad.len(),
                self.dimension()
            )));
        }

        Ok(embeddings)
    }
}

impl Embedder for SentenceEmbedder {
    fn model_name(&self) -> &str {
        self.kind.name()
    }

    fn dimension(&self) -> usize {
        self.kind.dimension()
    }

    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.run(texts.iter().map(|t| (*t).to_string()).collect())
    }

    fn embed_query(&self, text: &str) -> Result<Embedding> {
        let query_text = match self.kind.query_prompt() {
            Some(prompt) => format!("{prompt}{text}"),
            None => text.to_string(),
        };

        self.run(vec![query_text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("model returned no embeddings".to_string()))
    }
}
