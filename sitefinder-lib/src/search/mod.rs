//! High-level search interface
//!
//! Combines the embedder, the catalog store and the ranker into the one API
//! every entry point uses.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use sitefinder_lib::search::SearchEngine;
//!
//! // The model is loaded once and shared.
//! let embedder = Arc::new(SentenceEmbedder::new(EmbedderConfig::default())?);
//! let engine = SearchEngine::new(embedder, JsonCatalog::new("sites.json"));
//!
//! engine.submit(submission).await?;
//! let results = engine.search("granite cliffs and waterfalls", Some(3)).await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::embed::{encode_embedding, Embedder, Embedding};
use crate::enrich::{DescriptionEnhancer, NoPhotos, PhotoLocator, Verbatim};
use crate::rank::Ranker;
use crate::site::{ScoredSite, Site, SiteRecord, SiteSubmission};
use crate::store::CatalogStore;
use crate::{Error, Result};

/// Tunables for [`SearchEngine`].
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Result count used when a request does not name one
    pub default_top_k: usize,
    /// Upper bound applied to requested result counts
    pub max_top_k: usize,
    /// How long a catalog fetch may take before the request fails
    pub fetch_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            max_top_k: 50,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// A site accepted into the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    /// The site as stored, with the final description and photo
    pub site: Site,
    /// The description before enhancement
    pub original_description: String,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Names stored by this import
    pub inserted: Vec<String>,
    /// Names skipped because the catalog already had them
    pub skipped: Vec<String>,
}

struct Prepared {
    name: String,
    original_description: String,
    description: String,
    latitude: f64,
    longitude: f64,
    photo_url: Option<String>,
}

impl Prepared {
    fn into_record(self, embedding: &[f32]) -> (SiteRecord, String) {
        let record = SiteRecord {
            name: self.name,
            description: self.description,
            latitude: self.latitude.into(),
            longitude: self.longitude.into(),
            photo_url: self.photo_url,
            embedding: encode_embedding(embedding),
        };
        (record, self.original_description)
    }
}

/// Semantic search over a site catalog, plus the catalog's write path.
pub struct SearchEngine<E, S, D = Verbatim, P = NoPhotos>
where
    E: Embedder + 'static,
    S: CatalogStore,
    D: DescriptionEnhancer,
    P: PhotoLocator,
{
    embedder: Arc<E>,
    store: S,
    ranker: Ranker,
    enhancer: D,
    photos: P,
    config: SearchConfig,
}

// Constructor for engines without enrichment
impl<E: Embedder + 'static, S: CatalogStore> SearchEngine<E, S, Verbatim, NoPhotos> {
    /// Create a new search engine with default settings and no enrichment.
    #[must_use]
    pub fn new(embedder: Arc<E>, store: S) -> Self {
        Self {
            embedder,
            store,
            ranker: Ranker::new(),
            enhancer: Verbatim,
            photos: NoPhotos,
            config: SearchConfig::default(),
        }
    }
}

impl<E, S, D, P> SearchEngine<E, S, D, P>
where
    E: Embedder + 'static,
    S: CatalogStore,
    D: DescriptionEnhancer,
    P: PhotoLocator,
{
    /// Replace the settings.
    #[must_use]
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Use the given enrichment services for new sites.
    #[must_use]
    pub fn with_enrichment<D2, P2>(self, enhancer: D2, photos: P2) -> SearchEngine<E, S, D2, P2>
    where
        D2: DescriptionEnhancer,
        P2: PhotoLocator,
    {
        SearchEngine {
            embedder: self.embedder,
            store: self.store,
            ranker: self.ranker,
            enhancer,
            photos,
            config: self.config,
        }
    }

    /// Find the sites most similar to `query`.
    ///
    /// `top_k` defaults to [`SearchConfig::default_top_k`] and is capped at
    /// [`SearchConfig::max_top_k`]. An empty result means nothing matched;
    /// an error means the search itself failed.
    pub async fn search(&self, query: &str, top_k: Option<usize>) -> Result<Vec<ScoredSite>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("query is required".to_string()));
        }
        let k = self.resolve_top_k(top_k)?;

        let records = self.fetch_catalog().await?;
        if records.is_empty() {
            tracing::info!(query, "catalog is empty");
            return Ok(Vec::new());
        }

        let query_embedding = self.embed_query(query).await?;
        let ranking = self.ranker.rank(&query_embedding, records, k);

        tracing::info!(
            query,
            top_k = k,
            scanned = ranking.scanned,
            excluded = ranking.excluded,
            malformed = ranking.malformed,
            returned = ranking.sites.len(),
            "search complete"
        );
        Ok(ranking.sites)
    }

    /// Every site with usable coordinates, ordered by name.
    ///
    /// Rows whose coordinates do not parse are left out.
    pub async fn list_sites(&self) -> Result<Vec<Site>> {
        list_catalog(&self.store, self.config.fetch_timeout).await
    }

    /// Enrich, embed and store a new site.
    pub async fn submit(&self, submission: SiteSubmission) -> Result<Submitted> {
        submission.validate()?;
        let prepared = self.prepare(submission).await;

        let embedding = self
            .embed_documents(vec![prepared.description.clone()])
            .await?
            .pop()
            .ok_or_else(|| Error::Embedding("model returned no embeddings".to_string()))?;

        let (record, original_description) = prepared.into_record(&embedding);
        let stored = self.store.insert(record).await?;
        tracing::info!(site = %stored.name, "site stored");

        Ok(Submitted {
            site: stored.to_site()?,
            original_description,
        })
    }

    /// Store many sites at once, embedding their descriptions in one batch.
    ///
    /// Every submission is validated before anything is stored. Names the
    /// catalog already holds are reported as skipped.
    pub async fn import(&self, submissions: Vec<SiteSubmission>) -> Result<ImportReport> {
        for (i, submission) in submissions.iter().enumerate() {
            submission
                .validate()
                .map_err(|e| Error::InvalidInput(format!("entry {i}: {e}")))?;
        }

        let mut prepared = Vec::with_capacity(submissions.len());
        for submission in submissions {
            prepared.push(self.prepare(submission).await);
        }
        let texts = prepared.iter().map(|p| p.description.clone()).collect();
        let embeddings = self.embed_documents(texts).await?;
        if embeddings.len() != prepared.len() {
            return Err(Error::Embedding(format!(
                "model returned {} embeddings for {} sites",
                embeddings.len(),
                prepared.len()
            )));
        }

        let mut report = ImportReport::default();
        for (site, embedding) in prepared.into_iter().zip(&embeddings) {
            let (record, _) = site.into_record(embedding);
            match self.store.insert(record).await {
                Ok(stored) => report.inserted.push(stored.name),
                Err(Error::DuplicateSite(name)) => {
                    tracing::info!(site = %name, "already in catalog, skipping");
                    report.skipped.push(name);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            inserted = report.inserted.len(),
            skipped = report.skipped.len(),
            "import complete"
        );
        Ok(report)
    }

    /// Returns a reference to the embedder.
    #[must_use]
    pub fn embedder(&self) -> &Arc<E> {
        &self.embedder
    }

    /// Returns a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the active settings.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn resolve_top_k(&self, requested: Option<usize>) -> Result<usize> {
        match requested {
            Some(0) => Err(Error::InvalidInput("top_k must be at least 1".to_string())),
            Some(k) => Ok(k.min(self.config.max_top_k)),
            None => Ok(self.config.default_top_k.min(self.config.max_top_k)),
        }
    }

    async fn fetch_catalog(&self) -> Result<Vec<SiteRecord>> {
        with_timeout(self.config.fetch_timeout, self.store.fetch_all()).await
    }

    async fn embed_query(&self, query: &str) -> Result<Embedding> {
        let embedder = Arc::clone(&self.embedder);
        let query = query.to_string();
        tokio::task::spawn_blocking(move || embedder.embed_query(&query))
            .await
            .map_err(|e| Error::Embedding(format!("embedding task failed: {e}")))?
    }

    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Embedding>> {
        let embedder = Arc::clone(&self.embedder);
        tokio::task::spawn_blocking(move || {
            let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
            embedder.embed_documents(&texts)
        })
        .await
        .map_err(|e| Error::Embedding(format!("embedding task failed: {e}")))?
    }

    async fn prepare(&self, submission: SiteSubmission) -> Prepared {
        let name = submission.name.trim().to_string();
        let original_description = submission.description;

        let description = match self.enhancer.enhance(&name, &original_description).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!(site = %name, "enhancer returned an empty description, keeping original");
                original_description.clone()
            }
            Err(e) => {
                tracing::warn!(site = %name, error = %e, "description enhancement failed, keeping original");
                original_description.clone()
            }
        };

        let photo_url = match submission.photo_url.filter(|url| !url.trim().is_empty()) {
            Some(url) => Some(url),
            None => match self
                .photos
                .locate(&name, submission.latitude, submission.longitude)
                .await
            {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(site = %name, error = %e, "photo lookup failed");
                    None
                }
            },
        };

        Prepared {
            name,
            original_description,
            description,
            latitude: submission.latitude,
            longitude: submission.longitude,
            photo_url,
        }
    }
}

/// Every site in `store` with usable coordinates, ordered by name.
///
/// Needs no embedder, so listing works without loading a model. Rows whose
/// coordinates do not parse are left out.
pub async fn list_catalog<S: CatalogStore>(store: &S, fetch_timeout: Duration) -> Result<Vec<Site>> {
    let records = with_timeout(fetch_timeout, store.fetch_all()).await?;

    let mut sites: Vec<Site> = records
        .iter()
        .filter_map(|record| match record.to_site() {
            Ok(site) => Some(site),
            Err(e) => {
                tracing::warn!(error = %e, "leaving site out of listing");
                None
            }
        })
        .collect();
    sites.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(sites)
}

async fn with_timeout<T>(limit: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout = ?limit, "catalog fetch timed out");
            Err(Error::CatalogTimeout(limit))
        }
    }
}
