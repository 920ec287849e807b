use tokio::sync::RwLock;

use crate::site::SiteRecord;
use crate::store::CatalogStore;
use crate::{Error, Result};

/// In-memory catalog for development and testing.
///
/// Keeps rows in insertion order, which is also the order
/// [`fetch_all`](CatalogStore::fetch_all) returns them in.
pub struct MemoryCatalog {
    records: RwLock<Vec<SiteRecord>>,
}

impl MemoryCatalog {
    /// Create a new empty in-memory catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Create a catalog holding `records` as-is.
    ///
    /// No validation is done, so rows with broken coordinates or embeddings
    /// can be seeded.
    #[must_use]
    pub fn with_records(records: Vec<SiteRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore for MemoryCatalog {
    async fn fetch_all(&self) -> Result<Vec<SiteRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn insert(&self, record: SiteRecord) -> Result<SiteRecord> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.name == record.name) {
            return Err(Error::DuplicateSite(record.name));
        }
        records.push(record.clone());
        Ok(record)
    }
}
