//! Catalog storage backends
//!
//! The catalog is owned by the store. Searching only ever reads a full
//! snapshot with [`CatalogStore::fetch_all`]; new sites arrive through
//! [`CatalogStore::insert`].
//!
//! # Storage Model
//!
//! Each stored row is a [`SiteRecord`]: display fields plus the embedding in
//! its serialized text form. Site names are unique within a catalog.
//!
//! # Usage
//!
//! ```ignore
//! use sitefinder_lib::store::{CatalogStore, JsonCatalog};
//!
//! let store = JsonCatalog::new("sites.json");
//!
//! store.insert(record).await?;
//! let snapshot = store.fetch_all().await?;
//! ```

use std::future::Future;

use crate::site::SiteRecord;
use crate::Result;

/// Trait for catalog storage backends
pub trait CatalogStore: Send + Sync {
    /// Every stored row, in insertion order
    ///
    /// Fails with [`crate::Error::CatalogUnavailable`] if the catalog cannot
    /// be read at all.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<SiteRecord>>> + Send;

    /// Store a new row and return it as stored
    ///
    /// Fails with [`crate::Error::DuplicateSite`] if the name is taken.
    fn insert(&self, record: SiteRecord) -> impl Future<Output = Result<SiteRecord>> + Send;
}

mod json;
mod memory;

pub use json::*;
pub use memory::*;
