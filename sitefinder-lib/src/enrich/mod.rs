//! Enrichment applied to new sites before they are stored
//!
//! A submitted description may be rewritten (e.g. by a text model) and a
//! photo may be looked up by name and location. Both are optional services:
//! when one fails, the submission continues with the original description
//! or without a photo.
//!
//! Both seams are async so implementations backed by network services run
//! on the caller's runtime without blocking it.

use std::future::Future;

use crate::Result;

/// Rewrites a site description before it is embedded and stored.
pub trait DescriptionEnhancer: Send + Sync {
    fn enhance(
        &self,
        name: &str,
        description: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Finds a photo reference for a site.
pub trait PhotoLocator: Send + Sync {
    /// Resolves to `Ok(None)` when no photo is known.
    fn locate(
        &self,
        name: &str,
        latitude: f64,
        longitude: f64,
    ) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Keeps descriptions as submitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl DescriptionEnhancer for Verbatim {
    async fn enhance(&self, _name: &str, description: &str) -> Result<String> {
        Ok(description.trim().to_string())
    }
}

/// Never finds a photo.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPhotos;

impl PhotoLocator for NoPhotos {
    async fn locate(&self, _name: &str, _latitude: f64, _longitude: f64) -> Result<Option<String>> {
        Ok(None)
    }
}
