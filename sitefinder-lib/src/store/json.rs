use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::sync::Mutex;

use crate::site::SiteRecord;
use crate::store::CatalogStore;
use crate::{Error, Result};

/// Catalog kept as a JSON array of rows in a single file.
///
/// A missing file is an empty catalog. Rows that do not deserialize are
/// skipped on read but left untouched on disk, so a later insert never
/// drops data it could not interpret.
pub struct JsonCatalog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonCatalog {
    /// Create a catalog backed by `path`. The file is not touched until used.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_rows(&self) -> Result<Vec<Value>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::CatalogUnavailable(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )))
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            Error::CatalogUnavailable(format!(
                "{} is not a JSON array of sites: {e}",
                self.path.display()
            ))
        })
    }

    async fn write_rows(&self, rows: &[Value]) -> Result<()> {
        let body = serde_json::to_vec_pretty(rows).map_err(|e| Error::Store(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| Error::Store(format!("cannot write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::Store(format!("cannot replace {}: {e}", self.path.display())))
    }
}

impl CatalogStore for JsonCatalog {
    async fn fetch_all(&self) -> Result<Vec<SiteRecord>> {
        let rows = self.read_rows().await?;
        let total = rows.len();

        let records: Vec<SiteRecord> = rows
            .into_iter()
            .enumerate()
            .filter_map(|(i, row)| match serde_json::from_value(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(row = i, error = %e, "skipping unreadable catalog row");
                    None
                }
            })
            .collect();

        tracing::debug!(
            path = %self.path.display(),
            rows = total,
            records = records.len(),
            "loaded catalog"
        );
        Ok(records)
    }

    async fn insert(&self, record: SiteRecord) -> Result<SiteRecord> {
        let _guard = self.write_lock.lock().await;

        let mut rows = self.read_rows().await.map_err(|e| Error::Store(e.to_string()))?;
        let taken = rows
            .iter()
            .any(|row| row.get("site_name").and_then(Value::as_str) == Some(record.name.as_str()));
        if taken {
            return Err(Error::DuplicateSite(record.name));
        }

        rows.push(serde_json::to_value(&record).map_err(|e| Error::Store(e.to_string()))?);
        self.write_rows(&rows).await?;

        Ok(record)
    }
}
