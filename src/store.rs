//! The quote store seam.
//!
//! The pipeline never owns quote persistence; it consumes a read-only
//! lookup. [`QuoteStore`] is the trait boundary, with two implementations:
//! [`JsonDirStore`] for the CLI (one JSON file per quote) and
//! [`MemoryStore`] for embedders and tests.

use crate::error::QuoteDocError;
use crate::quote::QuoteRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Read-only lookup of quote records by identifier.
///
/// `Ok(None)` means the identifier does not resolve; `Err` means the store
/// itself failed. The orchestrator treats both the same way (`NotFound`),
/// so implementations should not strain to distinguish them.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<Option<QuoteRecord>, QuoteDocError>;
}

/// A directory of `<id>.json` files, one per quote.
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl QuoteStore for JsonDirStore {
    async fn fetch(&self, id: &str) -> Result<Option<QuoteRecord>, QuoteDocError> {
        // Identifiers become file names; anything that could escape the
        // directory is simply not a valid id.
        if id.is_empty() || id.contains(['/', '\\', '.']) {
            return Ok(None);
        }

        let path = self.dir.join(format!("{id}.json"));
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no quote file at {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(QuoteDocError::StoreFailed {
                    id: id.to_string(),
                    detail: e.to_string(),
                })
            }
        };

        let quote: QuoteRecord =
            serde_json::from_slice(&bytes).map_err(|e| QuoteDocError::StoreFailed {
                id: id.to_string(),
                detail: format!("malformed quote record: {e}"),
            })?;
        Ok(Some(quote))
    }
}

/// An in-memory store backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryStore {
    quotes: HashMap<String, QuoteRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, quote: QuoteRecord) {
        self.quotes.insert(quote.id.clone(), quote);
    }
}

impl FromIterator<QuoteRecord> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = QuoteRecord>>(iter: I) -> Self {
        Self {
            quotes: iter
                .into_iter()
                .map(|q| (q.id.clone(), q))
                .collect(),
        }
    }
}

#[async_trait]
impl QuoteStore for MemoryStore {
    async fn fetch(&self, id: &str) -> Result<Option<QuoteRecord>, QuoteDocError> {
        Ok(self.quotes.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::{ClientInfo, TourInfo};

    fn sample(id: &str) -> QuoteRecord {
        QuoteRecord {
            id: id.to_string(),
            client: ClientInfo {
                name: "Ada".into(),
                starting_day: None,
                ending_day: None,
            },
            tour: TourInfo {
                title: "Sample".into(),
                description: String::new(),
                cover_image: None,
                start_place: None,
                end_place: None,
                start_coordinates: None,
                end_coordinates: None,
            },
            days: Vec::new(),
            pricing: Default::default(),
            payment_terms: None,
            inclusions: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store: MemoryStore = [sample("q-1")].into_iter().collect();
        assert!(store.fetch("q-1").await.unwrap().is_some());
        assert!(store.fetch("q-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn json_dir_store_reads_and_misses() {
        let dir = tempfile::tempdir().unwrap();
        let quote = sample("q-file");
        tokio::fs::write(
            dir.path().join("q-file.json"),
            serde_json::to_vec(&quote).unwrap(),
        )
        .await
        .unwrap();

        let store = JsonDirStore::new(dir.path());
        let found = store.fetch("q-file").await.unwrap();
        assert_eq!(found.map(|q| q.id), Some("q-file".to_string()));
        assert!(store.fetch("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn json_dir_store_rejects_path_traversal_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        assert!(store.fetch("../etc/passwd").await.unwrap().is_none());
        assert!(store.fetch("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn json_dir_store_flags_malformed_records() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("bad.json"), b"{not json")
            .await
            .unwrap();
        let store = JsonDirStore::new(dir.path());
        let err = store.fetch("bad").await.unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }
}
