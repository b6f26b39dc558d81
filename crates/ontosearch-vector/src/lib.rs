//! Vector candidate source backed by a Qdrant collection over its REST API.
//!
//! Documents are stored as points whose id is the numeric manual id and
//! whose payload carries the title plus the extracted entities.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use ontosearch_core::config::VectorSettings;
use ontosearch_core::error::{Error, SourceFailure};
use ontosearch_core::http::build_http_client;
use ontosearch_core::traits::VectorIndexer;
use ontosearch_core::types::{ManualRecord, VectorCandidate};

pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use search::parse_search_response;
pub use writer::{payload_for, point_for};

pub struct QdrantIndexer {
    pub(crate) client: reqwest::Client,
    pub(crate) base: Url,
    pub(crate) collection: String,
    pub(crate) timeout: Duration,
    pub(crate) batch_size: usize,
}

impl QdrantIndexer {
    pub fn new(settings: &VectorSettings) -> ontosearch_core::error::Result<Self> {
        let base = Url::parse(&settings.url)
            .map_err(|e| Error::InvalidConfig(format!("vector.url '{}': {e}", settings.url)))?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!("vector.url '{}' cannot carry a path", settings.url)));
        }
        if settings.collection.trim().is_empty() {
            return Err(Error::InvalidConfig("vector.collection must not be empty".into()));
        }
        Ok(Self {
            client: build_http_client(settings.timeout())?,
            base,
            collection: settings.collection.clone(),
            timeout: settings.timeout(),
            batch_size: settings.upsert_batch_size.max(1),
        })
    }

    /// `<base>/collections/<name>/<tail...>`, with every segment percent-encoded.
    pub(crate) fn endpoint(&self, tail: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("collections").push(&self.collection).extend(tail);
        }
        url
    }
}

#[async_trait]
impl VectorIndexer for QdrantIndexer {
    async fn index(&self, records: &[ManualRecord], embeddings: &[Vec<f32>]) -> Result<usize> {
        let dim = embeddings.first().map_or(0, Vec::len);
        if dim > 0 {
            self.ensure_collection(dim).await?;
        }
        self.upsert(records, embeddings).await
    }

    async fn search_vec(&self, vector: &[f32], k: usize) -> std::result::Result<Vec<VectorCandidate>, SourceFailure> {
        self.search_points(vector, k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str) -> VectorSettings {
        VectorSettings { url: url.into(), collection: "manuals v2".into(), timeout_ms: 500, upsert_batch_size: 0 }
    }

    #[test]
    fn endpoint_appends_encoded_segments() {
        let indexer = QdrantIndexer::new(&settings("http://qdrant:6333/")).expect("indexer");
        assert_eq!(
            indexer.endpoint(&["points", "search"]).as_str(),
            "http://qdrant:6333/collections/manuals%20v2/points/search"
        );
        assert_eq!(indexer.batch_size, 1);
    }

    #[test]
    fn rejects_unusable_urls() {
        assert!(matches!(QdrantIndexer::new(&settings("not a url")), Err(Error::InvalidConfig(_))));
        assert!(matches!(QdrantIndexer::new(&settings("mailto:ops@example.org")), Err(Error::InvalidConfig(_))));
    }
}
