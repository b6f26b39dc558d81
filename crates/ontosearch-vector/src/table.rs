use anyhow::{bail, Context, Result};
use reqwest::StatusCode;
use tracing::{debug, info};

use ontosearch_core::http::ensure_success;

use crate::schema::CreateCollection;
use crate::QdrantIndexer;

impl QdrantIndexer {
    /// Create the collection with cosine distance unless it already exists.
    pub async fn ensure_collection(&self, dim: usize) -> Result<()> {
        let url = self.endpoint(&[]);
        let response = self.client.get(url.clone()).send().await.with_context(|| format!("GET {url}"))?;
        match response.status() {
            status if status.is_success() => {
                debug!(collection = %self.collection, "collection exists");
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                info!(collection = %self.collection, dim, "creating collection");
                let created = self
                    .client
                    .put(url.clone())
                    .json(&CreateCollection::cosine(dim))
                    .send()
                    .await
                    .with_context(|| format!("PUT {url}"))?;
                ensure_success(created).await.with_context(|| format!("creating collection '{}'", self.collection))?;
                Ok(())
            }
            status => bail!("unexpected status {status} probing collection '{}'", self.collection),
        }
    }
}
