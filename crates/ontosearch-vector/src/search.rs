use tracing::debug;

use ontosearch_core::error::SourceFailure;
use ontosearch_core::http::{classify, ensure_success};
use ontosearch_core::types::{Payload, VectorCandidate};

use crate::schema::{SearchRequest, SearchResponse};
use crate::QdrantIndexer;

/// Decode a `points/search` response, keeping Qdrant's ranking order.
pub fn parse_search_response(body: &str) -> Result<Vec<VectorCandidate>, SourceFailure> {
    let parsed: SearchResponse = serde_json::from_str(body).map_err(|e| SourceFailure::Malformed(e.to_string()))?;
    Ok(parsed
        .result
        .into_iter()
        .map(|p| VectorCandidate { id: p.id.to_string(), score: p.score, payload: p.payload.unwrap_or_else(Payload::new) })
        .collect())
}

impl QdrantIndexer {
    pub async fn search_points(&self, vector: &[f32], k: usize) -> Result<Vec<VectorCandidate>, SourceFailure> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let url = self.endpoint(&["points", "search"]);
        let response = self
            .client
            .post(url)
            .json(&SearchRequest { vector, limit: k, with_payload: true })
            .send()
            .await
            .map_err(|e| classify(&e, self.timeout))?;
        let body = ensure_success(response).await?.text().await.map_err(|e| classify(&e, self.timeout))?;
        let mut hits = parse_search_response(&body)?;
        hits.truncate(k);
        debug!(count = hits.len(), "vector candidates");
        Ok(hits)
    }
}
