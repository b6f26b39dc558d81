use async_trait::async_trait;

use crate::error::SourceFailure;
use crate::types::{GraphCandidate, IndexReport, ManualRecord, SearchResponse, VectorCandidate};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Symbolic side: a triple store holding the manuals ontology.
#[async_trait]
pub trait GraphIndexer: Send + Sync {
    /// Replace the triples of every record. Returns the number of triples written.
    async fn index(&self, records: &[ManualRecord]) -> anyhow::Result<usize>;

    /// Documents whose text contains every token (case-insensitive).
    async fn candidates(&self, tokens: &[String]) -> Result<Vec<GraphCandidate>, SourceFailure>;
}

/// Dense side: a nearest-neighbour index over record embeddings.
#[async_trait]
pub trait VectorIndexer: Send + Sync {
    /// Upsert one point per record. Returns the number of points written.
    async fn index(&self, records: &[ManualRecord], embeddings: &[Vec<f32>]) -> anyhow::Result<usize>;

    /// Up to `k` hits in descending similarity order.
    async fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<VectorCandidate>, SourceFailure>;
}

#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn index(&self, records: &[ManualRecord]) -> IndexReport;
    async fn search(&self, query: &str, top_k: usize) -> crate::error::Result<SearchResponse>;
}
