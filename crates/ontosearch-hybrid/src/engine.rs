use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use ontosearch_core::config::Settings;
use ontosearch_core::data_processor::{validate_record, DataProcessor};
use ontosearch_core::error::SourceFailure;
use ontosearch_core::traits::{Embedder, GraphIndexer, SearchEngine, VectorIndexer};
use ontosearch_core::types::{
    GraphCandidate, IndexReport, IndexStage, ManualRecord, Query, SearchResponse, VectorCandidate,
};
use ontosearch_embed::get_default_embedder;
use ontosearch_graph::SparqlIndexer;
use ontosearch_vector::QdrantIndexer;

use crate::fusion::merge;

pub struct HybridSearchEngine<G, V>
where
    G: GraphIndexer,
    V: VectorIndexer,
{
    graph: G,
    vector: V,
    embedder: Arc<dyn Embedder>,
    graph_timeout: Duration,
    vector_timeout: Duration,
}

/// The engine wired to Fuseki and Qdrant.
pub type DefaultEngine = HybridSearchEngine<SparqlIndexer, QdrantIndexer>;

impl DefaultEngine {
    /// Build both HTTP clients and load the embedder once.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let graph = SparqlIndexer::new(&settings.graph)?;
        let vector = QdrantIndexer::new(&settings.vector)?;
        let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder(&settings.embedding)?);
        Ok(Self::new(graph, vector, embedder)
            .with_timeouts(settings.graph.timeout(), settings.vector.timeout()))
    }
}

impl<G, V> HybridSearchEngine<G, V>
where
    G: GraphIndexer,
    V: VectorIndexer,
{
    pub fn new(graph: G, vector: V, embedder: Arc<dyn Embedder>) -> Self {
        let defaults = Settings::default();
        Self {
            graph,
            vector,
            embedder,
            graph_timeout: defaults.graph.timeout(),
            vector_timeout: defaults.vector.timeout(),
        }
    }

    pub fn with_timeouts(mut self, graph: Duration, vector: Duration) -> Self {
        self.graph_timeout = graph;
        self.vector_timeout = vector;
        self
    }

    pub fn graph(&self) -> &G { &self.graph }

    /// Query both sources concurrently and merge. A failing source
    /// contributes nothing; only invalid input is an error.
    pub async fn search(&self, text: &str, top_k: usize) -> ontosearch_core::error::Result<SearchResponse> {
        let query = Query::new(text, top_k)?;
        let start = Instant::now();
        let (vector, graph) = tokio::join!(self.vector_candidates(&query), self.graph_candidates(&query));
        let vector = vector.unwrap_or_else(|failure| {
            warn!(%failure, "vector source failed, continuing without it");
            Vec::new()
        });
        let graph = graph.unwrap_or_else(|failure| {
            warn!(%failure, "graph source failed, continuing without it");
            Vec::new()
        });
        let results = merge(&vector, &graph);
        info!(
            vector = vector.len(),
            graph = graph.len(),
            merged = results.len(),
            ms = start.elapsed().as_millis(),
            "search complete"
        );
        Ok(SearchResponse { query: query.text().to_string(), results })
    }

    async fn vector_candidates(&self, query: &Query) -> Result<Vec<VectorCandidate>, SourceFailure> {
        let branch = async {
            let embedder = Arc::clone(&self.embedder);
            let text = query.text().to_string();
            let vector = tokio::task::spawn_blocking(move || embedder.embed(&text))
                .await
                .map_err(|e| SourceFailure::Embedding(e.to_string()))?
                .map_err(|e| SourceFailure::Embedding(format!("{e:#}")))?;
            self.vector.search_vec(&vector, query.top_k()).await
        };
        tokio::time::timeout(self.vector_timeout, branch)
            .await
            .map_err(|_| SourceFailure::Timeout(self.vector_timeout))?
    }

    async fn graph_candidates(&self, query: &Query) -> Result<Vec<GraphCandidate>, SourceFailure> {
        if query.tokens().is_empty() {
            debug!("query has no tokens, graph source skipped");
            return Ok(Vec::new());
        }
        tokio::time::timeout(self.graph_timeout, self.graph.candidates(query.tokens()))
            .await
            .map_err(|_| SourceFailure::Timeout(self.graph_timeout))?
    }

    /// Push records into the graph store, then embed and upsert them.
    /// Stops at the first failing stage; earlier writes are kept.
    pub async fn index(&self, records: &[ManualRecord]) -> IndexReport {
        let mut report = IndexReport::new();
        report.records_read = records.len();
        let mut accepted = Vec::with_capacity(records.len());
        for record in records {
            match validate_record(record) {
                Ok(()) => accepted.push(record.clone()),
                Err(reason) => {
                    report.records_rejected += 1;
                    report.diagnostics.push(format!("record '{}': {reason}", record.id));
                }
            }
        }
        self.write(accepted, report).await
    }

    /// Read a manuals CSV and index every well-formed row.
    pub async fn index_csv(&self, path: &Path) -> IndexReport {
        let processed = match DataProcessor::new().process_csv(path) {
            Ok(processed) => processed,
            Err(e) => return IndexReport::new().fail(IndexStage::ReadInput, e.to_string()),
        };
        let mut report = IndexReport::new();
        report.records_read = processed.records.len() + processed.rejected.len();
        report.records_rejected = processed.rejected.len();
        report.diagnostics.extend(processed.rejected);
        self.write(processed.records, report).await
    }

    async fn write(&self, records: Vec<ManualRecord>, mut report: IndexReport) -> IndexReport {
        if records.is_empty() {
            info!("nothing to index");
            return report;
        }
        match self.graph.index(&records).await {
            Ok(triples) => report.triples_written = triples,
            Err(e) => return report.fail(IndexStage::GraphWrite, format!("{e:#}")),
        }

        let embedder = Arc::clone(&self.embedder);
        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        let embeddings = match tokio::task::spawn_blocking(move || embedder.embed_batch(&texts)).await {
            Ok(Ok(embeddings)) => embeddings,
            Ok(Err(e)) => return report.fail(IndexStage::Embedding, format!("{e:#}")),
            Err(e) => return report.fail(IndexStage::Embedding, e.to_string()),
        };
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.embedder.dim()) {
            let message = format!("embedding has {} dims, expected {}", bad.len(), self.embedder.dim());
            return report.fail(IndexStage::Embedding, message);
        }

        match self.vector.index(&records, &embeddings).await {
            Ok(points) => report.vectors_upserted = points,
            Err(e) => return report.fail(IndexStage::VectorWrite, format!("{e:#}")),
        }
        info!(
            records = records.len(),
            triples = report.triples_written,
            vectors = report.vectors_upserted,
            rejected = report.records_rejected,
            "indexing complete"
        );
        report
    }
}

#[async_trait]
impl<G, V> SearchEngine for HybridSearchEngine<G, V>
where
    G: GraphIndexer,
    V: VectorIndexer,
{
    async fn index(&self, records: &[ManualRecord]) -> IndexReport {
        Self::index(self, records).await
    }

    async fn search(&self, query: &str, top_k: usize) -> ontosearch_core::error::Result<SearchResponse> {
        Self::search(self, query, top_k).await
    }
}
