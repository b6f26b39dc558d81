//! Domain types shared by the graph source, the vector source and the
//! fusion engine.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type DocId = String;
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// A validated search request.
///
/// `tokens` is derived once from `text`: whitespace split, lowercased,
/// duplicates dropped in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    tokens: Vec<String>,
    top_k: usize,
}

impl Query {
    pub fn new(text: impl Into<String>, top_k: usize) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(Error::Validation("query text must not be empty".to_string()));
        }
        if top_k == 0 {
            return Err(Error::Validation("top_k must be a positive integer".to_string()));
        }
        let tokens = tokenize(&text);
        Ok(Self { text, tokens, top_k })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

/// Case-insensitive whitespace tokenization used for graph filtering.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for raw in text.split_whitespace() {
        let token = raw.to_lowercase();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// A document matched by the symbolic graph filter. Carries no score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphCandidate {
    pub id: DocId,
    pub title: String,
    pub text: String,
}

/// A nearest-neighbour hit from the vector index.
///
/// `score` is a similarity: higher is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorCandidate {
    pub id: DocId,
    pub score: f32,
    #[serde(default)]
    pub payload: Payload,
}

/// Indicates which backend claimed a merged result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Vector,
    Graph,
}

/// One entry of the fused result list.
///
/// Vector hits carry `score` and `payload`; graph-only hits carry `title`
/// and `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedResult {
    pub id: DocId,
    pub source: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl From<&VectorCandidate> for MergedResult {
    fn from(hit: &VectorCandidate) -> Self {
        Self {
            id: hit.id.clone(),
            source: SourceKind::Vector,
            score: Some(hit.score),
            title: None,
            text: None,
            payload: Some(hit.payload.clone()),
        }
    }
}

impl From<&GraphCandidate> for MergedResult {
    fn from(candidate: &GraphCandidate) -> Self {
        Self {
            id: candidate.id.clone(),
            source: SourceKind::Graph,
            score: None,
            title: Some(candidate.title.clone()),
            text: Some(candidate.text.clone()),
            payload: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<MergedResult>,
}

/// One row of a manuals CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualRecord {
    pub id: DocId,
    pub title: String,
    pub text: String,
}

/// Ontology tags pulled out of a manual's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub failure_modes: Vec<String>,
    pub procedures: Vec<String>,
}

/// Where an indexing run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStage {
    ReadInput,
    GraphWrite,
    Embedding,
    VectorWrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IndexStatus {
    Completed,
    Failed { stage: IndexStage, message: String },
}

/// Outcome of an indexing run. Writes that happened before a failure are
/// kept; re-running with corrected input overwrites by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    pub status: IndexStatus,
    pub records_read: usize,
    pub records_rejected: usize,
    pub triples_written: usize,
    pub vectors_upserted: usize,
    pub diagnostics: Vec<String>,
}

impl IndexReport {
    pub fn new() -> Self {
        Self {
            status: IndexStatus::Completed,
            records_read: 0,
            records_rejected: 0,
            triples_written: 0,
            vectors_upserted: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn fail(mut self, stage: IndexStage, message: impl Into<String>) -> Self {
        let message = message.into();
        self.diagnostics.push(format!("{stage:?}: {message}"));
        self.status = IndexStatus::Failed { stage, message };
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == IndexStatus::Completed
    }

    /// Process exit status for the indexing run.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }
}

impl Default for IndexReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_folds_case_and_drops_duplicates() {
        assert_eq!(tokenize("Bearing_Fault  seal_wear bearing_fault"), vec!["bearing_fault", "seal_wear"]);
        assert!(tokenize("   \t ").is_empty());
    }

    #[test]
    fn query_rejects_empty_text_and_zero_top_k() {
        assert!(matches!(Query::new("", 5), Err(Error::Validation(_))));
        assert!(matches!(Query::new("pump", 0), Err(Error::Validation(_))));
        let q = Query::new("Pump seal", 3).expect("valid query");
        assert_eq!(q.tokens(), ["pump", "seal"]);
        assert_eq!(q.top_k(), 3);
    }

    #[test]
    fn whitespace_query_is_valid_with_no_tokens() {
        let q = Query::new("   ", 5).expect("whitespace is accepted");
        assert!(q.tokens().is_empty());
    }

    #[test]
    fn merged_result_omits_absent_fields() {
        let graph = GraphCandidate { id: "3".into(), title: "T3".into(), text: "...".into() };
        let json = serde_json::to_value(MergedResult::from(&graph)).expect("serialize");
        assert_eq!(json, serde_json::json!({"id": "3", "source": "graph", "title": "T3", "text": "..."}));
    }

    #[test]
    fn failed_report_has_nonzero_exit_code() {
        let report = IndexReport::new().fail(IndexStage::GraphWrite, "connection refused");
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(IndexReport::new().is_success());
        assert_eq!(IndexReport::new().exit_code(), 0);
    }
}
