use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use ontosearch_core::error::SourceFailure;
use ontosearch_core::http::{classify, ensure_success};
use ontosearch_core::types::GraphCandidate;

use crate::index::SparqlIndexer;
use crate::sparql_utils::{build_select_query, matches_all_tokens};

const RESULTS_JSON: &str = "application/sparql-results+json";

#[derive(Debug, Deserialize)]
struct SelectResults {
    results: Bindings,
}

#[derive(Debug, Deserialize)]
struct Bindings {
    bindings: Vec<HashMap<String, Term>>,
}

#[derive(Debug, Deserialize)]
struct Term {
    value: String,
}

/// Decode a SPARQL JSON result set with `?doc ?title ?text` bindings.
/// The candidate id is the last path segment of the document IRI.
pub fn parse_candidates(body: &str) -> Result<Vec<GraphCandidate>, SourceFailure> {
    let parsed: SelectResults = serde_json::from_str(body).map_err(|e| SourceFailure::Malformed(e.to_string()))?;
    parsed
        .results
        .bindings
        .into_iter()
        .map(|mut row| {
            let mut take = |var: &str| {
                row.remove(var)
                    .map(|t| t.value)
                    .ok_or_else(|| SourceFailure::Malformed(format!("binding without ?{var}")))
            };
            let doc = take("doc")?;
            let title = take("title")?;
            let text = take("text")?;
            let id = doc.rsplit('/').next().unwrap_or_default().to_string();
            Ok(GraphCandidate { id, title, text })
        })
        .collect()
}

impl SparqlIndexer {
    pub async fn select_candidates(&self, tokens: &[String]) -> Result<Vec<GraphCandidate>, SourceFailure> {
        if tokens.is_empty() {
            debug!("no query tokens, skipping graph lookup");
            return Ok(Vec::new());
        }
        let query = build_select_query(tokens, self.candidate_limit);
        let response = self
            .client
            .post(self.query_endpoint.clone())
            .header(reqwest::header::ACCEPT, RESULTS_JSON)
            .form(&[("query", query)])
            .send()
            .await
            .map_err(|e| classify(&e, self.timeout))?;
        let body = ensure_success(response).await?.text().await.map_err(|e| classify(&e, self.timeout))?;
        let mut candidates = parse_candidates(&body)?;
        let before = candidates.len();
        candidates.retain(|c| matches_all_tokens(&c.text, tokens));
        if candidates.len() != before {
            warn!(dropped = before - candidates.len(), "graph endpoint returned rows that miss a query token");
        }
        candidates.truncate(self.candidate_limit);
        debug!(count = candidates.len(), "graph candidates");
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_candidates_reads_bindings() {
        let body = r#"{
          "head": {"vars": ["doc", "title", "text"]},
          "results": {"bindings": [
            {"doc": {"type": "uri", "value": "http://example.org/resource/doc/2"},
             "title": {"type": "literal", "value": "T2"},
             "text": {"type": "literal", "value": "bearing_fault seal_wear"}}
          ]}
        }"#;
        let candidates = parse_candidates(body).expect("parse");
        assert_eq!(candidates, vec![GraphCandidate { id: "2".into(), title: "T2".into(), text: "bearing_fault seal_wear".into() }]);
    }

    #[test]
    fn missing_variable_is_malformed() {
        let body = r#"{"results": {"bindings": [{"doc": {"type": "uri", "value": "http://x/doc/1"}}]}}"#;
        assert!(matches!(parse_candidates(body), Err(SourceFailure::Malformed(_))));
        assert!(matches!(parse_candidates("<html>"), Err(SourceFailure::Malformed(_))));
    }
}
