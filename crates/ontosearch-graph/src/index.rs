use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use ontosearch_core::config::GraphSettings;
use ontosearch_core::data_processor::extract_entities;
use ontosearch_core::error::SourceFailure;
use ontosearch_core::http::{build_http_client, classify, ensure_success};
use ontosearch_core::traits::GraphIndexer;
use ontosearch_core::types::{GraphCandidate, ManualRecord};

use crate::sparql_utils::{doc_iri, failure_iri, onto, procedure_iri, string_literal, RDF_TYPE};

/// Records per SPARQL Update request.
const UPDATE_BATCH: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Iri(String),
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: Object,
}

impl Triple {
    fn iri(subject: &str, predicate: String, object: String) -> Self {
        Self { subject: subject.to_string(), predicate, object: Object::Iri(object) }
    }

    fn literal(subject: &str, predicate: String, value: &str) -> Self {
        Self { subject: subject.to_string(), predicate, object: Object::Literal(value.to_string()) }
    }

    pub fn to_ntriple(&self) -> String {
        let object = match &self.object {
            Object::Iri(iri) => format!("<{iri}>"),
            Object::Literal(value) => string_literal(value),
        };
        format!("<{}> <{}> {} .", self.subject, self.predicate, object)
    }
}

/// Ontology triples for one manual: the document node, its title and text,
/// and one node per extracted failure mode and procedure.
pub fn triples_for(record: &ManualRecord) -> Vec<Triple> {
    let doc = doc_iri(&record.id);
    let entities = extract_entities(&record.text);
    let mut triples = vec![
        Triple::iri(&doc, RDF_TYPE.to_string(), onto("Document")),
        Triple::literal(&doc, onto("title"), &record.title),
        Triple::literal(&doc, onto("text"), &record.text),
    ];
    for failure in &entities.failure_modes {
        let node = failure_iri(failure);
        triples.push(Triple::iri(&node, RDF_TYPE.to_string(), onto("FailureMode")));
        triples.push(Triple::iri(&doc, onto("canCause"), node));
    }
    for procedure in &entities.procedures {
        let node = procedure_iri(procedure);
        triples.push(Triple::iri(&node, RDF_TYPE.to_string(), onto("Procedure")));
        triples.push(Triple::iri(&doc, onto("hasProcedure"), node));
    }
    triples
}

/// One update request that drops each document's previous statements and
/// inserts the new ones, so re-indexing an id overwrites it.
pub fn build_update(records: &[ManualRecord]) -> (String, usize) {
    let mut update = String::new();
    let mut data = String::new();
    let mut count = 0usize;
    for record in records {
        update.push_str(&format!("DELETE WHERE {{ <{}> ?p ?o }} ;\n", doc_iri(&record.id)));
        for triple in triples_for(record) {
            data.push_str("  ");
            data.push_str(&triple.to_ntriple());
            data.push('\n');
            count += 1;
        }
    }
    update.push_str("INSERT DATA {\n");
    update.push_str(&data);
    update.push('}');
    (update, count)
}

/// Graph backend speaking the SPARQL 1.1 protocol (Fuseki and friends).
pub struct SparqlIndexer {
    pub(crate) client: reqwest::Client,
    pub(crate) query_endpoint: Url,
    pub(crate) update_endpoint: Url,
    pub(crate) candidate_limit: usize,
    pub(crate) timeout: Duration,
}

impl SparqlIndexer {
    pub fn new(settings: &GraphSettings) -> ontosearch_core::error::Result<Self> {
        let parse = |name: &str, raw: &str| {
            Url::parse(raw).map_err(|e| ontosearch_core::error::Error::InvalidConfig(format!("{name} '{raw}': {e}")))
        };
        Ok(Self {
            client: build_http_client(settings.timeout())?,
            query_endpoint: parse("graph.query_endpoint", &settings.query_endpoint)?,
            update_endpoint: parse("graph.update_endpoint", &settings.update_endpoint)?,
            candidate_limit: settings.candidate_limit,
            timeout: settings.timeout(),
        })
    }

    pub async fn index_records(&self, records: &[ManualRecord]) -> Result<usize> {
        let mut written = 0usize;
        for batch in records.chunks(UPDATE_BATCH) {
            let (update, count) = build_update(batch);
            debug!(records = batch.len(), triples = count, "posting SPARQL update");
            self.post_update(update).await.with_context(|| format!("SPARQL update to {} failed", self.update_endpoint))?;
            written += count;
        }
        info!(records = records.len(), triples = written, "graph store updated");
        Ok(written)
    }

    async fn post_update(&self, update: String) -> std::result::Result<(), SourceFailure> {
        let response = self
            .client
            .post(self.update_endpoint.clone())
            .form(&[("update", update)])
            .send()
            .await
            .map_err(|e| classify(&e, self.timeout))?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl GraphIndexer for SparqlIndexer {
    async fn index(&self, records: &[ManualRecord]) -> Result<usize> {
        self.index_records(records).await
    }

    async fn candidates(&self, tokens: &[String]) -> std::result::Result<Vec<GraphCandidate>, SourceFailure> {
        self.select_candidates(tokens).await
    }
}
