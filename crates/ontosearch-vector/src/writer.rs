use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::info;

use ontosearch_core::data_processor::{extract_entities, validate_record};
use ontosearch_core::http::ensure_success;
use ontosearch_core::types::{ManualRecord, Payload};

use crate::schema::{PointId, PointStruct, UpsertRequest};
use crate::QdrantIndexer;

/// Point payload: the title and the entities extracted from the text.
pub fn payload_for(record: &ManualRecord) -> Payload {
    let entities = extract_entities(&record.text);
    let mut payload = Payload::new();
    payload.insert("title".into(), Value::String(record.title.clone()));
    payload.insert("failure_modes".into(), Value::from(entities.failure_modes));
    payload.insert("procedures".into(), Value::from(entities.procedures));
    payload
}

/// The point id is the numeric manual id; it must print back to the same
/// string the graph uses in the document IRI.
pub fn point_for(record: &ManualRecord, vector: &[f32]) -> Result<PointStruct> {
    validate_record(record).map_err(anyhow::Error::msg)?;
    let id: u64 = record.id.parse().with_context(|| format!("manual id '{}'", record.id))?;
    Ok(PointStruct { id: PointId::Num(id), vector: vector.to_vec(), payload: payload_for(record) })
}

impl QdrantIndexer {
    /// Upsert one point per record in batches, waiting for each batch to apply.
    pub async fn upsert(&self, records: &[ManualRecord], embeddings: &[Vec<f32>]) -> Result<usize> {
        if records.len() != embeddings.len() {
            bail!("{} records but {} embeddings", records.len(), embeddings.len());
        }
        if records.is_empty() {
            info!("no points to upsert");
            return Ok(0);
        }
        let mut url = self.endpoint(&["points"]);
        url.query_pairs_mut().append_pair("wait", "true");

        let pb = ProgressBar::new(records.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} points {msg}")?
                .progress_chars("#>-"),
        );
        let mut written = 0usize;
        for (records, vectors) in records.chunks(self.batch_size).zip(embeddings.chunks(self.batch_size)) {
            let points = records.iter().zip(vectors).map(|(r, v)| point_for(r, v)).collect::<Result<Vec<_>>>()?;
            let count = points.len();
            let response = self
                .client
                .put(url.clone())
                .json(&UpsertRequest { points })
                .send()
                .await
                .with_context(|| format!("PUT {url}"))?;
            ensure_success(response).await.with_context(|| format!("upsert into '{}'", self.collection))?;
            written += count;
            pb.set_position(written as u64);
        }
        pb.finish_with_message("done");
        info!(collection = %self.collection, points = written, "vector store updated");
        Ok(written)
    }
}
