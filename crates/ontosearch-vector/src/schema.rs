//! Qdrant REST wire types.

use serde::{Deserialize, Serialize};
use std::fmt;

use ontosearch_core::types::Payload;

pub const DISTANCE: &str = "Cosine";

/// Qdrant point ids are unsigned integers or UUID strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(String),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Uuid(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub vector: &'a [f32],
    pub limit: usize,
    pub with_payload: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
pub struct ScoredPoint {
    pub id: PointId,
    pub score: f32,
    #[serde(default)]
    pub payload: Option<Payload>,
}

#[derive(Debug, Serialize)]
pub struct PointStruct {
    pub id: PointId,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

#[derive(Debug, Serialize)]
pub struct UpsertRequest {
    pub points: Vec<PointStruct>,
}

#[derive(Debug, Serialize)]
pub struct VectorParams {
    pub size: usize,
    pub distance: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CreateCollection {
    pub vectors: VectorParams,
}

impl CreateCollection {
    pub fn cosine(size: usize) -> Self {
        Self { vectors: VectorParams { size, distance: DISTANCE } }
    }
}
