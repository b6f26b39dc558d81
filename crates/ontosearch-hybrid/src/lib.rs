//! Hybrid retrieval: union of vector and graph candidates with vector
//! precedence, plus the ingestion path that feeds both stores.

pub mod engine;
pub mod fusion;

pub use engine::{DefaultEngine, HybridSearchEngine};
pub use fusion::merge;
