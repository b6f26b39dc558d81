//! ontosearch-graph
//!
//! Symbolic candidate source over an RDF store: SPARQL SELECT for
//! token-filtered candidates and SPARQL Update for loading manuals.

pub mod sparql_utils;
pub mod index;
pub mod search;

pub use index::{SparqlIndexer, Triple, build_update, triples_for};
pub use search::parse_candidates;
