use std::collections::HashSet;

use ontosearch_core::types::{GraphCandidate, MergedResult, VectorCandidate};

/// Union-with-precedence merge.
///
/// Vector candidates come first in their supplied order, then graph
/// candidates whose id was not already emitted. Scores are never combined
/// and a graph hit never displaces a vector hit for the same id.
pub fn merge(vector: &[VectorCandidate], graph: &[GraphCandidate]) -> Vec<MergedResult> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(vector.len() + graph.len());
    let mut out = Vec::with_capacity(vector.len() + graph.len());
    for hit in vector {
        if seen.insert(hit.id.as_str()) {
            out.push(MergedResult::from(hit));
        }
    }
    for candidate in graph {
        if seen.insert(candidate.id.as_str()) {
            out.push(MergedResult::from(candidate));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontosearch_core::types::{Payload, SourceKind};

    fn v(id: &str, score: f32) -> VectorCandidate {
        VectorCandidate { id: id.into(), score, payload: Payload::new() }
    }

    fn g(id: &str, title: &str) -> GraphCandidate {
        GraphCandidate { id: id.into(), title: title.into(), text: "...".into() }
    }

    #[test]
    fn overlapping_id_is_reported_once_as_vector() {
        let merged = merge(&[v("1", 0.9), v("2", 0.7)], &[g("2", "T2"), g("3", "T3")]);
        let summary: Vec<(&str, SourceKind, Option<f32>)> =
            merged.iter().map(|r| (r.id.as_str(), r.source, r.score)).collect();
        assert_eq!(
            summary,
            vec![
                ("1", SourceKind::Vector, Some(0.9)),
                ("2", SourceKind::Vector, Some(0.7)),
                ("3", SourceKind::Graph, None),
            ]
        );
        assert_eq!(merged[2].title.as_deref(), Some("T3"));
        assert!(merged[1].title.is_none(), "graph fields never leak into a vector result");
    }

    #[test]
    fn empty_inputs_merge_to_nothing() {
        assert!(merge(&[], &[]).is_empty());
    }

    #[test]
    fn one_sided_inputs_pass_through() {
        let vector_only = merge(&[v("9", 0.2), v("4", 0.1)], &[]);
        assert!(vector_only.iter().all(|r| r.source == SourceKind::Vector));
        assert_eq!(vector_only.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), ["9", "4"]);

        let graph_only = merge(&[], &[g("5", "T5"), g("1", "T1")]);
        assert!(graph_only.iter().all(|r| r.source == SourceKind::Graph && r.score.is_none()));
        assert_eq!(graph_only.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), ["5", "1"]);
    }

    #[test]
    fn repeated_ids_within_a_source_keep_the_first() {
        let merged = merge(&[v("1", 0.9), v("1", 0.1)], &[g("2", "a"), g("2", "b")]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].score, Some(0.9));
        assert_eq!(merged[1].title.as_deref(), Some("a"));
    }

    #[test]
    fn serialized_results_omit_absent_fields() {
        let merged = merge(&[v("1", 0.5)], &[g("3", "T3")]);
        let json = serde_json::to_value(&merged).expect("json");
        assert_eq!(json[0]["source"], "vector");
        assert!(json[0].get("title").is_none());
        assert_eq!(json[1]["source"], "graph");
        assert!(json[1].get("score").is_none());
    }
}
