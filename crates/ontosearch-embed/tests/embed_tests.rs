use ontosearch_core::config::EmbeddingSettings;
use ontosearch_embed::{get_default_embedder, Embedder, HashingEmbedder};

#[test]
fn hashing_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { model_dir: None, use_hashing: true, hashing_dim: 384 };
    let embedder = get_default_embedder(&settings).expect("embedder");
    let texts = vec!["bearing_fault seal_wear".to_string(), "bearing_fault seal_wear".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim follows settings");
    assert_eq!(embedder.dim(), 384);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn hashing_embedder_separates_different_texts() {
    let embedder = HashingEmbedder::new(64);
    let a = embedder.embed("pump bearing").expect("embed");
    let b = embedder.embed("conveyor belt").expect("embed");
    let same = embedder.embed("PUMP Bearing").expect("embed");
    assert_ne!(a, b);
    assert_eq!(a, same, "tokens are case-folded before hashing");
}
