use anyhow::Result;

use ontosearch_core::config::Settings;
use ontosearch_core::traits::VectorIndexer;
use ontosearch_embed::get_default_embedder;
use ontosearch_vector::QdrantIndexer;

#[tokio::main]
async fn main() -> Result<()> {
    let query = std::env::args().nth(1).unwrap_or_else(|| "bearing noise".to_string());
    let settings = Settings::load()?;
    let embedder = get_default_embedder(&settings.embedding)?;
    let indexer = QdrantIndexer::new(&settings.vector)?;
    let vector = embedder.embed(&query)?;
    match indexer.search_vec(&vector, settings.search.default_top_k).await {
        Ok(hits) => {
            for hit in hits {
                println!("{:>8} {:.4} {}", hit.id, hit.score, serde_json::Value::Object(hit.payload));
            }
        }
        Err(e) => eprintln!("vector search failed: {e}"),
    }
    Ok(())
}
