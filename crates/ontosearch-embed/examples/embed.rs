use ontosearch_core::config::Settings;
use ontosearch_embed::get_default_embedder;

fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let embedder = get_default_embedder(&settings.embedding)?;
    let texts = vec!["bearing_fault on pump".to_string(), "replace seal".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("B={} dim={}", embs.len(), embedder.dim());
    Ok(())
}
