use ontosearch_core::config::Settings;
use ontosearch_core::traits::GraphIndexer;
use ontosearch_core::types::tokenize;
use ontosearch_graph::SparqlIndexer;

// Query the graph store alone, bypassing fusion.
// Usage:
//   cargo run -p ontosearch-graph --example search -- 'bearing_fault seal_wear'

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let query = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: search '<query>'");
        std::process::exit(2)
    });
    let settings = Settings::load()?;
    let graph = SparqlIndexer::new(&settings.graph)?;
    let tokens = tokenize(&query);
    println!("Endpoint: {}", settings.graph.query_endpoint);
    println!("Tokens  : {:?}", tokens);
    match graph.candidates(&tokens).await {
        Ok(candidates) => {
            println!("\n{} candidates", candidates.len());
            for (i, c) in candidates.iter().enumerate() {
                println!("  {}. id={}  title={}", i + 1, c.id, c.title);
            }
        }
        Err(failure) => eprintln!("graph source failed: {failure}"),
    }
    Ok(())
}
