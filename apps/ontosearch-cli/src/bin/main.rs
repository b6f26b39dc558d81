use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ontosearch_core::config::{expand_path, Settings};
use ontosearch_core::data_processor::extract_entities;
use ontosearch_core::types::{IndexStatus, SearchResponse};
use ontosearch_hybrid::DefaultEngine;

#[derive(Parser, Debug)]
#[command(author, version, about = "ontosearch: hybrid graph + vector search over equipment manuals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search both stores and print the merged results.
    Search {
        query: String,
        /// Nearest neighbours requested from the vector store.
        #[arg(long)]
        top_k: Option<usize>,
        /// Print the response as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Load a manuals CSV into the graph and vector stores.
    Index {
        #[arg(long)]
        csv: Option<PathBuf>,
        /// SPARQL update endpoint, overrides `graph.update_endpoint`.
        #[arg(long)]
        fuseki_update: Option<String>,
        /// Qdrant base URL, overrides `vector.url`.
        #[arg(long)]
        qdrant: Option<String>,
    },
    /// Print the failure modes and procedures found in a piece of text.
    Extract { text: String },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ONTOSEARCH_LOG").unwrap_or_else(|_| EnvFilter::new("ontosearch=info,warn"));
    let format = env::var("ONTOSEARCH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => registry.with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr)).init(),
        _ => registry.with(fmt::layer().compact().with_writer(std::io::stderr)).init(),
    }
}

fn print_results(response: &SearchResponse) {
    if response.results.is_empty() {
        println!("no results for \"{}\"", response.query);
        return;
    }
    for (rank, hit) in response.results.iter().enumerate() {
        let score = hit.score.map_or_else(|| "-".to_string(), |s| format!("{s:.4}"));
        let title = hit
            .title
            .clone()
            .or_else(|| hit.payload.as_ref().and_then(|p| p.get("title")).and_then(|t| t.as_str().map(str::to_string)))
            .unwrap_or_default();
        println!("{:>2}. [{:?}] {:>6} {:>8}  {}", rank + 1, hit.source, hit.id, score, title);
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Extract { text } => {
            println!("{}", serde_json::to_string_pretty(&extract_entities(&text))?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Search { query, top_k, json } => {
            let settings = Settings::load()?;
            let engine = DefaultEngine::from_settings(&settings)?;
            let response = engine.search(&query, top_k.unwrap_or(settings.search.default_top_k)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_results(&response);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Index { csv, fuseki_update, qdrant } => {
            let mut settings = Settings::load()?;
            if let Some(endpoint) = fuseki_update {
                settings.graph.update_endpoint = endpoint;
            }
            if let Some(url) = qdrant {
                settings.vector.url = url;
            }
            settings.validate()?;
            let csv = csv.unwrap_or_else(|| expand_path(&settings.search.default_csv));
            let engine = DefaultEngine::from_settings(&settings)?;
            let report = engine.index_csv(&csv).await;
            for line in &report.diagnostics {
                eprintln!("  {line}");
            }
            match &report.status {
                IndexStatus::Completed => info!(
                    records = report.records_read,
                    rejected = report.records_rejected,
                    triples = report.triples_written,
                    vectors = report.vectors_upserted,
                    "index complete"
                ),
                IndexStatus::Failed { stage, message } => error!(?stage, %message, "index failed"),
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::from(report.exit_code()))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
