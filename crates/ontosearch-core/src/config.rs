//! Typed configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults, `ontosearch.toml`,
//! `ontosearch.<env>.toml`, the legacy `FUSEKI_*`/`QDRANT_*` variables and
//! finally `APP_*` variables (`APP_GRAPH__CANDIDATE_LIMIT=20`). Provides
//! a helper to expand `~` and `${VAR}` in user-supplied paths.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "ontosearch.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub graph: GraphSettings,
    pub vector: VectorSettings,
    pub embedding: EmbeddingSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSettings {
    pub query_endpoint: String,
    pub update_endpoint: String,
    pub candidate_limit: usize,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSettings {
    pub url: String,
    pub collection: String,
    pub timeout_ms: u64,
    pub upsert_batch_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub model_dir: Option<String>,
    pub use_hashing: bool,
    pub hashing_dim: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    pub default_top_k: usize,
    pub default_csv: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            graph: GraphSettings {
                query_endpoint: "http://localhost:3030/ds/query".to_string(),
                update_endpoint: "http://localhost:3030/ds/update".to_string(),
                candidate_limit: 50,
                timeout_ms: 3_000,
            },
            vector: VectorSettings {
                url: "http://localhost:6333".to_string(),
                collection: "manuals".to_string(),
                timeout_ms: 3_000,
                upsert_batch_size: 256,
            },
            embedding: EmbeddingSettings { model_dir: None, use_hashing: false, hashing_dim: 384 },
            search: SearchSettings { default_top_k: 5, default_csv: "sample_data/manuals.csv".to_string() },
        }
    }
}

impl GraphSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms) }
}

impl VectorSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms) }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> Result<Self> {
        let settings: Self = Self::figment(env_name)
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn figment(env_name: &str) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default())).merge(Toml::file(CONFIG_FILE));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("ontosearch.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("ontosearch.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("ontosearch.test.toml")),
            _ => {}
        }
        figment
            .merge(
                Env::raw()
                    .only(&["FUSEKI_QUERY", "FUSEKI_UPDATE", "QDRANT_URL", "QDRANT_COLLECTION"])
                    .map(|key| match key.as_str().to_ascii_uppercase().as_str() {
                        "FUSEKI_QUERY" => "graph.query_endpoint".into(),
                        "FUSEKI_UPDATE" => "graph.update_endpoint".into(),
                        "QDRANT_URL" => "vector.url".into(),
                        _ => "vector.collection".into(),
                    }),
            )
            .merge(Env::prefixed("APP_").split("__"))
    }

    pub fn validate(&self) -> Result<()> {
        for (name, endpoint) in [
            ("graph.query_endpoint", &self.graph.query_endpoint),
            ("graph.update_endpoint", &self.graph.update_endpoint),
            ("vector.url", &self.vector.url),
        ] {
            Url::parse(endpoint).map_err(|e| Error::InvalidConfig(format!("{name} '{endpoint}': {e}")))?;
        }
        if self.vector.collection.trim().is_empty() {
            return Err(Error::InvalidConfig("vector.collection must not be empty".to_string()));
        }
        if self.graph.candidate_limit == 0 {
            return Err(Error::InvalidConfig("graph.candidate_limit must be positive".to_string()));
        }
        if self.search.default_top_k == 0 {
            return Err(Error::InvalidConfig("search.default_top_k must be positive".to_string()));
        }
        if self.graph.timeout_ms == 0 || self.vector.timeout_ms == 0 {
            return Err(Error::InvalidConfig("backend timeouts must be positive".to_string()));
        }
        if self.vector.upsert_batch_size == 0 || self.embedding.hashing_dim == 0 {
            return Err(Error::InvalidConfig("batch size and embedding dimension must be positive".to_string()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
