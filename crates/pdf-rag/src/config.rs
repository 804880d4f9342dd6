//! Configuration for the RAG engine
//!
//! Every component receives its section of [`RagConfig`] at construction.
//! Configuration is loaded from an optional TOML file, then the most common
//! knobs can be overridden with `PDF_RAG_*` environment variables.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main RAG configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Comparison-query aggregation configuration
    pub aggregation: AggregationConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// Text extraction configuration
    pub extraction: ExtractionConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: RagConfig = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an optional file, apply environment overrides, and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Override selected settings from `PDF_RAG_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PDF_RAG_LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("PDF_RAG_LLM_MODEL") {
            self.llm.generate_model = model;
        }
        if let Some(model) = lookup("PDF_RAG_EMBED_MODEL") {
            self.llm.embed_model = model.clone();
            self.embeddings.model = model;
        }
        if let Some(top_k) = lookup("PDF_RAG_TOP_K") {
            self.retrieval.top_k = top_k
                .parse()
                .map_err(|_| Error::Config(format!("PDF_RAG_TOP_K is not a number: {}", top_k)))?;
        }
        if let Some(port) = lookup("PDF_RAG_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("PDF_RAG_PORT is not a port: {}", port)))?;
        }
        Ok(())
    }

    /// Reject settings no component can work with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be positive".into()));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be positive".into()));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be positive".into()));
        }
        if self.llm.max_output_tokens == 0 {
            return Err(Error::Config("llm.max_output_tokens must be positive".into()));
        }
        self.aggregation.compile_pattern()?;
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Ollama embeddings endpoint
    #[default]
    Ollama,
    /// Offline feature-hashing embedder
    Hashing,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend used for both ingestion and queries
    pub provider: EmbeddingBackend,
    /// Model name, recorded for logging
    pub model: String,
    /// Embedding dimensions (768 for nomic-embed-text)
    pub dimensions: usize,
    /// Number of concurrent embedding requests during ingestion
    pub batch_size: usize,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::Ollama,
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 8,
            timeout_secs: 30,
        }
    }
}

/// How the chunker places chunk boundaries
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// Fixed-width slices of `chunk_size` characters
    Fixed,
    /// Pack paragraphs and sentences up to `chunk_size` characters
    #[default]
    Boundary,
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Boundary placement policy
    pub strategy: ChunkStrategy,
    /// Maximum chunk size in characters
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::Boundary,
            chunk_size: 1000,
        }
    }
}

/// Distance metric, fixed when the index is created
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine similarity
    #[default]
    Cosine,
    /// Euclidean (L2) distance
    Euclidean,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks to retrieve when the query doesn't say
    pub top_k: usize,
    /// Index distance metric
    pub metric: DistanceMetric,
    /// Drop results scoring below this (None keeps everything)
    pub min_score: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            metric: DistanceMetric::Cosine,
            min_score: None,
        }
    }
}

/// Comparison-query aggregation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Words that mark a query as a comparison query
    pub comparison_terms: Vec<String>,
    /// Extraction regex with named groups `label` and `value`
    pub pattern: String,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            comparison_terms: [
                "compare",
                "comparison",
                "versus",
                "vs",
                "difference",
                "differences",
                "higher",
                "lower",
                "highest",
                "lowest",
                "across",
                "rank",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            // A label is a capitalized word plus up to three lowercase words,
            // so leading text on the same line stays out of it
            pattern: concat!(
                r"\b(?P<label>\p{Lu}[\p{L}\p{N}'’\-]*(?: \p{Ll}[\p{L}'’\-]*){0,3})",
                r"\s*:\s*(?P<value>-?\d+(?:\.\d+)?)\s*%",
            )
            .to_string(),
        }
    }
}

impl AggregationConfig {
    /// Compile the extraction pattern, checking for the required groups
    pub fn compile_pattern(&self) -> Result<Regex> {
        let regex = Regex::new(&self.pattern)
            .map_err(|e| Error::Config(format!("aggregation.pattern: {}", e)))?;
        let names: Vec<&str> = regex.capture_names().flatten().collect();
        for group in ["label", "value"] {
            if !names.contains(&group) {
                return Err(Error::Config(format!(
                    "aggregation.pattern is missing the `{}` group",
                    group
                )));
            }
        }
        Ok(regex)
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "llama3.2:3b".to_string(),
            temperature: 0.1,
            max_output_tokens: 512,
            timeout_secs: 120,
        }
    }
}

/// Text extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Timeout for extracting a single file in seconds
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.chunking.strategy, ChunkStrategy::Boundary);
    }

    #[test]
    fn test_from_file_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[chunking]
strategy = "fixed"
chunk_size = 200

[retrieval]
metric = "euclidean"
top_k = 3
"#
        )
        .unwrap();

        let config = RagConfig::from_file(file.path()).unwrap();
        assert_eq!(config.chunking.strategy, ChunkStrategy::Fixed);
        assert_eq!(config.chunking.chunk_size, 200);
        assert_eq!(config.retrieval.metric, DistanceMetric::Euclidean);
        assert_eq!(config.retrieval.top_k, 3);
        // Untouched sections keep their defaults
        assert_eq!(config.llm.max_output_tokens, 512);
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let mut config = RagConfig::default();
        config.chunking.chunk_size = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_pattern_requires_named_groups() {
        let config = AggregationConfig {
            pattern: r"(\w+): (\d+)%".to_string(),
            ..Default::default()
        };
        assert!(config.compile_pattern().is_err());
        assert!(AggregationConfig::default().compile_pattern().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PDF_RAG_LLM_MODEL", "phi3"),
            ("PDF_RAG_TOP_K", "8"),
            ("PDF_RAG_EMBED_MODEL", "mxbai-embed-large"),
        ]
        .into_iter()
        .collect();

        let mut config = RagConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.llm.generate_model, "phi3");
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.llm.embed_model, "mxbai-embed-large");
        assert_eq!(config.embeddings.model, "mxbai-embed-large");

        let mut config = RagConfig::default();
        let bad = config.apply_overrides(|key| (key == "PDF_RAG_TOP_K").then(|| "many".to_string()));
        assert!(bad.is_err());
    }
}
