//! RAG Server binary
//!
//! Run with: cargo run -p pdf-rag --bin pdf-rag-server [config.toml]

use std::path::PathBuf;

use pdf_rag::{
    config::{EmbeddingBackend, RagConfig},
    providers::OllamaClient,
    server::RagServer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PDF_RAG_CONFIG").ok())
        .map(PathBuf::from);
    let config = RagConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding provider: {:?}", config.embeddings.provider);
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - LLM model: {}", config.llm.generate_model);
    tracing::info!("  - Chunking: {:?}, {} chars", config.chunking.strategy, config.chunking.chunk_size);
    tracing::info!("  - Retrieval: top {} by {:?}", config.retrieval.top_k, config.retrieval.metric);

    tracing::info!("Checking Ollama at {}...", config.llm.base_url);
    let ollama = OllamaClient::new(&config.llm, &config.embeddings)?;
    match ollama.health_check().await {
        Ok(true) => tracing::info!("Ollama is running"),
        _ => {
            tracing::warn!("Ollama not available at {}", config.llm.base_url);
            tracing::warn!(
                "Start it with `ollama serve` and pull `{}`",
                config.llm.generate_model
            );
            if config.embeddings.provider == EmbeddingBackend::Ollama {
                tracing::warn!("Ingestion needs the embedding model `{}` too", config.embeddings.model);
            }
        }
    }

    let server = RagServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
