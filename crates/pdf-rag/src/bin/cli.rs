//! Command-line front end: index a directory, then ask or retrieve

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use walkdir::WalkDir;

use pdf_rag::{
    config::RagConfig,
    server::RagServer,
    service::RagService,
    types::{FileType, QueryMode, QueryRequest},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pdf-rag", about = "Ask questions about a folder of PDFs", version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index every supported file under a directory, then answer a question
    Ask {
        /// Directory to index
        dir: PathBuf,
        /// Question to answer
        question: String,
        /// Number of chunks to retrieve
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
        /// How to resolve the question
        #[arg(long, value_enum, default_value = "auto")]
        mode: Mode,
        /// Field a comparison is about, e.g. "unemployment rate"
        #[arg(long)]
        field: Option<String>,
    },

    /// Index a directory and print the ranked chunks for a query
    Retrieve {
        /// Directory to index
        dir: PathBuf,
        /// Query text
        query: String,
        /// Number of chunks to retrieve
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
    },

    /// Start the HTTP server
    Serve,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Auto,
    Freeform,
    Comparison,
}

impl From<Mode> for QueryMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Auto => QueryMode::Auto,
            Mode::Freeform => QueryMode::Freeform,
            Mode::Comparison => QueryMode::Comparison,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_rag=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = RagConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Ask {
            dir,
            question,
            top_k,
            mode,
            field,
        } => {
            let service = index_directory(config, &dir).await?;
            let mut request = QueryRequest::new(question).with_mode(mode.into());
            request.top_k = top_k;
            request.field = field;

            let response = service.query(request).await?;
            println!("{}", response.answer);

            if let Some(record) = &response.aggregated {
                println!("\n{}", style("Figures").bold());
                for (label, value) in &record.values {
                    println!("  {}: {}", label, value);
                }
            }
            println!("\n{}", style("Sources").bold());
            for source in &response.sources {
                println!(
                    "  {} {} p.{}-{} ({:.3})",
                    style("•").dim(),
                    source.filename,
                    source.page_start,
                    source.page_end,
                    source.score
                );
            }
        }
        Command::Retrieve { dir, query, top_k } => {
            let service = index_directory(config, &dir).await?;
            let result = service.retrieve(&query, top_k).await?;
            for (rank, hit) in result.iter().enumerate() {
                println!(
                    "{} {} {} ({:.3})",
                    style(format!("#{}", rank + 1)).cyan(),
                    hit.chunk.filename,
                    hit.chunk.page_label(),
                    hit.score
                );
                println!("{}\n", hit.chunk.content.trim());
            }
        }
        Command::Serve => {
            let server = RagServer::new(config)?;
            println!("Serving on http://{}", server.address());
            server.start().await?;
        }
    }

    Ok(())
}

/// Build a service and ingest every supported file under `dir`
async fn index_directory(config: RagConfig, dir: &Path) -> anyhow::Result<Arc<RagService>> {
    let files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| FileType::from_filename(n).is_supported())
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("no supported files under {}", dir.display());
    }

    let service = Arc::new(RagService::new(config)?);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("#>-"),
    );

    let mut failed = 0usize;
    for path in &files {
        let name = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();
        pb.set_message(name.clone());

        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        if let Err(e) = service.ingest_file(&name, data).await {
            failed += 1;
            pb.println(format!("{} {}: {}", style("skipped").yellow(), name, e));
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let stats = service.stats();
    eprintln!(
        "{} {} documents, {} chunks{}",
        style("Indexed").green(),
        stats.documents,
        stats.chunks,
        if failed > 0 { format!(", {} skipped", failed) } else { String::new() }
    );

    Ok(service)
}
