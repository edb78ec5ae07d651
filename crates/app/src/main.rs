mod server;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use policy_chat_core::{
    ChatOptions, ChatOrchestrator, ChunkingConfig, EmbeddingBackend, FallbackEmbedder,
    GeminiClient, IngestionOptions, IngestionPipeline, Metrics, OpenAiClient, PineconeStore,
    Retriever,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "policy-chat", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Gemini API key (primary embedding and chat provider).
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: String,

    /// OpenAI API key; configures the fallback provider when set.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Pinecone API key.
    #[arg(long, env = "PINECONE_API_KEY", hide_env_values = true)]
    pinecone_api_key: String,

    /// Data-plane host of the Pinecone index.
    #[arg(long, env = "PINECONE_INDEX_HOST")]
    pinecone_index_host: String,

    /// Index namespace holding the policy chunks.
    #[arg(long, env = "PINECONE_NAMESPACE", default_value = "hr")]
    namespace: String,

    /// Dimension of the vector index; every embedding is normalized to it.
    #[arg(long, env = "EMBED_DIM", default_value = "768")]
    embed_dim: usize,

    /// Base URL citation links are built from (e.g. the folder of the
    /// published documents). Links fall back to bare file names when unset.
    #[arg(long, env = "DOC_BASE_URL")]
    doc_base_url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the chat API over HTTP.
    Serve {
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
        bind: String,

        /// File holding the system instruction, read once at startup.
        #[arg(long, env = "SYSTEM_PROMPT_PATH", default_value = "system_prompt.txt")]
        system_prompt_path: PathBuf,

        /// Nearest neighbors requested per chat message.
        #[arg(long, default_value = "5")]
        top_k: usize,

        /// Incoming messages are truncated to this many characters.
        #[arg(long, default_value = "200")]
        max_message_chars: usize,

        /// Retrieved context is truncated to this many characters.
        #[arg(long, default_value = "4000")]
        context_budget: usize,

        /// Completion-token bound passed to the fallback chat provider.
        #[arg(long, default_value = "400")]
        fallback_max_tokens: u32,
    },
    /// Ingest a documents directory into the vector index.
    Ingest {
        /// Directory scanned (non-recursively) for policy documents.
        #[arg(long, env = "DOCS_DIR", default_value = "documents")]
        docs_dir: PathBuf,

        /// Report chunk counts without any embedding or upsert calls.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        #[arg(long, default_value = "1200")]
        chunk_max_chars: usize,

        #[arg(long, default_value = "200")]
        chunk_overlap: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Some(base) = &cli.doc_base_url {
        url::Url::parse(base).context("--doc-base-url is not a valid URL")?;
    }

    let index = PineconeStore::new(cli.pinecone_index_host.clone(), cli.pinecone_api_key.clone());
    let embedder = FallbackEmbedder::new(
        Box::new(GeminiClient::new(cli.gemini_api_key.clone())),
        cli.openai_api_key
            .as_deref()
            .map(|key| Box::new(OpenAiClient::new(key)) as Box<dyn EmbeddingBackend>),
        cli.embed_dim,
    );

    match cli.command {
        Command::Serve {
            bind,
            system_prompt_path,
            top_k,
            max_message_chars,
            context_budget,
            fallback_max_tokens,
        } => {
            let system_prompt = std::fs::read_to_string(&system_prompt_path).with_context(|| {
                format!(
                    "failed to read system prompt from {}",
                    system_prompt_path.display()
                )
            })?;

            let secondary = cli
                .openai_api_key
                .as_deref()
                .map(|key| OpenAiClient::new(key).with_max_completion_tokens(fallback_max_tokens));
            if secondary.is_none() {
                warn!("no fallback chat provider configured; primary failures will return the apology reply");
            }

            let metrics = Arc::new(Metrics::new());
            let orchestrator = ChatOrchestrator::new(
                Retriever::new(embedder, index, cli.namespace.as_str()),
                GeminiClient::new(cli.gemini_api_key.clone()),
                secondary,
                system_prompt,
                ChatOptions {
                    max_message_chars,
                    top_k,
                    context_budget_chars: context_budget,
                },
                metrics.clone(),
            );

            info!(
                bind = %bind,
                namespace = %cli.namespace,
                started_at = %Utc::now().to_rfc3339(),
                "policy-chat serving"
            );
            server::run(&bind, orchestrator, metrics).await
        }
        Command::Ingest {
            docs_dir,
            dry_run,
            chunk_max_chars,
            chunk_overlap,
        } => {
            if dry_run {
                println!("=== DRY RUN MODE ===\nNo index connection, no upsert.\n");
            }

            let options = IngestionOptions {
                namespace: cli.namespace.clone(),
                index_dim: cli.embed_dim,
                chunking: ChunkingConfig {
                    max_chars: chunk_max_chars,
                    overlap_chars: chunk_overlap,
                },
                doc_base_url: cli.doc_base_url.clone(),
            };

            let pipeline = IngestionPipeline::new(embedder, index, options);
            let report = pipeline
                .run(&docs_dir, dry_run)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("Found {} docs in {}", report.files_found, docs_dir.display());
            for file in &report.ingested {
                if report.dry_run {
                    println!(
                        "[DRY-RUN] Would ingest {} chunks from {}",
                        file.chunk_count, file.file_name
                    );
                } else {
                    println!("Ingested {} chunks from {}", file.chunk_count, file.file_name);
                }
            }

            for skipped in &report.skipped {
                warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped document");
            }
            if !report.skipped.is_empty() {
                anyhow::bail!(
                    "{} of {} documents failed to ingest",
                    report.skipped.len(),
                    report.files_found
                );
            }

            Ok(())
        }
    }
}
