pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod providers;
pub mod retrieval;
pub mod stores;
pub mod traits;

pub use chunking::{chunk_text, ChunkingConfig};
pub use embeddings::FallbackEmbedder;
pub use error::{EmbeddingError, GenerationError, IndexError, IngestError, RetrievalError};
pub use extractor::extract_text;
pub use ingest::{
    discover_document_files, FileReport, IngestionPipeline, IngestionReport, SkippedFile,
};
pub use metrics::{Metrics, MetricsSnapshot};
pub use models::{
    ChatOptions, ChatTurn, Generation, IngestionOptions, MatchMetadata, RetrievedDoc, Role,
    ScoredMatch, TokenUsage, VectorMetadata, VectorRecord,
};
pub use normalize::normalize_dimension;
pub use orchestrator::{build_sources_markdown, ChatOrchestrator, APOLOGY_REPLY};
pub use providers::{GeminiClient, OpenAiClient};
pub use retrieval::Retriever;
pub use stores::PineconeStore;
pub use traits::{ChatModel, EmbeddingBackend, VectorIndex};
