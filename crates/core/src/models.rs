use crate::chunking::ChunkingConfig;
use serde::{Deserialize, Serialize};

/// Role vocabulary of the chat API: callers send `"user"` or `"model"`
/// turns, and each provider maps them onto its own role names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

/// Metadata stored alongside each vector so query results can be rendered
/// as citations without a second lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub source_file: String,
    pub chunk_index: u32,
    pub chunk_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: VectorMetadata,
}

/// The metadata subset the retrieval path consumes from a query match.
/// Indexes round-trip numbers loosely, so only the string fields are read
/// back and anything unknown is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchMetadata {
    #[serde(default)]
    pub source_file: String,
    #[serde(default)]
    pub chunk_text: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoredMatch {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<MatchMetadata>,
}

/// One ranked snippet returned to the chat layer; request-scoped.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedDoc {
    pub score: f32,
    pub text: String,
    pub file: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Per-request budgets for the chat orchestrator. The variants of the
/// original deployment disagreed on these, so they are knobs with the
/// hardened defaults rather than constants.
#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    /// Incoming messages are truncated to this many characters before
    /// retrieval and generation.
    pub max_message_chars: usize,
    pub top_k: usize,
    /// The concatenated retrieved context is truncated to this many
    /// characters. Hard truncation, not sentence-aware.
    pub context_budget_chars: usize,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            max_message_chars: 200,
            top_k: 5,
            context_budget_chars: 4_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub namespace: String,
    /// Dimension of the target index; dry-run placeholder vectors use it
    /// and live embeddings are normalized to it.
    pub index_dim: usize,
    pub chunking: ChunkingConfig,
    /// When set, each record carries a citation URL of
    /// `{base}/{file_name}`.
    pub doc_base_url: Option<String>,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            namespace: "hr".to_string(),
            index_dim: 768,
            chunking: ChunkingConfig::default(),
            doc_base_url: None,
        }
    }
}
