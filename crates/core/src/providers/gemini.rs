use crate::error::{EmbeddingError, GenerationError};
use crate::models::{ChatTurn, Generation, Role, TokenUsage};
use crate::traits::{ChatModel, EmbeddingBackend};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_EMBED_MODEL: &str = "gemini-embedding-001";
const DEFAULT_CHAT_MODEL: &str = "gemini-2.0-flash";

/// Client for the Gemini generative-language API, covering both the
/// embedding and chat endpoints. Constructed once at startup and shared.
pub struct GeminiClient {
    api_key: String,
    embed_model: String,
    chat_model: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_models(
        mut self,
        embed_model: impl Into<String>,
        chat_model: impl Into<String>,
    ) -> Self {
        self.embed_model = embed_model.into();
        self.chat_model = chat_model.into();
        self
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "model",
    }
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    content: ContentParts<'a>,
}

#[derive(Debug, Serialize)]
struct ContentParts<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    // Absent when generation was blocked before producing content.
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[async_trait]
impl EmbeddingBackend for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{API_BASE}/models/{}:embedContent", self.embed_model);
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&EmbedContentRequest {
                content: ContentParts {
                    parts: vec![TextPart { text }],
                },
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Provider {
                provider: "gemini",
                status: status.as_u16(),
                details: response.text().await.unwrap_or_default(),
            });
        }

        let payload: EmbedContentResponse = response.json().await?;
        if payload.embedding.values.is_empty() {
            return Err(EmbeddingError::MalformedResponse { provider: "gemini" });
        }

        Ok(payload.embedding.values)
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, turns: &[ChatTurn]) -> Result<Generation, GenerationError> {
        let contents = turns
            .iter()
            .map(|turn| Content {
                role: role_name(turn.role).to_string(),
                parts: vec![Part {
                    text: turn.content.clone(),
                }],
            })
            .collect();

        let url = format!("{API_BASE}/models/{}:generateContent", self.chat_model);
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&GenerateContentRequest { contents })
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            // Quota and safety rejections land here; the orchestrator
            // treats them as recoverable and tries the fallback provider.
            return Err(GenerationError::Rejected {
                provider: "gemini",
                status: status.as_u16(),
                details: response.text().await.unwrap_or_default(),
            });
        }
        if !status.is_success() {
            return Err(GenerationError::Unavailable {
                provider: "gemini",
                status: status.as_u16(),
                details: response.text().await.unwrap_or_default(),
            });
        }

        let payload: GenerateContentResponse = response.json().await?;
        let usage = payload.usage_metadata.map(|usage| TokenUsage {
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count,
        });

        let text = payload
            .candidates
            .into_iter()
            .find_map(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty())
            .ok_or(GenerationError::EmptyResponse { provider: "gemini" })?;

        Ok(Generation { text, usage })
    }
}
