use crate::error::{EmbeddingError, GenerationError};
use crate::models::{ChatTurn, Generation, Role, TokenUsage};
use crate::traits::{ChatModel, EmbeddingBackend};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-small";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 400;

/// Client for the OpenAI embeddings and chat-completions endpoints, used
/// as the secondary provider. Chat replies are bounded by a completion
/// token cap since this path only serves as a fallback.
pub struct OpenAiClient {
    api_key: String,
    embed_model: String,
    chat_model: String,
    max_completion_tokens: u32,
    client: Client,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            max_completion_tokens: DEFAULT_MAX_COMPLETION_TOKENS,
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

    pub fn with_max_completion_tokens(mut self, max_completion_tokens: u32) -> Self {
        self.max_completion_tokens = max_completion_tokens;
        self
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "assistant",
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[async_trait]
impl EmbeddingBackend for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(format!("{API_BASE}/embeddings"))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest {
                model: &self.embed_model,
                input: text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Provider {
                provider: "openai",
                status: status.as_u16(),
                details: response.text().await.unwrap_or_default(),
            });
        }

        let payload: EmbeddingsResponse = response.json().await?;
        payload
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or(EmbeddingError::MalformedResponse { provider: "openai" })
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, turns: &[ChatTurn]) -> Result<Generation, GenerationError> {
        let messages = turns
            .iter()
            .map(|turn| ChatMessage {
                role: role_name(turn.role).to_string(),
                content: turn.content.clone(),
            })
            .collect();

        let response = self
            .client
            .post(format!("{API_BASE}/chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&ChatCompletionRequest {
                model: &self.chat_model,
                messages,
                max_tokens: self.max_completion_tokens,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            return Err(GenerationError::Rejected {
                provider: "openai",
                status: status.as_u16(),
                details: response.text().await.unwrap_or_default(),
            });
        }
        if !status.is_success() {
            return Err(GenerationError::Unavailable {
                provider: "openai",
                status: status.as_u16(),
                details: response.text().await.unwrap_or_default(),
            });
        }

        let payload: ChatCompletionResponse = response.json().await?;
        let usage = payload.usage.map(|usage| TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        });

        let text = payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(GenerationError::EmptyResponse { provider: "openai" })?;

        Ok(Generation { text, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::{role_name, ChatCompletionResponse, EmbeddingsResponse};
    use crate::models::Role;

    #[test]
    fn model_turns_become_assistant_messages() {
        assert_eq!(role_name(Role::User), "user");
        assert_eq!(role_name(Role::Model), "assistant");
    }

    #[test]
    fn chat_completion_response_parses_text_and_usage() {
        let payload: ChatCompletionResponse = serde_json::from_str(
            r#"{
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Contact HR."}}],
                "usage": {"prompt_tokens": 90, "completion_tokens": 4, "total_tokens": 94}
            }"#,
        )
        .expect("response should deserialize");

        assert_eq!(payload.choices[0].message.content, "Contact HR.");
        let usage = payload.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 90);
        assert_eq!(usage.completion_tokens, 4);
    }

    #[test]
    fn embeddings_response_parses_first_vector() {
        let payload: EmbeddingsResponse = serde_json::from_str(
            r#"{"data": [{"index": 0, "embedding": [0.1, 0.2, 0.3]}], "model": "text-embedding-3-small"}"#,
        )
        .expect("response should deserialize");
        assert_eq!(payload.data[0].embedding.len(), 3);
    }
}
