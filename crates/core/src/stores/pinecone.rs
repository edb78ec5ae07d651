use crate::error::IndexError;
use crate::models::{ScoredMatch, VectorRecord};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Client for a single Pinecone index, addressed by its data-plane host.
/// The host may be given with or without a scheme; `https://` is assumed
/// when absent.
pub struct PineconeStore {
    host: String,
    api_key: String,
    client: Client,
}

impl PineconeStore {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        let host = host.into();
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{host}")
        };

        Self {
            host: host.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    namespace: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredMatch>,
}

#[async_trait]
impl VectorIndex for PineconeStore {
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<(), IndexError> {
        if records.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(format!("{}/vectors/upsert", self.host))
            .header("Api-Key", &self.api_key)
            .json(&UpsertRequest {
                vectors: records,
                namespace,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexError::BackendResponse {
                backend: "pinecone",
                details: format!("{}: {}", status, response.text().await.unwrap_or_default()),
            });
        }

        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredMatch>, IndexError> {
        let response = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .json(&QueryRequest {
                namespace,
                vector,
                top_k,
                include_metadata: true,
                include_values: false,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexError::BackendResponse {
                backend: "pinecone",
                details: format!("{}: {}", status, response.text().await.unwrap_or_default()),
            });
        }

        let payload: QueryResponse = response.json().await?;
        Ok(payload.matches)
    }
}
