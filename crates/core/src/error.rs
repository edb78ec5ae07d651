use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("index upsert failed: {0}")]
    Index(#[from] IndexError),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} embedding request returned {status}: {details}")]
    Provider {
        provider: &'static str,
        status: u16,
        details: String,
    },

    #[error("{provider} embedding response carried no vector")]
    MalformedResponse { provider: &'static str },

    #[error("no embedding provider available: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse {
        backend: &'static str,
        details: String,
    },
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("index query failed: {0}")]
    Index(#[from] IndexError),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} rejected the request ({status}): {details}")]
    Rejected {
        provider: &'static str,
        status: u16,
        details: String,
    },

    #[error("{provider} unavailable ({status}): {details}")]
    Unavailable {
        provider: &'static str,
        status: u16,
        details: String,
    },

    #[error("{provider} returned no generated text")]
    EmptyResponse { provider: &'static str },
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
