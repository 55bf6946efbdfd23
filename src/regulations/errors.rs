//! Regulations.gov specific error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegulationsError {
    #[error("Regulations.gov API key not configured. Pass --api-key, --api-key-file or set REGULATIONS_API_KEY")]
    MissingApiKey,

    #[error("Regulations.gov API error (status {status_code}) for {url}")]
    ApiError {
        status_code: u16,
        url: String,
    },

    #[error("Failed to parse Regulations.gov response from {url}: {source}")]
    MalformedEnvelope {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Response from {url} is missing required field '{field}'")]
    MissingField {
        field: &'static str,
        url: String,
    },

    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
