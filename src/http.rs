//! HTTP seam shared by every provider and the asset fetcher.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde_json::Value;
use thiserror::Error;

/// Browser-like identity; the image CDNs reject some default client strings.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub type ByteStream = BoxStream<'static, Result<Bytes, HttpError>>;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HttpError {
    fn transport(url: &str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    /// Rate limits, server errors and dropped connections are worth another
    /// attempt. Client errors and bad payloads are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Transport { .. } => true,
            Self::Decode { .. } => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The host never answered: connect, DNS or timeout failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// GET-only session abstraction so providers and downloads can run against
/// an in-process fake in tests.
#[async_trait]
pub trait HttpSession: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, HttpError>;

    /// Stream a response body; non-2xx statuses fail before any bytes flow.
    async fn get_stream(&self, url: &str) -> Result<ByteStream, HttpError>;
}

#[async_trait]
impl HttpSession for reqwest::Client {
    async fn get_json(&self, url: &str) -> Result<Value, HttpError> {
        let resp = self
            .get(url)
            .send()
            .await
            .map_err(|e| HttpError::transport(url, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| HttpError::transport(url, e))?;
        serde_json::from_slice(&body).map_err(|source| HttpError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn get_stream(&self, url: &str) -> Result<ByteStream, HttpError> {
        let resp = self
            .get(url)
            .send()
            .await
            .map_err(|e| HttpError::transport(url, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let owned_url = url.to_string();
        Ok(resp
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| HttpError::transport(&owned_url, e)))
            .boxed())
    }
}

/// Build the shared client with the browser identity header and a
/// per-request timeout.
pub fn build_client(user_agent: &str, timeout: Duration) -> anyhow::Result<reqwest::Client> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
    default_headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

    let client = reqwest::Client::builder()
        .default_headers(default_headers)
        .timeout(timeout)
        .build()?;
    Ok(client)
}
