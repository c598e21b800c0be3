//! Transport abstraction.
//!
//! The orchestrator never speaks HTTP itself: it hands a fully resolved
//! [`TransportRequest`] to a [`Transport`] and receives a [`TransportResponse`].
//! TLS, pooling, DNS and wire parsing all live behind this seam.

mod http;

pub use http::ReqwestTransport;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::types::request::Method;

/// A single outgoing call.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// JSON text of the request body, if any.
    pub body: Option<String>,
    /// Cancelled when the attempt times out; transports must stop promptly.
    pub abort: CancellationToken,
}

/// Raw response as seen by the transport, before status checks and decoding.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;

    fn name(&self) -> &'static str {
        "custom"
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(Arc<reqwest::Error>),

    #[error("request aborted")]
    Aborted,

    #[error("Transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Http(Arc::new(err))
    }
}
