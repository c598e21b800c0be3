//! 请求执行逻辑：超时、重试与响应解码。
//!
//! Request execution: timeout, retry/backoff and response decoding around a
//! single transport call.

use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::policy::{Decision, RetryPolicy};
use crate::transport::{Transport, TransportRequest, TransportResponse};
use crate::types::request::ResolvedRequest;
use crate::types::response::{flatten_headers, ApiResponse, ContentKind, ResponseBody};
use crate::{Error, Result};

pub(crate) struct RequestExecutor {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
        }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Execute with up to `request.retries` additional attempts.
    pub async fn execute(&self, url: &str, request: &ResolvedRequest) -> Result<ApiResponse<ResponseBody>> {
        let body = request
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let headers: Vec<(String, String)> = request
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let start = Instant::now();
        let mut attempt: u32 = 0;
        loop {
            let outgoing = TransportRequest {
                method: request.method,
                url: url.to_string(),
                headers: headers.clone(),
                body: body.clone(),
                abort: CancellationToken::new(),
            };

            let err = match self.execute_once(outgoing, request).await {
                Ok(response) => {
                    info!(
                        method = request.method.as_str(),
                        url,
                        http_status = response.status,
                        attempts = attempt + 1,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "speedcast request completed"
                    );
                    return Ok(response);
                }
                Err(err) => err,
            };

            match self.policy.decide(&err, attempt, request.retries) {
                Decision::Retry { delay } => {
                    warn!(
                        method = request.method.as_str(),
                        url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "speedcast request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Decision::Fail => {
                    info!(
                        method = request.method.as_str(),
                        url,
                        attempts = attempt + 1,
                        retryable = err.is_retryable(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        error = %err,
                        "speedcast request failed"
                    );
                    return Err(err);
                }
            }
        }
    }

    /// A single attempt raced against the per-call timeout.
    async fn execute_once(
        &self,
        outgoing: TransportRequest,
        request: &ResolvedRequest,
    ) -> Result<ApiResponse<ResponseBody>> {
        let abort = outgoing.abort.clone();
        let response = tokio::select! {
            res = self.transport.send(outgoing) => res?,
            _ = tokio::time::sleep(request.timeout) => {
                abort.cancel();
                return Err(Error::Timeout {
                    timeout_ms: request.timeout.as_millis() as u64,
                });
            }
        };
        decode_response(response)
    }
}

/// Status check, then decode the body per its declared content type.
pub(crate) fn decode_response(response: TransportResponse) -> Result<ApiResponse<ResponseBody>> {
    let TransportResponse {
        status,
        status_text,
        headers,
        content_type,
        body,
    } = response;

    if !(200..=299).contains(&status) {
        return Err(Error::Status { status, status_text });
    }

    let kind = ContentKind::from_content_type(content_type.as_deref());
    let data = ResponseBody::decode(kind, content_type.as_deref().unwrap_or_default(), body)?;

    Ok(ApiResponse {
        data,
        status,
        status_text,
        headers: flatten_headers(headers),
    })
}
