//! Shared test transport: replies from a script, counts calls, can stall.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use speedcast::transport::{Transport, TransportError, TransportRequest, TransportResponse};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub fn json(status: u16, status_text: &str, body: serde_json::Value) -> TransportResponse {
    TransportResponse {
        status,
        status_text: status_text.to_string(),
        headers: vec![("Content-Type".into(), "application/json".into())],
        content_type: Some("application/json".into()),
        body: Bytes::from(body.to_string()),
    }
}

pub fn ok_json(body: serde_json::Value) -> TransportResponse {
    json(200, "OK", body)
}

pub struct FakeTransport {
    script: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    fallback: Option<TransportResponse>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(Instant, TransportRequest)>>,
}

impl FakeTransport {
    /// Always answers with `response`.
    pub fn always(response: TransportResponse) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(response),
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Answers from `script` in order; fails once the script runs out.
    pub fn scripted(script: Vec<Result<TransportResponse, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Each call stalls for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.seen.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn last_request(&self) -> Option<TransportRequest> {
        self.seen.lock().unwrap().last().map(|(_, r)| r.clone())
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((Instant::now(), request));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(outcome), _) => outcome,
            (None, Some(response)) => Ok(response.clone()),
            (None, None) => Err(TransportError::Other("script exhausted".into())),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
