//! Scripted transport for tests: replays canned responses in order and
//! records every request it receives.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::transport::{HttpRequest, HttpResponse, HttpTransport, Method, RequestAuth, TransportError};

#[derive(Debug, Clone)]
pub enum Scripted {
    Respond(u16, String),
    Fail(String),
}

impl Scripted {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Scripted::Respond(status, body.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Scripted::Fail(message.into())
    }

    pub fn gemini_text(text: &str) -> Self {
        let body = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        });
        Scripted::Respond(200, body.to_string())
    }

    pub fn chatgpt_text(text: &str) -> Self {
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        });
        Scripted::Respond(200, body.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub auth: &'static str,
    pub body: Option<serde_json::Value>,
    pub timeout: Duration,
}

#[derive(Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let auth = match request.auth {
            RequestAuth::Bearer(_) => "bearer",
            RequestAuth::QueryParam { .. } => "query",
        };
        self.requests.lock().unwrap().push(RecordedRequest {
            method: request.method,
            url: request.url.to_string(),
            auth,
            body: request
                .body
                .as_ref()
                .map(|b| serde_json::to_value(b).unwrap()),
            timeout: request.timeout,
        });

        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Respond(status, body)) => Ok(HttpResponse { status, body }),
            Some(Scripted::Fail(message)) => Err(TransportError(message)),
            None => Err(TransportError("no scripted response left".to_string())),
        }
    }
}
