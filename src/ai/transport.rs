use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use super::{ApiKey, RequestPayload};

const USER_AGENT: &str = concat!("post-summary/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// How the API key reaches the provider.
#[derive(Debug, Clone)]
pub enum RequestAuth {
    Bearer(ApiKey),
    QueryParam { name: &'static str, key: ApiKey },
}

/// A single outbound call. `url` never contains the key, so it is safe to log.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub auth: RequestAuth,
    pub body: Option<RequestPayload>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError(format!("request timed out: {}", e))
        } else {
            TransportError(e.to_string())
        }
    }
}

/// Performs HTTP calls for the summarizer. Any status code is a successful
/// transport result; only connection-level failures are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let builder = match request.method {
            Method::Get => self.client.get(request.url),
            Method::Post => self.client.post(request.url),
        };

        // Timeout is per request so every fallback attempt gets the full budget.
        let mut builder = builder.timeout(request.timeout);

        builder = match &request.auth {
            RequestAuth::Bearer(key) => builder.bearer_auth(key.expose()),
            RequestAuth::QueryParam { name, key } => builder.query(&[(*name, key.expose())]),
        };

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}
