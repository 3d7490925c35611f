use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::chatgpt::{ChatCompletionRequest, ChatGptProvider};
use super::gemini::{GeminiProvider, GenerateContentRequest};
use super::transport::{Method, RequestAuth};
use super::{ApiKey, SummaryError};
use crate::config::EndpointSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    #[value(name = "chatgpt")]
    ChatGpt,
}

impl ProviderKind {
    pub fn slug(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::ChatGpt => "chatgpt",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::ChatGpt => "ChatGPT",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "chatgpt" | "openai" => Ok(ProviderKind::ChatGpt),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// What a call sequence is for; decides the per-attempt timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPurpose {
    Generation,
    Validation,
}

impl CallPurpose {
    pub fn timeout(self) -> Duration {
        match self {
            CallPurpose::Generation => Duration::from_secs(30),
            CallPurpose::Validation => Duration::from_secs(15),
        }
    }
}

/// Verdict on one HTTP status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    /// Move on to the next candidate, remembering why this one failed.
    Advance(SummaryError),
    /// Stop the whole sequence with this error.
    Terminal(SummaryError),
}

/// Provider request body. Serialized as the bare provider JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestPayload {
    Gemini(GenerateContentRequest),
    ChatGpt(ChatCompletionRequest),
}

/// One candidate target in a fallback sequence.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Human-readable name used in logs and errors (model or route).
    pub label: String,
    pub method: Method,
    pub url: Url,
    pub body: Option<RequestPayload>,
}

impl Endpoint {
    pub fn get(label: impl Into<String>, url: Url) -> Self {
        Self {
            label: label.into(),
            method: Method::Get,
            url,
            body: None,
        }
    }

    pub fn post(label: impl Into<String>, url: Url, body: RequestPayload) -> Self {
        Self {
            label: label.into(),
            method: Method::Post,
            url,
            body: Some(body),
        }
    }
}

/// Everything that differs between the two backends. The fallback sequencer
/// and the normalizer only talk to providers through this trait.
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn auth(&self, key: &ApiKey) -> RequestAuth;

    /// Build the generation payload. Pure; no I/O.
    fn build_payload(&self, content: &str, target_length: usize, directive: &str) -> RequestPayload;

    /// Ordered generation candidates carrying `payload`.
    fn generation_endpoints(&self, payload: RequestPayload) -> Vec<Endpoint>;

    /// Ordered key-check candidates: a model listing first, then minimal
    /// generation requests.
    fn validation_endpoints(&self) -> Vec<Endpoint>;

    fn classify_status(&self, status: u16, endpoint: &str, body: &str) -> StatusClass;

    /// Pull the generated text out of a successful response body.
    fn extract_text(&self, body: &str) -> Result<String, SummaryError>;
}

/// Both configured backends, selectable by kind.
pub struct Providers {
    gemini: GeminiProvider,
    chatgpt: ChatGptProvider,
}

impl Providers {
    pub fn new(endpoints: &EndpointSettings) -> Result<Self, url::ParseError> {
        Ok(Self {
            gemini: GeminiProvider::new(&endpoints.gemini_base_url, &endpoints.gemini_models)?,
            chatgpt: ChatGptProvider::new(&endpoints.openai_base_url, &endpoints.openai_model)?,
        })
    }

    pub fn get(&self, kind: ProviderKind) -> &dyn Provider {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::ChatGpt => &self.chatgpt,
        }
    }
}

/// Codes both providers treat the same way. Returns `None` for codes the
/// provider has to decide itself.
pub(crate) fn classify_shared(
    provider: &'static str,
    status: u16,
    endpoint: &str,
    body: &str,
) -> Option<StatusClass> {
    let class = match status {
        200 => StatusClass::Success,
        400 => StatusClass::Terminal(SummaryError::InvalidKey {
            provider,
            code: status,
            body: body.to_string(),
        }),
        403 => StatusClass::Terminal(SummaryError::Forbidden {
            provider,
            body: body.to_string(),
        }),
        404 => StatusClass::Advance(SummaryError::EndpointNotFound {
            provider,
            endpoint: endpoint.to_string(),
            body: body.to_string(),
        }),
        _ => return None,
    };
    Some(class)
}

pub(crate) fn generic_error(
    provider: &'static str,
    status: u16,
    endpoint: &str,
    body: &str,
) -> SummaryError {
    SummaryError::GenericProviderError {
        provider,
        endpoint: endpoint.to_string(),
        code: status,
        body: body.to_string(),
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("{}/{}", base.trim_end_matches('/'), path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parses_settings_values() {
        assert_eq!("gemini".parse(), Ok(ProviderKind::Gemini));
        assert_eq!("ChatGPT".parse(), Ok(ProviderKind::ChatGpt));
        assert!("claude".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn timeouts_differ_by_purpose() {
        assert_eq!(CallPurpose::Validation.timeout(), Duration::from_secs(15));
        assert_eq!(CallPurpose::Generation.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn join_url_tolerates_trailing_slash() {
        let a = join_url("https://example.test/v1/", "models").unwrap();
        let b = join_url("https://example.test/v1", "models").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "https://example.test/v1/models");
    }

    #[test]
    fn providers_select_by_kind() {
        let providers = Providers::new(&EndpointSettings::default()).unwrap();
        assert_eq!(providers.get(ProviderKind::Gemini).name(), "Gemini");
        assert_eq!(providers.get(ProviderKind::ChatGpt).name(), "ChatGPT");
    }
}
