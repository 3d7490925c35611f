use serde::{Deserialize, Serialize};
use url::Url;

use super::provider::{classify_shared, generic_error, join_url};
use super::transport::RequestAuth;
use super::{ApiKey, Endpoint, Provider, ProviderKind, RequestPayload, StatusClass, SummaryError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct ChatGptProvider {
    model: String,
    completions_url: Url,
    models_url: Url,
}

impl ChatGptProvider {
    pub fn new(base_url: &str, model: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            model: model.to_string(),
            completions_url: join_url(base_url, "chat/completions")?,
            models_url: join_url(base_url, "models")?,
        })
    }
}

impl Provider for ChatGptProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ChatGpt
    }

    fn auth(&self, key: &ApiKey) -> RequestAuth {
        RequestAuth::Bearer(key.clone())
    }

    fn build_payload(&self, content: &str, target_length: usize, directive: &str) -> RequestPayload {
        let user = format!(
            "Please provide a concise summary of the following content in {target_length} \
             characters or less. Focus on the main points and key information. Make it engaging \
             and readable.\n\nContent to summarize:\n{content}"
        );

        RequestPayload::ChatGpt(ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::new("system", directive),
                ChatMessage::new("user", user),
            ],
            max_tokens: 500,
            temperature: 0.3,
            top_p: Some(0.9),
        })
    }

    fn generation_endpoints(&self, payload: RequestPayload) -> Vec<Endpoint> {
        vec![Endpoint::post(
            &self.model,
            self.completions_url.clone(),
            payload,
        )]
    }

    fn validation_endpoints(&self) -> Vec<Endpoint> {
        let probe = RequestPayload::ChatGpt(ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::new("user", "Hi")],
            max_tokens: 1,
            temperature: 0.0,
            top_p: None,
        });

        // A listing call that cannot connect is not final here: the
        // completions probe below still gets its own attempt.
        vec![
            Endpoint::get("list models", self.models_url.clone()),
            Endpoint::post(&self.model, self.completions_url.clone(), probe),
        ]
    }

    fn classify_status(&self, status: u16, endpoint: &str, body: &str) -> StatusClass {
        if let Some(class) = classify_shared(self.name(), status, endpoint, body) {
            return class;
        }
        match status {
            401 => StatusClass::Terminal(SummaryError::InvalidKey {
                provider: self.name(),
                code: status,
                body: body.to_string(),
            }),
            429 => StatusClass::Terminal(SummaryError::RateLimited {
                provider: self.name(),
                body: body.to_string(),
            }),
            _ => StatusClass::Advance(generic_error(self.name(), status, endpoint, body)),
        }
    }

    fn extract_text(&self, body: &str) -> Result<String, SummaryError> {
        let response: ChatCompletionResponse =
            serde_json::from_str(body).map_err(|e| SummaryError::MalformedResponse {
                provider: self.name(),
                detail: format!("invalid JSON: {}", e),
            })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SummaryError::MalformedResponse {
                provider: self.name(),
                detail: format!("missing choices[0].message.content in {}", body),
            })
    }
}
