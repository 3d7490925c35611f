use serde::{Deserialize, Serialize};
use url::Url;

use super::provider::{classify_shared, generic_error, join_url};
use super::transport::RequestAuth;
use super::{ApiKey, Endpoint, Provider, ProviderKind, RequestPayload, StatusClass, SummaryError};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODELS: [&str; 2] = ["gemini-2.0-flash", "gemini-1.5-flash"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Content {
    parts: Vec<TextPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

impl GenerateContentRequest {
    fn new(prompt: String, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

struct ModelRoute {
    model: String,
    url: Url,
}

pub struct GeminiProvider {
    list_url: Url,
    models: Vec<ModelRoute>,
}

impl GeminiProvider {
    pub fn new(base_url: &str, models: &[String]) -> Result<Self, url::ParseError> {
        let models = models
            .iter()
            .map(|model| {
                Ok(ModelRoute {
                    model: model.clone(),
                    url: join_url(base_url, &format!("models/{}:generateContent", model))?,
                })
            })
            .collect::<Result<Vec<_>, url::ParseError>>()?;

        Ok(Self {
            list_url: join_url(base_url, "models")?,
            models,
        })
    }

    fn prompt(content: &str, target_length: usize, directive: &str) -> String {
        format!(
            "{directive}\n\n\
             Please provide a concise summary of the following content in {target_length} \
             characters or less. Focus on the main points and key information. Make it engaging \
             and readable.\n\n\
             Make sure to be a full sentence and not cut off in the middle.\n\n\
             Content to summarize:\n{content}"
        )
    }
}

impl Provider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn auth(&self, key: &ApiKey) -> RequestAuth {
        RequestAuth::QueryParam {
            name: "key",
            key: key.clone(),
        }
    }

    fn build_payload(&self, content: &str, target_length: usize, directive: &str) -> RequestPayload {
        RequestPayload::Gemini(GenerateContentRequest::new(
            Self::prompt(content, target_length, directive),
            GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 1024,
                top_p: Some(0.8),
                top_k: Some(10),
            },
        ))
    }

    fn generation_endpoints(&self, payload: RequestPayload) -> Vec<Endpoint> {
        self.models
            .iter()
            .map(|route| Endpoint::post(&route.model, route.url.clone(), payload.clone()))
            .collect()
    }

    fn validation_endpoints(&self) -> Vec<Endpoint> {
        let probe = RequestPayload::Gemini(GenerateContentRequest::new(
            "Test".to_string(),
            GenerationConfig {
                temperature: 0.1,
                max_output_tokens: 5,
                top_p: None,
                top_k: None,
            },
        ));

        // A listing call that cannot connect is not final here: the
        // generation probes below still get their own attempt.
        let mut endpoints = vec![Endpoint::get("list models", self.list_url.clone())];
        endpoints.extend(
            self.models
                .iter()
                .map(|route| Endpoint::post(&route.model, route.url.clone(), probe.clone())),
        );
        endpoints
    }

    fn classify_status(&self, status: u16, endpoint: &str, body: &str) -> StatusClass {
        classify_shared(self.name(), status, endpoint, body)
            .unwrap_or_else(|| StatusClass::Advance(generic_error(self.name(), status, endpoint, body)))
    }

    fn extract_text(&self, body: &str) -> Result<String, SummaryError> {
        let response: GenerateContentResponse =
            serde_json::from_str(body).map_err(|e| SummaryError::MalformedResponse {
                provider: self.name(),
                detail: format!("invalid JSON: {}", e),
            })?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| SummaryError::MalformedResponse {
                provider: self.name(),
                detail: "missing candidates[0].content.parts[0].text".to_string(),
            })
    }
}
