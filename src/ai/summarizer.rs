use std::sync::Arc;

use super::language::{detect, LanguagePreference};
use super::normalize::normalize;
use super::sequencer::FallbackSequencer;
use super::transport::HttpTransport;
use super::validator;
use super::{ApiKey, CallPurpose, ProviderKind, Providers, SummaryError};
use crate::config::Settings;
use crate::content::plain_text;
use crate::error::{AppError, Result};

pub const MIN_TARGET_LENGTH: i64 = 50;
pub const MAX_TARGET_LENGTH: i64 = 1000;
pub const DEFAULT_TARGET_LENGTH: u32 = 200;

/// Summary length budget in characters. Values outside 50..=1000 fall back
/// to the default of 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetLength(u32);

impl TargetLength {
    pub fn new(requested: i64) -> Self {
        if (MIN_TARGET_LENGTH..=MAX_TARGET_LENGTH).contains(&requested) {
            Self(requested as u32)
        } else {
            Self::default()
        }
    }

    pub fn chars(self) -> usize {
        self.0 as usize
    }
}

impl Default for TargetLength {
    fn default() -> Self {
        Self(DEFAULT_TARGET_LENGTH)
    }
}

#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub content: String,
    pub target_length: TargetLength,
    pub provider: ProviderKind,
    pub language: LanguagePreference,
}

pub type SummaryResult = std::result::Result<String, SummaryError>;

pub struct Summarizer {
    transport: Arc<dyn HttpTransport>,
    providers: Providers,
    provider: ProviderKind,
    api_key: Option<ApiKey>,
    language: LanguagePreference,
}

impl Summarizer {
    pub fn new(settings: &Settings, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let providers = Providers::new(&settings.endpoints)
            .map_err(|e| AppError::Config(format!("invalid provider endpoint: {}", e)))?;

        Ok(Self {
            transport,
            providers,
            provider: settings.provider(),
            api_key: settings.api_key.as_deref().map(ApiKey::new),
            language: settings.language_preference(),
        })
    }

    /// Summarize `content` with the configured provider and language
    /// preference.
    pub async fn generate_summary(&self, content: &str, target_length: i64) -> SummaryResult {
        let request = SummaryRequest {
            content: content.to_string(),
            target_length: TargetLength::new(target_length),
            provider: self.provider,
            language: self.language,
        };
        self.summarize(&request).await
    }

    pub async fn summarize(&self, request: &SummaryRequest) -> SummaryResult {
        let key = match &self.api_key {
            Some(key) if !key.is_empty() => key,
            _ => return Err(SummaryError::MissingApiKey),
        };

        let content = plain_text(&request.content);
        if content.is_empty() {
            return Err(SummaryError::EmptyInput { what: "Content" });
        }

        let provider = self.providers.get(request.provider);
        let detection = detect(&content, request.language);
        tracing::info!(
            provider = provider.name(),
            language = %detection.language,
            target_length = request.target_length.chars(),
            "Generating summary"
        );

        let payload =
            provider.build_payload(&content, request.target_length.chars(), &detection.directive);
        let endpoints = provider.generation_endpoints(payload);

        let body = FallbackSequencer::new(self.transport.as_ref(), provider, key)
            .run(&endpoints, CallPurpose::Generation)
            .await?;

        normalize(provider, &body, request.target_length.chars())
    }

    pub async fn validate_api_key(
        &self,
        key: &str,
        provider: ProviderKind,
    ) -> std::result::Result<(), SummaryError> {
        validator::validate_api_key(self.transport.as_ref(), self.providers.get(provider), key)
            .await
    }
}
