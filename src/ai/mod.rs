mod chatgpt;
mod error;
mod gemini;
mod key;
mod language;
mod normalize;
mod provider;
mod sequencer;
mod summarizer;
pub mod transport;
mod validator;

#[cfg(test)]
pub mod mock;

pub use error::SummaryError;
pub use key::ApiKey;
pub use language::LanguagePreference;
#[cfg(test)]
pub use language::LanguageTag;
pub use provider::{
    CallPurpose, Endpoint, Provider, ProviderKind, Providers, RequestPayload, StatusClass,
};
pub use summarizer::{Summarizer, SummaryResult, TargetLength};
pub use transport::{HttpTransport, ReqwestTransport};

pub mod defaults {
    pub use super::chatgpt::{DEFAULT_BASE_URL as OPENAI_BASE_URL, DEFAULT_MODEL as OPENAI_MODEL};
    pub use super::gemini::{DEFAULT_BASE_URL as GEMINI_BASE_URL, DEFAULT_MODELS as GEMINI_MODELS};
}
