use thiserror::Error;

/// Why a summary generation or key validation did not succeed.
///
/// Every provider failure ends up here as a value. HTTP-derived variants keep
/// the status code, the endpoint label and the response body so the caller
/// can tell which candidate failed and why.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryError {
    #[error("{what} cannot be empty")]
    EmptyInput { what: &'static str },

    #[error("API key not configured. Please set your API key in the settings")]
    MissingApiKey,

    #[error("Invalid {provider} API key format: {hint}")]
    InvalidKeyFormat {
        provider: &'static str,
        hint: &'static str,
    },

    #[error("Unable to connect to {provider} API ({endpoint}): {message}")]
    ConnectionFailure {
        provider: &'static str,
        endpoint: String,
        message: String,
    },

    #[error("Invalid {provider} API key or bad request (HTTP {code}): {body}")]
    InvalidKey {
        provider: &'static str,
        code: u16,
        body: String,
    },

    #[error("{provider} API key does not have permission for this request, check billing and key permissions (HTTP 403): {body}")]
    Forbidden { provider: &'static str, body: String },

    #[error("{provider} API rate limit exceeded, try again later or check your usage limits (HTTP 429): {body}")]
    RateLimited { provider: &'static str, body: String },

    #[error("{provider} API endpoint not found ({endpoint}): {body}")]
    EndpointNotFound {
        provider: &'static str,
        endpoint: String,
        body: String,
    },

    #[error("Unexpected response format from {provider} API: {detail}")]
    MalformedResponse {
        provider: &'static str,
        detail: String,
    },

    #[error("{provider} API error ({code}) at {endpoint}: {body}")]
    GenericProviderError {
        provider: &'static str,
        endpoint: String,
        code: u16,
        body: String,
    },
}

impl SummaryError {
    /// Short machine-readable reason, stable across message wording changes.
    pub fn reason(&self) -> &'static str {
        match self {
            SummaryError::EmptyInput { .. } => "empty_input",
            SummaryError::MissingApiKey => "no_api_key",
            SummaryError::InvalidKeyFormat { .. } => "invalid_format",
            SummaryError::ConnectionFailure { .. } => "connection_error",
            SummaryError::InvalidKey { .. } => "invalid_key",
            SummaryError::Forbidden { .. } => "forbidden",
            SummaryError::RateLimited { .. } => "rate_limit",
            SummaryError::EndpointNotFound { .. } => "endpoint_not_found",
            SummaryError::MalformedResponse { .. } => "unexpected_response",
            SummaryError::GenericProviderError { .. } => "api_error",
        }
    }

    /// Errors raised before any request leaves the process.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SummaryError::EmptyInput { .. }
                | SummaryError::MissingApiKey
                | SummaryError::InvalidKeyFormat { .. }
        )
    }
}
