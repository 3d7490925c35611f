use super::sequencer::FallbackSequencer;
use super::transport::HttpTransport;
use super::{ApiKey, CallPurpose, Provider, SummaryError};

/// Confirm that `raw_key` is accepted by the provider.
///
/// Empty and badly formatted keys are rejected without any network call.
/// Otherwise the provider's model listing is tried first, falling back to a
/// minimal generation request; only an HTTP 200 counts as valid.
#[tracing::instrument(skip_all, fields(provider = provider.name()))]
pub async fn validate_api_key(
    transport: &dyn HttpTransport,
    provider: &dyn Provider,
    raw_key: &str,
) -> Result<(), SummaryError> {
    let key = ApiKey::parse(raw_key, provider.kind())?;

    let endpoints = provider.validation_endpoints();
    FallbackSequencer::new(transport, provider, &key)
        .run(&endpoints, CallPurpose::Validation)
        .await?;

    tracing::info!("API key is valid");
    Ok(())
}
