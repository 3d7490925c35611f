use super::transport::{HttpRequest, HttpTransport};
use super::{ApiKey, CallPurpose, Endpoint, Provider, StatusClass, SummaryError};

/// Where a fallback run currently stands.
#[derive(Debug)]
enum Attempt {
    Trying(usize),
    Success(String),
    Terminal(SummaryError),
    Exhausted(Option<SummaryError>),
}

/// Result of calling a single endpoint.
enum Outcome {
    Body(String),
    Advance(SummaryError),
    Terminal(SummaryError),
}

/// Walks an ordered list of candidate endpoints, one call at a time, until
/// one succeeds, one fails terminally, or the list runs out.
pub struct FallbackSequencer<'a> {
    transport: &'a dyn HttpTransport,
    provider: &'a dyn Provider,
    key: &'a ApiKey,
}

impl<'a> FallbackSequencer<'a> {
    pub fn new(
        transport: &'a dyn HttpTransport,
        provider: &'a dyn Provider,
        key: &'a ApiKey,
    ) -> Self {
        Self {
            transport,
            provider,
            key,
        }
    }

    /// Returns the body of the first 200 response.
    ///
    /// When every candidate fails without a terminal status, the error from the
    /// last attempted endpoint is returned.
    #[tracing::instrument(skip_all, fields(provider = self.provider.name(), ?purpose))]
    pub async fn run(
        &self,
        endpoints: &[Endpoint],
        purpose: CallPurpose,
    ) -> Result<String, SummaryError> {
        let mut last_error = None;
        let mut state = Attempt::Trying(0);

        loop {
            state = match state {
                Attempt::Trying(i) if i >= endpoints.len() => {
                    Attempt::Exhausted(last_error.take())
                }
                Attempt::Trying(i) => match self.attempt(&endpoints[i], purpose).await {
                    Outcome::Body(body) => Attempt::Success(body),
                    Outcome::Terminal(e) => Attempt::Terminal(e),
                    Outcome::Advance(e) => {
                        tracing::warn!(endpoint = %endpoints[i].label, error = %e, "Trying next endpoint");
                        last_error = Some(e);
                        Attempt::Trying(i + 1)
                    }
                },
                Attempt::Success(body) => return Ok(body),
                Attempt::Terminal(e) => {
                    tracing::error!(error = %e, "Provider rejected the request");
                    return Err(e);
                }
                Attempt::Exhausted(e) => {
                    let e = e.unwrap_or_else(|| SummaryError::ConnectionFailure {
                        provider: self.provider.name(),
                        endpoint: "none".to_string(),
                        message: "no candidate endpoints configured".to_string(),
                    });
                    tracing::error!(error = %e, "All endpoints failed");
                    return Err(e);
                }
            };
        }
    }

    async fn attempt(&self, endpoint: &Endpoint, purpose: CallPurpose) -> Outcome {
        let request = HttpRequest {
            method: endpoint.method,
            url: endpoint.url.clone(),
            auth: self.provider.auth(self.key),
            body: endpoint.body.clone(),
            timeout: purpose.timeout(),
        };

        tracing::debug!(endpoint = %endpoint.label, url = %endpoint.url, "Calling provider");

        let response = match self.transport.send(request).await {
            Ok(r) => r,
            Err(e) => {
                return Outcome::Advance(SummaryError::ConnectionFailure {
                    provider: self.provider.name(),
                    endpoint: endpoint.label.clone(),
                    message: e.to_string(),
                })
            }
        };

        match self
            .provider
            .classify_status(response.status, &endpoint.label, &response.body)
        {
            StatusClass::Success => {
                tracing::debug!(endpoint = %endpoint.label, "Provider call succeeded");
                Outcome::Body(response.body)
            }
            StatusClass::Advance(e) => Outcome::Advance(e),
            StatusClass::Terminal(e) => Outcome::Terminal(e),
        }
    }
}
