use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

use super::{ProviderKind, SummaryError};

const OPENAI_KEY_PREFIX: &str = "sk-";
const MIN_KEY_LEN: usize = 20;

static GEMINI_KEY_RE: OnceLock<Regex> = OnceLock::new();

/// Provider API key. Never printed: `Debug` is redacted and the raw value is
/// only reachable through [`ApiKey::expose`].
pub struct ApiKey(SecretString);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Trim, reject empty input and apply the provider's format pre-check.
    ///
    /// Passing this check does not mean the key works; only a live call to the
    /// provider can tell.
    pub fn parse(raw: &str, provider: ProviderKind) -> Result<Self, SummaryError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(SummaryError::EmptyInput { what: "API key" });
        }
        check_format(key, provider)?;
        Ok(Self::new(key))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for ApiKey {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

pub fn check_format(key: &str, provider: ProviderKind) -> Result<(), SummaryError> {
    let valid = match provider {
        ProviderKind::Gemini => GEMINI_KEY_RE
            .get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{20,}$").expect("valid key regex"))
            .is_match(key),
        ProviderKind::ChatGpt => key.starts_with(OPENAI_KEY_PREFIX) && key.len() >= MIN_KEY_LEN,
    };

    if valid {
        Ok(())
    } else {
        Err(SummaryError::InvalidKeyFormat {
            provider: provider.name(),
            hint: match provider {
                ProviderKind::Gemini => {
                    "expected at least 20 letters, digits, '-' or '_'"
                }
                ProviderKind::ChatGpt => "keys start with \"sk-\" and are at least 20 characters",
            },
        })
    }
}
