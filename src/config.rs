use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ai::defaults::{GEMINI_BASE_URL, GEMINI_MODELS, OPENAI_BASE_URL, OPENAI_MODEL};
use crate::ai::{LanguagePreference, ProviderKind, TargetLength};
use crate::display::SummaryTheme;
use crate::error::{AppError, Result};

const SUPPORTED_POST_TYPES: [&str; 2] = ["post", "page"];

pub const DEFAULT_DISCLAIMER: &str = "This summary was generated by AI and may contain \
    inaccuracies or omissions. Please refer to the full article for complete information.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_provider")]
    pub api_provider: String,

    pub api_key: Option<String>,

    #[serde(default = "default_char_count")]
    pub char_count: i64,

    #[serde(default = "default_language")]
    pub default_language: String,

    #[serde(default)]
    pub global_enable: bool,

    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default = "default_post_types")]
    pub post_types: Vec<String>,

    #[serde(default = "default_disclaimer")]
    pub disclaimer: String,

    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default)]
    pub endpoints: EndpointSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSettings {
    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    /// Tried in order; the first model that answers wins.
    #[serde(default = "default_gemini_models")]
    pub gemini_models: Vec<String>,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,
}

fn default_provider() -> String {
    ProviderKind::default().slug().to_string()
}

fn default_char_count() -> i64 {
    TargetLength::default().chars() as i64
}

fn default_language() -> String {
    LanguagePreference::Auto.to_string()
}

fn default_theme() -> String {
    SummaryTheme::default().slug().to_string()
}

fn default_post_types() -> Vec<String> {
    vec!["post".to_string()]
}

fn default_disclaimer() -> String {
    DEFAULT_DISCLAIMER.to_string()
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("post-summary");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("posts.db").to_string_lossy().to_string()
}

fn default_gemini_base_url() -> String {
    GEMINI_BASE_URL.to_string()
}

fn default_gemini_models() -> Vec<String> {
    GEMINI_MODELS.iter().map(|m| m.to_string()).collect()
}

fn default_openai_base_url() -> String {
    OPENAI_BASE_URL.to_string()
}

fn default_openai_model() -> String {
    OPENAI_MODEL.to_string()
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            gemini_base_url: default_gemini_base_url(),
            gemini_models: default_gemini_models(),
            openai_base_url: default_openai_base_url(),
            openai_model: default_openai_model(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_provider: default_provider(),
            api_key: None,
            char_count: default_char_count(),
            default_language: default_language(),
            global_enable: false,
            theme: default_theme(),
            post_types: default_post_types(),
            disclaimer: default_disclaimer(),
            db_path: default_db_path(),
            endpoints: EndpointSettings::default(),
        }
    }
}

impl Settings {
    /// Read settings from `path`, writing defaults there first if the file
    /// does not exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings.sanitized())
        } else {
            let settings = Settings::default();
            settings.save_to(path)?;
            Ok(settings)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("post-summary")
            .join("config.toml")
    }

    /// Normalize hand-edited values: unknown choices fall back to their
    /// defaults and the global toggle needs an API key.
    pub fn sanitized(mut self) -> Self {
        self.api_provider = self
            .api_provider
            .parse::<ProviderKind>()
            .unwrap_or_default()
            .slug()
            .to_string();

        self.api_key = self
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        self.char_count = TargetLength::new(self.char_count).chars() as i64;

        self.default_language = self
            .default_language
            .parse::<LanguagePreference>()
            .unwrap_or_default()
            .to_string();

        if self.global_enable && self.api_key.is_none() {
            tracing::warn!("Global summaries cannot be enabled without an API key");
            self.global_enable = false;
        }

        self.theme = self
            .theme
            .parse::<SummaryTheme>()
            .unwrap_or_default()
            .slug()
            .to_string();

        let mut post_types: Vec<String> = Vec::new();
        for post_type in &self.post_types {
            let post_type = post_type.trim().to_lowercase();
            if SUPPORTED_POST_TYPES.contains(&post_type.as_str()) && !post_types.contains(&post_type)
            {
                post_types.push(post_type);
            }
        }
        if post_types.is_empty() {
            post_types = default_post_types();
        }
        self.post_types = post_types;

        self
    }

    pub fn provider(&self) -> ProviderKind {
        self.api_provider.parse().unwrap_or_default()
    }

    pub fn language_preference(&self) -> LanguagePreference {
        self.default_language.parse().unwrap_or_default()
    }

    pub fn theme(&self) -> SummaryTheme {
        self.theme.parse().unwrap_or_default()
    }

    pub fn supports_post_type(&self, post_type: &str) -> bool {
        self.post_types.iter().any(|t| t == post_type)
    }
}
