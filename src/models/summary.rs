use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ai::SummaryError;

/// Per-post summary toggle. `Unset` means nobody chose yet, so the global
/// setting decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnabledState {
    #[default]
    Unset,
    Enabled,
    Disabled,
}

impl EnabledState {
    pub fn from_flag(flag: bool) -> Self {
        if flag {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }

    /// SQLite column value: NULL, 1 or 0.
    pub fn to_column(self) -> Option<i64> {
        match self {
            Self::Unset => None,
            Self::Enabled => Some(1),
            Self::Disabled => Some(0),
        }
    }

    pub fn from_column(value: Option<i64>) -> Self {
        match value {
            None => Self::Unset,
            Some(0) => Self::Disabled,
            Some(_) => Self::Enabled,
        }
    }

    pub fn resolve(self, global_enable: bool) -> bool {
        match self {
            Self::Enabled => true,
            Self::Disabled => false,
            Self::Unset => global_enable,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostSummaryMeta {
    pub post_id: i64,
    pub enabled: EnabledState,
    pub summary: Option<String>,
    pub regenerate_flag: bool,
    pub generated_at: Option<DateTime<Utc>>,
}

impl PostSummaryMeta {
    pub fn unset(post_id: i64) -> Self {
        Self {
            post_id,
            ..Self::default()
        }
    }

    pub fn has_summary(&self) -> bool {
        self.summary.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyProcessed,
    PostNotFound,
    UnsupportedPostType,
    Disabled,
    EmptyContent,
    UpToDate,
    NotPublished,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::AlreadyProcessed => "already processed in this pass",
            Self::PostNotFound => "post not found",
            Self::UnsupportedPostType => "post type not enabled for summaries",
            Self::Disabled => "summaries disabled for this post",
            Self::EmptyContent => "post has no content",
            Self::UpToDate => "summary exists and no regeneration was requested",
            Self::NotPublished => "not a transition into publish",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Skipped(SkipReason),
    Generated(String),
    Regenerated(String),
    Failed(SummaryError),
}

/// Poll response for the editor: `generating` while a regeneration is
/// pending, `regenerated` once a summary is stored and nothing is pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateStatus {
    pub summary: String,
    pub generating: bool,
    pub regenerated: bool,
}

impl From<&PostSummaryMeta> for UpdateStatus {
    fn from(meta: &PostSummaryMeta) -> Self {
        let generating = meta.regenerate_flag;
        Self {
            summary: meta.summary.clone().unwrap_or_default(),
            generating,
            regenerated: !generating && meta.has_summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_state_column_mapping() {
        for state in [EnabledState::Unset, EnabledState::Enabled, EnabledState::Disabled] {
            assert_eq!(EnabledState::from_column(state.to_column()), state);
        }
    }

    #[test]
    fn unset_follows_global_setting() {
        assert!(EnabledState::Unset.resolve(true));
        assert!(!EnabledState::Unset.resolve(false));
        assert!(!EnabledState::Disabled.resolve(true));
        assert!(EnabledState::Enabled.resolve(false));
    }

    #[test]
    fn update_status_flags() {
        let mut meta = PostSummaryMeta::unset(7);
        assert_eq!(
            UpdateStatus::from(&meta),
            UpdateStatus {
                summary: String::new(),
                generating: false,
                regenerated: false
            }
        );

        meta.summary = Some("Short summary.".to_string());
        meta.regenerate_flag = true;
        let status = UpdateStatus::from(&meta);
        assert!(status.generating);
        assert!(!status.regenerated);

        meta.regenerate_flag = false;
        let status = UpdateStatus::from(&meta);
        assert!(status.regenerated);
        assert_eq!(status.summary, "Short summary.");
    }
}
