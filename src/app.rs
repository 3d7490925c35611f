use std::collections::HashSet;
use std::sync::Arc;

use crate::ai::{HttpTransport, ProviderKind, Summarizer, SummaryError, SummaryResult};
use crate::config::Settings;
use crate::content::plain_text;
use crate::db::Repository;
use crate::display::render_summary;
use crate::error::{AppError, Result};
use crate::models::{
    EnabledState, GenerationOutcome, NewPost, Post, SkipReason, UpdateStatus, STATUS_PUBLISH,
};

/// Post ids already handled during one inbound event. Several hooks can fire
/// for the same save, but each post is generated at most once per pass.
#[derive(Debug, Default)]
pub struct GenerationPass {
    processed: HashSet<i64>,
}

impl GenerationPass {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim(&mut self, post_id: i64) -> bool {
        self.processed.insert(post_id)
    }
}

pub struct App {
    pub settings: Settings,
    pub repository: Repository,
    summarizer: Summarizer,
}

impl App {
    pub async fn new(settings: Settings, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let repository = Repository::new(&settings.db_path).await?;
        Self::with_repository(settings, repository, transport)
    }

    pub fn with_repository(
        settings: Settings,
        repository: Repository,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let summarizer = Summarizer::new(&settings, transport)?;
        Ok(Self {
            settings,
            repository,
            summarizer,
        })
    }

    async fn require_post(&self, post_id: i64) -> Result<Post> {
        self.repository
            .get_post(post_id)
            .await?
            .ok_or(AppError::PostNotFound(post_id))
    }

    pub async fn add_post(&self, post: NewPost) -> Result<i64> {
        self.repository.insert_post(post).await
    }

    /// Persist the editor's summary fields. `enabled: None` leaves the stored
    /// state alone; the regeneration flag is set or cleared every time.
    pub async fn save_post_meta(
        &self,
        post_id: i64,
        enabled: Option<bool>,
        regenerate: bool,
    ) -> Result<()> {
        self.require_post(post_id).await?;
        if let Some(enabled) = enabled {
            self.repository
                .set_enabled(post_id, EnabledState::from_flag(enabled))
                .await?;
        }
        self.repository
            .set_regenerate_flag(post_id, regenerate)
            .await?;
        Ok(())
    }

    /// Editor save: store content and summary fields, then run the update
    /// hook when the post is already published.
    pub async fn save_post(
        &self,
        post_id: i64,
        title: Option<String>,
        content: Option<String>,
        enabled: Option<bool>,
        regenerate: bool,
    ) -> Result<GenerationOutcome> {
        let post = self.require_post(post_id).await?;
        if let Some(content) = content {
            self.repository
                .update_post_content(post_id, title, content)
                .await?;
        } else if title.is_some() {
            self.repository
                .update_post_content(post_id, title, post.content.clone())
                .await?;
        }
        self.save_post_meta(post_id, enabled, regenerate).await?;

        if !post.is_published() {
            return Ok(GenerationOutcome::Skipped(SkipReason::NotPublished));
        }
        let mut pass = GenerationPass::new();
        self.auto_generate(post_id, &mut pass).await
    }

    /// Publish a post, firing both the publish hook and the status
    /// transition hook within one pass.
    pub async fn publish(&self, post_id: i64) -> Result<GenerationOutcome> {
        let old_status = self
            .repository
            .set_post_status(post_id, STATUS_PUBLISH.to_string())
            .await?
            .ok_or(AppError::PostNotFound(post_id))?;

        let mut pass = GenerationPass::new();
        let outcome = self.auto_generate(post_id, &mut pass).await?;
        let transition = self
            .on_publish(post_id, &old_status, STATUS_PUBLISH, &mut pass)
            .await?;

        match outcome {
            GenerationOutcome::Skipped(_) => Ok(transition),
            _ => Ok(outcome),
        }
    }

    /// Publish/update handler. Generates a summary when the post is enabled
    /// and either has no summary yet or a regeneration was requested.
    pub async fn auto_generate(
        &self,
        post_id: i64,
        pass: &mut GenerationPass,
    ) -> Result<GenerationOutcome> {
        if !pass.claim(post_id) {
            return Ok(GenerationOutcome::Skipped(SkipReason::AlreadyProcessed));
        }

        let Some(post) = self.repository.get_post(post_id).await? else {
            return Ok(GenerationOutcome::Skipped(SkipReason::PostNotFound));
        };
        if !self.settings.supports_post_type(&post.post_type) {
            return Ok(GenerationOutcome::Skipped(SkipReason::UnsupportedPostType));
        }

        let meta = self.repository.get_summary_meta(post_id).await?;
        if !meta.enabled.resolve(self.settings.global_enable) {
            return Ok(GenerationOutcome::Skipped(SkipReason::Disabled));
        }
        // Markup with no text counts as empty.
        if plain_text(&post.content).is_empty() {
            return Ok(GenerationOutcome::Skipped(SkipReason::EmptyContent));
        }
        if meta.enabled == EnabledState::Unset {
            self.repository
                .set_enabled(post_id, EnabledState::Enabled)
                .await?;
        }

        if meta.has_summary() && !meta.regenerate_flag {
            return Ok(GenerationOutcome::Skipped(SkipReason::UpToDate));
        }

        match self
            .summarizer
            .generate_summary(&post.content, self.settings.char_count)
            .await
        {
            Ok(summary) => {
                self.repository.save_summary(post_id, summary.clone()).await?;
                if meta.regenerate_flag {
                    tracing::info!(post_id, "Post summary regenerated");
                    Ok(GenerationOutcome::Regenerated(summary))
                } else {
                    tracing::info!(post_id, "Post summary generated");
                    Ok(GenerationOutcome::Generated(summary))
                }
            }
            Err(e) => {
                if e.is_local() {
                    tracing::warn!(post_id, reason = e.reason(), "Summary not generated: {}", e);
                } else {
                    tracing::error!(post_id, reason = e.reason(), "Summary generation failed: {}", e);
                }
                Ok(GenerationOutcome::Failed(e))
            }
        }
    }

    /// Status transition hook: only a move into `publish` for a regular post
    /// triggers generation.
    pub async fn on_publish(
        &self,
        post_id: i64,
        old_status: &str,
        new_status: &str,
        pass: &mut GenerationPass,
    ) -> Result<GenerationOutcome> {
        let Some(post) = self.repository.get_post(post_id).await? else {
            return Ok(GenerationOutcome::Skipped(SkipReason::PostNotFound));
        };
        if new_status != STATUS_PUBLISH || old_status == STATUS_PUBLISH || post.post_type != "post"
        {
            return Ok(GenerationOutcome::Skipped(SkipReason::NotPublished));
        }
        self.auto_generate(post_id, pass).await
    }

    /// Generate right away, whatever the stored flags say. A failure leaves
    /// the stored summary untouched.
    pub async fn regenerate_now(&self, post_id: i64) -> Result<String> {
        let post = self.require_post(post_id).await?;
        let summary = self
            .summarizer
            .generate_summary(&post.content, self.settings.char_count)
            .await?;
        self.repository.save_summary(post_id, summary.clone()).await?;
        Ok(summary)
    }

    pub async fn check_update(&self, post_id: i64) -> Result<UpdateStatus> {
        let meta = self.repository.get_summary_meta(post_id).await?;
        Ok(UpdateStatus::from(&meta))
    }

    /// Themed HTML for a post, or `None` when summaries are off for it or
    /// nothing was generated yet.
    pub async fn render(&self, post_id: i64) -> Result<Option<String>> {
        let meta = self.repository.get_summary_meta(post_id).await?;
        if !meta.enabled.resolve(self.settings.global_enable) {
            return Ok(None);
        }
        Ok(meta.summary.as_deref().and_then(|summary| {
            render_summary(summary, self.settings.theme(), &self.settings.disclaimer)
        }))
    }

    /// Manual "test" action from the settings screen.
    pub async fn test_summary(&self, content: &str) -> SummaryResult {
        if content.trim().is_empty() {
            return Err(SummaryError::EmptyInput { what: "Content" });
        }
        self.summarizer
            .generate_summary(content, self.settings.char_count)
            .await
    }

    pub async fn validate_api_key(
        &self,
        key: &str,
        provider: ProviderKind,
    ) -> std::result::Result<(), SummaryError> {
        self.summarizer.validate_api_key(key, provider).await
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::ai::mock::{MockTransport, Scripted};
    use crate::models::STATUS_DRAFT;

    const ARTICLE: &str = "<p>The city council approved the new budget on Monday after a \
                           long debate about public transport and road repairs.</p>";

    fn settings(global_enable: bool) -> Settings {
        Settings {
            api_provider: "gemini".to_string(),
            api_key: Some("AIzaSyA-1234567890_abcdefghij".to_string()),
            global_enable,
            ..Settings::default()
        }
    }

    async fn app(settings: Settings, transport: &MockTransport) -> App {
        let repository = Repository::open_in_memory().await.unwrap();
        App::with_repository(settings, repository, Arc::new(transport.clone())).unwrap()
    }

    async fn add(app: &App, post_type: &str, content: &str, status: &str) -> i64 {
        app.add_post(NewPost {
            post_type: post_type.to_string(),
            title: "Council budget".to_string(),
            content: content.to_string(),
            status: status.to_string(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn unset_post_follows_global_enable() {
        let transport = MockTransport::new(vec![Scripted::gemini_text("Budget approved.")]);
        let app = app(settings(true), &transport).await;
        let id = add(&app, "post", ARTICLE, STATUS_PUBLISH).await;

        let outcome = app
            .auto_generate(id, &mut GenerationPass::new())
            .await
            .unwrap();
        assert_eq!(outcome, GenerationOutcome::Generated("Budget approved.".to_string()));

        let meta = app.repository.get_summary_meta(id).await.unwrap();
        assert_eq!(meta.enabled, EnabledState::Enabled);
        assert_eq!(meta.summary.as_deref(), Some("Budget approved."));
    }

    #[tokio::test]
    async fn unset_post_without_global_enable_is_skipped() {
        let transport = MockTransport::new(vec![]);
        let app = app(settings(false), &transport).await;
        let id = add(&app, "post", ARTICLE, STATUS_PUBLISH).await;

        let outcome = app
            .auto_generate(id, &mut GenerationPass::new())
            .await
            .unwrap();
        assert_eq!(outcome, GenerationOutcome::Skipped(SkipReason::Disabled));
        assert_eq!(transport.request_count(), 0);
        assert_eq!(
            app.repository.get_summary_meta(id).await.unwrap().enabled,
            EnabledState::Unset
        );
    }

    #[tokio::test]
    async fn explicit_disable_beats_global_enable() {
        let transport = MockTransport::new(vec![]);
        let app = app(settings(true), &transport).await;
        let id = add(&app, "post", ARTICLE, STATUS_PUBLISH).await;
        app.save_post_meta(id, Some(false), false).await.unwrap();

        let outcome = app
            .auto_generate(id, &mut GenerationPass::new())
            .await
            .unwrap();
        assert_eq!(outcome, GenerationOutcome::Skipped(SkipReason::Disabled));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn same_post_is_generated_once_per_pass() {
        let transport = MockTransport::new(vec![Scripted::gemini_text("Budget approved.")]);
        let app = app(settings(true), &transport).await;
        let id = add(&app, "post", ARTICLE, STATUS_PUBLISH).await;
        app.save_post_meta(id, Some(true), true).await.unwrap();

        let mut pass = GenerationPass::new();
        assert_ok!(app.auto_generate(id, &mut pass).await);
        let second = app.auto_generate(id, &mut pass).await.unwrap();
        assert_eq!(second, GenerationOutcome::Skipped(SkipReason::AlreadyProcessed));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn unsupported_post_type_and_empty_content_are_skipped() {
        let transport = MockTransport::new(vec![]);
        let app = app(settings(true), &transport).await;
        let page = add(&app, "page", ARTICLE, STATUS_PUBLISH).await;
        let empty = add(&app, "post", "<p> </p>", STATUS_PUBLISH).await;

        let mut pass = GenerationPass::new();
        assert_eq!(
            app.auto_generate(page, &mut pass).await.unwrap(),
            GenerationOutcome::Skipped(SkipReason::UnsupportedPostType)
        );
        assert_eq!(
            app.auto_generate(empty, &mut pass).await.unwrap(),
            GenerationOutcome::Skipped(SkipReason::EmptyContent)
        );
        assert_eq!(
            app.auto_generate(999, &mut pass).await.unwrap(),
            GenerationOutcome::Skipped(SkipReason::PostNotFound)
        );
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn markup_only_post_is_skipped_and_left_unset() {
        let transport = MockTransport::new(vec![Scripted::gemini_text("never used")]);
        let app = app(settings(true), &transport).await;
        let id = add(&app, "post", "<div><p> </p><br/></div>", STATUS_PUBLISH).await;

        let outcome = app
            .auto_generate(id, &mut GenerationPass::new())
            .await
            .unwrap();
        assert_eq!(outcome, GenerationOutcome::Skipped(SkipReason::EmptyContent));
        assert_eq!(transport.request_count(), 0);
        assert_eq!(
            app.repository.get_summary_meta(id).await.unwrap().enabled,
            EnabledState::Unset
        );
    }

    #[tokio::test]
    async fn existing_summary_needs_regeneration_flag() {
        let transport = MockTransport::new(vec![Scripted::gemini_text("Second summary.")]);
        let app = app(settings(true), &transport).await;
        let id = add(&app, "post", ARTICLE, STATUS_PUBLISH).await;
        app.repository
            .save_summary(id, "First summary.".to_string())
            .await
            .unwrap();

        let outcome = app
            .auto_generate(id, &mut GenerationPass::new())
            .await
            .unwrap();
        assert_eq!(outcome, GenerationOutcome::Skipped(SkipReason::UpToDate));

        app.save_post_meta(id, Some(true), true).await.unwrap();
        assert!(app.check_update(id).await.unwrap().generating);

        let outcome = app
            .auto_generate(id, &mut GenerationPass::new())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            GenerationOutcome::Regenerated("Second summary.".to_string())
        );

        let status = app.check_update(id).await.unwrap();
        assert!(!status.generating);
        assert!(status.regenerated);
        assert_eq!(status.summary, "Second summary.");
    }

    #[tokio::test]
    async fn failed_regeneration_keeps_previous_state() {
        let transport = MockTransport::new(vec![Scripted::status(400, "API key not valid")]);
        let app = app(settings(true), &transport).await;
        let id = add(&app, "post", ARTICLE, STATUS_PUBLISH).await;
        app.repository
            .save_summary(id, "First summary.".to_string())
            .await
            .unwrap();
        app.save_post_meta(id, Some(true), true).await.unwrap();

        let outcome = app
            .auto_generate(id, &mut GenerationPass::new())
            .await
            .unwrap();
        let GenerationOutcome::Failed(err) = outcome else {
            panic!("expected failure, got {:?}", outcome);
        };
        assert_eq!(err.reason(), "invalid_key");

        let meta = app.repository.get_summary_meta(id).await.unwrap();
        assert_eq!(meta.summary.as_deref(), Some("First summary."));
        assert!(meta.regenerate_flag);
    }

    #[tokio::test]
    async fn publishing_a_draft_generates_once() {
        let transport = MockTransport::new(vec![Scripted::gemini_text("Budget approved.")]);
        let app = app(settings(true), &transport).await;
        let id = add(&app, "post", ARTICLE, STATUS_DRAFT).await;

        let outcome = app.publish(id).await.unwrap();
        assert_eq!(outcome, GenerationOutcome::Generated("Budget approved.".to_string()));
        assert_eq!(transport.request_count(), 1);

        // already published: transition hook does nothing, summary is current
        let outcome = app.publish(id).await.unwrap();
        assert_eq!(outcome, GenerationOutcome::Skipped(SkipReason::NotPublished));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn transition_hook_ignores_pages_and_non_publish_moves() {
        let transport = MockTransport::new(vec![]);
        let app = app(settings(true), &transport).await;
        let page = add(&app, "page", ARTICLE, STATUS_DRAFT).await;
        let post = add(&app, "post", ARTICLE, STATUS_DRAFT).await;

        let mut pass = GenerationPass::new();
        for (id, old, new) in [
            (page, STATUS_DRAFT, STATUS_PUBLISH),
            (post, STATUS_PUBLISH, STATUS_PUBLISH),
            (post, STATUS_PUBLISH, STATUS_DRAFT),
        ] {
            assert_eq!(
                app.on_publish(id, old, new, &mut pass).await.unwrap(),
                GenerationOutcome::Skipped(SkipReason::NotPublished)
            );
        }
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn saving_a_published_post_runs_update_hook() {
        let transport = MockTransport::new(vec![Scripted::gemini_text("Updated summary.")]);
        let app = app(settings(false), &transport).await;
        let id = add(&app, "post", ARTICLE, STATUS_PUBLISH).await;

        let outcome = app
            .save_post(id, None, Some("<p>New text.</p>".to_string()), Some(true), false)
            .await
            .unwrap();
        assert_eq!(outcome, GenerationOutcome::Generated("Updated summary.".to_string()));
        assert_eq!(
            app.repository.get_post(id).await.unwrap().unwrap().content,
            "<p>New text.</p>"
        );
    }

    #[tokio::test]
    async fn regenerate_now_overwrites_or_leaves_unchanged() {
        let transport = MockTransport::new(vec![
            Scripted::gemini_text("Fresh summary."),
            Scripted::status(403, "forbidden"),
        ]);
        let app = app(settings(false), &transport).await;
        let id = add(&app, "post", ARTICLE, STATUS_DRAFT).await;
        app.save_post_meta(id, None, true).await.unwrap();

        assert_eq!(app.regenerate_now(id).await.unwrap(), "Fresh summary.");
        let meta = app.repository.get_summary_meta(id).await.unwrap();
        assert_eq!(meta.summary.as_deref(), Some("Fresh summary."));
        assert!(!meta.regenerate_flag);

        let err = assert_err!(app.regenerate_now(id).await);
        assert!(matches!(
            err,
            AppError::Summary(SummaryError::Forbidden { .. })
        ));
        let meta = app.repository.get_summary_meta(id).await.unwrap();
        assert_eq!(meta.summary.as_deref(), Some("Fresh summary."));

        assert!(matches!(
            app.regenerate_now(999).await,
            Err(AppError::PostNotFound(999))
        ));
    }

    #[tokio::test]
    async fn render_respects_enabled_state() {
        let transport = MockTransport::new(vec![]);
        let app = app(settings(false), &transport).await;
        let id = add(&app, "post", ARTICLE, STATUS_PUBLISH).await;
        app.repository
            .save_summary(id, "Budget approved.".to_string())
            .await
            .unwrap();

        assert_eq!(app.render(id).await.unwrap(), None);

        app.save_post_meta(id, Some(true), false).await.unwrap();
        let html = app.render(id).await.unwrap().unwrap();
        assert!(html.contains("post-summary-classic"));
        assert!(html.contains("Budget approved."));
    }

    #[tokio::test]
    async fn test_summary_rejects_empty_content() {
        let transport = MockTransport::new(vec![]);
        let app = app(settings(false), &transport).await;

        let err = assert_err!(app.test_summary("   ").await);
        assert_eq!(err, SummaryError::EmptyInput { what: "Content" });
        assert_eq!(transport.request_count(), 0);
    }
}
