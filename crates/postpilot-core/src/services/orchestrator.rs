//! Edit orchestrator - creates posts and appends bounded revisions.
//!
//! Every quota-consuming operation follows the same pipeline:
//! quota check, one generation call, charge, persist. Nothing is written until
//! the agent has answered, and a failed write gives the credit back.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{EditSpec, Post, PromptSpec, User, VersionContent};
use crate::error::{DomainError, RepoError};
use crate::ports::{
    Clock, GatewayError, GeneratedContent, GenerationGateway, GenerationRequest, PostRepository,
    ProfileRepository, RevisionRequest,
};
use crate::services::QuotaLedger;

/// Maximum number of versions a post may hold.
pub const DEFAULT_VERSION_CAP: u32 = 3;

pub struct EditOrchestrator {
    posts: Arc<dyn PostRepository>,
    profiles: Arc<dyn ProfileRepository>,
    quota: Arc<QuotaLedger>,
    generator: Arc<dyn GenerationGateway>,
    clock: Arc<dyn Clock>,
    version_cap: u32,
}

fn generation_failed(err: GatewayError) -> DomainError {
    tracing::warn!(error = %err, "Generation agent call failed");
    DomainError::GenerationFailed(err.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl EditOrchestrator {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        profiles: Arc<dyn ProfileRepository>,
        quota: Arc<QuotaLedger>,
        generator: Arc<dyn GenerationGateway>,
        clock: Arc<dyn Clock>,
        version_cap: u32,
    ) -> Self {
        Self {
            posts,
            profiles,
            quota,
            generator,
            clock,
            version_cap,
        }
    }

    pub fn version_cap(&self) -> u32 {
        self.version_cap
    }

    /// Generate a new post and store it with version 1.
    pub async fn create(&self, user: &User, prompt: PromptSpec) -> Result<Post, DomainError> {
        let profile = self
            .profiles
            .find_by_user_id(user.id)
            .await?
            .ok_or_else(|| DomainError::not_found("profile", user.id))?;

        self.quota.check(user.id).await?;

        let request = GenerationRequest {
            user_id: user.id,
            email: user.email.clone(),
            topic: prompt.topic.clone(),
            additional_info: prompt.brief.clone(),
            preferred_tone: profile.tone.to_string(),
            media_type: vec!["text".to_string(), "image".to_string()],
            inspiration_link: prompt.link.clone(),
        };
        let generated = self
            .generator
            .generate(&request)
            .await
            .map_err(generation_failed)?;

        let text = non_empty(generated.text).ok_or_else(|| {
            DomainError::GenerationFailed("agent returned no post text".to_string())
        })?;
        let content = VersionContent {
            text,
            image_url: non_empty(generated.image_url),
            image_id: non_empty(generated.image_id),
        };
        let post = Post::new(user.id, prompt, content, self.clock.now());

        let balance = self.quota.charge(user.id).await?;
        match self.posts.insert(post).await {
            Ok(post) => {
                tracing::info!(user_id = %user.id, post_id = %post.id, balance, "Post created");
                Ok(post)
            }
            Err(e) => {
                self.quota.refund(user.id).await;
                Err(e.into())
            }
        }
    }

    /// Regenerate one or both facets of the latest version and append the result.
    pub async fn edit(
        &self,
        user: &User,
        post_id: Uuid,
        spec: EditSpec,
    ) -> Result<Post, DomainError> {
        let post = self.get(user.id, post_id).await?;

        if !post.can_edit(self.version_cap) {
            return Err(DomainError::EditLimitReached {
                cap: self.version_cap,
            });
        }

        self.quota.check(user.id).await?;

        let previous = post.latest();
        let request = RevisionRequest {
            email: user.email.clone(),
            prompt: spec.instructions.clone(),
            post_text: previous.content.text.clone(),
            image_edit: spec.facet.regenerates_image(),
            post_edit: spec.facet.regenerates_text(),
        };
        let generated = self
            .generator
            .revise(&request)
            .await
            .map_err(generation_failed)?;
        let generated = Self::revision_content(generated, &spec)?;

        let content = VersionContent::layer(&previous.content, generated, spec.facet);
        let version = post.next_version(content, self.clock.now());
        let number = version.version;

        let balance = self.quota.charge(user.id).await?;
        match self.posts.append_version(post.id, version).await {
            Ok(post) => {
                tracing::info!(
                    user_id = %user.id,
                    post_id = %post.id,
                    version = number,
                    balance,
                    "Post version appended"
                );
                Ok(post)
            }
            Err(e) => {
                self.quota.refund(user.id).await;
                // The post was deleted while the agent was working on it.
                Err(match e {
                    RepoError::NotFound => DomainError::not_found("post", post_id),
                    other => other.into(),
                })
            }
        }
    }

    /// The agent must return every facet it was asked to regenerate.
    fn revision_content(
        generated: GeneratedContent,
        spec: &EditSpec,
    ) -> Result<VersionContent, DomainError> {
        let text = non_empty(generated.text);
        let image_url = non_empty(generated.image_url);

        if spec.facet.regenerates_text() && text.is_none() {
            return Err(DomainError::GenerationFailed(
                "agent returned no post text".to_string(),
            ));
        }
        if spec.facet.regenerates_image() && image_url.is_none() {
            return Err(DomainError::GenerationFailed(
                "agent returned no image".to_string(),
            ));
        }

        Ok(VersionContent {
            text: text.unwrap_or_default(),
            image_url,
            image_id: non_empty(generated.image_id),
        })
    }

    pub async fn get(&self, user_id: Uuid, post_id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_for_user(user_id, post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Post>, DomainError> {
        Ok(self.posts.list_for_user(user_id).await?)
    }

    /// Unconditional and final.
    pub async fn delete(&self, user_id: Uuid, post_id: Uuid) -> Result<(), DomainError> {
        if !self.posts.delete_for_user(user_id, post_id).await? {
            return Err(DomainError::not_found("post", post_id));
        }
        tracing::info!(%user_id, %post_id, "Post deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EditFacet, NewProfile, UserProfile};
    use crate::ports::BaseRepository;
    use crate::services::fakes::{
        FakePosts, FakeProfiles, FakeUsers, FixedClock, ScriptedGenerator, at,
    };

    struct Harness {
        orchestrator: EditOrchestrator,
        users: Arc<FakeUsers>,
        posts: Arc<FakePosts>,
        generator: Arc<ScriptedGenerator>,
        user: User,
    }

    fn harness_with_cap(cap: u32) -> Harness {
        let clock = Arc::new(FixedClock::new(at(2025, 6, 10)));
        let user = User::new("ada@example.com".into(), "ada".into(), 5, at(2025, 6, 1));
        let profile = UserProfile::create(
            user.id,
            user.email.clone(),
            NewProfile {
                full_name: "Ada".into(),
                profession_title: "Engineer".into(),
                linkedin_url: "https://www.linkedin.com/in/ada".into(),
                bio: "bio".into(),
                ..Default::default()
            },
        )
        .unwrap();

        let users = Arc::new(FakeUsers::with(user.clone()));
        let posts = Arc::new(FakePosts::default());
        let generator = Arc::new(ScriptedGenerator::default());
        let quota = Arc::new(QuotaLedger::new(users.clone(), clock.clone(), 5));
        let orchestrator = EditOrchestrator::new(
            posts.clone(),
            Arc::new(FakeProfiles::with(profile)),
            quota,
            generator.clone(),
            clock,
            cap,
        );

        Harness {
            orchestrator,
            users,
            posts,
            generator,
            user,
        }
    }

    fn harness() -> Harness {
        harness_with_cap(DEFAULT_VERSION_CAP)
    }

    fn prompt() -> PromptSpec {
        PromptSpec::new("AI".into(), "launch".into(), None).unwrap()
    }

    fn edit(facet: EditFacet) -> EditSpec {
        EditSpec::new(facet, "make it punchier".into()).unwrap()
    }

    #[tokio::test]
    async fn test_create_stores_version_one_and_charges() {
        let h = harness();
        h.generator.push_ok(Some("Hello"), Some("x"));

        let post = h.orchestrator.create(&h.user, prompt()).await.unwrap();

        assert_eq!(post.version_count(), 1);
        assert_eq!(post.latest().content.text, "Hello");
        assert_eq!(post.latest().content.image_url.as_deref(), Some("x"));
        assert_eq!(h.users.get(h.user.id).credits, 4);
    }

    #[tokio::test]
    async fn test_failed_generation_persists_nothing_and_is_free() {
        let h = harness();
        h.generator
            .push_err(GatewayError::Transport("timeout".into()));

        let result = h.orchestrator.create(&h.user, prompt()).await;

        assert!(matches!(result, Err(DomainError::GenerationFailed(_))));
        assert_eq!(h.posts.count(), 0);
        assert_eq!(h.users.get(h.user.id).credits, 5);
    }

    #[tokio::test]
    async fn test_empty_text_is_generation_failure() {
        let h = harness();
        h.generator.push_ok(Some("  "), Some("x"));

        let result = h.orchestrator.create(&h.user, prompt()).await;

        assert!(matches!(result, Err(DomainError::GenerationFailed(_))));
        assert_eq!(h.users.get(h.user.id).credits, 5);
    }

    #[tokio::test]
    async fn test_no_credits_means_no_agent_call() {
        let h = harness();
        let mut broke = h.users.get(h.user.id);
        broke.credits = 0;
        h.users.save(broke).await.unwrap();
        h.generator.push_ok(Some("Hello"), None);

        let result = h.orchestrator.create(&h.user, prompt()).await;

        assert!(matches!(result, Err(DomainError::QuotaExceeded)));
        assert_eq!(h.generator.call_count(), 0);
        assert_eq!(h.posts.count(), 0);
    }

    #[tokio::test]
    async fn test_failed_store_refunds_credit() {
        let h = harness();
        h.generator.push_ok(Some("Hello"), None);
        *h.posts.fail_writes.lock().unwrap() = true;

        let result = h.orchestrator.create(&h.user, prompt()).await;

        assert!(matches!(result, Err(DomainError::Internal(_))));
        assert_eq!(h.users.get(h.user.id).credits, 5);
    }

    #[tokio::test]
    async fn test_text_edit_keeps_image_and_prior_versions() {
        let h = harness();
        h.generator
            .push_ok(Some("Hello"), Some("x"))
            .push_ok(Some("Hello, world"), Some("should-be-ignored"));
        let post = h.orchestrator.create(&h.user, prompt()).await.unwrap();
        let original = post.latest().clone();

        let edited = h
            .orchestrator
            .edit(&h.user, post.id, edit(EditFacet::Text))
            .await
            .unwrap();

        assert_eq!(edited.version_count(), 2);
        assert_eq!(edited.versions()[0], original);
        let latest = &edited.latest().content;
        assert_eq!(latest.text, "Hello, world");
        assert_eq!(latest.image_url, original.content.image_url);
        assert_eq!(latest.image_id, original.content.image_id);

        let sent = h.generator.revisions.lock().unwrap()[0].clone();
        assert!(sent.post_edit);
        assert!(!sent.image_edit);
        assert_eq!(sent.post_text, "Hello");
    }

    #[tokio::test]
    async fn test_image_edit_requires_image() {
        let h = harness();
        h.generator
            .push_ok(Some("Hello"), Some("x"))
            .push_ok(Some("text only"), None);
        let post = h.orchestrator.create(&h.user, prompt()).await.unwrap();

        let result = h
            .orchestrator
            .edit(&h.user, post.id, edit(EditFacet::Image))
            .await;

        assert!(matches!(result, Err(DomainError::GenerationFailed(_))));
        assert_eq!(h.orchestrator.get(h.user.id, post.id).await.unwrap().version_count(), 1);
        assert_eq!(h.users.get(h.user.id).credits, 4);
    }

    #[tokio::test]
    async fn test_edit_cap_rejects_without_calling_agent() {
        let h = harness();
        h.generator
            .push_ok(Some("v1"), Some("a"))
            .push_ok(Some("v2"), None)
            .push_ok(None, Some("c"));
        let post = h.orchestrator.create(&h.user, prompt()).await.unwrap();
        h.orchestrator
            .edit(&h.user, post.id, edit(EditFacet::Text))
            .await
            .unwrap();
        h.orchestrator
            .edit(&h.user, post.id, edit(EditFacet::Image))
            .await
            .unwrap();
        let calls_before = h.generator.call_count();

        let result = h
            .orchestrator
            .edit(&h.user, post.id, edit(EditFacet::Both))
            .await;

        assert!(matches!(result, Err(DomainError::EditLimitReached { cap: 3 })));
        assert_eq!(h.generator.call_count(), calls_before);
        assert_eq!(h.orchestrator.get(h.user.id, post.id).await.unwrap().version_count(), 3);
        assert_eq!(h.users.get(h.user.id).credits, 2);
    }

    #[tokio::test]
    async fn test_three_edits_then_rejected_with_cap_of_four() {
        let h = harness_with_cap(4);
        h.generator.push_ok(Some("v1"), Some("a"));
        for i in 2..=4 {
            h.generator.push_ok(Some(&format!("v{i}")), Some("b"));
        }
        let post = h.orchestrator.create(&h.user, prompt()).await.unwrap();
        for _ in 0..3 {
            h.orchestrator
                .edit(&h.user, post.id, edit(EditFacet::Both))
                .await
                .unwrap();
        }

        let result = h
            .orchestrator
            .edit(&h.user, post.id, edit(EditFacet::Text))
            .await;

        assert!(matches!(result, Err(DomainError::EditLimitReached { cap: 4 })));
        let stored = h.orchestrator.get(h.user.id, post.id).await.unwrap();
        let numbers: Vec<u32> = stored.versions().iter().map(|v| v.version).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(h.users.get(h.user.id).credits, 1);
    }

    #[tokio::test]
    async fn test_delete_removes_post_from_listing() {
        let h = harness();
        h.generator.push_ok(Some("Hello"), None).push_ok(Some("Other"), None);
        let doomed = h.orchestrator.create(&h.user, prompt()).await.unwrap();
        let kept = h.orchestrator.create(&h.user, prompt()).await.unwrap();

        h.orchestrator.delete(h.user.id, doomed.id).await.unwrap();

        let listed: Vec<Uuid> = h
            .orchestrator
            .list(h.user.id)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(listed, vec![kept.id]);
        assert!(matches!(
            h.orchestrator.delete(h.user.id, doomed.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    /// Generator that deletes the post it is revising before answering.
    struct DeletingGenerator {
        posts: Arc<FakePosts>,
        user_id: Uuid,
        post_id: Uuid,
    }

    #[async_trait::async_trait]
    impl GenerationGateway for DeletingGenerator {
        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<GeneratedContent, GatewayError> {
            Err(GatewayError::EmptyResponse)
        }

        async fn revise(
            &self,
            _request: &RevisionRequest,
        ) -> Result<GeneratedContent, GatewayError> {
            self.posts
                .delete_for_user(self.user_id, self.post_id)
                .await
                .unwrap();
            Ok(GeneratedContent {
                text: Some("too late".into()),
                image_url: None,
                image_id: None,
            })
        }
    }

    #[tokio::test]
    async fn test_post_deleted_during_edit_is_not_found_and_refunded() {
        let h = harness();
        h.generator.push_ok(Some("Hello"), None);
        let post = h.orchestrator.create(&h.user, prompt()).await.unwrap();
        assert_eq!(h.users.get(h.user.id).credits, 4);

        let clock = Arc::new(FixedClock::new(at(2025, 6, 10)));
        let racing = EditOrchestrator::new(
            h.posts.clone(),
            Arc::new(FakeProfiles::default()),
            Arc::new(QuotaLedger::new(h.users.clone(), clock.clone(), 5)),
            Arc::new(DeletingGenerator {
                posts: h.posts.clone(),
                user_id: h.user.id,
                post_id: post.id,
            }),
            clock,
            DEFAULT_VERSION_CAP,
        );

        let result = racing.edit(&h.user, post.id, edit(EditFacet::Text)).await;

        assert!(matches!(result, Err(DomainError::NotFound { entity_type: "post", .. })));
        assert_eq!(h.posts.count(), 0);
        assert_eq!(h.users.get(h.user.id).credits, 4);
    }

    #[tokio::test]
    async fn test_other_users_post_is_not_found() {
        let h = harness();
        h.generator.push_ok(Some("Hello"), None);
        let post = h.orchestrator.create(&h.user, prompt()).await.unwrap();

        let result = h.orchestrator.get(Uuid::new_v4(), post.id).await;

        assert!(matches!(result, Err(DomainError::NotFound { entity_type: "post", .. })));
    }
}
