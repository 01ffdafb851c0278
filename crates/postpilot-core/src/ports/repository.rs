use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{LinkedInCredential, Post, User, UserProfile, Version};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository. Credit mutations are single conditional updates so that
/// concurrent requests from the same user cannot overspend.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Set credits to `allowance` and stamp `last_credit_reset = now`, but only if
    /// the last reset is missing or earlier than the month containing `now`.
    /// Returns whether the reset was applied.
    async fn reset_credits_if_stale(
        &self,
        id: Uuid,
        allowance: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, RepoError>;

    /// Decrement credits by one if the balance is positive.
    /// Returns the new balance, or `None` when the balance was already exhausted.
    async fn decrement_credit_if_positive(&self, id: Uuid) -> Result<Option<i32>, RepoError>;

    /// Give back one credit taken by [`UserRepository::decrement_credit_if_positive`].
    async fn refund_credit(&self, id: Uuid) -> Result<(), RepoError>;

    /// Store or clear the LinkedIn credential.
    async fn set_linkedin_credential(
        &self,
        id: Uuid,
        credential: Option<LinkedInCredential>,
    ) -> Result<(), RepoError>;
}

#[async_trait]
pub trait ProfileRepository: BaseRepository<UserProfile, Uuid> {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<UserProfile>, RepoError>;
}

/// Post repository. Every lookup is scoped to the owning user.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Persist a new post together with its first version.
    async fn insert(&self, post: Post) -> Result<Post, RepoError>;

    async fn find_for_user(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<Post>, RepoError>;

    /// All posts of a user, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Post>, RepoError>;

    /// Append `version` if the post currently has exactly `version.version - 1` versions.
    /// Fails with [`RepoError::Conflict`] when another writer appended first.
    async fn append_version(&self, post_id: Uuid, version: Version) -> Result<Post, RepoError>;

    /// Hard delete. Returns false when the user owns no such post.
    async fn delete_for_user(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError>;
}
