//! In-memory repositories for development without PostgreSQL.
//!
//! Every conditional update runs under a single write lock, so the
//! check-and-modify pairs are as atomic as their SQL counterparts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use postpilot_core::domain::{LinkedInCredential, Post, User, UserProfile, Version};
use postpilot_core::error::RepoError;
use postpilot_core::ports::{
    BaseRepository, PostRepository, ProfileRepository, UserRepository,
};

#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        let taken = users
            .values()
            .any(|u| u.email == entity.email && u.id != entity.id);
        if taken {
            return Err(RepoError::Constraint(format!(
                "email {} already registered",
                entity.email
            )));
        }
        users.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn reset_credits_if_stale(
        &self,
        id: Uuid,
        allowance: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, RepoError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RepoError::NotFound)?;
        if !user.needs_credit_reset(now) {
            return Ok(false);
        }
        user.credits = allowance;
        user.last_credit_reset = Some(now);
        user.updated_at = now;
        Ok(true)
    }

    async fn decrement_credit_if_positive(&self, id: Uuid) -> Result<Option<i32>, RepoError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RepoError::NotFound)?;
        if user.credits <= 0 {
            return Ok(None);
        }
        user.credits -= 1;
        Ok(Some(user.credits))
    }

    async fn refund_credit(&self, id: Uuid) -> Result<(), RepoError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.credits += 1;
        Ok(())
    }

    async fn set_linkedin_credential(
        &self,
        id: Uuid,
        credential: Option<LinkedInCredential>,
    ) -> Result<(), RepoError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.linkedin = credential;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryProfileRepository {
    profiles: Arc<RwLock<HashMap<Uuid, UserProfile>>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<UserProfile, Uuid> for InMemoryProfileRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, RepoError> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: UserProfile) -> Result<UserProfile, RepoError> {
        let mut profiles = self.profiles.write().await;
        let taken = profiles
            .values()
            .any(|p| p.user_id == entity.user_id && p.id != entity.id);
        if taken {
            return Err(RepoError::Constraint(format!(
                "user {} already has a profile",
                entity.user_id
            )));
        }
        profiles.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.profiles
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<UserProfile>, RepoError> {
        let profiles = self.profiles.read().await;
        Ok(profiles.values().find(|p| p.user_id == user_id).cloned())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryPostRepository {
    posts: Arc<RwLock<HashMap<Uuid, Post>>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(RepoError::Constraint(format!("post {} exists", post.id)));
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_for_user(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<Post>, RepoError> {
        let posts = self.posts.read().await;
        Ok(posts
            .get(&post_id)
            .filter(|p| p.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let posts = self.posts.read().await;
        let mut owned: Vec<Post> = posts
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn append_version(&self, post_id: Uuid, version: Version) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts.get_mut(&post_id).ok_or(RepoError::NotFound)?;
        post.push_version(version)
            .map_err(|e| RepoError::Conflict(e.to_string()))?;
        Ok(post.clone())
    }

    async fn delete_for_user(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        let mut posts = self.posts.write().await;
        match posts.get(&post_id) {
            Some(p) if p.user_id == user_id => {
                posts.remove(&post_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postpilot_core::domain::{PromptSpec, VersionContent};

    fn user(credits: i32) -> User {
        User::new(
            "ada@example.com".to_string(),
            "ada".to_string(),
            credits,
            Utc::now(),
        )
    }

    fn post(user_id: Uuid) -> Post {
        Post::new(
            user_id,
            PromptSpec::new("Rust".to_string(), "ownership".to_string(), None).unwrap(),
            VersionContent {
                text: "v1".to_string(),
                image_url: None,
                image_id: None,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_concurrent_decrements_never_overspend() {
        let repo = InMemoryUserRepository::new();
        let id = repo.save(user(3)).await.unwrap().id;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.decrement_credit_if_positive(id).await.unwrap()
            }));
        }

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                granted += 1;
            }
        }

        assert_eq!(granted, 3);
        assert_eq!(repo.find_by_id(id).await.unwrap().unwrap().credits, 0);
    }

    #[tokio::test]
    async fn test_reset_applies_once_per_month() {
        let repo = InMemoryUserRepository::new();
        let mut stale = user(0);
        stale.last_credit_reset = None;
        let u = repo.save(stale).await.unwrap();

        let now = Utc::now();
        assert!(repo.reset_credits_if_stale(u.id, 5, now).await.unwrap());
        assert!(!repo.reset_credits_if_stale(u.id, 5, now).await.unwrap());
        assert_eq!(repo.find_by_id(u.id).await.unwrap().unwrap().credits, 5);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.save(user(5)).await.unwrap();

        let result = repo.save(user(5)).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_stale_append_conflicts() {
        let repo = InMemoryPostRepository::new();
        let p = repo.insert(post(Uuid::new_v4())).await.unwrap();

        let v2 = p.next_version(
            VersionContent {
                text: "v2".to_string(),
                image_url: None,
                image_id: None,
            },
            Utc::now(),
        );
        repo.append_version(p.id, v2.clone()).await.unwrap();

        // A second writer that read the post before the first append
        let result = repo.append_version(p.id, v2).await;
        assert!(matches!(result, Err(RepoError::Conflict(_))));
        assert_eq!(
            repo.find_for_user(p.user_id, p.id)
                .await
                .unwrap()
                .unwrap()
                .version_count(),
            2
        );
    }

    #[tokio::test]
    async fn test_lookups_are_scoped_to_owner() {
        let repo = InMemoryPostRepository::new();
        let owner = Uuid::new_v4();
        let p = repo.insert(post(owner)).await.unwrap();
        let stranger = Uuid::new_v4();

        assert!(repo.find_for_user(stranger, p.id).await.unwrap().is_none());
        assert!(!repo.delete_for_user(stranger, p.id).await.unwrap());
        assert!(repo.delete_for_user(owner, p.id).await.unwrap());
        assert!(repo.list_for_user(owner).await.unwrap().is_empty());
    }
}
