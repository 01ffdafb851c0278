//! In-process doubles for service tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::domain::{LinkedInCredential, Post, User, UserProfile, Version, month_start};
use crate::error::{PublishStage, RepoError};
use crate::ports::{
    AuthError, BaseRepository, Clock, GatewayError, GeneratedContent, GenerationGateway,
    GenerationRequest, IdentityTokenDecoder, OAuthClient, PostRepository, ProfileRepository,
    PublishGateway, RevisionRequest, TokenGrant, UploadSlot, UserRepository,
};

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
}

pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[derive(Default)]
pub struct FakeUsers {
    rows: Mutex<HashMap<Uuid, User>>,
}

impl FakeUsers {
    pub fn with(user: User) -> Self {
        let repo = Self::default();
        repo.rows.lock().unwrap().insert(user.id, user);
        repo
    }

    pub fn get(&self, id: Uuid) -> User {
        self.rows.lock().unwrap()[&id].clone()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for FakeUsers {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        self.rows.lock().unwrap().insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for FakeUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn reset_credits_if_stale(
        &self,
        id: Uuid,
        allowance: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows.get_mut(&id).ok_or(RepoError::NotFound)?;
        let stale = user.last_credit_reset.is_none_or(|t| t < month_start(now));
        if stale {
            user.credits = allowance;
            user.last_credit_reset = Some(now);
        }
        Ok(stale)
    }

    async fn decrement_credit_if_positive(&self, id: Uuid) -> Result<Option<i32>, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows.get_mut(&id).ok_or(RepoError::NotFound)?;
        if user.credits <= 0 {
            return Ok(None);
        }
        user.credits -= 1;
        Ok(Some(user.credits))
    }

    async fn refund_credit(&self, id: Uuid) -> Result<(), RepoError> {
        let mut rows = self.rows.lock().unwrap();
        rows.get_mut(&id).ok_or(RepoError::NotFound)?.credits += 1;
        Ok(())
    }

    async fn set_linkedin_credential(
        &self,
        id: Uuid,
        credential: Option<LinkedInCredential>,
    ) -> Result<(), RepoError> {
        let mut rows = self.rows.lock().unwrap();
        rows.get_mut(&id).ok_or(RepoError::NotFound)?.linkedin = credential;
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeProfiles {
    rows: Mutex<HashMap<Uuid, UserProfile>>,
}

impl FakeProfiles {
    pub fn with(profile: UserProfile) -> Self {
        let repo = Self::default();
        repo.rows.lock().unwrap().insert(profile.id, profile);
        repo
    }
}

#[async_trait]
impl BaseRepository<UserProfile, Uuid> for FakeProfiles {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, RepoError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, profile: UserProfile) -> Result<UserProfile, RepoError> {
        self.rows.lock().unwrap().insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for FakeProfiles {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<UserProfile>, RepoError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|p| p.user_id == user_id)
            .cloned())
    }
}

#[derive(Default)]
pub struct FakePosts {
    rows: Mutex<Vec<Post>>,
    pub fail_writes: Mutex<bool>,
}

impl FakePosts {
    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn check_writable(&self) -> Result<(), RepoError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(RepoError::Connection("store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for FakePosts {
    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        self.check_writable()?;
        self.rows.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn find_for_user(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == post_id && p.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn append_version(&self, post_id: Uuid, version: Version) -> Result<Post, RepoError> {
        self.check_writable()?;
        let mut rows = self.rows.lock().unwrap();
        let post = rows
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or(RepoError::NotFound)?;
        post.push_version(version)
            .map_err(|e| RepoError::Conflict(e.to_string()))?;
        Ok(post.clone())
    }

    async fn delete_for_user(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|p| !(p.id == post_id && p.user_id == user_id));
        Ok(rows.len() != before)
    }
}

/// Generation gateway that replays queued responses and records requests.
#[derive(Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<GeneratedContent, GatewayError>>>,
    pub calls: AtomicUsize,
    pub revisions: Mutex<Vec<RevisionRequest>>,
}

impl ScriptedGenerator {
    pub fn push_ok(&self, text: Option<&str>, image_url: Option<&str>) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(GeneratedContent {
            text: text.map(str::to_string),
            image_url: image_url.map(str::to_string),
            image_id: image_url.map(|u| format!("id-{u}")),
        }));
        self
    }

    pub fn push_err(&self, err: GatewayError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Result<GeneratedContent, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GatewayError::EmptyResponse))
    }
}

#[async_trait]
impl GenerationGateway for ScriptedGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedContent, GatewayError> {
        self.next()
    }

    async fn revise(&self, request: &RevisionRequest) -> Result<GeneratedContent, GatewayError> {
        self.revisions.lock().unwrap().push(request.clone());
        self.next()
    }
}

/// Publish gateway that records every call and can fail at one stage.
#[derive(Default)]
pub struct RecordingPublisher {
    pub calls: Mutex<Vec<&'static str>>,
    pub fail_at: Mutex<Option<PublishStage>>,
    pub network_id: Mutex<Option<String>>,
}

impl RecordingPublisher {
    pub fn failing_at(stage: PublishStage) -> Self {
        let publisher = Self::default();
        *publisher.fail_at.lock().unwrap() = Some(stage);
        publisher
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str, stage: PublishStage) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(name);
        if *self.fail_at.lock().unwrap() == Some(stage) {
            return Err(GatewayError::Status {
                status: 500,
                body: format!("{name} failed"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PublishGateway for RecordingPublisher {
    async fn register_upload(&self, actor_id: &str, _token: &str) -> Result<UploadSlot, GatewayError> {
        self.record("register_upload", PublishStage::RegisterUpload)?;
        Ok(UploadSlot {
            upload_url: format!("https://upload.example/{actor_id}"),
            asset: "urn:li:digitalmediaAsset:A1".to_string(),
        })
    }

    async fn fetch_image(&self, _image_url: &str) -> Result<Vec<u8>, GatewayError> {
        self.record("fetch_image", PublishStage::FetchImage)?;
        Ok(vec![0x89, 0x50, 0x4e, 0x47])
    }

    async fn upload_image(&self, _upload_url: &str, _bytes: Vec<u8>) -> Result<(), GatewayError> {
        self.record("upload_image", PublishStage::UploadImage)
    }

    async fn create_post(
        &self,
        _actor_id: &str,
        _token: &str,
        _text: &str,
        _asset: Option<&str>,
    ) -> Result<Option<String>, GatewayError> {
        self.record("create_post", PublishStage::CreatePost)?;
        Ok(self.network_id.lock().unwrap().clone())
    }
}

pub struct StaticDecoder(pub Option<String>);

impl IdentityTokenDecoder for StaticDecoder {
    fn actor_id(&self, _id_token: &str) -> Result<String, AuthError> {
        self.0.clone().ok_or(AuthError::MissingClaim("sub"))
    }
}

pub struct FakeOAuth {
    pub grant: Option<TokenGrant>,
}

#[async_trait]
impl OAuthClient for FakeOAuth {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://auth.example/authorize?state={state}")
    }

    async fn exchange_code(&self, _code: &str) -> Result<TokenGrant, GatewayError> {
        self.grant.clone().ok_or(GatewayError::Status {
            status: 400,
            body: "invalid_grant".to_string(),
        })
    }
}
