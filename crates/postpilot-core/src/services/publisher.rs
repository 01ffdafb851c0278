//! Publishing a selected version to LinkedIn.
//!
//! The upload and share calls form a saga without compensation: if the image
//! is uploaded and share creation then fails, the asset stays on LinkedIn and
//! the error reports it as orphaned.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{LinkedInCredential, User, VersionContent};
use crate::error::{DomainError, PublishStage};
use crate::ports::{
    Clock, GatewayError, IdentityTokenDecoder, PostRepository, ProfileRepository, PublishGateway,
    UserRepository,
};

const FEED_UPDATE_URL: &str = "https://www.linkedin.com/feed/update/";
const FEED_URL: &str = "https://www.linkedin.com/feed/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub post_id: Uuid,
    pub version: u32,
    pub published_url: String,
    pub network_post_id: Option<String>,
}

pub struct PublishService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    profiles: Arc<dyn ProfileRepository>,
    gateway: Arc<dyn PublishGateway>,
    decoder: Arc<dyn IdentityTokenDecoder>,
    clock: Arc<dyn Clock>,
}

fn stage_failed(
    stage: PublishStage,
    orphaned_asset: Option<String>,
) -> impl FnOnce(GatewayError) -> DomainError {
    move |err| {
        match &orphaned_asset {
            Some(asset) => {
                tracing::error!(%stage, %asset, error = %err, "Publish failed, uploaded asset orphaned")
            }
            None => tracing::warn!(%stage, error = %err, "Publish failed"),
        }
        DomainError::PublishFailed {
            stage,
            reason: err.to_string(),
            orphaned_asset,
        }
    }
}

impl PublishService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        profiles: Arc<dyn ProfileRepository>,
        gateway: Arc<dyn PublishGateway>,
        decoder: Arc<dyn IdentityTokenDecoder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            posts,
            profiles,
            gateway,
            decoder,
            clock,
        }
    }

    /// Publish version `version_index` (1-based, latest when `None`) of a post.
    pub async fn publish(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        version_index: Option<u32>,
    ) -> Result<PublishReceipt, DomainError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id))?;
        let post = self
            .posts
            .find_for_user(user_id, post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;
        let version = post.select(version_index)?;

        let credential = self.usable_credential(&user)?;
        let actor_id = self.decoder.actor_id(&credential.id_token).map_err(|e| {
            DomainError::NotAuthorized(format!(
                "invalid LinkedIn identity token ({e}); reconnect your LinkedIn account"
            ))
        })?;

        let network_post_id = self
            .run(&actor_id, &credential.access_token, &version.content)
            .await?;

        let published_url = match &network_post_id {
            Some(id) => format!("{FEED_UPDATE_URL}{id}"),
            None => self
                .profiles
                .find_by_user_id(user_id)
                .await?
                .map(|p| p.linkedin_url)
                .unwrap_or_else(|| FEED_URL.to_string()),
        };

        tracing::info!(%user_id, %post_id, version = version.version, "Post published to LinkedIn");
        Ok(PublishReceipt {
            post_id,
            version: version.version,
            published_url,
            network_post_id,
        })
    }

    /// Checked in order: present, non-empty, not expired.
    fn usable_credential<'a>(&self, user: &'a User) -> Result<&'a LinkedInCredential, DomainError> {
        let credential = user.linkedin.as_ref().ok_or_else(|| {
            DomainError::NotAuthorized("connect your LinkedIn account in your profile".to_string())
        })?;
        if credential.access_token.is_empty() || credential.id_token.is_empty() {
            return Err(DomainError::NotAuthorized(
                "LinkedIn credential is incomplete; reconnect your LinkedIn account".to_string(),
            ));
        }
        if credential.expires_at < self.clock.now() {
            return Err(DomainError::NotAuthorized(
                "LinkedIn credential expired; reconnect your LinkedIn account".to_string(),
            ));
        }
        Ok(credential)
    }

    async fn run(
        &self,
        actor_id: &str,
        access_token: &str,
        content: &VersionContent,
    ) -> Result<Option<String>, DomainError> {
        let image_url = content.image_url.as_deref().filter(|u| !u.is_empty());

        let asset = match image_url {
            Some(image_url) => {
                let bytes = self
                    .gateway
                    .fetch_image(image_url)
                    .await
                    .map_err(stage_failed(PublishStage::FetchImage, None))?;
                let slot = self
                    .gateway
                    .register_upload(actor_id, access_token)
                    .await
                    .map_err(stage_failed(PublishStage::RegisterUpload, None))?;
                self.gateway
                    .upload_image(&slot.upload_url, bytes)
                    .await
                    .map_err(stage_failed(PublishStage::UploadImage, Some(slot.asset.clone())))?;
                Some(slot.asset)
            }
            None => None,
        };

        self.gateway
            .create_post(actor_id, access_token, &content.text, asset.as_deref())
            .await
            .map_err(stage_failed(PublishStage::CreatePost, asset.clone()))
    }
}
