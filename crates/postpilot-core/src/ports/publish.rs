//! Publish gateway port - LinkedIn's asset upload and share creation.

use async_trait::async_trait;

use super::GatewayError;

/// Upload slot returned by register-upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSlot {
    pub upload_url: String,
    pub asset: String,
}

/// The calls are independent; the caller sequences them and nothing is rolled back.
#[async_trait]
pub trait PublishGateway: Send + Sync {
    async fn register_upload(
        &self,
        actor_id: &str,
        access_token: &str,
    ) -> Result<UploadSlot, GatewayError>;

    /// Download the generated image so it can be re-uploaded to LinkedIn.
    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, GatewayError>;

    async fn upload_image(&self, upload_url: &str, bytes: Vec<u8>) -> Result<(), GatewayError>;

    /// Create the share. Returns the network's id for the new post when it reports one.
    async fn create_post(
        &self,
        actor_id: &str,
        access_token: &str,
        text: &str,
        asset: Option<&str>,
    ) -> Result<Option<String>, GatewayError>;
}
