use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use postpilot_core::ports::{GatewayError, PublishGateway, UploadSlot};

use crate::http::{ensure_success, transport};

const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";
const UPLOAD_MECHANISM: &str = "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest";

#[derive(Debug, Deserialize)]
struct RegisterUploadResponse {
    value: RegisterUploadValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterUploadValue {
    asset: String,
    upload_mechanism: UploadMechanism,
}

#[derive(Debug, Deserialize)]
struct UploadMechanism {
    #[serde(rename = "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest")]
    http_request: MediaUploadHttpRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaUploadHttpRequest {
    upload_url: String,
}

fn person_urn(actor_id: &str) -> String {
    format!("urn:li:person:{actor_id}")
}

/// Body of `POST /v2/assets?action=registerUpload` for a feed-share image.
pub(crate) fn register_upload_body(actor_id: &str) -> Value {
    json!({
        "registerUploadRequest": {
            "recipes": ["urn:li:digitalmediaRecipe:feedshare-image"],
            "owner": person_urn(actor_id),
            "serviceRelationships": [{
                "relationshipType": "OWNER",
                "identifier": "urn:li:userGeneratedContent",
            }],
        }
    })
}

/// Body of `POST /v2/ugcPosts`. With an asset the share is an image post,
/// otherwise a plain text post.
pub(crate) fn share_body(actor_id: &str, text: &str, asset: Option<&str>) -> Value {
    let share_content = match asset {
        Some(asset) => json!({
            "shareCommentary": { "text": text },
            "shareMediaCategory": "IMAGE",
            "media": [{
                "status": "READY",
                "description": { "text": "AI-generated visual" },
                "media": asset,
                "title": { "text": "PostPilot.ai" },
            }],
        }),
        None => json!({
            "shareCommentary": { "text": text },
            "shareMediaCategory": "NONE",
        }),
    };

    json!({
        "author": person_urn(actor_id),
        "lifecycleState": "PUBLISHED",
        "specificContent": { "com.linkedin.ugc.ShareContent": share_content },
        "visibility": { "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC" },
    })
}

pub(crate) fn parse_upload_slot(body: &str) -> Result<UploadSlot, GatewayError> {
    let parsed: RegisterUploadResponse = serde_json::from_str(body).map_err(|e| {
        GatewayError::InvalidResponse(format!("registerUpload response missing {UPLOAD_MECHANISM}: {e}"))
    })?;
    Ok(UploadSlot {
        upload_url: parsed.value.upload_mechanism.http_request.upload_url,
        asset: parsed.value.asset,
    })
}

/// LinkedIn REST calls used to publish a post.
pub struct LinkedInPublishGateway {
    client: reqwest::Client,
    api_base: String,
}

impl LinkedInPublishGateway {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PublishGateway for LinkedInPublishGateway {
    async fn register_upload(
        &self,
        actor_id: &str,
        access_token: &str,
    ) -> Result<UploadSlot, GatewayError> {
        let response = self
            .client
            .post(format!("{}/v2/assets?action=registerUpload", self.api_base))
            .bearer_auth(access_token)
            .header("X-Restli-Protocol-Version", RESTLI_PROTOCOL_VERSION)
            .json(&register_upload_body(actor_id))
            .send()
            .await
            .map_err(transport)?;
        let body = ensure_success(response)
            .await?
            .text()
            .await
            .map_err(transport)?;
        parse_upload_slot(&body)
    }

    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, GatewayError> {
        let response = self.client.get(image_url).send().await.map_err(transport)?;
        let bytes = ensure_success(response)
            .await?
            .bytes()
            .await
            .map_err(transport)?;
        if bytes.is_empty() {
            return Err(GatewayError::EmptyResponse);
        }
        Ok(bytes.to_vec())
    }

    async fn upload_image(&self, upload_url: &str, bytes: Vec<u8>) -> Result<(), GatewayError> {
        let response = self
            .client
            .put(upload_url)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(bytes)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn create_post(
        &self,
        actor_id: &str,
        access_token: &str,
        text: &str,
        asset: Option<&str>,
    ) -> Result<Option<String>, GatewayError> {
        let response = self
            .client
            .post(format!("{}/v2/ugcPosts", self.api_base))
            .bearer_auth(access_token)
            .header("X-Restli-Protocol-Version", RESTLI_PROTOCOL_VERSION)
            .json(&share_body(actor_id, text, asset))
            .send()
            .await
            .map_err(transport)?;
        let response = ensure_success(response).await?;

        // The new share's URN, e.g. `urn:li:share:7100...`
        let network_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(network_id)
    }
}
