//! Generation gateway port - the external AI agent that writes posts.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

/// Body sent to the agent when creating a post.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub user_id: Uuid,
    pub email: String,
    pub topic: String,
    pub additional_info: String,
    pub preferred_tone: String,
    pub media_type: Vec<String>,
    pub inspiration_link: Option<String>,
}

/// Body sent to the agent when revising the latest version.
#[derive(Debug, Clone, Serialize)]
pub struct RevisionRequest {
    pub email: String,
    pub prompt: String,
    #[serde(rename = "Post_text")]
    pub post_text: String,
    pub image_edit: bool,
    pub post_edit: bool,
}

/// Content returned by the agent. Fields it did not produce are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedContent {
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub image_id: Option<String>,
}

/// A single best-effort call; the caller never retries.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedContent, GatewayError>;

    async fn revise(&self, request: &RevisionRequest) -> Result<GeneratedContent, GatewayError>;
}

/// Errors from any external HTTP collaborator.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty response")]
    EmptyResponse,
}
