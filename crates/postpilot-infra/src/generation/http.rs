//! HTTP generation gateway. Each call is one POST with a JSON body; there
//! are no retries.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use postpilot_core::ports::{
    GatewayError, GeneratedContent, GenerationGateway, GenerationRequest, RevisionRequest,
};

use crate::http::{ensure_success, transport};

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Endpoint that writes a new post.
    pub create_url: String,
    /// Endpoint that revises an existing post.
    pub edit_url: String,
    pub timeout: Duration,
}

impl GenerationConfig {
    pub fn from_env() -> Self {
        Self {
            create_url: std::env::var("GENERATION_CREATE_URL")
                .unwrap_or_else(|_| "http://localhost:5678/webhook/create-post".to_string()),
            edit_url: std::env::var("GENERATION_EDIT_URL")
                .unwrap_or_else(|_| "http://localhost:5678/webhook/edit-post".to_string()),
            timeout: Duration::from_secs(
                std::env::var("GENERATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }
}

pub struct HttpGenerationGateway {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl HttpGenerationGateway {
    pub fn new(config: GenerationConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(transport)?;
        Ok(Self { client, config })
    }

    async fn call<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<GeneratedContent, GatewayError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        let response = ensure_success(response).await?;
        let text = response.text().await.map_err(transport)?;
        parse_content(&text)
    }
}

#[async_trait]
impl GenerationGateway for HttpGenerationGateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedContent, GatewayError> {
        tracing::debug!(topic = %request.topic, "Requesting new post from agent");
        self.call(&self.config.create_url, request).await
    }

    async fn revise(&self, request: &RevisionRequest) -> Result<GeneratedContent, GatewayError> {
        tracing::debug!(
            post_edit = request.post_edit,
            image_edit = request.image_edit,
            "Requesting revision from agent"
        );
        self.call(&self.config.edit_url, request).await
    }
}

/// The agent answers with either an object or an array whose first element
/// is the object. Text arrives under `text` or `output`.
pub(crate) fn parse_content(body: &str) -> Result<GeneratedContent, GatewayError> {
    if body.trim().is_empty() {
        return Err(GatewayError::EmptyResponse);
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
    let object = match value {
        Value::Array(items) => items.into_iter().next().ok_or(GatewayError::EmptyResponse)?,
        other => other,
    };
    let Value::Object(map) = object else {
        return Err(GatewayError::InvalidResponse(
            "expected a JSON object".to_string(),
        ));
    };

    let field = |name: &str| {
        map.get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let content = GeneratedContent {
        text: field("text").or_else(|| field("output")),
        image_url: field("image_url"),
        image_id: field("image_id"),
    };
    if content == GeneratedContent::default() {
        return Err(GatewayError::EmptyResponse);
    }
    Ok(content)
}
