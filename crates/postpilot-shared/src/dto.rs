//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Request to generate a new post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub topic: String,
    /// Free-text brief for the agent.
    #[serde(alias = "brief")]
    pub overview: String,
    /// Optional post whose style should be emulated.
    #[serde(default, alias = "link")]
    pub reference_url: Option<String>,
}

/// Request to revise the latest version of a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditPostRequest {
    /// `text`, `image` or `both`.
    #[serde(rename = "type")]
    pub edit_type: String,
    pub prompt: String,
}

/// Request to publish a post. Without a version the latest is published.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishPostRequest {
    /// 1-based version number.
    #[serde(default)]
    pub version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionContentDto {
    pub text: String,
    pub image_url: Option<String>,
    pub image_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: u32,
    pub content: VersionContentDto,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptResponse {
    pub topic: String,
    pub overview: String,
    pub reference_url: Option<String>,
}

/// Full post with every version, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub prompt: PromptResponse,
    pub versions: Vec<VersionResponse>,
    pub can_edit: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummaryResponse {
    pub id: String,
    pub topic: String,
    pub version_count: u32,
    pub latest: VersionContentDto,
    pub can_edit: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedPostResponse {
    pub post_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditedPostResponse {
    pub post_id: String,
    pub version: u32,
    pub can_edit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResponse {
    pub published_url: String,
    pub version: u32,
}

/// Onboarding form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingRequest {
    pub full_name: String,
    pub profession_title: String,
    pub linkedin_url: String,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    pub bio: String,
    #[serde(default)]
    pub tone: Option<String>,
}

/// Profile changes. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdateRequest {
    pub full_name: Option<String>,
    pub profession_title: Option<String>,
    pub bio: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub interests: Option<Vec<String>>,
    pub tone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub full_name: String,
    pub profession_title: String,
    pub linkedin_url: String,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub interests: Vec<String>,
    pub bio: String,
    pub tone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub email: String,
    pub username: String,
    pub credits: i32,
    pub subscription_tier: String,
    pub linkedin_connected: bool,
    pub linkedin_expires_at: Option<String>,
    pub profile: Option<ProfileResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizeUrlResponse {
    pub url: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInConnectedResponse {
    pub expires_at: String,
}
