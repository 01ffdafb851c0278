//! LinkedIn integration: OAuth code exchange, identity-token decoding,
//! image upload and share creation.

mod id_token;
mod oauth;
mod publish;

pub use id_token::LinkedInIdTokenDecoder;
pub use oauth::LinkedInOAuthClient;
pub use publish::LinkedInPublishGateway;

/// Scopes requested at consent.
pub const SCOPES: &str = "openid profile email w_member_social";

/// Issuer of LinkedIn's OpenID Connect identity tokens.
pub const ID_TOKEN_ISSUER: &str = "https://www.linkedin.com/oauth";

#[derive(Debug, Clone)]
pub struct LinkedInConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// REST API root, e.g. `https://api.linkedin.com`.
    pub api_base: String,
    /// OAuth root, e.g. `https://www.linkedin.com/oauth/v2`.
    pub oauth_base: String,
}

impl LinkedInConfig {
    pub fn from_env() -> Self {
        let client_id = std::env::var("LINKEDIN_CLIENT_ID").unwrap_or_default();
        if client_id.is_empty() {
            tracing::warn!("LINKEDIN_CLIENT_ID is not set; LinkedIn connect will fail");
        }

        Self {
            client_id,
            client_secret: std::env::var("LINKEDIN_CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: std::env::var("LINKEDIN_REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:8080/api/linkedin/callback".to_string()),
            api_base: std::env::var("LINKEDIN_API_BASE")
                .unwrap_or_else(|_| "https://api.linkedin.com".to_string()),
            oauth_base: std::env::var("LINKEDIN_OAUTH_BASE")
                .unwrap_or_else(|_| "https://www.linkedin.com/oauth/v2".to_string()),
        }
    }
}
