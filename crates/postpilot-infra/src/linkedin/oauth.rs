use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use postpilot_core::ports::{GatewayError, OAuthClient, TokenGrant};

use super::{LinkedInConfig, SCOPES};
use crate::http::{ensure_success, transport};

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
    expires_in: i64,
}

/// Authorization-code flow against LinkedIn's OAuth endpoints.
pub struct LinkedInOAuthClient {
    client: reqwest::Client,
    config: LinkedInConfig,
    authorize_endpoint: Url,
}

impl LinkedInOAuthClient {
    pub fn new(config: LinkedInConfig) -> Result<Self, GatewayError> {
        let authorize_endpoint = Url::parse(&format!(
            "{}/authorization",
            config.oauth_base.trim_end_matches('/')
        ))
        .map_err(|e| GatewayError::InvalidResponse(format!("invalid LinkedIn OAuth base: {e}")))?;

        Ok(Self {
            client: reqwest::Client::new(),
            config,
            authorize_endpoint,
        })
    }
}

#[async_trait]
impl OAuthClient for LinkedInOAuthClient {
    fn authorization_url(&self, state: &str) -> String {
        let mut url = self.authorize_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("state", state)
            .append_pair("scope", SCOPES);
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, GatewayError> {
        let url = format!(
            "{}/accessToken",
            self.config.oauth_base.trim_end_matches('/')
        );
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(url)
            .form(&params)
            .send()
            .await
            .map_err(transport)?;
        let token: AccessTokenResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        // Without `openid` consent LinkedIn omits the identity token, which
        // we need to learn the member id.
        let id_token = token.id_token.ok_or_else(|| {
            GatewayError::InvalidResponse("token response carries no id_token".to_string())
        })?;

        Ok(TokenGrant {
            access_token: token.access_token,
            id_token,
            expires_in: token.expires_in,
        })
    }
}
