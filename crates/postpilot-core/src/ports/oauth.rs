use async_trait::async_trait;

use super::GatewayError;

/// Result of the LinkedIn authorization-code exchange.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub id_token: String,
    pub expires_in: i64,
}

#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// URL the browser is sent to for consent.
    fn authorization_url(&self, state: &str) -> String;

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, GatewayError>;
}
