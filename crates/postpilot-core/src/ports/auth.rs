//! Authentication ports: identity-provider bearer tokens and LinkedIn identity tokens.

/// Claims carried by an identity-provider bearer token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub subject: String,
    pub email: String,
    pub username: String,
    pub exp: i64,
}

/// Validates bearer tokens issued by the external identity provider.
pub trait TokenService: Send + Sync {
    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Extracts the LinkedIn member id (`sub`) from a stored identity token.
pub trait IdentityTokenDecoder: Send + Sync {
    fn actor_id(&self, id_token: &str) -> Result<String, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Token is missing claim '{0}'")]
    MissingClaim(&'static str),
}
