//! JWT validation for identity-provider bearer tokens.
//!
//! Sign-in happens at the identity provider; this service only checks the
//! tokens it issues (HS256 shared secret, issuer, expiry) and extracts the
//! caller's email and username.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;

use postpilot_core::ports::{AuthError, TokenClaims, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";

/// Identity-provider token configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            issuer: "postpilot-idp".to_string(),
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let secret = std::env::var("IDP_JWT_SECRET").unwrap_or_else(|_| DEFAULT_SECRET.to_string());

        // Warn if using default secret in production
        if secret == DEFAULT_SECRET {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default identity-provider secret in production! Set IDP_JWT_SECRET."
                );
            } else {
                tracing::warn!("Using default identity-provider secret. Set IDP_JWT_SECRET for production use.");
            }
        }

        Self {
            secret,
            issuer: std::env::var("IDP_JWT_ISSUER").unwrap_or_else(|_| "postpilot-idp".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, alias = "preferred_username")]
    username: Option<String>,
    exp: i64,
}

/// Validates identity-provider tokens.
pub struct JwtTokenService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }
}

impl TokenService for JwtTokenService {
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken(e.to_string()),
                }
            })?;

        let claims = token_data.claims;
        let email = claims
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or(AuthError::MissingClaim("email"))?;
        // Fall back to the local part of the address when the provider sends no username.
        let username = claims
            .username
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        Ok(TokenClaims {
            subject: claims.sub,
            email,
            username,
            exp: claims.exp,
        })
    }
}
