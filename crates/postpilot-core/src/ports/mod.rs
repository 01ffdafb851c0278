//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod clock;
mod generation;
mod oauth;
mod publish;
mod rate_limit;
mod repository;

pub use auth::{AuthError, IdentityTokenDecoder, TokenClaims, TokenService};
pub use clock::{Clock, SystemClock};
pub use generation::{
    GatewayError, GeneratedContent, GenerationGateway, GenerationRequest, RevisionRequest,
};
pub use oauth::{OAuthClient, TokenGrant};
pub use publish::{PublishGateway, UploadSlot};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{BaseRepository, PostRepository, ProfileRepository, UserRepository};
