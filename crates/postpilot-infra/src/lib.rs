//! # PostPilot Infrastructure
//!
//! Concrete implementations of the ports defined in `postpilot-core`:
//! persistence, the AI agent client, LinkedIn, bearer-token validation
//! and rate limiting.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - In-memory repositories only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `rate-limit` - Rate limiting via governor

pub mod auth;
pub mod database;
pub mod generation;
mod http;
pub mod linkedin;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

pub use auth::{JwtConfig, JwtTokenService};
pub use database::{
    DatabaseConfig, InMemoryPostRepository, InMemoryProfileRepository, InMemoryUserRepository,
};
pub use generation::{GenerationConfig, HttpGenerationGateway};
pub use linkedin::{
    LinkedInConfig, LinkedInIdTokenDecoder, LinkedInOAuthClient, LinkedInPublishGateway,
};

#[cfg(feature = "postgres")]
pub use database::{
    DatabaseConnections, PostgresPostRepository, PostgresProfileRepository,
    PostgresUserRepository,
};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};
