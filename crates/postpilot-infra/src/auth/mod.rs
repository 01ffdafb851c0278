//! Bearer-token validation for the external identity provider.

mod jwt;

pub use jwt::{JwtConfig, JwtTokenService};
