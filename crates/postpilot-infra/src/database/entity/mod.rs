//! SeaORM entities.

pub mod post;
pub mod post_version;
pub mod user;
pub mod user_profile;
