//! Domain entities - the core business objects.

mod identity;
mod post;
mod profile;
mod user;

pub use identity::Principal;
pub use post::{EditFacet, EditSpec, Post, PromptSpec, Version, VersionContent};
pub use profile::{NewProfile, ProfilePatch, Tone, UserProfile};
pub use user::{
    DEFAULT_MONTHLY_CREDITS, LinkedInCredential, SubscriptionTier, User, month_start,
};
