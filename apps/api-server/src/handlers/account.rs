//! Onboarding and account handlers.

use actix_web::{HttpResponse, web};

use postpilot_core::domain::{NewProfile, ProfilePatch, Tone, UserProfile};
use postpilot_core::services::Account;
use postpilot_shared::ApiResponse;
use postpilot_shared::dto::{
    AccountResponse, OnboardingRequest, ProfileResponse, ProfileUpdateRequest,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn parse_tone(tone: Option<String>) -> AppResult<Option<Tone>> {
    Ok(tone
        .filter(|t| !t.trim().is_empty())
        .map(|t| t.parse::<Tone>())
        .transpose()?)
}

fn profile_dto(profile: UserProfile) -> ProfileResponse {
    ProfileResponse {
        full_name: profile.full_name,
        profession_title: profile.profession_title,
        linkedin_url: profile.linkedin_url,
        github_url: profile.github_url,
        portfolio_url: profile.portfolio_url,
        interests: profile.interests,
        bio: profile.bio,
        tone: profile.tone.to_string(),
    }
}

fn account_dto(account: Account) -> AccountResponse {
    let now = chrono::Utc::now();
    let linkedin_connected = account.user.has_usable_credential(now);
    AccountResponse {
        email: account.user.email,
        username: account.user.username,
        credits: account.user.credits,
        subscription_tier: account.user.tier.to_string(),
        linkedin_connected,
        linkedin_expires_at: account
            .user
            .linkedin
            .map(|c| c.expires_at.to_rfc3339()),
        profile: account.profile.map(profile_dto),
    }
}

/// POST /api/onboarding
pub async fn onboard(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<OnboardingRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let input = NewProfile {
        full_name: req.full_name,
        profession_title: req.profession_title,
        linkedin_url: req.linkedin_url,
        github_url: req.github_url.filter(|u| !u.is_empty()),
        portfolio_url: req.portfolio_url.filter(|u| !u.is_empty()),
        interests: req.interests,
        bio: req.bio,
        tone: parse_tone(req.tone)?,
    };

    let account = state.accounts.onboard(&identity.principal, input).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        account_dto(account),
        "Profile completed successfully",
    )))
}

/// GET /api/account
pub async fn get_account(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let account = state.accounts.account(&identity.principal).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(account_dto(account))))
}

/// PATCH /api/account/profile
pub async fn update_profile(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<ProfileUpdateRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let patch = ProfilePatch {
        full_name: req.full_name,
        profession_title: req.profession_title,
        bio: req.bio,
        github_url: req.github_url,
        portfolio_url: req.portfolio_url,
        interests: req.interests,
        tone: parse_tone(req.tone)?,
    };

    let profile = state
        .accounts
        .update_profile(&identity.principal, patch)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        profile_dto(profile),
        "Profile updated",
    )))
}
