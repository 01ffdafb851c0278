//! LinkedIn connection handlers.

use actix_web::{HttpResponse, web};

use postpilot_shared::ApiResponse;
use postpilot_shared::dto::{AuthorizeUrlResponse, LinkedInCallbackQuery, LinkedInConnectedResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/linkedin/authorize
///
/// The returned `state` must come back on the callback for this same user.
pub async fn authorize(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.accounts.resolve(&identity.principal).await?;
    let request = state.credentials.begin_authorization(user.id);

    Ok(HttpResponse::Ok().json(ApiResponse::ok(AuthorizeUrlResponse {
        url: request.url,
        state: request.state,
    })))
}

/// GET /api/linkedin/callback?code=...&state=...
pub async fn callback(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<LinkedInCallbackQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    if let Some(error) = query.error {
        let detail = query.error_description.unwrap_or_default();
        return Err(AppError::NotAuthorized(format!(
            "LinkedIn consent was not granted: {error} {detail}"
        )));
    }
    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing code".to_string()))?;

    let user = state.accounts.resolve(&identity.principal).await?;
    let credential = state
        .credentials
        .connect(user.id, &code, query.state.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        LinkedInConnectedResponse {
            expires_at: credential.expires_at.to_rfc3339(),
        },
        "LinkedIn account connected",
    )))
}

/// DELETE /api/linkedin
pub async fn disconnect(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.accounts.resolve(&identity.principal).await?;
    state.credentials.disconnect(user.id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("LinkedIn account disconnected")))
}
