//! Post lifecycle handlers: generate, list, read, edit, delete, publish.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use postpilot_core::domain::{EditFacet, EditSpec, Post, PromptSpec, Version, VersionContent};
use postpilot_shared::ApiResponse;
use postpilot_shared::dto::{
    CreatePostRequest, CreatedPostResponse, EditPostRequest, EditedPostResponse, PostResponse,
    PostSummaryResponse, PromptResponse, PublishPostRequest, PublishResponse, VersionContentDto,
    VersionResponse,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::observability::RequestId;
use crate::state::AppState;

fn content_dto(content: &VersionContent) -> VersionContentDto {
    VersionContentDto {
        text: content.text.clone(),
        image_url: content.image_url.clone(),
        image_id: content.image_id.clone(),
    }
}

fn version_dto(version: &Version) -> VersionResponse {
    VersionResponse {
        version: version.version,
        content: content_dto(&version.content),
        created_at: version.created_at.to_rfc3339(),
    }
}

fn post_dto(post: &Post, cap: u32) -> PostResponse {
    PostResponse {
        id: post.id.to_string(),
        prompt: PromptResponse {
            topic: post.prompt.topic.clone(),
            overview: post.prompt.brief.clone(),
            reference_url: post.prompt.link.clone(),
        },
        versions: post.versions().iter().map(version_dto).collect(),
        can_edit: post.can_edit(cap),
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
    }
}

fn summary_dto(post: &Post, cap: u32) -> PostSummaryResponse {
    PostSummaryResponse {
        id: post.id.to_string(),
        topic: post.prompt.topic.clone(),
        version_count: post.version_count(),
        latest: content_dto(&post.latest().content),
        can_edit: post.can_edit(cap),
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
    }
}

/// GET /api/posts
pub async fn list_posts(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.accounts.resolve(&identity.principal).await?;
    let posts = state.posts.list(user.id).await?;

    let cap = state.posts.version_cap();
    let summaries: Vec<PostSummaryResponse> = posts.iter().map(|p| summary_dto(p, cap)).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        summaries,
        "Posts fetched successfully",
    )))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let prompt = PromptSpec::new(req.topic, req.overview, req.reference_url)?;

    let user = state.accounts.resolve(&identity.principal).await?;
    let post = state.posts.create(&user, prompt).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        CreatedPostResponse {
            post_id: post.id.to_string(),
        },
        "Post generated successfully",
    )))
}

/// GET /api/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user = state.accounts.resolve(&identity.principal).await?;
    let post = state.posts.get(user.id, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(post_dto(
        &post,
        state.posts.version_cap(),
    ))))
}

/// POST /api/posts/{id}/edit
pub async fn edit_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<EditPostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let facet: EditFacet = req.edit_type.parse()?;
    let spec = EditSpec::new(facet, req.prompt)?;

    let user = state.accounts.resolve(&identity.principal).await?;
    let post = state.posts.edit(&user, path.into_inner(), spec).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        EditedPostResponse {
            post_id: post.id.to_string(),
            version: post.version_count(),
            can_edit: post.can_edit(state.posts.version_cap()),
        },
        "Post edited successfully",
    )))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user = state.accounts.resolve(&identity.principal).await?;
    state.posts.delete(user.id, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Post deleted")))
}

/// POST /api/posts/{id}/publish
pub async fn publish_post(
    state: web::Data<AppState>,
    identity: Identity,
    request_id: RequestId,
    path: web::Path<Uuid>,
    body: Option<web::Json<PublishPostRequest>>,
) -> AppResult<HttpResponse> {
    let version = body.and_then(|b| b.into_inner().version);
    let user = state.accounts.resolve(&identity.principal).await?;

    let receipt = state
        .publisher
        .publish(user.id, path.into_inner(), version)
        .await?;

    tracing::info!(
        request_id = %request_id.as_str(),
        post_id = %receipt.post_id,
        network_post_id = ?receipt.network_post_id,
        "Post shared on LinkedIn"
    );
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        PublishResponse {
            published_url: receipt.published_url,
            version: receipt.version,
        },
        "Post published successfully",
    )))
}
