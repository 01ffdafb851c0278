//! HTTP handlers and route configuration.

mod account;
mod health;
mod linkedin;
mod posts;


use std::sync::Arc;

use actix_web::{HttpMessage, HttpRequest, HttpResponse, error::InternalError, web};
use postpilot_core::ports::RateLimiter;
use postpilot_shared::ErrorResponse;

use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::observability::RequestId;

/// Render malformed bodies, queries and paths in the standard error envelope.
fn extractor_error<E: std::fmt::Display + std::fmt::Debug + 'static>(
    err: E,
    req: &HttpRequest,
) -> actix_web::Error {
    let mut body = ErrorResponse::bad_request(err.to_string());
    if let Some(id) = req.extensions().get::<RequestId>() {
        body = body.with_request_id(id.as_str());
    }
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

/// Configure all application routes. Post endpoints, which spend credits
/// and call the agent, sit behind the rate limiter.
pub fn configure_routes(cfg: &mut web::ServiceConfig, limiter: Option<Arc<dyn RateLimiter>>) {
    cfg.app_data(web::JsonConfig::default().error_handler(extractor_error))
        .app_data(web::QueryConfig::default().error_handler(extractor_error))
        .app_data(web::PathConfig::default().error_handler(extractor_error));

    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Account routes
            .route("/onboarding", web::post().to(account::onboard))
            .service(
                web::scope("/account")
                    .route("", web::get().to(account::get_account))
                    .route("/profile", web::patch().to(account::update_profile)),
            )
            // LinkedIn connection
            .service(
                web::scope("/linkedin")
                    .route("", web::delete().to(linkedin::disconnect))
                    .route("/authorize", web::get().to(linkedin::authorize))
                    .route("/callback", web::get().to(linkedin::callback)),
            )
            // Posts
            .service(
                web::scope("/posts")
                    .wrap(RateLimitMiddleware::new(limiter))
                    .route("", web::get().to(posts::list_posts))
                    .route("", web::post().to(posts::create_post))
                    .route("/{id}", web::get().to(posts::get_post))
                    .route("/{id}", web::delete().to(posts::delete_post))
                    .route("/{id}/edit", web::post().to(posts::edit_post))
                    .route("/{id}/publish", web::post().to(posts::publish_post)),
            ),
    );
}
