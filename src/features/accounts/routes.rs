use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::accounts::handlers;
use crate::features::accounts::services::AccountService;

/// Routes behind the auth middleware
pub fn routes(service: Arc<AccountService>) -> Router {
    Router::new()
        .route("/api/accounts/register", post(handlers::register))
        .route(
            "/api/profile/me",
            get(handlers::get_my_profile).put(handlers::update_my_profile),
        )
        .route("/api/profile/me/avatar", post(handlers::upload_avatar))
        .route("/api/profile/me/cv", post(handlers::upload_cv))
        .route(
            "/api/profile/me/cover-letter",
            post(handlers::upload_cover_letter),
        )
        .route(
            "/api/users/{user_id}/profile",
            get(handlers::get_public_profile),
        )
        .with_state(service)
}
