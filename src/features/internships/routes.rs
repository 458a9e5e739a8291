use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};

use crate::features::internships::handlers;
use crate::features::internships::services::InternshipService;

/// Catalog routes open to anonymous callers
pub fn public_routes(service: Arc<InternshipService>) -> Router {
    Router::new()
        .route("/api/internships", get(handlers::browse_internships))
        .route("/api/internships/facets", get(handlers::get_facets))
        .route("/api/internships/{id}", get(handlers::get_internship))
        .with_state(service)
}

/// Company posting management, behind the auth middleware
pub fn protected_routes(service: Arc<InternshipService>) -> Router {
    Router::new()
        .route(
            "/api/company/internships",
            get(handlers::list_my_internships).post(handlers::create_internship),
        )
        .route(
            "/api/company/internships/{id}",
            put(handlers::update_internship),
        )
        .with_state(service)
}
