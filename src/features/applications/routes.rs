use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::applications::handlers;
use crate::features::applications::services::ApplicationService;

/// Student and company application routes, behind the auth middleware
pub fn routes(service: Arc<ApplicationService>) -> Router {
    Router::new()
        .route(
            "/api/student/internships/{id}/apply",
            post(handlers::apply),
        )
        .route(
            "/api/student/applications",
            get(handlers::list_my_applications),
        )
        .route(
            "/api/company/applications",
            get(handlers::list_company_applications),
        )
        .route(
            "/api/company/applications/export",
            get(handlers::export_company_applications),
        )
        .route(
            "/api/company/applications/{id}/status",
            patch(handlers::update_application_status),
        )
        .route(
            "/api/company/internships/{id}/applications",
            get(handlers::list_internship_applications),
        )
        .route(
            "/api/company/internships/{id}/applications/export",
            get(handlers::export_internship_applications),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::DefaultBodyLimit;
    use axum::http::{header, StatusCode};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::core::config::MarketplaceConfig;
    use crate::features::accounts::models::Role;
    use crate::features::auth::model::{Caller, CallerAccount};
    use crate::features::internships::models::InternshipFields;
    use crate::shared::test_helpers::{
        anonymous_identity, caller_for, super_admin, with_caller, MemoryApplications,
        MemoryInternships, MemoryStorage, MemoryStore,
    };

    struct World {
        store: Arc<MemoryStore>,
        service: Arc<ApplicationService>,
        company: CallerAccount,
        student: CallerAccount,
        internship_id: uuid::Uuid,
    }

    fn world() -> World {
        let store = Arc::new(MemoryStore::default());
        let service = Arc::new(ApplicationService::new(
            Arc::new(MemoryApplications::new(store.clone())),
            Arc::new(MemoryInternships::new(store.clone())),
            Arc::new(MemoryStorage::default()),
            MarketplaceConfig::default(),
        ));
        let company = store.add_user("acme", Role::Company);
        let student = store.add_user("ada", Role::Student);
        let internship_id = store
            .add_internship(
                company.user_id,
                InternshipFields {
                    title: "Backend Intern".to_string(),
                    location: "Berlin".to_string(),
                    is_remote: false,
                    description: "Rust services".to_string(),
                    requirements: String::new(),
                    deadline: None,
                    is_active: true,
                },
            )
            .id;

        World {
            store,
            service,
            company,
            student,
            internship_id,
        }
    }

    fn server(w: &World, caller: Option<Caller>) -> TestServer {
        let router = routes(w.service.clone()).layer(DefaultBodyLimit::max(16 * 1024 * 1024));
        let router = match caller {
            Some(caller) => with_caller(router, caller),
            None => router,
        };
        TestServer::new(router).unwrap()
    }

    fn cv_form(name: &str, size: usize) -> MultipartForm {
        MultipartForm::new().add_part(
            "cv",
            Part::bytes(vec![1u8; size])
                .file_name(name)
                .mime_type("application/pdf"),
        )
    }

    #[tokio::test]
    async fn test_missing_identity_is_401_envelope() {
        let w = world();
        let response = server(&w, None).get("/api/student/applications").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_wrong_role_and_unregistered_are_403() {
        let w = world();

        let as_company = server(&w, Some(caller_for(&w.company)));
        as_company
            .get("/api/student/applications")
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let unregistered = server(&w, Some(anonymous_identity()));
        unregistered
            .get("/api/company/applications")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_super_admin_passes_role_check_but_not_ownership() {
        let w = world();
        let admin_account = w.store.add_user("root", Role::Student);
        let admin = server(&w, Some(super_admin(Some(&admin_account))));

        admin
            .get("/api/company/applications")
            .await
            .assert_status_ok();

        admin
            .get(&format!(
                "/api/company/internships/{}/applications",
                w.internship_id
            ))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_apply_then_duplicate_is_409() {
        let w = world();
        let student = server(&w, Some(caller_for(&w.student)));
        let path = format!("/api/student/internships/{}/apply", w.internship_id);

        let response = student.post(&path).multipart(cv_form("cv.pdf", 1024)).await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["status"]["value"], "new");

        student
            .post(&path)
            .multipart(cv_form("cv.pdf", 1024))
            .await
            .assert_status(StatusCode::CONFLICT);

        let listed: Value = student.get("/api/student/applications").await.json();
        assert_eq!(listed["meta"]["total"], 1);
    }

    #[tokio::test]
    async fn test_oversized_cv_is_validation_error() {
        let w = world();
        let student = server(&w, Some(caller_for(&w.student)));

        let response = student
            .post(&format!(
                "/api/student/internships/{}/apply",
                w.internship_id
            ))
            .multipart(cv_form("cv.pdf", 6 * 1024 * 1024))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("5 MB"));
    }

    #[tokio::test]
    async fn test_status_update_errors() {
        let w = world();
        let application = w
            .store
            .add_application(w.internship_id, w.student.user_id);
        let company = server(&w, Some(caller_for(&w.company)));
        let path = format!("/api/company/applications/{}/status", application.id);

        let response = company.patch(&path).json(&json!({ "status": "hired" })).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["errors"].is_array());

        company
            .patch(&format!(
                "/api/company/applications/{}/status",
                uuid::Uuid::new_v4()
            ))
            .json(&json!({ "status": "review" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let response = company.patch(&path).json(&json!({ "status": "review" })).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["status"]["label"], "Under Review");
    }

    #[tokio::test]
    async fn test_export_is_csv_attachment() {
        let w = world();
        w.store.add_application(w.internship_id, w.student.user_id);
        let company = server(&w, Some(caller_for(&w.company)));

        let response = company.get("/api/company/applications/export").await;
        response.assert_status_ok();

        let content_type = response.header(header::CONTENT_TYPE);
        assert!(content_type.to_str().unwrap().starts_with("text/csv"));
        let disposition = response.header(header::CONTENT_DISPOSITION);
        assert_eq!(
            disposition.to_str().unwrap(),
            "attachment; filename=\"all_applications.csv\"; filename*=UTF-8''all_applications.csv"
        );
        assert_eq!(response.text().lines().count(), 2);
    }
}
