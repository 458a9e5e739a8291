use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::applications::dtos::{
    ApplicationListQuery, ApplyFormDto, CompanyApplicationDto, StudentApplicationDto,
    UpdateStatusDto,
};
use crate::features::applications::models::CompanyScope;
use crate::features::applications::services::{
    ApplicationService, CsvExport, COVER_LETTER_FIELD, CV_FIELD,
};
use crate::features::auth::guards::{RequireCompany, RequireStudent};
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::uploads::collect_files;

/// Apply to an internship
///
/// Multipart form with a required `cv` file (PDF/DOC/DOCX, max 5MB) and an
/// optional `cover_letter` file (PDF/DOC/DOCX, max 2MB).
#[utoipa::path(
    post,
    path = "/api/student/internships/{id}/apply",
    tag = "student",
    params(
        ("id" = Uuid, Path, description = "Internship ID")
    ),
    request_body(
        content = ApplyFormDto,
        content_type = "multipart/form-data",
        description = "CV and optional cover letter"
    ),
    responses(
        (status = 201, description = "Application submitted", body = ApiResponse<StudentApplicationDto>),
        (status = 400, description = "Missing CV or file too large / wrong type"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Only students can apply"),
        (status = 404, description = "Internship not found or not active"),
        (status = 409, description = "Already applied to this internship")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn apply(
    RequireStudent(student): RequireStudent,
    State(service): State<Arc<ApplicationService>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<StudentApplicationDto>>), AppError> {
    let files = collect_files(&mut multipart, &[CV_FIELD, COVER_LETTER_FIELD]).await?;
    let application = service.submit(&student, id, files).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(application),
            Some("Application submitted".to_string()),
            None,
        )),
    ))
}

/// List the caller's applications, newest first
#[utoipa::path(
    get,
    path = "/api/student/applications",
    tag = "student",
    responses(
        (status = 200, description = "Own applications", body = ApiResponse<Vec<StudentApplicationDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Student access required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_my_applications(
    RequireStudent(student): RequireStudent,
    State(service): State<Arc<ApplicationService>>,
) -> Result<Json<ApiResponse<Vec<StudentApplicationDto>>>, AppError> {
    let items = service.list_for_student(&student).await?;
    let total = items.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::total(total)),
    )))
}

/// Applications across all of the caller's postings
#[utoipa::path(
    get,
    path = "/api/company/applications",
    tag = "company",
    params(ApplicationListQuery),
    responses(
        (status = 200, description = "Applications, newest first", body = ApiResponse<Vec<CompanyApplicationDto>>),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Company access required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_company_applications(
    RequireCompany(company): RequireCompany,
    State(service): State<Arc<ApplicationService>>,
    AppQuery(query): AppQuery<ApplicationListQuery>,
) -> Result<Json<ApiResponse<Vec<CompanyApplicationDto>>>, AppError> {
    let (items, meta) = service
        .list_for_company(&company, CompanyScope::AllPostings, query)
        .await?;
    Ok(Json(ApiResponse::success(Some(items), None, Some(meta))))
}

/// Applications to one of the caller's postings
#[utoipa::path(
    get,
    path = "/api/company/internships/{id}/applications",
    tag = "company",
    params(
        ("id" = Uuid, Path, description = "Internship ID"),
        ApplicationListQuery
    ),
    responses(
        (status = 200, description = "Applications, newest first", body = ApiResponse<Vec<CompanyApplicationDto>>),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Company access required"),
        (status = 404, description = "Internship not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_internship_applications(
    RequireCompany(company): RequireCompany,
    State(service): State<Arc<ApplicationService>>,
    Path(id): Path<Uuid>,
    AppQuery(query): AppQuery<ApplicationListQuery>,
) -> Result<Json<ApiResponse<Vec<CompanyApplicationDto>>>, AppError> {
    let (items, meta) = service
        .list_for_company(&company, CompanyScope::Posting(id), query)
        .await?;
    Ok(Json(ApiResponse::success(Some(items), None, Some(meta))))
}

/// Download every matching application across the caller's postings as CSV
#[utoipa::path(
    get,
    path = "/api/company/applications/export",
    tag = "company",
    params(ApplicationListQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Company access required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn export_company_applications(
    RequireCompany(company): RequireCompany,
    State(service): State<Arc<ApplicationService>>,
    AppQuery(query): AppQuery<ApplicationListQuery>,
) -> Result<Response, AppError> {
    let export = service
        .export_csv(&company, CompanyScope::AllPostings, query)
        .await?;
    Ok(csv_attachment(export))
}

/// Download every matching application to one posting as CSV
#[utoipa::path(
    get,
    path = "/api/company/internships/{id}/applications/export",
    tag = "company",
    params(
        ("id" = Uuid, Path, description = "Internship ID"),
        ApplicationListQuery
    ),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Company access required"),
        (status = 404, description = "Internship not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn export_internship_applications(
    RequireCompany(company): RequireCompany,
    State(service): State<Arc<ApplicationService>>,
    Path(id): Path<Uuid>,
    AppQuery(query): AppQuery<ApplicationListQuery>,
) -> Result<Response, AppError> {
    let export = service
        .export_csv(&company, CompanyScope::Posting(id), query)
        .await?;
    Ok(csv_attachment(export))
}

/// Move an application through the review workflow
#[utoipa::path(
    patch,
    path = "/api/company/applications/{id}/status",
    tag = "company",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = UpdateStatusDto,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<CompanyApplicationDto>),
        (status = 400, description = "Unknown status or transition not allowed"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Application belongs to another company's posting"),
        (status = 404, description = "Application not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_application_status(
    RequireCompany(company): RequireCompany,
    State(service): State<Arc<ApplicationService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateStatusDto>,
) -> Result<Json<ApiResponse<CompanyApplicationDto>>, AppError> {
    let application = service.update_status(&company, id, dto).await?;

    Ok(Json(ApiResponse::success(
        Some(application),
        Some("Application status updated".to_string()),
        None,
    )))
}

fn csv_attachment(export: CsvExport) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"{}\"; filename*=UTF-8''{}",
                    export.file_name,
                    urlencoding::encode(&export.file_name)
                ),
            ),
        ],
        export.body,
    )
        .into_response()
}
