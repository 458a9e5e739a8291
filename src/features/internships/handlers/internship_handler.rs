use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::guards::{MaybeCaller, RequireCompany};
use crate::features::internships::dtos::{
    BrowseQuery, CatalogFacetsDto, InternshipDetailDto, InternshipFormDto, InternshipListingDto,
    InternshipResponseDto, OwnedQuery,
};
use crate::features::internships::services::InternshipService;
use crate::shared::types::ApiResponse;

/// Browse active internships
///
/// Public. With a student token each item also reports whether the student
/// has already applied.
#[utoipa::path(
    get,
    path = "/api/internships",
    tag = "internships",
    params(BrowseQuery),
    responses(
        (status = 200, description = "Active internships, newest first", body = ApiResponse<Vec<InternshipListingDto>>),
        (status = 400, description = "Invalid query parameters")
    )
)]
pub async fn browse_internships(
    MaybeCaller(caller): MaybeCaller,
    State(service): State<Arc<InternshipService>>,
    AppQuery(query): AppQuery<BrowseQuery>,
) -> Result<Json<ApiResponse<Vec<InternshipListingDto>>>, AppError> {
    let (items, meta) = service.browse(caller.as_ref(), query).await?;
    Ok(Json(ApiResponse::success(Some(items), None, Some(meta))))
}

/// Distinct titles, locations and companies for the browse filters
#[utoipa::path(
    get,
    path = "/api/internships/facets",
    tag = "internships",
    responses(
        (status = 200, description = "Filter suggestions", body = ApiResponse<CatalogFacetsDto>)
    )
)]
pub async fn get_facets(
    State(service): State<Arc<InternshipService>>,
) -> Result<Json<ApiResponse<CatalogFacetsDto>>, AppError> {
    let facets = service.facets().await?;
    Ok(Json(ApiResponse::success(Some(facets), None, None)))
}

/// Get an internship
#[utoipa::path(
    get,
    path = "/api/internships/{id}",
    tag = "internships",
    params(
        ("id" = Uuid, Path, description = "Internship ID")
    ),
    responses(
        (status = 200, description = "Internship detail", body = ApiResponse<InternshipDetailDto>),
        (status = 404, description = "Internship not found or not active")
    )
)]
pub async fn get_internship(
    MaybeCaller(caller): MaybeCaller,
    State(service): State<Arc<InternshipService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InternshipDetailDto>>, AppError> {
    let detail = service.detail(caller.as_ref(), id).await?;
    Ok(Json(ApiResponse::success(Some(detail), None, None)))
}

/// Post a new internship
#[utoipa::path(
    post,
    path = "/api/company/internships",
    tag = "company",
    request_body = InternshipFormDto,
    responses(
        (status = 201, description = "Internship created", body = ApiResponse<InternshipResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Company access required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_internship(
    RequireCompany(company): RequireCompany,
    State(service): State<Arc<InternshipService>>,
    AppJson(dto): AppJson<InternshipFormDto>,
) -> Result<(StatusCode, Json<ApiResponse<InternshipResponseDto>>), AppError> {
    let internship = service.create(&company, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(internship),
            Some("Internship created".to_string()),
            None,
        )),
    ))
}

/// List the caller's internships, including inactive ones
#[utoipa::path(
    get,
    path = "/api/company/internships",
    tag = "company",
    params(OwnedQuery),
    responses(
        (status = 200, description = "Own internships, newest first", body = ApiResponse<Vec<InternshipListingDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Company access required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_my_internships(
    RequireCompany(company): RequireCompany,
    State(service): State<Arc<InternshipService>>,
    AppQuery(query): AppQuery<OwnedQuery>,
) -> Result<Json<ApiResponse<Vec<InternshipListingDto>>>, AppError> {
    let (items, meta) = service.list_owned(&company, query).await?;
    Ok(Json(ApiResponse::success(Some(items), None, Some(meta))))
}

/// Replace an internship's fields
#[utoipa::path(
    put,
    path = "/api/company/internships/{id}",
    tag = "company",
    params(
        ("id" = Uuid, Path, description = "Internship ID")
    ),
    request_body = InternshipFormDto,
    responses(
        (status = 200, description = "Internship updated", body = ApiResponse<InternshipResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Company access required"),
        (status = 404, description = "Internship not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_internship(
    RequireCompany(company): RequireCompany,
    State(service): State<Arc<InternshipService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<InternshipFormDto>,
) -> Result<Json<ApiResponse<InternshipResponseDto>>, AppError> {
    let internship = service.update(&company, id, dto).await?;

    Ok(Json(ApiResponse::success(
        Some(internship),
        Some("Internship updated".to_string()),
        None,
    )))
}
