use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::core::extractor::AppJson;
use crate::features::accounts::dtos::{
    FileUploadDto, ProfileResponseDto, PublicProfileDto, RegisterAccountDto, UpdateProfileDto,
};
use crate::features::accounts::models::ProfileFile;
use crate::features::accounts::services::AccountService;
use crate::features::auth::guards::{RequireAccount, RequireIdentity, RequireStudent};
use crate::shared::types::ApiResponse;
use crate::shared::uploads::collect_files;

/// Register the authenticated identity as a student or company
#[utoipa::path(
    post,
    path = "/api/accounts/register",
    tag = "accounts",
    request_body = RegisterAccountDto,
    responses(
        (status = 201, description = "Account registered", body = ApiResponse<ProfileResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 409, description = "Identity already registered or username taken")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn register(
    RequireIdentity(caller): RequireIdentity,
    State(service): State<Arc<AccountService>>,
    AppJson(dto): AppJson<RegisterAccountDto>,
) -> Result<(StatusCode, Json<ApiResponse<ProfileResponseDto>>), AppError> {
    let profile = service.register(&caller, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(profile),
            Some("Account registered".to_string()),
            None,
        )),
    ))
}

/// Get the caller's profile (student profiles include education and experience)
#[utoipa::path(
    get,
    path = "/api/profile/me",
    tag = "accounts",
    responses(
        (status = 200, description = "Own profile", body = ApiResponse<ProfileResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Registration required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_my_profile(
    RequireAccount(account): RequireAccount,
    State(service): State<Arc<AccountService>>,
) -> Result<Json<ApiResponse<ProfileResponseDto>>, AppError> {
    let profile = service.me(&account).await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}

/// Replace the caller's profile fields
#[utoipa::path(
    put,
    path = "/api/profile/me",
    tag = "accounts",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<ProfileResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Registration required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_my_profile(
    RequireAccount(account): RequireAccount,
    State(service): State<Arc<AccountService>>,
    AppJson(dto): AppJson<UpdateProfileDto>,
) -> Result<Json<ApiResponse<ProfileResponseDto>>, AppError> {
    let profile = service.update_me(&account, dto).await?;

    Ok(Json(ApiResponse::success(
        Some(profile),
        Some("Profile updated".to_string()),
        None,
    )))
}

/// Upload a profile picture (multipart field `file`)
#[utoipa::path(
    post,
    path = "/api/profile/me/avatar",
    tag = "accounts",
    request_body(
        content = FileUploadDto,
        content_type = "multipart/form-data",
        description = "Image"
    ),
    responses(
        (status = 200, description = "Avatar stored", body = ApiResponse<ProfileResponseDto>),
        (status = 400, description = "Missing file, wrong type or too large"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Registration required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_avatar(
    RequireAccount(account): RequireAccount,
    State(service): State<Arc<AccountService>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ProfileResponseDto>>, AppError> {
    let mut files = collect_files(&mut multipart, &["file"]).await?;
    let profile = service
        .upload_profile_file(&account, ProfileFile::Avatar, files.remove("file"))
        .await?;

    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}

/// Upload the student's default CV (multipart field `file`)
#[utoipa::path(
    post,
    path = "/api/profile/me/cv",
    tag = "accounts",
    request_body(
        content = FileUploadDto,
        content_type = "multipart/form-data",
        description = "PDF/DOC/DOCX"
    ),
    responses(
        (status = 200, description = "CV stored", body = ApiResponse<ProfileResponseDto>),
        (status = 400, description = "Missing file, wrong type or too large"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Student access required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_cv(
    RequireStudent(account): RequireStudent,
    State(service): State<Arc<AccountService>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ProfileResponseDto>>, AppError> {
    let mut files = collect_files(&mut multipart, &["file"]).await?;
    let profile = service
        .upload_profile_file(&account, ProfileFile::Cv, files.remove("file"))
        .await?;

    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}

/// Upload the student's default cover letter (multipart field `file`)
#[utoipa::path(
    post,
    path = "/api/profile/me/cover-letter",
    tag = "accounts",
    request_body(
        content = FileUploadDto,
        content_type = "multipart/form-data",
        description = "PDF/DOC/DOCX"
    ),
    responses(
        (status = 200, description = "Cover letter stored", body = ApiResponse<ProfileResponseDto>),
        (status = 400, description = "Missing file, wrong type or too large"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Student access required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_cover_letter(
    RequireStudent(account): RequireStudent,
    State(service): State<Arc<AccountService>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ProfileResponseDto>>, AppError> {
    let mut files = collect_files(&mut multipart, &["file"]).await?;
    let profile = service
        .upload_profile_file(&account, ProfileFile::CoverLetter, files.remove("file"))
        .await?;

    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}

/// View another user's public profile
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/profile",
    tag = "accounts",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Public profile", body = ApiResponse<PublicProfileDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_public_profile(
    RequireAccount(_account): RequireAccount,
    State(service): State<Arc<AccountService>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<PublicProfileDto>>, AppError> {
    let profile = service.public_profile(user_id).await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}
