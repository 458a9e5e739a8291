use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::applications::models::{
    ApplicationFilter, ApplicationRecord, ApplicationStatus,
};
use crate::shared::types::PageQuery;
use crate::shared::validation::normalize_search;

/// Request DTO for changing an application's status
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateStatusDto {
    /// One of `new`, `review`, `accepted`, `rejected`
    pub status: String,
}

/// Multipart form accepted by the apply endpoint.
///
/// Documentation only; the handler reads the parts with `Multipart`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ApplyFormDto {
    /// PDF, DOC or DOCX, at most 5MB
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub cv: String,
    /// PDF, DOC or DOCX, at most 2MB
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub cover_letter: Option<String>,
}

/// Filters for company application listings and exports
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApplicationListQuery {
    /// Page number (1-indexed); ignored by exports
    pub page: Option<i64>,
    /// Case-insensitive substring of student username, email or full name
    pub search: Option<String>,
    /// Exact status (`new`, `review`, `accepted`, `rejected`)
    pub status: Option<String>,
}

impl ApplicationListQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page.unwrap_or(1),
        }
    }

    pub fn filter(&self) -> Result<ApplicationFilter> {
        let status = normalize_search(self.status.clone())
            .map(|s| s.parse::<ApplicationStatus>())
            .transpose()
            .map_err(AppError::Validation)?;

        Ok(ApplicationFilter {
            search: normalize_search(self.search.clone()),
            status,
        })
    }
}

/// Status as stored plus its display label
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusDto {
    pub value: ApplicationStatus,
    pub label: String,
}

impl From<ApplicationStatus> for StatusDto {
    fn from(status: ApplicationStatus) -> Self {
        Self {
            value: status,
            label: status.label().to_string(),
        }
    }
}

/// An application as returned to the student who submitted it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentApplicationDto {
    pub id: Uuid,
    pub internship_id: Uuid,
    pub internship_title: String,
    pub company: String,
    pub status: StatusDto,
    pub submitted_at: DateTime<Utc>,
}

impl From<ApplicationRecord> for StudentApplicationDto {
    fn from(r: ApplicationRecord) -> Self {
        Self {
            id: r.application.id,
            internship_id: r.application.internship_id,
            internship_title: r.internship_title,
            company: r.company_username,
            status: r.application.status.into(),
            submitted_at: r.application.submitted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
}

/// An application as seen by the company owning the posting
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyApplicationDto {
    pub id: Uuid,
    pub internship_id: Uuid,
    pub internship_title: String,
    pub student: ApplicantDto,
    pub status: StatusDto,
    pub submitted_at: DateTime<Utc>,
    /// Time-limited download link
    pub cv_url: String,
    pub cover_letter_url: Option<String>,
}
