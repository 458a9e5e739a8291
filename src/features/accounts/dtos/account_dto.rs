use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::accounts::models::{
    Education, EducationEntry, Experience, ExperienceEntry, Gender, Role,
};
use crate::shared::constants::{MAX_EDUCATION_ENTRIES, MAX_EXPERIENCE_ENTRIES};
use crate::shared::validation::USERNAME_REGEX;

/// Request DTO for registering the caller's identity as a marketplace account
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAccountDto {
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1-150 characters"),
        regex(
            path = *USERNAME_REGEX,
            message = "Username may only contain letters, digits and @/./+/-/_"
        )
    )]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Cannot be changed after registration
    pub role: Role,

    #[serde(default)]
    #[validate(length(max = 150, message = "Full name must not exceed 150 characters"))]
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EducationDto {
    #[validate(length(max = 255, message = "School name must not exceed 255 characters"))]
    pub school_name: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "Degree must not exceed 255 characters"))]
    pub degree: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceDto {
    #[validate(length(max = 255, message = "Company name must not exceed 255 characters"))]
    pub company_name: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "Role must not exceed 255 characters"))]
    pub role: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

/// Request DTO for replacing the caller's profile.
///
/// `gender`, `education` and `experience` are only accepted for students.
/// Omitted lists keep the stored entries; an empty list clears them.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileDto {
    #[serde(default)]
    #[validate(length(max = 150, message = "Full name must not exceed 150 characters"))]
    pub full_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "Language must not exceed 255 characters"))]
    pub language: String,
    #[serde(default)]
    pub linkedin_url: String,
    #[serde(default)]
    pub twitter_url: String,
    #[serde(default)]
    pub website_url: String,
    pub gender: Option<Gender>,
    #[validate(
        length(
            max = MAX_EDUCATION_ENTRIES,
            message = "At most 2 education entries are allowed"
        ),
        nested
    )]
    pub education: Option<Vec<EducationDto>>,
    #[validate(
        length(
            max = MAX_EXPERIENCE_ENTRIES,
            message = "At most 3 experience entries are allowed"
        ),
        nested
    )]
    pub experience: Option<Vec<ExperienceDto>>,
}

impl UpdateProfileDto {
    pub fn has_student_fields(&self) -> bool {
        self.gender.is_some() || self.education.is_some() || self.experience.is_some()
    }
}

/// Fields shared by every profile response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCommonDto {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub bio: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub linkedin_url: String,
    pub twitter_url: String,
    pub website_url: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfileDto {
    #[serde(flatten)]
    pub common: ProfileCommonDto,
    pub email: String,
    pub gender: Option<Gender>,
    pub cv_url: Option<String>,
    pub cover_letter_url: Option<String>,
    pub education: Vec<EducationDto>,
    pub experience: Vec<ExperienceDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfileDto {
    #[serde(flatten)]
    pub common: ProfileCommonDto,
    pub email: String,
}

/// The caller's own profile; the shape depends on `role`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ProfileResponseDto {
    Student(StudentProfileDto),
    Company(CompanyProfileDto),
}

/// Profile as shown to other users (no contact email, no documents)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileDto {
    #[serde(flatten)]
    pub common: ProfileCommonDto,
    pub role: Role,
}

impl From<EducationDto> for EducationEntry {
    fn from(d: EducationDto) -> Self {
        Self {
            school_name: d.school_name,
            degree: d.degree,
            start_date: d.start_date,
            end_date: d.end_date,
        }
    }
}

impl From<ExperienceDto> for ExperienceEntry {
    fn from(d: ExperienceDto) -> Self {
        Self {
            company_name: d.company_name,
            role: d.role,
            start_date: d.start_date,
            end_date: d.end_date,
            description: d.description,
        }
    }
}

impl From<Education> for EducationDto {
    fn from(e: Education) -> Self {
        Self {
            school_name: e.school_name,
            degree: e.degree,
            start_date: e.start_date,
            end_date: e.end_date,
        }
    }
}

impl From<Experience> for ExperienceDto {
    fn from(e: Experience) -> Self {
        Self {
            company_name: e.company_name,
            role: e.role,
            start_date: e.start_date,
            end_date: e.end_date,
            description: e.description,
        }
    }
}

/// Single-file multipart form used by the profile upload endpoints.
///
/// Documentation only; handlers read the part with `Multipart`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct FileUploadDto {
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}
