use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::auth::model::CallerAccount;

/// Profile role, fixed at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Company,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Company => write!(f, "company"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

/// Database model for a registered user
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub subject: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Identity lookup result used by the auth middleware
#[derive(Debug, Clone, FromRow)]
pub struct AccountSummary {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl From<AccountSummary> for CallerAccount {
    fn from(a: AccountSummary) -> Self {
        Self {
            user_id: a.user_id,
            username: a.username,
            role: a.role,
        }
    }
}

/// Raw `profiles` row; student columns are nullable for every role
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub role: Role,
    pub full_name: String,
    pub bio: String,
    pub language: String,
    pub avatar_key: Option<String>,
    pub linkedin_url: String,
    pub twitter_url: String,
    pub website_url: String,
    pub gender: Option<Gender>,
    pub cv_key: Option<String>,
    pub cover_letter_key: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Fields every profile carries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDetails {
    pub full_name: String,
    pub bio: String,
    pub language: String,
    pub avatar_key: Option<String>,
    pub linkedin_url: String,
    pub twitter_url: String,
    pub website_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentDetails {
    pub gender: Option<Gender>,
    pub cv_key: Option<String>,
    pub cover_letter_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileKind {
    Student(StudentDetails),
    Company,
}

/// A profile whose field set is determined by its role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user_id: Uuid,
    pub details: ProfileDetails,
    pub kind: ProfileKind,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn role(&self) -> Role {
        match self.kind {
            ProfileKind::Student(_) => Role::Student,
            ProfileKind::Company => Role::Company,
        }
    }

    pub fn student(&self) -> Option<&StudentDetails> {
        match &self.kind {
            ProfileKind::Student(details) => Some(details),
            ProfileKind::Company => None,
        }
    }
}

impl TryFrom<ProfileRow> for Profile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let kind = match row.role {
            Role::Student => ProfileKind::Student(StudentDetails {
                gender: row.gender,
                cv_key: row.cv_key,
                cover_letter_key: row.cover_letter_key,
            }),
            Role::Company => {
                if row.gender.is_some() || row.cv_key.is_some() || row.cover_letter_key.is_some()
                {
                    return Err(AppError::Internal(format!(
                        "Company profile {} carries student-only fields",
                        row.user_id
                    )));
                }
                ProfileKind::Company
            }
        };

        Ok(Self {
            user_id: row.user_id,
            details: ProfileDetails {
                full_name: row.full_name,
                bio: row.bio,
                language: row.language,
                avatar_key: row.avatar_key,
                linkedin_url: row.linkedin_url,
                twitter_url: row.twitter_url,
                website_url: row.website_url,
            },
            kind,
            updated_at: row.updated_at,
        })
    }
}

/// A user together with its profile
#[derive(Debug, Clone)]
pub struct Account {
    pub user: User,
    pub profile: Profile,
}

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct Education {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub school_name: String,
    pub degree: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct Experience {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub company_name: String,
    pub role: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: String,
}

/// Input for a new user and profile
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub subject: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EducationEntry {
    pub school_name: String,
    pub degree: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperienceEntry {
    pub company_name: String,
    pub role: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: String,
}

/// Replacement values for the editable part of a profile. Stored files are
/// changed separately; `None` lists leave the existing rows untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub bio: String,
    pub language: String,
    pub linkedin_url: String,
    pub twitter_url: String,
    pub website_url: String,
    pub gender: Option<Gender>,
    pub education: Option<Vec<EducationEntry>>,
    pub experience: Option<Vec<ExperienceEntry>>,
}

/// Stored files attached directly to a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFile {
    Avatar,
    Cv,
    CoverLetter,
}

impl ProfileFile {
    pub fn column(self) -> &'static str {
        match self {
            ProfileFile::Avatar => "avatar_key",
            ProfileFile::Cv => "cv_key",
            ProfileFile::CoverLetter => "cover_letter_key",
        }
    }

    pub fn student_only(self) -> bool {
        !matches!(self, ProfileFile::Avatar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: Role) -> ProfileRow {
        ProfileRow {
            user_id: Uuid::new_v4(),
            role,
            full_name: "Ada".to_string(),
            bio: String::new(),
            language: String::new(),
            avatar_key: None,
            linkedin_url: String::new(),
            twitter_url: String::new(),
            website_url: String::new(),
            gender: None,
            cv_key: None,
            cover_letter_key: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_student_row_becomes_student_variant() {
        let mut r = row(Role::Student);
        r.cv_key = Some("private/cvs/x/cv.pdf".to_string());

        let profile = Profile::try_from(r).unwrap();
        assert_eq!(profile.role(), Role::Student);
        assert_eq!(
            profile.student().and_then(|s| s.cv_key.as_deref()),
            Some("private/cvs/x/cv.pdf")
        );
    }

    #[test]
    fn test_company_row_with_student_fields_is_rejected() {
        let mut r = row(Role::Company);
        r.cover_letter_key = Some("private/covers/x/letter.pdf".to_string());

        assert!(Profile::try_from(r).is_err());
    }

    #[test]
    fn test_company_profile_has_no_student_details() {
        let profile = Profile::try_from(row(Role::Company)).unwrap();
        assert_eq!(profile.role(), Role::Company);
        assert!(profile.student().is_none());
    }

    #[test]
    fn test_role_display_matches_database_labels() {
        assert_eq!(Role::Student.to_string(), "student");
        assert_eq!(Role::Company.to_string(), "company");
    }
}
