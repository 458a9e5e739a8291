use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::ApplicationStatus;

/// Database model for an application
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct Application {
    pub id: Uuid,
    pub internship_id: Uuid,
    pub student_id: Uuid,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub cv_key: String,
    pub cover_letter_key: Option<String>,
}

/// An application joined with its posting, the posting's company and the student
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRecord {
    #[sqlx(flatten)]
    pub application: Application,
    pub internship_title: String,
    pub internship_owner_id: Uuid,
    pub company_username: String,
    pub student_username: String,
    pub student_email: String,
    pub student_full_name: String,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub internship_id: Uuid,
    pub student_id: Uuid,
    pub cv_key: String,
    pub cover_letter_key: Option<String>,
}

/// Which of a company's postings an application listing covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyScope {
    AllPostings,
    Posting(Uuid),
}

/// Company-side filters, combined with AND
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    /// Substring of the student's username, email or full name
    pub search: Option<String>,
    pub status: Option<ApplicationStatus>,
}
