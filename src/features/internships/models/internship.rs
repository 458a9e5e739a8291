use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a posting
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct Internship {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub location: String,
    pub is_remote: bool,
    pub description: String,
    pub requirements: String,
    pub posted_at: DateTime<Utc>,
    /// Informational; postings are never deactivated by date
    pub deadline: Option<NaiveDate>,
    pub is_active: bool,
}

/// A posting with the values derived for listings
#[derive(Debug, Clone, FromRow)]
pub struct InternshipListing {
    #[sqlx(flatten)]
    pub internship: Internship,
    pub owner_username: String,
    pub applicant_count: i64,
    /// Submission time of the viewing student's application, if any
    pub applied_at: Option<DateTime<Utc>>,
}

impl InternshipListing {
    pub fn already_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

/// Editable attributes of a posting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternshipFields {
    pub title: String,
    pub location: String,
    pub is_remote: bool,
    pub description: String,
    pub requirements: String,
    pub deadline: Option<NaiveDate>,
    pub is_active: bool,
}

/// Filters for the public catalog; every field narrows the result
#[derive(Debug, Clone, Default)]
pub struct BrowseFilter {
    /// Substring of title or description
    pub search: Option<String>,
    pub location: Option<String>,
    /// Substring of the owning company's username
    pub company: Option<String>,
    /// `None` matches both remote and on-site postings
    pub remote: Option<bool>,
}

/// Filters for a company's own postings
#[derive(Debug, Clone, Default)]
pub struct OwnedFilter {
    /// Substring of title
    pub search: Option<String>,
    pub remote: Option<bool>,
}

/// Distinct values offered as browse filter suggestions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFacets {
    pub titles: Vec<String>,
    pub locations: Vec<String>,
    pub companies: Vec<String>,
}
