use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::internships::models::{
    BrowseFilter, CatalogFacets, Internship, InternshipFields, InternshipListing, OwnedFilter,
};
use crate::shared::types::PageQuery;
use crate::shared::validation::normalize_search;

fn default_true() -> bool {
    true
}

/// Request DTO for creating or replacing a posting
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternshipFormDto {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "Location must not exceed 150 characters"))]
    pub location: String,

    #[serde(default)]
    pub is_remote: bool,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[serde(default)]
    pub requirements: String,

    /// Informational only
    pub deadline: Option<NaiveDate>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl From<InternshipFormDto> for InternshipFields {
    fn from(d: InternshipFormDto) -> Self {
        Self {
            title: d.title.trim().to_string(),
            location: d.location.trim().to_string(),
            is_remote: d.is_remote,
            description: d.description,
            requirements: d.requirements,
            deadline: d.deadline,
            is_active: d.is_active,
        }
    }
}

/// Query parameters for the public catalog
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BrowseQuery {
    /// Page number (1-indexed)
    pub page: Option<i64>,
    /// Case-insensitive substring of title or description
    pub search: Option<String>,
    /// Case-insensitive substring of location
    pub location: Option<String>,
    /// Case-insensitive substring of the company username
    pub company: Option<String>,
    /// `true` for remote only, `false` for on-site only, omit for both
    pub remote: Option<bool>,
}

impl BrowseQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page.unwrap_or(1),
        }
    }

    pub fn filter(&self) -> BrowseFilter {
        BrowseFilter {
            search: normalize_search(self.search.clone()),
            location: normalize_search(self.location.clone()),
            company: normalize_search(self.company.clone()),
            remote: self.remote,
        }
    }
}

/// Query parameters for a company's own postings
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OwnedQuery {
    /// Page number (1-indexed)
    pub page: Option<i64>,
    /// Case-insensitive substring of title
    pub search: Option<String>,
    pub remote: Option<bool>,
}

impl OwnedQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page.unwrap_or(1),
        }
    }

    pub fn filter(&self) -> OwnedFilter {
        OwnedFilter {
            search: normalize_search(self.search.clone()),
            remote: self.remote,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternshipResponseDto {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub location: String,
    pub is_remote: bool,
    pub description: String,
    pub requirements: String,
    pub posted_at: DateTime<Utc>,
    pub deadline: Option<NaiveDate>,
    pub is_active: bool,
}

impl From<Internship> for InternshipResponseDto {
    fn from(i: Internship) -> Self {
        Self {
            id: i.id,
            owner_id: i.owner_id,
            title: i.title,
            location: i.location,
            is_remote: i.is_remote,
            description: i.description,
            requirements: i.requirements,
            posted_at: i.posted_at,
            deadline: i.deadline,
            is_active: i.is_active,
        }
    }
}

/// Posting as shown in listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternshipListingDto {
    #[serde(flatten)]
    pub internship: InternshipResponseDto,
    pub company: String,
    pub applicant_count: i64,
    /// Always false for anonymous callers and companies
    pub already_applied: bool,
}

impl From<InternshipListing> for InternshipListingDto {
    fn from(l: InternshipListing) -> Self {
        let already_applied = l.already_applied();
        Self {
            internship: l.internship.into(),
            company: l.owner_username,
            applicant_count: l.applicant_count,
            already_applied,
        }
    }
}

/// Posting detail, including when the viewing student applied
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternshipDetailDto {
    #[serde(flatten)]
    pub listing: InternshipListingDto,
    pub applied_at: Option<DateTime<Utc>>,
}

impl From<InternshipListing> for InternshipDetailDto {
    fn from(l: InternshipListing) -> Self {
        let applied_at = l.applied_at;
        Self {
            listing: l.into(),
            applied_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFacetsDto {
    pub titles: Vec<String>,
    pub locations: Vec<String>,
    pub companies: Vec<String>,
}

impl From<CatalogFacets> for CatalogFacetsDto {
    fn from(f: CatalogFacets) -> Self {
        Self {
            titles: f.titles,
            locations: f.locations,
            companies: f.companies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_filters_are_ignored() {
        let query = BrowseQuery {
            search: Some("  ".to_string()),
            location: Some(" Berlin ".to_string()),
            remote: Some(false),
            ..Default::default()
        };

        let filter = query.filter();
        assert_eq!(filter.search, None);
        assert_eq!(filter.location.as_deref(), Some("Berlin"));
        assert_eq!(filter.company, None);
        assert_eq!(filter.remote, Some(false));
        assert_eq!(query.page().page, 1);
    }

    #[test]
    fn test_form_defaults_to_active() {
        let dto: InternshipFormDto = serde_json::from_str(
            r#"{"title":"Backend Intern","description":"Rust services"}"#,
        )
        .unwrap();

        assert!(dto.is_active);
        assert!(!dto.is_remote);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_form_requires_title() {
        let dto: InternshipFormDto =
            serde_json::from_str(r#"{"title":"","description":"x"}"#).unwrap();
        assert!(dto.validate().is_err());
    }
}
