use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::internships::models::{
    BrowseFilter, CatalogFacets, Internship, InternshipFields, InternshipListing, OwnedFilter,
};
use crate::shared::types::PageRequest;
use crate::shared::validation::contains_pattern;

#[async_trait]
pub trait InternshipRepository: Send + Sync {
    async fn insert(&self, owner_id: Uuid, fields: InternshipFields) -> Result<Internship>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Internship>>;

    /// Replace the editable fields; `None` when no posting with `id` is owned by `owner_id`
    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        fields: InternshipFields,
    ) -> Result<Option<Internship>>;

    /// Active postings only, newest first, with the total match count
    async fn browse(
        &self,
        filter: &BrowseFilter,
        viewer: Option<Uuid>,
        page: PageRequest,
    ) -> Result<(Vec<InternshipListing>, i64)>;

    /// Every posting of `owner_id` regardless of active flag, newest first
    async fn list_owned(
        &self,
        owner_id: Uuid,
        filter: &OwnedFilter,
        page: PageRequest,
    ) -> Result<(Vec<InternshipListing>, i64)>;

    /// One posting with listing annotations for `viewer`
    async fn listing(&self, id: Uuid, viewer: Option<Uuid>) -> Result<Option<InternshipListing>>;

    async fn facets(&self) -> Result<CatalogFacets>;
}

const INTERNSHIP_COLUMNS: &str = "id, owner_id, title, location, is_remote, description, \
     requirements, posted_at, deadline, is_active";

/// Listing projection; `$1` is the viewing student (nullable)
const LISTING_SELECT: &str = r#"
    SELECT i.id, i.owner_id, i.title, i.location, i.is_remote, i.description,
           i.requirements, i.posted_at, i.deadline, i.is_active,
           u.username AS owner_username,
           (SELECT COUNT(*) FROM applications a WHERE a.internship_id = i.id) AS applicant_count,
           (SELECT a.submitted_at FROM applications a
             WHERE a.internship_id = i.id AND a.student_id = $1) AS applied_at
    FROM internships i
    JOIN users u ON u.id = i.owner_id
"#;

const BROWSE_WHERE: &str = r#"
    WHERE i.is_active
      AND ($2::text IS NULL OR i.title ILIKE $2 OR i.description ILIKE $2)
      AND ($3::text IS NULL OR i.location ILIKE $3)
      AND ($4::text IS NULL OR u.username ILIKE $4)
      AND ($5::bool IS NULL OR i.is_remote = $5)
"#;

const OWNED_WHERE: &str = r#"
    WHERE i.owner_id = $2
      AND ($3::text IS NULL OR i.title ILIKE $3)
      AND ($4::bool IS NULL OR i.is_remote = $4)
"#;

pub struct PgInternshipRepository {
    pool: PgPool,
}

impl PgInternshipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InternshipRepository for PgInternshipRepository {
    async fn insert(&self, owner_id: Uuid, fields: InternshipFields) -> Result<Internship> {
        let internship = sqlx::query_as::<_, Internship>(&format!(
            r#"
            INSERT INTO internships
                (id, owner_id, title, location, is_remote, description, requirements, deadline, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            INTERNSHIP_COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(owner_id)
        .bind(&fields.title)
        .bind(&fields.location)
        .bind(fields.is_remote)
        .bind(&fields.description)
        .bind(&fields.requirements)
        .bind(fields.deadline)
        .bind(fields.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(internship)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Internship>> {
        let internship = sqlx::query_as::<_, Internship>(&format!(
            "SELECT {} FROM internships WHERE id = $1",
            INTERNSHIP_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(internship)
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        fields: InternshipFields,
    ) -> Result<Option<Internship>> {
        // posted_at is never touched
        let internship = sqlx::query_as::<_, Internship>(&format!(
            r#"
            UPDATE internships
            SET title = $3, location = $4, is_remote = $5, description = $6,
                requirements = $7, deadline = $8, is_active = $9
            WHERE id = $1 AND owner_id = $2
            RETURNING {}
            "#,
            INTERNSHIP_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .bind(&fields.title)
        .bind(&fields.location)
        .bind(fields.is_remote)
        .bind(&fields.description)
        .bind(&fields.requirements)
        .bind(fields.deadline)
        .bind(fields.is_active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(internship)
    }

    async fn browse(
        &self,
        filter: &BrowseFilter,
        viewer: Option<Uuid>,
        page: PageRequest,
    ) -> Result<(Vec<InternshipListing>, i64)> {
        let search = filter.search.as_deref().map(contains_pattern);
        let location = filter.location.as_deref().map(contains_pattern);
        let company = filter.company.as_deref().map(contains_pattern);

        let rows = sqlx::query_as::<_, InternshipListing>(&format!(
            "{} {} ORDER BY i.posted_at DESC, i.id DESC LIMIT $6 OFFSET $7",
            LISTING_SELECT, BROWSE_WHERE
        ))
        .bind(viewer)
        .bind(&search)
        .bind(&location)
        .bind(&company)
        .bind(filter.remote)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM internships i
            JOIN users u ON u.id = i.owner_id
            WHERE i.is_active
              AND ($1::text IS NULL OR i.title ILIKE $1 OR i.description ILIKE $1)
              AND ($2::text IS NULL OR i.location ILIKE $2)
              AND ($3::text IS NULL OR u.username ILIKE $3)
              AND ($4::bool IS NULL OR i.is_remote = $4)
            "#,
        )
        .bind(&search)
        .bind(&location)
        .bind(&company)
        .bind(filter.remote)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn list_owned(
        &self,
        owner_id: Uuid,
        filter: &OwnedFilter,
        page: PageRequest,
    ) -> Result<(Vec<InternshipListing>, i64)> {
        let search = filter.search.as_deref().map(contains_pattern);

        let rows = sqlx::query_as::<_, InternshipListing>(&format!(
            "{} {} ORDER BY i.posted_at DESC, i.id DESC LIMIT $5 OFFSET $6",
            LISTING_SELECT, OWNED_WHERE
        ))
        .bind(None::<Uuid>)
        .bind(owner_id)
        .bind(&search)
        .bind(filter.remote)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM internships i
            WHERE i.owner_id = $1
              AND ($2::text IS NULL OR i.title ILIKE $2)
              AND ($3::bool IS NULL OR i.is_remote = $3)
            "#,
        )
        .bind(owner_id)
        .bind(&search)
        .bind(filter.remote)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn listing(&self, id: Uuid, viewer: Option<Uuid>) -> Result<Option<InternshipListing>> {
        let listing = sqlx::query_as::<_, InternshipListing>(&format!(
            "{} WHERE i.id = $2",
            LISTING_SELECT
        ))
        .bind(viewer)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(listing)
    }

    async fn facets(&self) -> Result<CatalogFacets> {
        let titles = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT title FROM internships WHERE is_active ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;

        let locations = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT location FROM internships WHERE is_active AND location <> '' ORDER BY location",
        )
        .fetch_all(&self.pool)
        .await?;

        let companies = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT u.username
            FROM internships i
            JOIN users u ON u.id = i.owner_id
            WHERE i.is_active
            ORDER BY u.username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(CatalogFacets {
            titles,
            locations,
            companies,
        })
    }
}
