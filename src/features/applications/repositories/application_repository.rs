use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::applications::models::{
    Application, ApplicationFilter, ApplicationRecord, ApplicationStatus, CompanyScope,
    NewApplication,
};
use crate::shared::types::PageRequest;
use crate::shared::validation::contains_pattern;

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn exists(&self, internship_id: Uuid, student_id: Uuid) -> Result<bool>;

    /// Insert with status `new`. `None` when the student already applied to the posting.
    async fn insert(&self, application: NewApplication) -> Result<Option<Application>>;

    /// Delete a row whose documents could not be stored
    async fn remove(&self, id: Uuid) -> Result<()>;

    async fn find(&self, id: Uuid) -> Result<Option<ApplicationRecord>>;

    async fn set_status(&self, id: Uuid, status: ApplicationStatus) -> Result<Option<Application>>;

    /// Newest submission first
    async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<ApplicationRecord>>;

    /// Applications on postings owned by `owner_id`, newest first. `page = None`
    /// returns every match.
    async fn list_for_company(
        &self,
        owner_id: Uuid,
        scope: CompanyScope,
        filter: &ApplicationFilter,
        page: Option<PageRequest>,
    ) -> Result<(Vec<ApplicationRecord>, i64)>;
}

const APPLICATION_COLUMNS: &str =
    "id, internship_id, student_id, status, submitted_at, cv_key, cover_letter_key";

const RECORD_SELECT: &str = r#"
    SELECT a.id, a.internship_id, a.student_id, a.status, a.submitted_at,
           a.cv_key, a.cover_letter_key,
           i.title AS internship_title,
           i.owner_id AS internship_owner_id,
           o.username AS company_username,
           s.username AS student_username,
           s.email AS student_email,
           COALESCE(p.full_name, '') AS student_full_name
    FROM applications a
    JOIN internships i ON i.id = a.internship_id
    JOIN users o ON o.id = i.owner_id
    JOIN users s ON s.id = a.student_id
    LEFT JOIN profiles p ON p.user_id = a.student_id
"#;

const COMPANY_WHERE: &str = r#"
    WHERE i.owner_id = $1
      AND ($2::uuid IS NULL OR a.internship_id = $2)
      AND ($3::text IS NULL
           OR s.username ILIKE $3 OR s.email ILIKE $3 OR p.full_name ILIKE $3)
      AND ($4::application_status IS NULL OR a.status = $4)
"#;

pub struct PgApplicationRepository {
    pool: PgPool,
}

impl PgApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationRepository for PgApplicationRepository {
    async fn exists(&self, internship_id: Uuid, student_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM applications WHERE internship_id = $1 AND student_id = $2)",
        )
        .bind(internship_id)
        .bind(student_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, application: NewApplication) -> Result<Option<Application>> {
        // The unique constraint decides between concurrent submissions
        let inserted = sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications (id, internship_id, student_id, cv_key, cover_letter_key)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (internship_id, student_id) DO NOTHING
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(application.internship_id)
        .bind(application.student_id)
        .bind(&application.cv_key)
        .bind(&application.cover_letter_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<ApplicationRecord>> {
        let record = sqlx::query_as::<_, ApplicationRecord>(&format!(
            "{} WHERE a.id = $1",
            RECORD_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn set_status(&self, id: Uuid, status: ApplicationStatus) -> Result<Option<Application>> {
        let updated = sqlx::query_as::<_, Application>(&format!(
            "UPDATE applications SET status = $2 WHERE id = $1 RETURNING {}",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<ApplicationRecord>> {
        let records = sqlx::query_as::<_, ApplicationRecord>(&format!(
            "{} WHERE a.student_id = $1 ORDER BY a.submitted_at DESC, a.id DESC",
            RECORD_SELECT
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn list_for_company(
        &self,
        owner_id: Uuid,
        scope: CompanyScope,
        filter: &ApplicationFilter,
        page: Option<PageRequest>,
    ) -> Result<(Vec<ApplicationRecord>, i64)> {
        let posting = match scope {
            CompanyScope::AllPostings => None,
            CompanyScope::Posting(id) => Some(id),
        };
        let search = filter.search.as_deref().map(contains_pattern);

        // LIMIT NULL means no limit in Postgres
        let records = sqlx::query_as::<_, ApplicationRecord>(&format!(
            "{} {} ORDER BY a.submitted_at DESC, a.id DESC LIMIT $5 OFFSET $6",
            RECORD_SELECT, COMPANY_WHERE
        ))
        .bind(owner_id)
        .bind(posting)
        .bind(&search)
        .bind(filter.status)
        .bind(page.map(|p| p.limit()))
        .bind(page.map(|p| p.offset()).unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            r#"
            SELECT COUNT(*)
            FROM applications a
            JOIN internships i ON i.id = a.internship_id
            JOIN users s ON s.id = a.student_id
            LEFT JOIN profiles p ON p.user_id = a.student_id
            {}
            "#,
            COMPANY_WHERE
        ))
        .bind(owner_id)
        .bind(posting)
        .bind(&search)
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await?;

        Ok((records, total))
    }
}
