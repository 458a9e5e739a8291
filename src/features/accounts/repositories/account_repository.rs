use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::accounts::models::{
    Account, AccountSummary, Education, Experience, NewAccount, Profile, ProfileFile, ProfileRow,
    ProfileUpdate, User,
};

/// Persistence for users, profiles and the student education/experience rows
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<AccountSummary>>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<Account>>;

    /// Create user and profile together. Duplicate subject or username is `Conflict`.
    async fn create(&self, account: NewAccount) -> Result<Account>;

    /// Update the profile row and replace any provided lists in one transaction
    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<Account>;

    /// Point a profile file column at `key`, returning the key it replaced
    async fn set_profile_file(
        &self,
        user_id: Uuid,
        file: ProfileFile,
        key: &str,
    ) -> Result<Option<String>>;

    async fn list_education(&self, user_id: Uuid) -> Result<Vec<Education>>;

    async fn list_experience(&self, user_id: Uuid) -> Result<Vec<Experience>>;
}

const USER_COLUMNS: &str = "id, subject, username, email, created_at";

const PROFILE_COLUMNS: &str = "user_id, role, full_name, bio, language, avatar_key, \
     linkedin_url, twitter_url, website_url, gender, cv_key, cover_letter_key, updated_at";

pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles WHERE user_id = $1",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Profile::try_from).transpose()
    }

    async fn replace_education(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<()> {
        let Some(entries) = &update.education else {
            return Ok(());
        };

        sqlx::query("DELETE FROM education WHERE profile_id = $1")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO education (id, profile_id, school_name, degree, start_date, end_date)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::now_v7())
            .bind(user_id)
            .bind(&entry.school_name)
            .bind(&entry.degree)
            .bind(entry.start_date)
            .bind(entry.end_date)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn replace_experience(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<()> {
        let Some(entries) = &update.experience else {
            return Ok(());
        };

        sqlx::query("DELETE FROM experience WHERE profile_id = $1")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO experience
                    (id, profile_id, company_name, role, start_date, end_date, description)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::now_v7())
            .bind(user_id)
            .bind(&entry.company_name)
            .bind(&entry.role)
            .bind(entry.start_date)
            .bind(entry.end_date)
            .bind(&entry.description)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

/// Map unique violations on `users` to a readable `Conflict`
fn registration_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return match db.constraint() {
                Some("users_username_key") => {
                    AppError::Conflict("Username is already taken".to_string())
                }
                _ => AppError::Conflict("Account is already registered".to_string()),
            };
        }
    }
    AppError::Database(e)
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<AccountSummary>> {
        let summary = sqlx::query_as::<_, AccountSummary>(
            r#"
            SELECT u.id AS user_id, u.username, p.role
            FROM users u
            JOIN profiles p ON p.user_id = u.id
            WHERE u.subject = $1
            "#,
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await?;

        Ok(summary)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<Account>> {
        let Some(user) = self.fetch_user(user_id).await? else {
            return Ok(None);
        };
        let Some(profile) = self.fetch_profile(user_id).await? else {
            return Ok(None);
        };

        Ok(Some(Account { user, profile }))
    }

    async fn create(&self, account: NewAccount) -> Result<Account> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, subject, username, email) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(&account.subject)
        .bind(&account.username)
        .bind(&account.email)
        .fetch_one(&mut *tx)
        .await
        .map_err(registration_error)?;

        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "INSERT INTO profiles (user_id, role, full_name) VALUES ($1, $2, $3) RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(user.id)
        .bind(account.role)
        .bind(&account.full_name)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Account {
            user,
            profile: Profile::try_from(row)?,
        })
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<Account> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            UPDATE profiles
            SET full_name = $2, bio = $3, language = $4,
                linkedin_url = $5, twitter_url = $6, website_url = $7,
                gender = $8, updated_at = NOW()
            WHERE user_id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(&update.full_name)
        .bind(&update.bio)
        .bind(&update.language)
        .bind(&update.linkedin_url)
        .bind(&update.twitter_url)
        .bind(&update.website_url)
        .bind(update.gender)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        Self::replace_education(&mut tx, user_id, &update).await?;
        Self::replace_experience(&mut tx, user_id, &update).await?;

        tx.commit().await?;

        let user = self
            .fetch_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(Account {
            user,
            profile: Profile::try_from(row)?,
        })
    }

    async fn set_profile_file(
        &self,
        user_id: Uuid,
        file: ProfileFile,
        key: &str,
    ) -> Result<Option<String>> {
        let column = file.column();
        let mut tx = self.pool.begin().await?;

        let previous = sqlx::query_scalar::<_, Option<String>>(&format!(
            "SELECT {} FROM profiles WHERE user_id = $1 FOR UPDATE",
            column
        ))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let previous =
            previous.ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        sqlx::query(&format!(
            "UPDATE profiles SET {} = $2, updated_at = NOW() WHERE user_id = $1",
            column
        ))
        .bind(user_id)
        .bind(key)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(previous)
    }

    async fn list_education(&self, user_id: Uuid) -> Result<Vec<Education>> {
        let rows = sqlx::query_as::<_, Education>(
            r#"
            SELECT id, profile_id, school_name, degree, start_date, end_date
            FROM education
            WHERE profile_id = $1
            ORDER BY start_date DESC NULLS LAST, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn list_experience(&self, user_id: Uuid) -> Result<Vec<Experience>> {
        let rows = sqlx::query_as::<_, Experience>(
            r#"
            SELECT id, profile_id, company_name, role, start_date, end_date, description
            FROM experience
            WHERE profile_id = $1
            ORDER BY start_date DESC NULLS LAST, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
