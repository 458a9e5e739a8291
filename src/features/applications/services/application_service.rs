use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::core::config::MarketplaceConfig;
use crate::core::error::{AppError, Result};
use crate::features::applications::csv_export::{self, ExportRow};
use crate::features::applications::dtos::{
    ApplicantDto, ApplicationListQuery, CompanyApplicationDto, StudentApplicationDto,
    UpdateStatusDto,
};
use crate::features::applications::models::{
    ApplicationRecord, ApplicationStatus, CompanyScope, NewApplication,
};
use crate::features::applications::repositories::ApplicationRepository;
use crate::features::auth::gate;
use crate::features::auth::model::CallerAccount;
use crate::features::internships::repositories::InternshipRepository;
use crate::modules::storage::paths::{self, ApplicationDocument};
use crate::modules::storage::{FileStorage, FileVisibility};
use crate::shared::types::Meta;
use crate::shared::uploads::{UploadedFile, COVER_LETTER_RULE, CV_RULE};

pub const CV_FIELD: &str = "cv";
pub const COVER_LETTER_FIELD: &str = "cover_letter";

/// Submission and review of applications
pub struct ApplicationService {
    applications: Arc<dyn ApplicationRepository>,
    internships: Arc<dyn InternshipRepository>,
    storage: Arc<dyn FileStorage>,
    config: MarketplaceConfig,
}

/// An export ready to be sent as an attachment
pub struct CsvExport {
    pub file_name: String,
    pub body: Vec<u8>,
}

impl ApplicationService {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        internships: Arc<dyn InternshipRepository>,
        storage: Arc<dyn FileStorage>,
        config: MarketplaceConfig,
    ) -> Self {
        Self {
            applications,
            internships,
            storage,
            config,
        }
    }

    /// Apply to an active posting with a CV and an optional cover letter.
    ///
    /// The row is written before the documents so that a concurrent duplicate
    /// is rejected by the database without touching storage; when an upload
    /// fails the row is deleted again.
    pub async fn submit(
        &self,
        student: &CallerAccount,
        internship_id: Uuid,
        mut files: HashMap<String, UploadedFile>,
    ) -> Result<StudentApplicationDto> {
        let internship = self
            .internships
            .find_by_id(internship_id)
            .await?
            .filter(|i| i.is_active)
            .ok_or_else(|| AppError::NotFound("Internship not found".to_string()))?;

        if self
            .applications
            .exists(internship.id, student.user_id)
            .await?
        {
            return Err(duplicate());
        }

        let cv_file = files.remove(CV_FIELD);
        let cover_file = files.remove(COVER_LETTER_FIELD);

        let cv = CV_RULE.require(cv_file.as_ref())?;
        let cover = match cover_file.as_ref() {
            Some(file) => {
                COVER_LETTER_RULE.check(file)?;
                Some(file)
            }
            None => None,
        };

        let cv_key =
            self.document_key(internship.id, student.user_id, ApplicationDocument::Cv, cv);
        let cover_key = cover.map(|file| {
            self.document_key(
                internship.id,
                student.user_id,
                ApplicationDocument::CoverLetter,
                file,
            )
        });

        let application = self
            .applications
            .insert(NewApplication {
                internship_id: internship.id,
                student_id: student.user_id,
                cv_key: cv_key.clone(),
                cover_letter_key: cover_key.clone(),
            })
            .await?
            .ok_or_else(duplicate)?;

        let mut stored = Vec::new();
        let mut uploads = vec![(cv_key, cv)];
        if let (Some(key), Some(file)) = (cover_key, cover) {
            uploads.push((key, file));
        }

        for (key, file) in uploads {
            if let Err(e) = self
                .storage
                .store(&key, file.data.clone(), &file.content_type)
                .await
            {
                self.rollback(application.id, &stored).await;
                return Err(e);
            }
            stored.push(key);
        }

        info!(
            application_id = %application.id,
            internship_id = %internship.id,
            student_id = %student.user_id,
            "Application submitted"
        );

        let record = self
            .applications
            .find(application.id)
            .await?
            .ok_or_else(|| AppError::Internal("Submitted application vanished".to_string()))?;

        Ok(record.into())
    }

    /// Change the status of an application on one of the caller's postings
    pub async fn update_status(
        &self,
        company: &CallerAccount,
        application_id: Uuid,
        dto: UpdateStatusDto,
    ) -> Result<CompanyApplicationDto> {
        let status = dto
            .status
            .parse::<ApplicationStatus>()
            .map_err(AppError::Validation)?;

        let mut record = self
            .applications
            .find(application_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

        if record.internship_owner_id != company.user_id {
            return Err(AppError::Forbidden(
                "Only the company that posted the internship can review this application"
                    .to_string(),
            ));
        }

        let current = record.application.status;
        if !self.config.status_policy.allows(current, status) {
            let message = if current.is_final() {
                format!(
                    "Application is already {} and its outcome can no longer change",
                    current.label()
                )
            } else {
                format!(
                    "Cannot change status from {} to {}",
                    current.label(),
                    status.label()
                )
            };
            return Err(AppError::Validation(message));
        }

        if current != status {
            let updated = self
                .applications
                .set_status(application_id, status)
                .await?
                .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;
            record.application = updated;

            info!(
                application_id = %application_id,
                from = %current,
                to = %status,
                "Application status changed"
            );
        }

        self.company_view(record).await
    }

    pub async fn list_for_student(
        &self,
        student: &CallerAccount,
    ) -> Result<Vec<StudentApplicationDto>> {
        let records = self.applications.list_for_student(student.user_id).await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    pub async fn list_for_company(
        &self,
        company: &CallerAccount,
        scope: CompanyScope,
        query: ApplicationListQuery,
    ) -> Result<(Vec<CompanyApplicationDto>, Meta)> {
        self.ensure_scope(company, scope).await?;

        let filter = query.filter()?;
        let page = query.page().with_size(self.config.applications_page_size);

        let (records, total) = self
            .applications
            .list_for_company(company.user_id, scope, &filter, Some(page))
            .await?;

        let mut items = Vec::with_capacity(records.len());
        for record in records {
            items.push(self.company_view(record).await?);
        }

        Ok((items, Meta::paginated(page, total)))
    }

    /// Every application matching the filters, as CSV
    pub async fn export_csv(
        &self,
        company: &CallerAccount,
        scope: CompanyScope,
        query: ApplicationListQuery,
    ) -> Result<CsvExport> {
        self.ensure_scope(company, scope).await?;

        let filter = query.filter()?;
        let (records, _) = self
            .applications
            .list_for_company(company.user_id, scope, &filter, None)
            .await?;

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let cv_url = if record.application.cv_key.is_empty() {
                None
            } else {
                Some(self.storage.file_url(&record.application.cv_key).await?)
            };

            rows.push(ExportRow {
                internship_title: record.internship_title,
                student_username: record.student_username,
                student_email: record.student_email,
                status: record.application.status,
                submitted_at: record.application.submitted_at,
                cv_url,
            });
        }

        info!(
            company_id = %company.user_id,
            rows = rows.len(),
            "Applications exported"
        );

        Ok(CsvExport {
            file_name: csv_export::file_name(scope),
            body: csv_export::render(&rows)?,
        })
    }

    /// A single-posting scope must name a posting the caller owns
    async fn ensure_scope(&self, company: &CallerAccount, scope: CompanyScope) -> Result<()> {
        let CompanyScope::Posting(internship_id) = scope else {
            return Ok(());
        };

        let internship = self
            .internships
            .find_by_id(internship_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Internship not found".to_string()))?;

        gate::ensure_owner(internship.owner_id, company, "Internship")
    }

    fn document_key(
        &self,
        internship_id: Uuid,
        student_id: Uuid,
        document: ApplicationDocument,
        file: &UploadedFile,
    ) -> String {
        let path = paths::application_document(internship_id, student_id, document, file);
        self.storage.object_key(FileVisibility::Private, &path)
    }

    async fn rollback(&self, application_id: Uuid, stored: &[String]) {
        for key in stored {
            if let Err(e) = self.storage.remove(key).await {
                warn!("Failed to remove '{}' after aborted submission: {}", key, e);
            }
        }
        if let Err(e) = self.applications.remove(application_id).await {
            warn!(
                "Failed to remove application {} after aborted submission: {}",
                application_id, e
            );
        }
    }

    async fn company_view(&self, record: ApplicationRecord) -> Result<CompanyApplicationDto> {
        let cv_url = self.storage.file_url(&record.application.cv_key).await?;
        let cover_letter_url = match record.application.cover_letter_key.as_deref() {
            Some(key) => Some(self.storage.file_url(key).await?),
            None => None,
        };

        Ok(CompanyApplicationDto {
            id: record.application.id,
            internship_id: record.application.internship_id,
            internship_title: record.internship_title,
            student: ApplicantDto {
                id: record.application.student_id,
                username: record.student_username,
                email: record.student_email,
                full_name: record.student_full_name,
            },
            status: record.application.status.into(),
            submitted_at: record.application.submitted_at,
            cv_url,
            cover_letter_url,
        })
    }
}

fn duplicate() -> AppError {
    AppError::DuplicateApplication("You have already applied to this internship".to_string())
}
