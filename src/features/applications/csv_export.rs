//! CSV rendering for company application exports

use chrono::{DateTime, SecondsFormat, Utc};

use crate::core::error::{AppError, Result};
use crate::features::applications::models::{ApplicationStatus, CompanyScope};

pub const HEADER: [&str; 6] = [
    "Internship",
    "Student",
    "Email",
    "Status",
    "Submitted At",
    "CV URL",
];

/// One exported application
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub internship_title: String,
    pub student_username: String,
    pub student_email: String,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    /// Absolute download link; written as an empty cell when absent
    pub cv_url: Option<String>,
}

pub fn render(rows: &[ExportRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(HEADER).map_err(csv_error)?;

    for row in rows {
        let submitted_at = row
            .submitted_at
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        writer
            .write_record([
                row.internship_title.as_str(),
                row.student_username.as_str(),
                row.student_email.as_str(),
                row.status.label(),
                submitted_at.as_str(),
                row.cv_url.as_deref().unwrap_or(""),
            ])
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to finish CSV export: {}", e)))
}

pub fn file_name(scope: CompanyScope) -> String {
    match scope {
        CompanyScope::AllPostings => "all_applications.csv".to_string(),
        CompanyScope::Posting(id) => format!("applications_{}.csv", id),
    }
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::Internal(format!("Failed to write CSV export: {}", e))
}
