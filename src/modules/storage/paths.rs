//! Object paths (relative to the visibility prefix) for every stored document

use uuid::Uuid;

use crate::shared::uploads::UploadedFile;

/// Which application document a path refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationDocument {
    Cv,
    CoverLetter,
}

impl ApplicationDocument {
    fn stem(self) -> &'static str {
        match self {
            ApplicationDocument::Cv => "cv",
            ApplicationDocument::CoverLetter => "cover_letter",
        }
    }
}

pub fn avatar(user_id: Uuid, file: &UploadedFile) -> String {
    format!("avatars/{}/{}", user_id, file.safe_file_name())
}

pub fn profile_cv(user_id: Uuid, file: &UploadedFile) -> String {
    format!("cvs/{}/{}", user_id, file.safe_file_name())
}

pub fn profile_cover_letter(user_id: Uuid, file: &UploadedFile) -> String {
    format!("covers/{}/{}", user_id, file.safe_file_name())
}

/// Documents attached to one application, grouped by posting then student
pub fn application_document(
    internship_id: Uuid,
    student_id: Uuid,
    document: ApplicationDocument,
    file: &UploadedFile,
) -> String {
    let ext = file.extension().unwrap_or_else(|| "bin".to_string());
    format!(
        "applications/internship_{}/student_{}/{}.{}",
        internship_id,
        student_id,
        document.stem(),
        ext
    )
}
