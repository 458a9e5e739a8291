//! Multipart upload collection and per-document file rules.

use std::collections::HashMap;

use axum::extract::Multipart;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::shared::constants::{
    DOCUMENT_EXTENSIONS, IMAGE_EXTENSIONS, MAX_AVATAR_SIZE, MAX_COVER_LETTER_SIZE, MAX_CV_SIZE,
};

/// A file received from a multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Lowercased extension without the dot
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }

    /// File name reduced to a single safe path segment
    pub fn safe_file_name(&self) -> String {
        sanitize_file_name(&self.file_name)
    }
}

/// Size and type constraints for one kind of uploaded document
#[derive(Debug, Clone, Copy)]
pub struct FileRule {
    pub label: &'static str,
    pub max_bytes: usize,
    pub allowed_extensions: &'static [&'static str],
}

pub const CV_RULE: FileRule = FileRule {
    label: "CV",
    max_bytes: MAX_CV_SIZE,
    allowed_extensions: DOCUMENT_EXTENSIONS,
};

pub const COVER_LETTER_RULE: FileRule = FileRule {
    label: "Cover letter",
    max_bytes: MAX_COVER_LETTER_SIZE,
    allowed_extensions: DOCUMENT_EXTENSIONS,
};

pub const AVATAR_RULE: FileRule = FileRule {
    label: "Avatar",
    max_bytes: MAX_AVATAR_SIZE,
    allowed_extensions: IMAGE_EXTENSIONS,
};

impl FileRule {
    /// Check size first, then extension; the error names the violated constraint
    pub fn check(&self, file: &UploadedFile) -> Result<()> {
        if file.size() > self.max_bytes {
            return Err(AppError::Validation(format!(
                "{} must be at most {} MB",
                self.label,
                self.max_bytes / 1024 / 1024
            )));
        }

        let allowed = file
            .extension()
            .map(|ext| self.allowed_extensions.contains(&ext.as_str()))
            .unwrap_or(false);

        if !allowed {
            let list = self
                .allowed_extensions
                .iter()
                .map(|e| e.to_uppercase())
                .collect::<Vec<_>>()
                .join("/");
            return Err(AppError::Validation(format!(
                "{} must be one of the following file types: {}",
                self.label, list
            )));
        }

        Ok(())
    }

    /// Require the file to be present, then check it
    pub fn require<'a>(&self, file: Option<&'a UploadedFile>) -> Result<&'a UploadedFile> {
        let file =
            file.ok_or_else(|| AppError::Validation(format!("{} is required", self.label)))?;
        self.check(file)?;
        Ok(file)
    }
}

/// Read every file field named in `accepted` from a multipart body.
///
/// Browsers submit an empty part when a file input is left blank, so parts with
/// no file name and no bytes are treated as absent.
pub async fn collect_files(
    multipart: &mut Multipart,
    accepted: &[&str],
) -> Result<HashMap<String, UploadedFile>> {
    let mut files = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        if !accepted.contains(&field_name.as_str()) {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let file_name = field.file_name().map(|s| s.to_string()).unwrap_or_default();

        let data = field.bytes().await.map_err(|e| {
            debug!("Failed to read file bytes: {}", e);
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        if file_name.is_empty() && data.is_empty() {
            continue;
        }

        let file_name = if file_name.is_empty() {
            "unnamed".to_string()
        } else {
            file_name
        };

        files.insert(
            field_name,
            UploadedFile::new(file_name, content_type, data.to_vec()),
        );
    }

    Ok(files)
}

/// Keep only the last path segment and replace anything outside `[A-Za-z0-9._-]`
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
