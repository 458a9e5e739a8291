/// Upper bound on any configured page size
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Identity-provider role granting elevated access to every role-gated route
pub const ROLE_SUPER_ADMIN: &str = "super_admin";

// =============================================================================
// PROFILE LIMITS
// =============================================================================

/// Maximum education entries a student profile may carry
pub const MAX_EDUCATION_ENTRIES: u64 = 2;

/// Maximum experience entries a student profile may carry
pub const MAX_EXPERIENCE_ENTRIES: u64 = 3;

// =============================================================================
// UPLOAD LIMITS
// =============================================================================

/// Maximum CV size in bytes (5MB)
pub const MAX_CV_SIZE: usize = 5 * 1024 * 1024;

/// Maximum cover letter size in bytes (2MB)
pub const MAX_COVER_LETTER_SIZE: usize = 2 * 1024 * 1024;

/// Maximum avatar size in bytes (5MB)
pub const MAX_AVATAR_SIZE: usize = 5 * 1024 * 1024;

/// Extensions accepted for CVs and cover letters
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// Extensions accepted for avatars
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
