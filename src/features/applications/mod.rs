//! Applications: submission with documents, review workflow and CSV export.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Access | Description |
//! |--------|----------|--------|-------------|
//! | POST | `/api/student/internships/{id}/apply` | Student | Apply with CV and optional cover letter |
//! | GET | `/api/student/applications` | Student | Own applications |
//! | GET | `/api/company/applications` | Company | Applications to all own postings |
//! | GET | `/api/company/applications/export` | Company | Same, as CSV |
//! | PATCH | `/api/company/applications/{id}/status` | Company (owner) | Change status |
//! | GET | `/api/company/internships/{id}/applications` | Company (owner) | Applications to one posting |
//! | GET | `/api/company/internships/{id}/applications/export` | Company (owner) | Same, as CSV |
//!
//! ## Status workflow
//!
//! `new` → `review` → `accepted` | `rejected` under the default guarded
//! policy. `APPLICATION_STATUS_POLICY=unrestricted` allows any change.

pub mod csv_export;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::{ApplicationRepository, PgApplicationRepository};
pub use routes::routes;
pub use services::ApplicationService;
