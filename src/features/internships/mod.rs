//! Internship postings: the public catalog and company-side management.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Access | Description |
//! |--------|----------|--------|-------------|
//! | GET | `/api/internships` | Public | Browse active postings |
//! | GET | `/api/internships/facets` | Public | Filter suggestions |
//! | GET | `/api/internships/{id}` | Public | Posting detail |
//! | GET | `/api/company/internships` | Company | Own postings |
//! | POST | `/api/company/internships` | Company | Create posting |
//! | PUT | `/api/company/internships/{id}` | Company (owner) | Update posting |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::{InternshipRepository, PgInternshipRepository};
pub use routes::{protected_routes, public_routes};
pub use services::InternshipService;
