//! Marketplace accounts: registration and role-specific profiles.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Access | Description |
//! |--------|----------|--------|-------------|
//! | POST | `/api/accounts/register` | Authenticated | Create account and profile |
//! | GET | `/api/profile/me` | Registered | Own profile |
//! | PUT | `/api/profile/me` | Registered | Replace profile fields |
//! | POST | `/api/profile/me/avatar` | Registered | Upload avatar |
//! | POST | `/api/profile/me/cv` | Student | Upload default CV |
//! | POST | `/api/profile/me/cover-letter` | Student | Upload default cover letter |
//! | GET | `/api/users/{user_id}/profile` | Registered | Another user's public profile |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::{AccountRepository, PgAccountRepository};
pub use routes::routes;
pub use services::AccountService;
