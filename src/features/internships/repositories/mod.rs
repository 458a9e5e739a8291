mod internship_repository;

pub use internship_repository::{InternshipRepository, PgInternshipRepository};
