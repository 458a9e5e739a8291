mod internship_service;

pub use internship_service::InternshipService;
