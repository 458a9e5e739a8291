mod internship_dto;

pub use internship_dto::*;
