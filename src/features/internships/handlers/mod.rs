mod internship_handler;

pub use internship_handler::*;
