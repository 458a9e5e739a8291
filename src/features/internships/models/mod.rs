mod internship;

pub use internship::*;
