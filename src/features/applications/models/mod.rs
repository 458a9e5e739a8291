mod application;
mod status;

pub use application::*;
pub use status::*;
