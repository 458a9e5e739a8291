//! Adapters for services running outside the API process.
//!
//! Only object storage lives here today: uploaded CVs, cover letters and avatars.

pub mod storage;
