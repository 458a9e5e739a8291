//! Identity resolution and role-gated access.
//!
//! A request's bearer token is validated once by `auth_middleware`, the
//! matching account is looked up, and the resulting `Caller` is stored in the
//! request extensions. Handlers receive it through the guards in `guards`.

mod jwks;
mod validator;

pub mod gate;
pub mod guards;
pub mod model;

pub use jwks::JwksClient;
pub use validator::JwtValidator;
