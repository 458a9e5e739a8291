//! Request guards built on the `Caller` that the auth middleware stores in
//! the request extensions.
//!
//! | Guard | Passes when |
//! |-------|-------------|
//! | `RequireIdentity` | a valid token was presented (registered or not) |
//! | `RequireAccount` | the identity has a registered account |
//! | `RequireStudent` | student account, or super admin with an account |
//! | `RequireCompany` | company account, or super admin with an account |
//! | `MaybeCaller` | always; carries the caller when there is one |

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::core::error::AppError;
use crate::features::accounts::models::Role;
use crate::features::auth::gate;
use crate::features::auth::model::{Caller, CallerAccount};

fn caller(parts: &Parts) -> Option<&Caller> {
    parts.extensions.get::<Caller>()
}

pub struct RequireIdentity(pub Caller);

impl<S> FromRequestParts<S> for RequireIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller(parts)
            .cloned()
            .map(RequireIdentity)
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
    }
}

pub struct RequireAccount(pub CallerAccount);

impl<S> FromRequestParts<S> for RequireAccount
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        gate::registered(caller(parts)).map(RequireAccount)
    }
}

pub struct RequireStudent(pub CallerAccount);

impl<S> FromRequestParts<S> for RequireStudent
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        gate::authorize_account(caller(parts), Role::Student).map(RequireStudent)
    }
}

pub struct RequireCompany(pub CallerAccount);

impl<S> FromRequestParts<S> for RequireCompany
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        gate::authorize_account(caller(parts), Role::Company).map(RequireCompany)
    }
}

/// Optional caller for public routes
pub struct MaybeCaller(pub Option<Caller>);

impl<S> FromRequestParts<S> for MaybeCaller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeCaller(caller(parts).cloned()))
    }
}
