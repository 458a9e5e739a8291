use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::accounts::models::Role;
use crate::shared::constants::ROLE_SUPER_ADMIN;

/// Identity asserted by a validated access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub sub: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(ROLE_SUPER_ADMIN)
    }
}

/// The registered marketplace account behind an identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerAccount {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

/// Everything known about the caller of one request.
///
/// `account` is `None` for identities that have not registered yet.
#[derive(Debug, Clone)]
pub struct Caller {
    pub identity: AuthenticatedUser,
    pub account: Option<CallerAccount>,
}

impl Caller {
    pub fn is_super_admin(&self) -> bool {
        self.identity.is_super_admin()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.account.as_ref().map(|a| a.user_id)
    }

    /// Student account of the caller, used to annotate listings
    pub fn student_id(&self) -> Option<Uuid> {
        self.account
            .as_ref()
            .filter(|a| a.role == Role::Student)
            .map(|a| a.user_id)
    }
}
