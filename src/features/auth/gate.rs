//! Access decisions. Nothing here performs I/O; callers turn the returned
//! error into a response.

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::accounts::models::Role;
use crate::features::auth::model::{Caller, CallerAccount};

/// Allow iff the caller is authenticated and either holds elevated privilege
/// or has a profile with the required role.
///
/// Missing identity is `Unauthorized`; a present identity with the wrong (or no)
/// role is `Forbidden`.
pub fn authorize(caller: Option<&Caller>, required: Role) -> Result<()> {
    let caller = caller
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    if caller.is_super_admin() {
        return Ok(());
    }

    match &caller.account {
        Some(account) if account.role == required => Ok(()),
        Some(_) => Err(AppError::Forbidden(format!(
            "This action requires a {} account",
            required
        ))),
        None => Err(AppError::Forbidden(
            "Complete registration before using this feature".to_string(),
        )),
    }
}

/// Pass the role gate, then return the account the operation acts as.
///
/// Elevated callers bypass the role comparison but still need an account,
/// since every write is attributed to a user.
pub fn authorize_account(caller: Option<&Caller>, required: Role) -> Result<CallerAccount> {
    authorize(caller, required)?;
    registered(caller)
}

/// Any registered account, whatever its role
pub fn registered(caller: Option<&Caller>) -> Result<CallerAccount> {
    let caller = caller
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    caller.account.clone().ok_or_else(|| {
        AppError::Forbidden("Complete registration before using this feature".to_string())
    })
}

/// Resource-scoped check. A non-owner gets the same answer as for a missing
/// resource.
pub fn ensure_owner(owner_id: Uuid, account: &CallerAccount, resource: &str) -> Result<()> {
    if owner_id == account.user_id {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("{} not found", resource)))
    }
}
