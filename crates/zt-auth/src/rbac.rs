//! C11 — RBAC guard. Operates on whatever identity the authorization
//! interceptor (C10) already attached; this module has no transport
//! dependency of its own.

use crate::error::AuthError;
use std::sync::Arc;
use zt_common::domain::{MembershipRepository, Role};

/// The identity an authenticated request carries, as attached by C10.
#[derive(Debug, Clone)]
pub struct RequestIdentity {
    pub user_id: String,
    pub org_id: String,
    pub session_id: String,
}

/// `(org_id, user_id)` returned on success, mirroring the distilled spec's
/// return shape for both guards.
pub type RbacOk = (String, String);

async fn require_role(
    memberships: &Arc<dyn MembershipRepository>,
    identity: Option<&RequestIdentity>,
    admin_only: bool,
) -> Result<RbacOk, AuthError> {
    let identity = match identity {
        Some(identity) if !identity.user_id.is_empty() && !identity.org_id.is_empty() => identity,
        _ => return Err(AuthError::Unauthenticated),
    };
    let membership = memberships
        .get(&identity.user_id, &identity.org_id)
        .await
        .map_err(|_| AuthError::PermissionDenied)?;

    if admin_only && !membership.role.is_admin_or_above() {
        return Err(AuthError::PermissionDenied);
    }
    Ok((identity.org_id.clone(), identity.user_id.clone()))
}

pub async fn require_org_admin(
    memberships: &Arc<dyn MembershipRepository>,
    identity: Option<&RequestIdentity>,
) -> Result<RbacOk, AuthError> {
    require_role(memberships, identity, true).await
}

pub async fn require_org_member(
    memberships: &Arc<dyn MembershipRepository>,
    identity: Option<&RequestIdentity>,
) -> Result<RbacOk, AuthError> {
    require_role(memberships, identity, false).await
}
