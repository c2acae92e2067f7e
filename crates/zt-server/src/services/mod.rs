//! Shared plumbing the per-service RPC implementations lean on: identity
//! extraction from request extensions (as attached by the auth layer),
//! pagination per §6, timestamp conversion, and role (de)serialization.

pub mod audit_service;
pub mod auth_service;
pub mod device_service;
pub mod health_service;
pub mod membership_service;
pub mod org_policy_service;
pub mod policy_service;
pub mod session_service;

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tonic::{Request, Status};
use zt_auth::{require_org_admin, RequestIdentity};
use zt_common::domain::{MembershipRepository, Role};

pub const DEFAULT_PAGE_SIZE: i32 = 50;
pub const MAX_PAGE_SIZE: i32 = 100;

pub fn identity_of<T>(request: &Request<T>) -> Option<RequestIdentity> {
    request.extensions().get::<RequestIdentity>().cloned()
}

/// Every RBAC-guarded RPC resolves its identity, requires org-admin, and
/// checks the caller's org matches the request's `org_id` (empty
/// `org_id` defaults to the caller's own org, mirroring §6's "inferred
/// from context" allowance).
pub async fn require_admin_for_org<T>(
    memberships: &Arc<dyn MembershipRepository>,
    request: &Request<T>,
    requested_org_id: &str,
) -> Result<(String, String), Status> {
    let identity = identity_of(request);
    let (org_id, user_id) = require_org_admin(memberships, identity.as_ref())
        .await
        .map_err(crate::error::auth_error_to_status)?;
    if !requested_org_id.is_empty() && requested_org_id != org_id {
        return Err(Status::permission_denied("org_id does not match the caller's organization"));
    }
    Ok((org_id, user_id))
}

/// Clamps `page_size` to `[1, MAX_PAGE_SIZE]` (defaulting to
/// `DEFAULT_PAGE_SIZE` when zero or negative) and parses `page_token` as an
/// integer offset, defaulting to zero on anything unparseable.
pub fn parse_page(page_size: i32, page_token: &str) -> (u32, u32) {
    let limit = if page_size <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size.min(MAX_PAGE_SIZE)
    } as u32;
    let offset = page_token.parse::<u32>().unwrap_or(0);
    (limit, offset)
}

/// §6: "response carries `next_page_token` when the returned count equals
/// `page_size`".
pub fn next_page_token(offset: u32, limit: u32, returned: usize) -> String {
    if returned as u32 == limit {
        (offset + limit).to_string()
    } else {
        String::new()
    }
}

pub fn to_unix(at: Option<DateTime<Utc>>) -> i64 {
    at.map(|t| t.timestamp()).unwrap_or(0)
}

pub fn unix_to_datetime(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

pub fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::Member => "member",
        Role::Admin => "admin",
        Role::Owner => "owner",
    }
}

pub fn str_to_role(value: &str) -> Result<Role, Status> {
    match value {
        "member" => Ok(Role::Member),
        "admin" => Ok(Role::Admin),
        "owner" => Ok(Role::Owner),
        other => Err(Status::invalid_argument(format!("unknown role: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_defaults_and_clamps() {
        assert_eq!(parse_page(0, "").0, DEFAULT_PAGE_SIZE as u32);
        assert_eq!(parse_page(-5, "").0, DEFAULT_PAGE_SIZE as u32);
        assert_eq!(parse_page(1000, "").0, MAX_PAGE_SIZE as u32);
        assert_eq!(parse_page(10, "").1, 0);
        assert_eq!(parse_page(10, "40").1, 40);
        assert_eq!(parse_page(10, "garbage").1, 0);
    }

    #[test]
    fn next_page_token_only_set_on_a_full_page() {
        assert_eq!(next_page_token(0, 50, 50), "50");
        assert_eq!(next_page_token(50, 50, 30), "");
    }

    #[test]
    fn role_round_trips() {
        for role in [Role::Member, Role::Admin, Role::Owner] {
            assert_eq!(str_to_role(role_to_str(role)).unwrap(), role);
        }
        assert!(str_to_role("bogus").is_err());
    }
}
