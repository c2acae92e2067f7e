//! C12 — audit trail. `parse_full_method` is pure (P5); `AuditLogger` writes
//! the synchronous row and best-effort fans out to an `EventEmitter`.

use crate::types::EventEmitter;
use chrono::Utc;
use std::sync::Arc;
use zt_common::domain::{AuditEvent, AuditRepository, SYSTEM_ORG_ID};

/// Action and resource derived from a canonical method name. Both fields are
/// owned since the override table and the method-lowercase fallback can't
/// both return `&'static str`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMethod {
    pub action: String,
    pub resource: String,
}

/// Maps a canonical `<package>.<Service>/<Method>` name to `(action,
/// resource)`. A name with no `/` yields `(lowercased_method, "unknown")`; a
/// name with no `.` before the `/` still parses fine since only the
/// service/method split on `/` matters for this function.
pub fn parse_full_method(full_method: &str) -> ParsedMethod {
    let (service_part, method) = match full_method.rsplit_once('/') {
        Some((service_part, method)) => (service_part, method),
        None => {
            return ParsedMethod {
                action: full_method.to_lowercase(),
                resource: "unknown".to_string(),
            }
        }
    };

    let service_name = service_part.rsplit_once('.').map(|(_, s)| s).unwrap_or(service_part);
    let resource = resource_from_service(service_name);

    if let Some((action, override_resource)) = method_override(service_name, method) {
        return ParsedMethod {
            action: action.to_string(),
            resource: override_resource.to_string(),
        };
    }

    ParsedMethod {
        action: action_from_method(method),
        resource,
    }
}

fn resource_from_service(service_name: &str) -> String {
    let stripped = service_name.strip_suffix("Service").unwrap_or(service_name);
    let mut chars = stripped.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => "unknown".to_string(),
    }
}

fn method_override(service_name: &str, method: &str) -> Option<(&'static str, &'static str)> {
    if service_name == "MembershipService" {
        match method {
            "AddMember" => return Some(("user_added", "user")),
            "RemoveMember" => return Some(("user_removed", "user")),
            "UpdateRole" => return Some(("role_changed", "user")),
            _ => {}
        }
    }
    None
}

fn action_from_method(method: &str) -> String {
    const PREFIXES: &[(&str, &str)] = &[
        ("List", "list"),
        ("Create", "create"),
        ("Update", "update"),
        ("Delete", "delete"),
        ("Add", "add"),
        ("Remove", "remove"),
        ("Register", "register"),
        ("Revoke", "revoke"),
        ("Suspend", "suspend"),
        ("Emit", "emit"),
        ("Batch", "emit"),
    ];
    if method != "Get" && method.starts_with("Get") {
        return "get".to_string();
    }
    for (prefix, action) in PREFIXES {
        if method.starts_with(prefix) {
            return action.to_string();
        }
    }
    method.to_lowercase()
}

/// Resolves the audited client IP per §4.12's precedence: `x-forwarded-for`
/// (first entry), then `x-real-ip`, then the transport peer address (host
/// part only), else `"unknown"`.
pub fn client_ip(forwarded_for: Option<&str>, real_ip: Option<&str>, peer_addr: Option<&str>) -> String {
    if let Some(value) = forwarded_for {
        if let Some(first) = value.split(',').next() {
            let trimmed = first.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    if let Some(value) = real_ip {
        if !value.trim().is_empty() {
            return value.trim().to_string();
        }
    }
    if let Some(peer) = peer_addr {
        let host = peer.rsplit_once(':').map(|(host, _)| host).unwrap_or(peer);
        if !host.is_empty() {
            return host.to_string();
        }
    }
    "unknown".to_string()
}

pub struct AuditLogger {
    audit: Arc<dyn AuditRepository>,
    emitter: Arc<dyn EventEmitter>,
}

impl AuditLogger {
    pub fn new(audit: Arc<dyn AuditRepository>, emitter: Arc<dyn EventEmitter>) -> Self {
        Self { audit, emitter }
    }

    /// Called by the audit interceptor after a handler returns. Writes
    /// nothing for skipped methods or a missing `org_id` — those checks are
    /// the caller's responsibility so this function stays a pure writer.
    pub async fn record(&self, org_id: &str, user_id: &str, action: &str, resource: &str, ip: &str) {
        let event = AuditEvent {
            id: uuid::Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            user_id: user_id.to_string(),
            action: action.to_string(),
            resource: resource.to_string(),
            ip: ip.to_string(),
            metadata: String::new(),
            created_at: Utc::now(),
        };
        if let Err(err) = self.audit.create(event).await {
            tracing::warn!(org_id, action, resource, error = %err, "audit write failed");
        }
        self.emitter.emit(org_id, user_id, action, resource, "").await;
    }

    /// Explicit domain events from the service layer (login failures,
    /// logout with an invalid token). `org_id` defaults to `_system` when
    /// empty.
    pub async fn log_event(&self, org_id: &str, user_id: &str, action: &str, resource: &str, metadata: &str) {
        let org_id = if org_id.is_empty() { SYSTEM_ORG_ID } else { org_id };
        let event = AuditEvent {
            id: uuid::Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            user_id: user_id.to_string(),
            action: action.to_string(),
            resource: resource.to_string(),
            ip: String::new(),
            metadata: metadata.to_string(),
            created_at: Utc::now(),
        };
        if let Err(err) = self.audit.create(event).await {
            tracing::warn!(org_id, action, resource, error = %err, "audit write failed");
        }
        self.emitter.emit(org_id, user_id, action, resource, metadata).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_service_suffix_and_lowercases_first_char() {
        let parsed = parse_full_method("ztcp.v1.UserService/GetUser");
        assert_eq!(parsed.action, "get");
        assert_eq!(parsed.resource, "user");
    }

    #[test]
    fn every_prefix_rule() {
        let cases = [
            ("pkg.UserService/ListUsers", "list"),
            ("pkg.UserService/CreateUser", "create"),
            ("pkg.UserService/UpdateUser", "update"),
            ("pkg.UserService/DeleteUser", "delete"),
            ("pkg.SessionService/AddSomething", "add"),
            ("pkg.SessionService/RemoveSomething", "remove"),
            ("pkg.DeviceService/RegisterDevice", "register"),
            ("pkg.DeviceService/RevokeDevice", "revoke"),
            ("pkg.OrgService/SuspendOrg", "suspend"),
            ("pkg.AuditService/EmitEvent", "emit"),
            ("pkg.AuditService/BatchWrite", "emit"),
            ("pkg.FooService/Get", "get"),
        ];
        for (method, expected_action) in cases {
            assert_eq!(parse_full_method(method).action, expected_action, "{method}");
        }
    }

    #[test]
    fn unmapped_method_falls_back_to_lowercased_name() {
        assert_eq!(parse_full_method("pkg.WeirdService/Frobnicate").action, "frobnicate");
    }

    #[test]
    fn membership_overrides_win_over_generic_prefix_rules() {
        let parsed = parse_full_method("ztcp.v1.MembershipService/AddMember");
        assert_eq!(parsed.action, "user_added");
        assert_eq!(parsed.resource, "user");

        let parsed = parse_full_method("ztcp.v1.MembershipService/RemoveMember");
        assert_eq!(parsed.action, "user_removed");

        let parsed = parse_full_method("ztcp.v1.MembershipService/UpdateRole");
        assert_eq!(parsed.action, "role_changed");
    }

    #[test]
    fn name_without_slash_yields_unknown_resource() {
        let parsed = parse_full_method("HealthCheck");
        assert_eq!(parsed.resource, "unknown");
        assert_eq!(parsed.action, "healthcheck");
    }

    #[test]
    fn client_ip_precedence() {
        assert_eq!(client_ip(Some("1.2.3.4, 5.6.7.8"), Some("9.9.9.9"), Some("10.0.0.1:443")), "1.2.3.4");
        assert_eq!(client_ip(None, Some("9.9.9.9"), Some("10.0.0.1:443")), "9.9.9.9");
        assert_eq!(client_ip(None, None, Some("10.0.0.1:443")), "10.0.0.1");
        assert_eq!(client_ip(None, None, None), "unknown");
        assert_eq!(client_ip(Some(""), Some(""), Some("10.0.0.1:443")), "10.0.0.1");
    }
}
