//! The data model of §3: every entity carries a stable opaque string id and
//! UTC timestamps. Entities refer to one another only by id — repositories
//! expose "get by foreign id" operations so the service layer never holds a
//! cyclic in-memory graph (see DESIGN.md).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub status: UserStatus,
    pub phone: Option<String>,
    pub phone_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_phone(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityProvider {
    Local,
    Oidc,
    Saml,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub user_id: String,
    pub provider: IdentityProvider,
    /// For `provider == Local` this equals the normalized email.
    pub provider_id: String,
    /// Only set for `provider == Local`.
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgStatus {
    Active,
    Suspended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub status: OrgStatus,
    pub created_at: DateTime<Utc>,
}

/// Role is totally ordered: `Owner > Admin > Member`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Admin,
    Owner,
}

impl Role {
    /// Whether this role satisfies an org-admin RBAC check.
    pub fn is_admin_or_above(&self) -> bool {
        matches!(self, Role::Admin | Role::Owner)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub user_id: String,
    pub org_id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub user_id: String,
    pub org_id: String,
    pub fingerprint: String,
    pub trusted: bool,
    pub trusted_until: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Device {
    /// Effective trust ≡ `trusted ∧ revoked_at = nil ∧ (trusted_until = nil ∨
    /// trusted_until > now)`. `revoked_at` overrides `trusted` unconditionally
    /// (I5). Shared by the policy evaluator's input document and the C7
    /// device-trust logic so both sides agree on one definition.
    pub fn is_effectively_trusted(&self, now: DateTime<Utc>) -> bool {
        self.trusted
            && self.revoked_at.is_none()
            && match self.trusted_until {
                Some(until) => until > now,
                None => true,
            }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub org_id: String,
    pub device_id: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub refresh_jti: String,
    pub refresh_token_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Active ≡ not revoked and not expired.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfaChallenge {
    pub id: String,
    pub user_id: String,
    pub org_id: String,
    pub device_id: String,
    pub phone: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl MfaChallenge {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Single-use ticket letting a phone-less user submit a phone number before
/// MFA begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfaIntent {
    pub id: String,
    pub user_id: String,
    pub org_id: String,
    pub device_id: String,
    pub expires_at: DateTime<Utc>,
}

impl MfaIntent {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    pub org_id: String,
    /// Rego source for package `ztcp.device_trust`.
    pub rules: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Singleton per platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlatformDeviceTrustSettings {
    pub mfa_required_always: bool,
    pub default_trust_ttl_days: i64,
}

impl Default for PlatformDeviceTrustSettings {
    fn default() -> Self {
        Self {
            mfa_required_always: false,
            default_trust_ttl_days: 30,
        }
    }
}

/// One per org; absence means "apply platform/embedded defaults".
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrgMfaSettings {
    pub mfa_required_for_new_device: bool,
    pub mfa_required_for_untrusted: bool,
    pub mfa_required_always: bool,
    pub register_trust_after_mfa: bool,
    pub trust_ttl_days: i64,
}

impl Default for OrgMfaSettings {
    fn default() -> Self {
        Self {
            mfa_required_for_new_device: false,
            mfa_required_for_untrusted: false,
            mfa_required_always: false,
            register_trust_after_mfa: true,
            trust_ttl_days: 0,
        }
    }
}

/// Sentinel org id used for audit rows that have no owning organization.
pub const SYSTEM_ORG_ID: &str = "_system";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    pub org_id: String,
    pub user_id: String,
    pub action: String,
    pub resource: String,
    pub ip: String,
    pub metadata: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordering() {
        assert!(Role::Owner > Role::Admin);
        assert!(Role::Admin > Role::Member);
        assert!(Role::Owner.is_admin_or_above());
        assert!(Role::Admin.is_admin_or_above());
        assert!(!Role::Member.is_admin_or_above());
    }

    #[test]
    fn device_trust_formula() {
        let now = Utc::now();
        let mut d = Device {
            id: "d1".into(),
            user_id: "u1".into(),
            org_id: "o1".into(),
            fingerprint: "fp".into(),
            trusted: false,
            trusted_until: None,
            revoked_at: None,
            last_seen_at: None,
            created_at: now,
        };
        assert!(!d.is_effectively_trusted(now));
        d.trusted = true;
        assert!(d.is_effectively_trusted(now));
        d.trusted_until = Some(now - chrono::Duration::seconds(1));
        assert!(!d.is_effectively_trusted(now));
        d.trusted_until = Some(now + chrono::Duration::days(1));
        assert!(d.is_effectively_trusted(now));
        d.revoked_at = Some(now);
        assert!(!d.is_effectively_trusted(now));
    }

    #[test]
    fn session_active_formula() {
        let now = Utc::now();
        let mut s = Session {
            id: "s1".into(),
            user_id: "u1".into(),
            org_id: "o1".into(),
            device_id: "d1".into(),
            expires_at: now + chrono::Duration::minutes(5),
            revoked_at: None,
            last_seen_at: None,
            ip_address: None,
            refresh_jti: "jti".into(),
            refresh_token_hash: "hash".into(),
            created_at: now,
        };
        assert!(s.is_active(now));
        s.revoked_at = Some(now);
        assert!(!s.is_active(now));
        s.revoked_at = None;
        s.expires_at = now - chrono::Duration::minutes(1);
        assert!(!s.is_active(now));
    }

    #[test]
    fn user_has_phone() {
        let now = Utc::now();
        let mut u = User {
            id: "u1".into(),
            email: "a@b.com".into(),
            name: "A".into(),
            status: UserStatus::Active,
            phone: None,
            phone_verified: false,
            created_at: now,
            updated_at: now,
        };
        assert!(!u.has_phone());
        u.phone = Some(String::new());
        assert!(!u.has_phone());
        u.phone = Some("+15551234567".into());
        assert!(u.has_phone());
    }
}
