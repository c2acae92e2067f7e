//! The input document §4.6 hands to the Rego evaluator, and the result both
//! the Rego path and the embedded-default path produce.

use chrono::{DateTime, Utc};
use serde::Serialize;
use zt_common::domain::{Device, OrgMfaSettings, PlatformDeviceTrustSettings, User};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MfaResult {
    pub mfa_required: bool,
    pub register_trust_after_mfa: bool,
    pub trust_ttl_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyInput {
    pub platform: PlatformInput,
    pub org: OrgInput,
    pub device: DeviceInput,
    pub user: UserInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformInput {
    pub mfa_required_always: bool,
    pub default_trust_ttl_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrgInput {
    pub mfa_required_for_new_device: bool,
    pub mfa_required_for_untrusted: bool,
    pub mfa_required_always: bool,
    pub register_trust_after_mfa: bool,
    pub trust_ttl_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceInput {
    pub id: String,
    pub trusted: bool,
    pub trusted_until: Option<String>,
    pub revoked_at: Option<String>,
    pub is_new: bool,
    pub is_effectively_trusted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserInput {
    pub id: String,
    pub has_phone: bool,
}

impl PolicyInput {
    pub fn build(
        platform: PlatformDeviceTrustSettings,
        org: OrgMfaSettings,
        device: &Device,
        user: &User,
        is_new_device: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            platform: PlatformInput {
                mfa_required_always: platform.mfa_required_always,
                default_trust_ttl_days: platform.default_trust_ttl_days,
            },
            org: OrgInput {
                mfa_required_for_new_device: org.mfa_required_for_new_device,
                mfa_required_for_untrusted: org.mfa_required_for_untrusted,
                mfa_required_always: org.mfa_required_always,
                register_trust_after_mfa: org.register_trust_after_mfa,
                trust_ttl_days: org.trust_ttl_days,
            },
            device: DeviceInput {
                id: device.id.clone(),
                trusted: device.trusted,
                trusted_until: device.trusted_until.map(|t| t.to_rfc3339()),
                revoked_at: device.revoked_at.map(|t| t.to_rfc3339()),
                is_new: is_new_device,
                is_effectively_trusted: device.is_effectively_trusted(now),
            },
            user: UserInput {
                id: user.id.clone(),
                has_phone: user.has_phone(),
            },
        }
    }
}
