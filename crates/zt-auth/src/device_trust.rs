//! C7 — device-trust registration and revocation. `is_effectively_trusted`
//! itself lives on `zt_common::domain::Device` so the policy evaluator's
//! input document and this logic share one definition (P3).

use chrono::{DateTime, Utc};
use zt_common::domain::Device;

/// Applies §4.9's Session-create step 4: trust is only (re)registered when
/// the policy result says so and the TTL is positive.
pub fn register_trust_after_mfa(device: &mut Device, trust_ttl_days: i64, now: DateTime<Utc>) {
    if trust_ttl_days <= 0 {
        return;
    }
    device.trusted = true;
    device.trusted_until = Some(now + chrono::Duration::days(trust_ttl_days));
    device.revoked_at = None;
}

/// Idempotent: calling this on an already-revoked device is a no-op beyond
/// re-stamping `revoked_at` is avoided — the first revocation's timestamp
/// is authoritative (P6's sibling invariant for devices, mirrored from the
/// session revoke rule).
pub fn revoke_trust(device: &mut Device, now: DateTime<Utc>) {
    if device.revoked_at.is_some() {
        return;
    }
    device.revoked_at = Some(now);
    device.trusted = false;
    device.trusted_until = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> Device {
        let now = Utc::now();
        Device {
            id: "d1".into(),
            user_id: "u1".into(),
            org_id: "o1".into(),
            fingerprint: "fp".into(),
            trusted: false,
            trusted_until: None,
            revoked_at: None,
            last_seen_at: None,
            created_at: now,
        }
    }

    #[test]
    fn register_trust_sets_expiry_and_clears_revocation() {
        let mut d = device();
        d.revoked_at = Some(Utc::now());
        let now = Utc::now();
        register_trust_after_mfa(&mut d, 30, now);
        assert!(d.trusted);
        assert!(d.revoked_at.is_none());
        assert_eq!(d.trusted_until, Some(now + chrono::Duration::days(30)));
    }

    #[test]
    fn register_trust_is_noop_for_non_positive_ttl() {
        let mut d = device();
        register_trust_after_mfa(&mut d, 0, Utc::now());
        assert!(!d.trusted);
        assert!(d.trusted_until.is_none());
    }

    #[test]
    fn revoke_is_idempotent() {
        let mut d = device();
        d.trusted = true;
        let first = Utc::now();
        revoke_trust(&mut d, first);
        assert_eq!(d.revoked_at, Some(first));
        let later = first + chrono::Duration::seconds(5);
        revoke_trust(&mut d, later);
        assert_eq!(d.revoked_at, Some(first));
    }
}
