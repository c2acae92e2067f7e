//! Request/response shapes and the trait seams `AuthService` is constructed
//! with. `LinkIdentity` is intentionally absent here — it is wired straight
//! to `AuthError::Unimplemented` at the call site, per the open question in
//! DESIGN.md.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: String,
    pub org_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MfaRequired {
    pub challenge_id: String,
    pub phone_mask: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhoneRequired {
    pub intent_id: String,
}

/// The tagged union `Login` returns — a sum type rather than three optional
/// fields, so callers must match rather than guess which fields are live.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginResult {
    Tokens(Tokens),
    MfaRequired(MfaRequired),
    PhoneRequired(PhoneRequired),
}

/// Delivers an OTP to a phone number. The concrete SMS gateway is an
/// external collaborator outside this crate's scope; only the seam lives
/// here.
#[async_trait]
pub trait OTPSender: Send + Sync {
    async fn send(&self, phone: &str, otp: &str) -> Result<(), String>;
}

/// Development-only side channel for retrieving an OTP without an SMS
/// gateway. Must only be wired when a dev flag is set at the composition
/// root; never reachable from this crate's own logic unless the caller
/// passes one in.
#[async_trait]
pub trait DevOTPStore: Send + Sync {
    async fn put(&self, challenge_id: &str, otp: &str, expires_at: DateTime<Utc>);
}

/// Asynchronous fan-out for domain events, e.g. to a downstream aggregation
/// pipeline. Emission failure must never affect the synchronous request
/// path — implementations should swallow their own errors.
#[async_trait]
pub trait EventEmitter: Send + Sync {
    async fn emit(&self, org_id: &str, user_id: &str, action: &str, resource: &str, metadata: &str);
}

/// No-op default: every event is dropped. Used when no downstream
/// aggregation pipeline is configured.
pub struct NoopEventEmitter;

#[async_trait]
impl EventEmitter for NoopEventEmitter {
    async fn emit(&self, _org_id: &str, _user_id: &str, _action: &str, _resource: &str, _metadata: &str) {}
}

pub(crate) fn phone_mask(phone: &str) -> String {
    if phone.len() <= 4 {
        "****".to_string()
    } else {
        format!("****{}", &phone[phone.len() - 4..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_short_phone_entirely() {
        assert_eq!(phone_mask("123"), "****");
        assert_eq!(phone_mask("1234"), "****");
    }

    #[test]
    fn masks_long_phone_to_last_four() {
        assert_eq!(phone_mask("+15551234567"), "****4567");
    }
}
