//! The authentication state machine (C9), device-trust logic (C7), RBAC
//! guard (C11), and audit pipeline (C12) for the zero-trust control plane.
//! `zt-auth` never depends on a transport crate — the gRPC surface and the
//! `tower::Layer` that wraps C10's algorithm live in `zt-server`.

pub mod audit;
pub mod device_trust;
pub mod error;
pub mod rbac;
pub mod service;
pub mod types;
mod validate;

pub use audit::{client_ip, parse_full_method, AuditLogger, ParsedMethod};
pub use device_trust::{register_trust_after_mfa, revoke_trust};
pub use error::AuthError;
pub use rbac::{require_org_admin, require_org_member, RbacOk, RequestIdentity};
pub use service::{AuthService, AuthServiceConfig};
pub use types::{DevOTPStore, EventEmitter, LoginResult, MfaRequired, NoopEventEmitter, OTPSender, PhoneRequired, Tokens};
pub use validate::{normalize_and_validate_email, normalize_device_fingerprint, validate_password_strength, validate_phone};

/// C10 — the authorization interceptor's algorithm, independent of any
/// specific transport. `zt-server`'s `tower::Layer` implementation calls
/// these in order; kept here (not in `zt-server`) so it is unit-testable
/// without spinning up a gRPC channel.
pub mod authz {
    use crate::rbac::RequestIdentity;

    /// Extracts a bearer token from an `authorization` header value:
    /// case-insensitive `"bearer "` prefix, surrounding whitespace trimmed.
    /// Absent or malformed input yields an empty string.
    pub fn extract_bearer_token(authorization_header: Option<&str>) -> String {
        let Some(value) = authorization_header else { return String::new() };
        let trimmed = value.trim();
        if trimmed.len() < 7 {
            return String::new();
        }
        let (prefix, rest) = trimmed.split_at(7);
        if prefix.eq_ignore_ascii_case("bearer ") {
            rest.trim().to_string()
        } else {
            String::new()
        }
    }

    /// The configured public method set: `Register`, `Login`, `Refresh`,
    /// `HealthCheck`. These canonical names are matched against whatever
    /// `parse_full_method`-style method name the transport surfaces; see
    /// `zt-server`'s interceptor for how the full `<package>.<Service>/<Method>`
    /// name is reduced to one of these.
    pub const PUBLIC_METHODS: &[&str] = &["Register", "Login", "Refresh", "HealthCheck"];

    pub fn is_public_method(method: &str) -> bool {
        PUBLIC_METHODS.contains(&method)
    }

    /// What `zt-server`'s interceptor attaches to the request context after
    /// step 6 of §4.10. `session_valid` is the result of the optional
    /// `SessionValidator(session_id)` consultation (step 5); callers that
    /// skip that check pass `true`.
    pub fn authorize(
        authorization_header: Option<&str>,
        method: &str,
        validate_access_token: impl FnOnce(&str) -> Option<RequestIdentity>,
        session_valid: impl FnOnce(&str) -> bool,
    ) -> Result<Option<RequestIdentity>, crate::error::AuthError> {
        let token = extract_bearer_token(authorization_header);
        let public = is_public_method(method);

        if token.is_empty() {
            return if public { Ok(None) } else { Err(crate::error::AuthError::Unauthenticated) };
        }

        let identity = match validate_access_token(&token) {
            Some(identity) => identity,
            None => {
                return if public { Ok(None) } else { Err(crate::error::AuthError::Unauthenticated) };
            }
        };

        if !session_valid(&identity.session_id) {
            return if public { Ok(None) } else { Err(crate::error::AuthError::Unauthenticated) };
        }

        Ok(Some(identity))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn bearer_extraction_is_case_insensitive_and_trims() {
            assert_eq!(extract_bearer_token(Some("Bearer abc123")), "abc123");
            assert_eq!(extract_bearer_token(Some("  bearer   abc123  ")), "abc123");
            assert_eq!(extract_bearer_token(Some("BEARER abc123")), "abc123");
        }

        #[test]
        fn malformed_or_absent_header_yields_empty() {
            assert_eq!(extract_bearer_token(None), "");
            assert_eq!(extract_bearer_token(Some("Basic abc123")), "");
            assert_eq!(extract_bearer_token(Some("short")), "");
        }

        #[test]
        fn public_method_without_token_proceeds_without_identity() {
            let result = authorize(None, "Login", |_| None, |_| true);
            assert_eq!(result.unwrap(), None);
        }

        #[test]
        fn private_method_without_token_is_unauthenticated() {
            let result = authorize(None, "UserService/GetUser", |_| None, |_| true);
            assert!(result.is_err());
        }

        #[test]
        fn valid_token_with_invalid_session_is_unauthenticated_on_private_method() {
            let identity = RequestIdentity { user_id: "u1".into(), org_id: "o1".into(), session_id: "s1".into() };
            let result = authorize(Some("Bearer tok"), "UserService/GetUser", move |_| Some(identity), |_| false);
            assert!(result.is_err());
        }

        #[test]
        fn valid_token_and_session_attaches_identity() {
            let identity = RequestIdentity { user_id: "u1".into(), org_id: "o1".into(), session_id: "s1".into() };
            let result = authorize(Some("Bearer tok"), "UserService/GetUser", move |_| Some(identity), |_| true).unwrap();
            assert!(result.is_some());
        }
    }
}
