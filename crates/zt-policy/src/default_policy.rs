//! The embedded default policy (§4.6 step 4): applied whenever no org
//! policies are enabled, or every enabled policy failed to compile/evaluate.
//! Pure and infallible — this function can never itself be the reason
//! `evaluate_mfa` fails, which is what makes policy-default safety (P8)
//! provable by inspection.

use crate::types::{MfaResult, PolicyInput};

const SYSTEM_DEFAULT_TRUST_TTL_DAYS: i64 = 30;

pub fn evaluate_default(input: &PolicyInput) -> MfaResult {
    let mfa_required = input.platform.mfa_required_always
        || (input.device.is_new && input.org.mfa_required_for_new_device)
        || (!input.device.is_effectively_trusted && input.org.mfa_required_for_untrusted)
        || input.org.mfa_required_always;

    let trust_ttl_days = if input.org.trust_ttl_days > 0 {
        input.org.trust_ttl_days
    } else if input.platform.default_trust_ttl_days > 0 {
        input.platform.default_trust_ttl_days
    } else {
        SYSTEM_DEFAULT_TRUST_TTL_DAYS
    };

    MfaResult {
        mfa_required,
        register_trust_after_mfa: input.org.register_trust_after_mfa,
        trust_ttl_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceInput, OrgInput, PlatformInput, UserInput};

    fn base_input() -> PolicyInput {
        PolicyInput {
            platform: PlatformInput {
                mfa_required_always: false,
                default_trust_ttl_days: 30,
            },
            org: OrgInput {
                mfa_required_for_new_device: false,
                mfa_required_for_untrusted: false,
                mfa_required_always: false,
                register_trust_after_mfa: true,
                trust_ttl_days: 0,
            },
            device: DeviceInput {
                id: "d1".into(),
                trusted: false,
                trusted_until: None,
                revoked_at: None,
                is_new: false,
                is_effectively_trusted: false,
            },
            user: UserInput {
                id: "u1".into(),
                has_phone: true,
            },
        }
    }

    #[test]
    fn no_mfa_when_nothing_triggers_it() {
        let mut input = base_input();
        input.device.is_effectively_trusted = true;
        let result = evaluate_default(&input);
        assert!(!result.mfa_required);
        assert_eq!(result.trust_ttl_days, 30);
    }

    #[test]
    fn platform_always_wins() {
        let mut input = base_input();
        input.platform.mfa_required_always = true;
        input.device.is_effectively_trusted = true;
        assert!(evaluate_default(&input).mfa_required);
    }

    #[test]
    fn new_device_triggers_mfa_when_org_requires_it() {
        let mut input = base_input();
        input.device.is_new = true;
        input.org.mfa_required_for_new_device = true;
        assert!(evaluate_default(&input).mfa_required);
    }

    #[test]
    fn untrusted_device_triggers_mfa_when_org_requires_it() {
        let mut input = base_input();
        input.device.is_effectively_trusted = false;
        input.org.mfa_required_for_untrusted = true;
        assert!(evaluate_default(&input).mfa_required);
    }

    #[test]
    fn org_trust_ttl_overrides_platform_default() {
        let mut input = base_input();
        input.org.trust_ttl_days = 7;
        assert_eq!(evaluate_default(&input).trust_ttl_days, 7);
    }

    #[test]
    fn falls_back_to_system_default_when_both_are_zero() {
        let mut input = base_input();
        input.org.trust_ttl_days = 0;
        input.platform.default_trust_ttl_days = 0;
        assert_eq!(evaluate_default(&input).trust_ttl_days, 30);
    }
}
