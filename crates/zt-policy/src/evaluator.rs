//! C6 — the policy evaluator. `EvaluateMFA` is a capability set so the
//! authentication service's unit tests can substitute a deterministic stub
//! and never link against the Rego runtime (see design notes §9 and
//! DESIGN.md).

use crate::default_policy::evaluate_default;
use crate::types::{MfaResult, PolicyInput};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use zt_common::domain::{Device, OrgMfaSettings, PlatformDeviceTrustSettings, PolicyRepository, User};

#[async_trait]
pub trait PolicyEvaluator: Send + Sync {
    /// Never fails (P8): evaluation errors and missing/uncompilable policies
    /// all collapse into the embedded default, so the authentication service
    /// never has to handle a policy-layer error.
    async fn evaluate_mfa(
        &self,
        org_id: &str,
        platform: PlatformDeviceTrustSettings,
        org_settings: OrgMfaSettings,
        device: &Device,
        user: &User,
        is_new_device: bool,
        now: DateTime<Utc>,
    ) -> MfaResult;
}

/// A package `ztcp.device_trust` evaluator backed by `regorus`, a pure-Rust
/// Rego interpreter — the one genuinely new dependency this crate adds
/// beyond the pack (see DESIGN.md; no retrieved repo ships a policy-engine
/// runtime for real Rego, only hand-rolled condition trees).
pub struct RegoPolicyEvaluator {
    policies: Arc<dyn PolicyRepository>,
    cache: moka::sync::Cache<(String, u64), Arc<Mutex<regorus::Engine>>>,
}

impl RegoPolicyEvaluator {
    pub fn new(policies: Arc<dyn PolicyRepository>) -> Self {
        Self {
            policies,
            cache: moka::sync::Cache::builder()
                .max_capacity(1_000)
                .build(),
        }
    }

    /// Invalidate every cached compilation for an org. Call this after a
    /// policy write; cache staleness otherwise self-heals on next read
    /// because the cache key includes a hash of the enabled rule sources.
    pub fn invalidate_org(&self, org_id: &str) {
        self.cache.invalidate_entries_if(move |(k_org, _), _| k_org == org_id).ok();
    }

    fn rules_hash(sources: &[String]) -> u64 {
        let mut hasher = DefaultHasher::new();
        for s in sources {
            s.hash(&mut hasher);
        }
        hasher.finish()
    }

    fn compile(org_id: &str, sources: &[String]) -> Option<regorus::Engine> {
        let mut engine = regorus::Engine::new();
        for (i, source) in sources.iter().enumerate() {
            if engine
                .add_policy(format!("{org_id}-{i}.rego"), source.clone())
                .is_err()
            {
                tracing::warn!(org_id, policy_index = i, "policy failed to compile, skipping");
                return None;
            }
        }
        Some(engine)
    }

    fn eval_query(engine: &mut regorus::Engine, input: &PolicyInput, query: &str) -> Option<regorus::Value> {
        let input_json = serde_json::to_string(input).ok()?;
        let input_value = regorus::Value::from_json_str(&input_json).ok()?;
        engine.set_input(input_value);
        engine.eval_query(query.to_string(), false).ok().and_then(|r| {
            r.result
                .into_iter()
                .next()
                .and_then(|q| q.expressions.into_iter().next())
                .map(|e| e.value)
        })
    }
}

#[async_trait]
impl PolicyEvaluator for RegoPolicyEvaluator {
    async fn evaluate_mfa(
        &self,
        org_id: &str,
        platform: PlatformDeviceTrustSettings,
        org_settings: OrgMfaSettings,
        device: &Device,
        user: &User,
        is_new_device: bool,
        now: DateTime<Utc>,
    ) -> MfaResult {
        let input = PolicyInput::build(platform, org_settings, device, user, is_new_device, now);

        let enabled = match self.policies.list_enabled_by_org(org_id).await {
            Ok(policies) => policies,
            Err(err) => {
                tracing::warn!(org_id, error = %err, "policy lookup failed, applying embedded default");
                return evaluate_default(&input);
            }
        };

        if enabled.is_empty() {
            return evaluate_default(&input);
        }

        let sources: Vec<String> = enabled.into_iter().map(|p| p.rules).collect();
        let key = (org_id.to_string(), Self::rules_hash(&sources));

        let engine = if let Some(cached) = self.cache.get(&key) {
            cached
        } else {
            match Self::compile(org_id, &sources) {
                Some(engine) => {
                    let wrapped = Arc::new(Mutex::new(engine));
                    self.cache.insert(key, wrapped.clone());
                    wrapped
                }
                None => return evaluate_default(&input),
            }
        };

        let mut engine = engine.lock();
        let mfa_required = Self::eval_query(
            &mut engine,
            &input,
            "data.ztcp.device_trust.mfa_required",
        )
        .and_then(|v| v.as_bool().ok())
        .unwrap_or(false);
        let register_trust_after_mfa = Self::eval_query(
            &mut engine,
            &input,
            "data.ztcp.device_trust.register_trust_after_mfa",
        )
        .and_then(|v| v.as_bool().ok())
        .unwrap_or(true);
        let trust_ttl_days = Self::eval_query(
            &mut engine,
            &input,
            "data.ztcp.device_trust.trust_ttl_days",
        )
        .and_then(|v| v.as_i64().ok())
        .unwrap_or(input.platform.default_trust_ttl_days);

        MfaResult {
            mfa_required,
            register_trust_after_mfa,
            trust_ttl_days,
        }
    }
}
