//! C6 — MFA policy evaluation. An org may enable Rego policies under package
//! `ztcp.device_trust`; absent or uncompilable policies fall back to an
//! embedded default so this crate's public contract never fails (P8).

mod default_policy;
mod error;
mod evaluator;
mod types;

pub use error::PolicyError;
pub use evaluator::{PolicyEvaluator, RegoPolicyEvaluator};
pub use types::{DeviceInput, MfaResult, OrgInput, PlatformInput, PolicyInput, UserInput};
