//! §6's configuration surface, read straight from the environment. There is
//! no config file layer — every recognized key is an env var, matching how
//! `edge`/`sase-client` read their activation settings directly rather than
//! through a generic config-merge pipeline.

use chrono::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub grpc_addr: String,
    pub database_url: String,
    pub jwt_private_key: String,
    pub jwt_public_key: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_access_ttl: Duration,
    pub jwt_refresh_ttl: Duration,
    pub bcrypt_cost: i32,
    pub default_trust_ttl_days: i64,
    pub mfa_challenge_ttl: Duration,
    pub otp_return_to_client: bool,
}

impl AppConfig {
    /// Loads every recognized key, falling back to the defaults the
    /// specification names. `database_url`/the JWT keys are left empty when
    /// unset — `auth_enabled()` is how callers decide whether that means
    /// "disabled" rather than treating an empty string as an error here.
    pub fn load() -> Self {
        Self {
            grpc_addr: env_or("GRPC_ADDR", "0.0.0.0:7443"),
            database_url: env_or("DATABASE_URL", ""),
            jwt_private_key: env_or("JWT_PRIVATE_KEY", ""),
            jwt_public_key: env_or("JWT_PUBLIC_KEY", ""),
            jwt_issuer: env_or("JWT_ISSUER", "ztcp"),
            jwt_audience: env_or("JWT_AUDIENCE", "ztcp-clients"),
            jwt_access_ttl: parse_duration_secs("JWT_ACCESS_TTL", 15 * 60),
            jwt_refresh_ttl: parse_duration_secs("JWT_REFRESH_TTL", 30 * 24 * 60 * 60),
            bcrypt_cost: parse_env("BCRYPT_COST", 0),
            default_trust_ttl_days: parse_env("DEFAULT_TRUST_TTL_DAYS", 30),
            mfa_challenge_ttl: parse_duration_secs("MFA_CHALLENGE_TTL", 10 * 60),
            otp_return_to_client: parse_bool("OTP_RETURN_TO_CLIENT", false),
        }
    }

    /// §6: "Auth is enabled iff `DATABASE_URL` and both JWT keys are set".
    pub fn auth_enabled(&self) -> bool {
        !self.database_url.is_empty() && !self.jwt_private_key.is_empty() && !self.jwt_public_key.is_empty()
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Duration env vars are plain integer seconds; §6 calls these "duration
/// strings" but names no particular format, so the simplest unambiguous one
/// is used.
fn parse_duration_secs(key: &str, default_secs: i64) -> Duration {
    let secs = parse_env(key, default_secs);
    Duration::seconds(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_disabled_when_any_required_value_is_missing() {
        let mut cfg = AppConfig::load();
        cfg.database_url = String::new();
        cfg.jwt_private_key = "x".to_string();
        cfg.jwt_public_key = "x".to_string();
        assert!(!cfg.auth_enabled());

        cfg.database_url = "postgres://x".to_string();
        assert!(cfg.auth_enabled());
    }
}
