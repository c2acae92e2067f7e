//! C1 — password hashing. Adaptive-cost, salted, self-describing output;
//! constant-time verification via bcrypt's own comparison.

use crate::error::{CryptoError, CryptoResult};

/// Capability set so the authentication service (C9) can be unit-tested
/// against a deterministic stub without paying the real KDF cost, mirroring
/// the `PolicyEvaluator` trait-seam note in the design notes.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> CryptoResult<String>;
    /// Returns `Ok(())` on match, `Err(CryptoError::Mismatch)` otherwise.
    /// Never distinguishes "malformed hash" from "wrong password".
    fn compare(&self, password: &str, hash: &str) -> CryptoResult<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// `cost <= 0` means "use bcrypt's default"; anything else is clamped to
    /// bcrypt's allowed range.
    pub fn new(cost: i32) -> Self {
        let cost = if cost <= 0 {
            bcrypt::DEFAULT_COST
        } else {
            (cost as u32).clamp(bcrypt::MIN_COST, bcrypt::MAX_COST)
        };
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> CryptoResult<String> {
        bcrypt::hash(password, self.cost).map_err(|_| CryptoError::HashFailure)
    }

    fn compare(&self, password: &str, hash: &str) -> CryptoResult<()> {
        match bcrypt::verify(password, hash) {
            Ok(true) => Ok(()),
            _ => Err(CryptoError::Mismatch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_clamps_to_algorithm_range() {
        assert_eq!(BcryptHasher::new(0).cost, bcrypt::DEFAULT_COST);
        assert_eq!(BcryptHasher::new(-5).cost, bcrypt::DEFAULT_COST);
        assert_eq!(BcryptHasher::new(1).cost, bcrypt::MIN_COST);
        assert_eq!(BcryptHasher::new(999).cost, bcrypt::MAX_COST);
    }

    #[test]
    fn hash_then_compare_round_trips() {
        let hasher = BcryptHasher::new(bcrypt::MIN_COST as i32);
        let hash = hasher.hash("Passw0rd!Pass!").unwrap();
        assert!(hasher.compare("Passw0rd!Pass!", &hash).is_ok());
        assert!(hasher.compare("wrong", &hash).is_err());
    }

    #[test]
    fn malformed_hash_yields_same_error_as_mismatch() {
        let hasher = BcryptHasher::new(bcrypt::MIN_COST as i32);
        let err = hasher.compare("whatever", "not-a-bcrypt-hash").unwrap_err();
        assert!(matches!(err, CryptoError::Mismatch));
    }
}
