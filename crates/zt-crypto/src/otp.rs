//! C5 — OTP utility. Six-digit numeric codes from a cryptographically
//! secure source; only a hashed form is ever stored, and comparison reuses
//! the password hasher's constant-time primitive rather than a second
//! bespoke one (it is still a KDF applied to a low-entropy secret, but
//! OTP lifetimes are minutes, not the months a password hash must survive).

use crate::hasher::PasswordHasher;
use crate::error::CryptoResult;
use rand::RngCore;

/// Generates a zero-padded six-digit OTP using `OsRng`.
pub fn generate_otp() -> String {
    let mut bytes = [0u8; 4];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let value = u32::from_be_bytes(bytes) % 1_000_000;
    format!("{value:06}")
}

pub fn hash_otp(hasher: &dyn PasswordHasher, otp: &str) -> CryptoResult<String> {
    hasher.hash(otp)
}

pub fn verify_otp(hasher: &dyn PasswordHasher, otp: &str, hash: &str) -> bool {
    hasher.compare(otp, hash).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::BcryptHasher;

    #[test]
    fn otp_is_six_digits_zero_padded() {
        for _ in 0..20 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let hasher = BcryptHasher::new(bcrypt::MIN_COST as i32);
        let otp = "042817";
        let hash = hash_otp(&hasher, otp).unwrap();
        assert!(verify_otp(&hasher, otp, &hash));
        assert!(!verify_otp(&hasher, "000000", &hash));
    }
}
