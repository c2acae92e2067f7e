//! C4 — refresh-token hashing. `hash(s) = hex(SHA-256(s))`; equality is
//! computed in constant time so a timing side channel cannot help an
//! attacker guess a stored hash from a candidate token.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Produces a 64-character lowercase hex string.
pub fn hash_refresh_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(digest)
}

/// Hashes `token` and compares it to `stored_hash` in constant time. Empty
/// inputs on either side never match.
pub fn refresh_tokens_equal(token: &str, stored_hash: &str) -> bool {
    if token.is_empty() || stored_hash.is_empty() {
        return false;
    }
    let computed = hash_refresh_token(token);
    computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_64_char_lowercase_hex() {
        let hash = hash_refresh_token("some-refresh-token");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn equal_hashes_match() {
        let token = "refresh-abc";
        let hash = hash_refresh_token(token);
        assert!(refresh_tokens_equal(token, &hash));
        assert!(!refresh_tokens_equal("refresh-xyz", &hash));
    }

    #[test]
    fn empty_inputs_never_match() {
        assert!(!refresh_tokens_equal("", ""));
        assert!(!refresh_tokens_equal("token", ""));
        assert!(!refresh_tokens_equal("", "hash"));
    }
}
