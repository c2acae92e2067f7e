//! Cryptographic primitives for the zero-trust control plane: password
//! hashing (C1), asymmetric key loading (C2), access/refresh token issuance
//! and validation (C3), refresh-token hashing (C4), and OTP generation (C5).
//!
//! This crate is pure — no repository access, no network calls — so it can
//! be exercised with plain unit tests and composed into `zt-auth`'s
//! authentication service by constructor injection.

pub mod error;
pub mod hasher;
pub mod keys;
pub mod otp;
pub mod refresh_hash;
pub mod token;

pub use error::{CryptoError, CryptoResult};
pub use hasher::{BcryptHasher, PasswordHasher};
pub use keys::{load_private_key, load_public_key, SigningKey, VerifyingKey};
pub use otp::{generate_otp, hash_otp, verify_otp};
pub use refresh_hash::{hash_refresh_token, refresh_tokens_equal};
pub use token::{Claims, TokenProvider, ValidatedToken};
