use thiserror::Error;

/// Every failure mode this crate exposes. Callers in `zt-auth` map these to
/// the spec's uniform, side-channel-free outcomes — `CryptoError` itself
/// carries no information an attacker could use to distinguish "wrong
/// password" from "malformed hash" or "expired token" from "bad signature".
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key")]
    InvalidKey,

    #[error("hash error")]
    HashFailure,

    #[error("password does not match")]
    Mismatch,

    #[error("invalid token")]
    InvalidToken,
}

pub type CryptoResult<T> = Result<T, CryptoError>;
