//! Sentinel errors for the authentication state machine (C9) and its
//! surrounding guards. Authentication failures are deliberately coarse —
//! see `InvalidCredentials`'s doc comment — so the dispatcher (C13) can map
//! the whole enum to transport status codes without the domain crate
//! depending on a transport type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {field}: {reason}")]
    Validation { field: &'static str, reason: &'static str },

    #[error("email already registered")]
    EmailAlreadyRegistered,

    /// Covers "no such user", "user disabled", "no local identity", and
    /// "wrong password" uniformly (P2): none of these may be distinguished
    /// by the caller.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// A refresh token that was already rotated away was presented again.
    /// All sessions of the owning user have been revoked by the time this
    /// is returned.
    #[error("refresh token reuse detected")]
    RefreshTokenReuse,

    #[error("user is not a member of this organization")]
    NotOrgMember,

    #[error("a phone number is required before MFA can proceed")]
    PhoneRequiredForMFA,

    #[error("invalid MFA challenge")]
    InvalidMFAChallenge,

    #[error("invalid MFA intent")]
    InvalidMFAIntent,

    #[error("invalid one-time code")]
    InvalidOTP,

    #[error("challenge expired")]
    ChallengeExpired,

    #[error("permission denied")]
    PermissionDenied,

    #[error("not authenticated")]
    Unauthenticated,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not implemented")]
    Unimplemented,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<zt_common::error::RepoError> for AuthError {
    fn from(err: zt_common::error::RepoError) -> Self {
        match err {
            zt_common::error::RepoError::NotFound(what) => AuthError::NotFound(what),
            other => AuthError::Internal(other.to_string()),
        }
    }
}
