//! C13 — the sentinel-to-status mapping of §4.13. Kept as two free functions
//! rather than a blanket `From` impl so the mapping table stays readable in
//! one place instead of spread across match arms on two different enums.

use tonic::Status;
use zt_auth::AuthError;
use zt_common::error::RepoError;

pub fn auth_error_to_status(err: AuthError) -> Status {
    match err {
        AuthError::EmailAlreadyRegistered => Status::already_exists(err.to_string()),

        AuthError::InvalidCredentials
        | AuthError::InvalidRefreshToken
        | AuthError::RefreshTokenReuse
        | AuthError::InvalidMFAChallenge
        | AuthError::InvalidMFAIntent
        | AuthError::InvalidOTP
        | AuthError::ChallengeExpired
        | AuthError::Unauthenticated => Status::unauthenticated(err.to_string()),

        AuthError::NotOrgMember | AuthError::PermissionDenied => Status::permission_denied(err.to_string()),

        AuthError::Validation { .. } | AuthError::PhoneRequiredForMFA => Status::invalid_argument(err.to_string()),

        AuthError::NotFound(_) => Status::not_found(err.to_string()),

        AuthError::Unimplemented => Status::unimplemented(err.to_string()),

        AuthError::Internal(_) => Status::internal(err.to_string()),
    }
}

pub fn repo_error_to_status(err: RepoError) -> Status {
    match err {
        RepoError::NotFound(_) => Status::not_found(err.to_string()),
        RepoError::Conflict(msg) => Status::already_exists(msg),
        RepoError::Storage(_) => Status::internal(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_sentinel_per_the_table() {
        assert_eq!(auth_error_to_status(AuthError::EmailAlreadyRegistered).code(), tonic::Code::AlreadyExists);
        assert_eq!(auth_error_to_status(AuthError::InvalidCredentials).code(), tonic::Code::Unauthenticated);
        assert_eq!(auth_error_to_status(AuthError::RefreshTokenReuse).code(), tonic::Code::Unauthenticated);
        assert_eq!(auth_error_to_status(AuthError::NotOrgMember).code(), tonic::Code::PermissionDenied);
        assert_eq!(auth_error_to_status(AuthError::PermissionDenied).code(), tonic::Code::PermissionDenied);
        assert_eq!(
            auth_error_to_status(AuthError::Validation { field: "email", reason: "bad" }).code(),
            tonic::Code::InvalidArgument
        );
        assert_eq!(auth_error_to_status(AuthError::NotFound("x".into())).code(), tonic::Code::NotFound);
        assert_eq!(auth_error_to_status(AuthError::Unimplemented).code(), tonic::Code::Unimplemented);
        assert_eq!(auth_error_to_status(AuthError::Internal("x".into())).code(), tonic::Code::Internal);
    }
}
