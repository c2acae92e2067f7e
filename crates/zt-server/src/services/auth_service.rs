//! `AuthService` RPCs. These are the pre-authentication (public) or
//! identity-bootstrapping endpoints, so unlike the RBAC-guarded services
//! they log their own domain events explicitly (§4.12) rather than relying
//! on the generic post-response audit layer, which never sees a resolved
//! identity for most of these calls.

use crate::error::auth_error_to_status;
use crate::proto::auth_service_server::AuthService as AuthServiceTrait;
use crate::proto::{
    login_response, LinkIdentityRequest, LinkIdentityResponse, LoginRequest, LoginResponse, LogoutRequest,
    LogoutResponse, MfaRequiredResponse, PhoneRequiredResponse, RefreshRequest, RegisterRequest, RegisterResponse,
    SubmitPhoneAndRequestMfaRequest, TokensResponse, VerifyMfaRequest,
};
use crate::services::identity_of;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use zt_auth::{AuditLogger, AuthService, LoginResult, Tokens};

pub struct AuthServiceImpl {
    auth: Option<Arc<AuthService>>,
    audit: Arc<AuditLogger>,
}

impl AuthServiceImpl {
    pub fn new(auth: Option<Arc<AuthService>>, audit: Arc<AuditLogger>) -> Self {
        Self { auth, audit }
    }

    fn require_auth(&self) -> Result<&Arc<AuthService>, Status> {
        self.auth.as_ref().ok_or_else(|| Status::unimplemented("auth is disabled: DATABASE_URL/JWT keys not configured"))
    }
}

fn tokens_to_proto(tokens: Tokens) -> TokensResponse {
    TokensResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_at_unix: tokens.expires_at.timestamp(),
        user_id: tokens.user_id,
        org_id: tokens.org_id,
    }
}

#[tonic::async_trait]
impl AuthServiceTrait for AuthServiceImpl {
    async fn register(&self, request: Request<RegisterRequest>) -> Result<Response<RegisterResponse>, Status> {
        let auth = self.require_auth()?;
        let req = request.into_inner();
        let user_id = auth
            .register(&req.email, &req.password, Some(req.name.as_str()).filter(|n| !n.is_empty()))
            .await
            .map_err(auth_error_to_status)?;
        Ok(Response::new(RegisterResponse { user_id }))
    }

    async fn login(&self, request: Request<LoginRequest>) -> Result<Response<LoginResponse>, Status> {
        let auth = self.require_auth()?;
        let req = request.into_inner();
        let fingerprint = Some(req.device_fingerprint.as_str()).filter(|f| !f.is_empty());

        match auth.login(&req.email, &req.password, &req.org_id, fingerprint).await {
            Ok(LoginResult::Tokens(tokens)) => {
                self.audit
                    .log_event(&req.org_id, &tokens.user_id, "login_success", "session", "")
                    .await;
                Ok(Response::new(LoginResponse { result: Some(login_response::Result::Tokens(tokens_to_proto(tokens))) }))
            }
            Ok(LoginResult::MfaRequired(mfa)) => Ok(Response::new(LoginResponse {
                result: Some(login_response::Result::MfaRequired(MfaRequiredResponse {
                    challenge_id: mfa.challenge_id,
                    phone_mask: mfa.phone_mask,
                })),
            })),
            Ok(LoginResult::PhoneRequired(phone)) => Ok(Response::new(LoginResponse {
                result: Some(login_response::Result::PhoneRequired(PhoneRequiredResponse { intent_id: phone.intent_id })),
            })),
            Err(err) => {
                self.audit.log_event(&req.org_id, "", "login_failure", "session", "").await;
                Err(auth_error_to_status(err))
            }
        }
    }

    async fn submit_phone_and_request_mfa(
        &self,
        request: Request<SubmitPhoneAndRequestMfaRequest>,
    ) -> Result<Response<MfaRequiredResponse>, Status> {
        let auth = self.require_auth()?;
        let req = request.into_inner();
        let mfa = auth
            .submit_phone_and_request_mfa(&req.intent_id, &req.phone)
            .await
            .map_err(auth_error_to_status)?;
        Ok(Response::new(MfaRequiredResponse { challenge_id: mfa.challenge_id, phone_mask: mfa.phone_mask }))
    }

    async fn verify_mfa(&self, request: Request<VerifyMfaRequest>) -> Result<Response<TokensResponse>, Status> {
        let auth = self.require_auth()?;
        let req = request.into_inner();
        let tokens = auth.verify_mfa(&req.challenge_id, &req.otp).await.map_err(auth_error_to_status)?;
        self.audit.log_event(&tokens.org_id, &tokens.user_id, "session_created", "session", "").await;
        Ok(Response::new(tokens_to_proto(tokens)))
    }

    async fn refresh(&self, request: Request<RefreshRequest>) -> Result<Response<TokensResponse>, Status> {
        let auth = self.require_auth()?;
        let req = request.into_inner();
        let tokens = auth.refresh(&req.refresh_token).await.map_err(auth_error_to_status)?;
        Ok(Response::new(tokens_to_proto(tokens)))
    }

    async fn logout(&self, request: Request<LogoutRequest>) -> Result<Response<LogoutResponse>, Status> {
        let auth = self.require_auth()?;
        let identity = identity_of(&request);
        let req = request.into_inner();
        let refresh_token = Some(req.refresh_token.as_str()).filter(|t| !t.is_empty());
        auth.logout(refresh_token, identity.as_ref().map(|i| i.session_id.as_str())).await;
        if let Some(identity) = identity {
            self.audit.log_event(&identity.org_id, &identity.user_id, "logout", "session", "").await;
        }
        Ok(Response::new(LogoutResponse {}))
    }

    /// Reserved per §6's RPC surface; linking an external identity provider
    /// is out of scope for this core (see DESIGN.md, Open Question 2).
    async fn link_identity(&self, _request: Request<LinkIdentityRequest>) -> Result<Response<LinkIdentityResponse>, Status> {
        Err(Status::unimplemented("LinkIdentity is reserved"))
    }
}
