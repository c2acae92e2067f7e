use crate::error::repo_error_to_status;
use crate::proto::session_service_server::SessionService as SessionServiceTrait;
use crate::proto::{
    GetSessionRequest, ListSessionsRequest, ListSessionsResponse, RevokeAllSessionsForUserRequest,
    RevokeAllSessionsForUserResponse, RevokeSessionRequest, RevokeSessionResponse, Session as ProtoSession,
};
use crate::services::{next_page_token, parse_page, require_admin_for_org, to_unix};
use tonic::{Request, Response, Status};
use zt_common::domain::{Repositories, Session};

pub struct SessionServiceImpl {
    repos: Repositories,
}

impl SessionServiceImpl {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }
}

fn to_proto(s: Session) -> ProtoSession {
    ProtoSession {
        id: s.id,
        user_id: s.user_id,
        org_id: s.org_id,
        device_id: s.device_id,
        expires_at_unix: s.expires_at.timestamp(),
        revoked_at_unix: to_unix(s.revoked_at),
        last_seen_at_unix: to_unix(s.last_seen_at),
        ip_address: s.ip_address.unwrap_or_default(),
        created_at_unix: s.created_at.timestamp(),
    }
}

#[tonic::async_trait]
impl SessionServiceTrait for SessionServiceImpl {
    async fn get_session(&self, request: Request<GetSessionRequest>) -> Result<Response<ProtoSession>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        let session = self.repos.sessions.get_by_id(&req.session_id).await.map_err(repo_error_to_status)?;
        if session.org_id != req.org_id {
            return Err(Status::not_found("no such session in this organization"));
        }
        Ok(Response::new(to_proto(session)))
    }

    async fn list_sessions(&self, request: Request<ListSessionsRequest>) -> Result<Response<ListSessionsResponse>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        let (limit, offset) = parse_page(req.page_size, &req.page_token);
        let user_filter = Some(req.user_id.as_str()).filter(|u| !u.is_empty());
        let sessions = self
            .repos
            .sessions
            .list_by_org(&req.org_id, user_filter, limit, offset)
            .await
            .map_err(repo_error_to_status)?;
        let next_token = next_page_token(offset, limit, sessions.len());
        Ok(Response::new(ListSessionsResponse {
            sessions: sessions.into_iter().map(to_proto).collect(),
            next_page_token: next_token,
        }))
    }

    async fn revoke_session(&self, request: Request<RevokeSessionRequest>) -> Result<Response<RevokeSessionResponse>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        let session = self.repos.sessions.get_by_id(&req.session_id).await.map_err(repo_error_to_status)?;
        if session.org_id != req.org_id {
            return Err(Status::not_found("no such session in this organization"));
        }
        self.repos.sessions.revoke(&req.session_id, chrono::Utc::now()).await.map_err(repo_error_to_status)?;
        Ok(Response::new(RevokeSessionResponse {}))
    }

    async fn revoke_all_sessions_for_user(
        &self,
        request: Request<RevokeAllSessionsForUserRequest>,
    ) -> Result<Response<RevokeAllSessionsForUserResponse>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        self.repos
            .sessions
            .revoke_all_by_user_and_org(&req.user_id, &req.org_id, chrono::Utc::now())
            .await
            .map_err(repo_error_to_status)?;
        Ok(Response::new(RevokeAllSessionsForUserResponse {}))
    }
}
