use crate::error::repo_error_to_status;
use crate::proto::audit_service_server::AuditService as AuditServiceTrait;
use crate::proto::{AuditLogEntry, ListAuditLogsRequest, ListAuditLogsResponse};
use crate::services::{next_page_token, parse_page, require_admin_for_org};
use tonic::{Request, Response, Status};
use zt_common::domain::{AuditEvent, Repositories};

pub struct AuditServiceImpl {
    repos: Repositories,
}

impl AuditServiceImpl {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }
}

fn to_proto(e: AuditEvent) -> AuditLogEntry {
    AuditLogEntry {
        id: e.id,
        org_id: e.org_id,
        user_id: e.user_id,
        action: e.action,
        resource: e.resource,
        ip: e.ip,
        metadata: e.metadata,
        created_at_unix: e.created_at.timestamp(),
    }
}

#[tonic::async_trait]
impl AuditServiceTrait for AuditServiceImpl {
    async fn list_audit_logs(
        &self,
        request: Request<ListAuditLogsRequest>,
    ) -> Result<Response<ListAuditLogsResponse>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        let (limit, offset) = parse_page(req.page_size, &req.page_token);
        let entries = self
            .repos
            .audit
            .list_by_org(&req.org_id, limit, offset)
            .await
            .map_err(repo_error_to_status)?;
        let next_token = next_page_token(offset, limit, entries.len());
        Ok(Response::new(ListAuditLogsResponse {
            entries: entries.into_iter().map(to_proto).collect(),
            next_page_token: next_token,
        }))
    }
}
