use crate::error::repo_error_to_status;
use crate::proto::membership_service_server::MembershipService as MembershipServiceTrait;
use crate::proto::{
    AddMemberRequest, ListMembersRequest, ListMembersResponse, Membership as ProtoMembership, RemoveMemberRequest,
    RemoveMemberResponse, UpdateRoleRequest,
};
use crate::services::{next_page_token, parse_page, require_admin_for_org, role_to_str, str_to_role};
use tonic::{Request, Response, Status};
use zt_common::domain::{Membership, Repositories};

pub struct MembershipServiceImpl {
    repos: Repositories,
}

impl MembershipServiceImpl {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }
}

fn to_proto(m: Membership) -> ProtoMembership {
    ProtoMembership {
        id: m.id,
        user_id: m.user_id,
        org_id: m.org_id,
        role: role_to_str(m.role).to_string(),
        created_at_unix: m.created_at.timestamp(),
    }
}

#[tonic::async_trait]
impl MembershipServiceTrait for MembershipServiceImpl {
    async fn add_member(&self, request: Request<AddMemberRequest>) -> Result<Response<ProtoMembership>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        let role = str_to_role(&req.role)?;
        let membership = Membership {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: req.user_id,
            org_id: req.org_id,
            role,
            created_at: chrono::Utc::now(),
        };
        self.repos.memberships.create(membership.clone()).await.map_err(repo_error_to_status)?;
        Ok(Response::new(to_proto(membership)))
    }

    async fn remove_member(&self, request: Request<RemoveMemberRequest>) -> Result<Response<RemoveMemberResponse>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        self.repos.memberships.remove(&req.user_id, &req.org_id).await.map_err(repo_error_to_status)?;
        Ok(Response::new(RemoveMemberResponse {}))
    }

    async fn update_role(&self, request: Request<UpdateRoleRequest>) -> Result<Response<ProtoMembership>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        let role = str_to_role(&req.role)?;
        self.repos
            .memberships
            .update_role(&req.user_id, &req.org_id, role)
            .await
            .map_err(repo_error_to_status)?;
        let membership = self.repos.memberships.get(&req.user_id, &req.org_id).await.map_err(repo_error_to_status)?;
        Ok(Response::new(to_proto(membership)))
    }

    async fn list_members(&self, request: Request<ListMembersRequest>) -> Result<Response<ListMembersResponse>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        let (limit, offset) = parse_page(req.page_size, &req.page_token);
        let user_filter = Some(req.user_id.as_str()).filter(|u| !u.is_empty());
        let members = self
            .repos
            .memberships
            .list_by_org(&req.org_id, user_filter, limit, offset)
            .await
            .map_err(repo_error_to_status)?;
        let next_token = next_page_token(offset, limit, members.len());
        Ok(Response::new(ListMembersResponse {
            members: members.into_iter().map(to_proto).collect(),
            next_page_token: next_token,
        }))
    }
}
