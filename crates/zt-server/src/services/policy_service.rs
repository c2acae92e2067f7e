use crate::error::repo_error_to_status;
use crate::proto::policy_service_server::PolicyService as PolicyServiceTrait;
use crate::proto::{
    CreatePolicyRequest, DeletePolicyRequest, DeletePolicyResponse, ListPoliciesRequest, ListPoliciesResponse,
    Policy as ProtoPolicy, UpdatePolicyRequest,
};
use crate::services::require_admin_for_org;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use zt_common::domain::{Policy, Repositories};
use zt_policy::RegoPolicyEvaluator;

pub struct PolicyServiceImpl {
    repos: Repositories,
    evaluator: Arc<RegoPolicyEvaluator>,
}

impl PolicyServiceImpl {
    pub fn new(repos: Repositories, evaluator: Arc<RegoPolicyEvaluator>) -> Self {
        Self { repos, evaluator }
    }
}

fn to_proto(p: Policy) -> ProtoPolicy {
    ProtoPolicy { id: p.id, org_id: p.org_id, rules: p.rules, enabled: p.enabled, created_at_unix: p.created_at.timestamp() }
}

#[tonic::async_trait]
impl PolicyServiceTrait for PolicyServiceImpl {
    async fn create_policy(&self, request: Request<CreatePolicyRequest>) -> Result<Response<ProtoPolicy>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        let policy = Policy {
            id: uuid::Uuid::new_v4().to_string(),
            org_id: req.org_id,
            rules: req.rules,
            enabled: req.enabled,
            created_at: chrono::Utc::now(),
        };
        self.repos.policies.create(policy.clone()).await.map_err(repo_error_to_status)?;
        self.evaluator.invalidate_org(&policy.org_id);
        Ok(Response::new(to_proto(policy)))
    }

    async fn update_policy(&self, request: Request<UpdatePolicyRequest>) -> Result<Response<ProtoPolicy>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        let policy = Policy {
            id: req.id,
            org_id: req.org_id,
            rules: req.rules,
            enabled: req.enabled,
            created_at: chrono::Utc::now(),
        };
        self.repos.policies.update(policy.clone()).await.map_err(repo_error_to_status)?;
        self.evaluator.invalidate_org(&policy.org_id);
        Ok(Response::new(to_proto(policy)))
    }

    async fn delete_policy(&self, request: Request<DeletePolicyRequest>) -> Result<Response<DeletePolicyResponse>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        self.repos.policies.delete(&req.id).await.map_err(repo_error_to_status)?;
        self.evaluator.invalidate_org(&req.org_id);
        Ok(Response::new(DeletePolicyResponse {}))
    }

    async fn list_policies(&self, request: Request<ListPoliciesRequest>) -> Result<Response<ListPoliciesResponse>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        let policies = self.repos.policies.list_by_org(&req.org_id).await.map_err(repo_error_to_status)?;
        Ok(Response::new(ListPoliciesResponse { policies: policies.into_iter().map(to_proto).collect() }))
    }
}
