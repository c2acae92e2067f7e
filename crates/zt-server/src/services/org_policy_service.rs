use crate::error::repo_error_to_status;
use crate::proto::org_policy_config_service_server::OrgPolicyConfigService as OrgPolicyConfigServiceTrait;
use crate::proto::{GetOrgPolicyConfigRequest, OrgPolicyConfig as ProtoOrgPolicyConfig, UpdateOrgPolicyConfigRequest};
use crate::services::require_admin_for_org;
use tonic::{Request, Response, Status};
use zt_common::domain::{OrgMfaSettings, Repositories};

pub struct OrgPolicyConfigServiceImpl {
    repos: Repositories,
}

impl OrgPolicyConfigServiceImpl {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }
}

fn to_proto(org_id: &str, settings: OrgMfaSettings) -> ProtoOrgPolicyConfig {
    ProtoOrgPolicyConfig {
        org_id: org_id.to_string(),
        mfa_required_for_new_device: settings.mfa_required_for_new_device,
        mfa_required_for_untrusted: settings.mfa_required_for_untrusted,
        mfa_required_always: settings.mfa_required_always,
        register_trust_after_mfa: settings.register_trust_after_mfa,
        trust_ttl_days: settings.trust_ttl_days,
    }
}

fn from_proto(config: &ProtoOrgPolicyConfig) -> OrgMfaSettings {
    OrgMfaSettings {
        mfa_required_for_new_device: config.mfa_required_for_new_device,
        mfa_required_for_untrusted: config.mfa_required_for_untrusted,
        mfa_required_always: config.mfa_required_always,
        register_trust_after_mfa: config.register_trust_after_mfa,
        trust_ttl_days: config.trust_ttl_days,
    }
}

#[tonic::async_trait]
impl OrgPolicyConfigServiceTrait for OrgPolicyConfigServiceImpl {
    async fn get(&self, request: Request<GetOrgPolicyConfigRequest>) -> Result<Response<ProtoOrgPolicyConfig>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        let settings = self
            .repos
            .org_mfa_settings
            .get_by_org(&req.org_id)
            .await
            .map_err(repo_error_to_status)?
            .unwrap_or_default();
        Ok(Response::new(to_proto(&req.org_id, settings)))
    }

    async fn update(
        &self,
        request: Request<UpdateOrgPolicyConfigRequest>,
    ) -> Result<Response<ProtoOrgPolicyConfig>, Status> {
        let org_id = request
            .get_ref()
            .config
            .as_ref()
            .map(|c| c.org_id.clone())
            .unwrap_or_default();
        require_admin_for_org(&self.repos.memberships, &request, &org_id).await?;
        let req = request.into_inner();
        let config = req.config.ok_or_else(|| Status::invalid_argument("config is required"))?;
        let settings = from_proto(&config);
        self.repos
            .org_mfa_settings
            .upsert(&config.org_id, settings)
            .await
            .map_err(repo_error_to_status)?;
        Ok(Response::new(to_proto(&config.org_id, settings)))
    }
}
