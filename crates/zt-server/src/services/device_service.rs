use crate::error::repo_error_to_status;
use crate::proto::device_service_server::DeviceService as DeviceServiceTrait;
use crate::proto::{
    Device as ProtoDevice, GetDeviceRequest, ListDevicesRequest, ListDevicesResponse, RevokeDeviceRequest,
    RevokeDeviceResponse,
};
use crate::services::{next_page_token, parse_page, require_admin_for_org, to_unix};
use tonic::{Request, Response, Status};
use zt_auth::revoke_trust;
use zt_common::domain::{Device, Repositories};

pub struct DeviceServiceImpl {
    repos: Repositories,
}

impl DeviceServiceImpl {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }
}

fn to_proto(d: Device) -> ProtoDevice {
    ProtoDevice {
        id: d.id,
        user_id: d.user_id,
        org_id: d.org_id,
        fingerprint: d.fingerprint,
        trusted: d.trusted,
        trusted_until_unix: to_unix(d.trusted_until),
        revoked_at_unix: to_unix(d.revoked_at),
        last_seen_at_unix: to_unix(d.last_seen_at),
        created_at_unix: d.created_at.timestamp(),
    }
}

#[tonic::async_trait]
impl DeviceServiceTrait for DeviceServiceImpl {
    async fn get_device(&self, request: Request<GetDeviceRequest>) -> Result<Response<ProtoDevice>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        let device = self.repos.devices.get_by_id(&req.device_id).await.map_err(repo_error_to_status)?;
        if device.org_id != req.org_id {
            return Err(Status::not_found("no such device in this organization"));
        }
        Ok(Response::new(to_proto(device)))
    }

    async fn list_devices(&self, request: Request<ListDevicesRequest>) -> Result<Response<ListDevicesResponse>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        let (limit, offset) = parse_page(req.page_size, &req.page_token);
        let user_filter = Some(req.user_id.as_str()).filter(|u| !u.is_empty());
        let devices = self
            .repos
            .devices
            .list_by_org(&req.org_id, user_filter, limit, offset)
            .await
            .map_err(repo_error_to_status)?;
        let next_token = next_page_token(offset, limit, devices.len());
        Ok(Response::new(ListDevicesResponse {
            devices: devices.into_iter().map(to_proto).collect(),
            next_page_token: next_token,
        }))
    }

    async fn revoke_device(&self, request: Request<RevokeDeviceRequest>) -> Result<Response<RevokeDeviceResponse>, Status> {
        require_admin_for_org(&self.repos.memberships, &request, &request.get_ref().org_id).await?;
        let req = request.into_inner();
        let mut device = self.repos.devices.get_by_id(&req.device_id).await.map_err(repo_error_to_status)?;
        if device.org_id != req.org_id {
            return Err(Status::not_found("no such device in this organization"));
        }
        revoke_trust(&mut device, chrono::Utc::now());
        self.repos.devices.update(device).await.map_err(repo_error_to_status)?;
        Ok(Response::new(RevokeDeviceResponse {}))
    }
}
