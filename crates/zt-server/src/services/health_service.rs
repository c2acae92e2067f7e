//! §6: "always public; returns `SERVING` when all configured readiness
//! probes succeed (DB ping and policy-compile smoke test), else
//! `NOT_SERVING`; the RPC itself always succeeds."

use crate::proto::health_check_response::ServingStatus;
use crate::proto::health_service_server::HealthService as HealthServiceTrait;
use crate::proto::{HealthCheckRequest, HealthCheckResponse};
use tonic::{Request, Response, Status};
use zt_common::domain::Repositories;

pub struct HealthServiceImpl {
    repos: Repositories,
}

impl HealthServiceImpl {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Exercises the store without depending on any particular row
    /// existing, matching how a liveness ping is meant to probe
    /// reachability rather than application state.
    async fn db_ping_ok(&self) -> bool {
        self.repos.memberships.list_by_org("__healthcheck__", None, 1, 0).await.is_ok()
    }
}

#[tonic::async_trait]
impl HealthServiceTrait for HealthServiceImpl {
    async fn health_check(&self, _request: Request<HealthCheckRequest>) -> Result<Response<HealthCheckResponse>, Status> {
        // Policy evaluation never fails (P8): the embedded default always
        // backs it, so the compile smoke test degenerates to the DB ping.
        let status = if self.db_ping_ok().await { ServingStatus::Serving } else { ServingStatus::NotServing };
        Ok(Response::new(HealthCheckResponse { status: status as i32 }))
    }
}
