//! The gRPC transport and composition root for the zero-trust control
//! plane: loads configuration (§6), wires the injected collaborators from
//! `zt-common`/`zt-crypto`/`zt-policy`/`zt-auth`, stacks the authorization
//! (C10) and audit (C12) layers, and serves the eight services defined in
//! `proto/ztcp.proto`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod proto;
pub mod services;

use crate::config::AppConfig;
use crate::middleware::{AuditLayer, AuthLayer};
use crate::proto::audit_service_server::AuditServiceServer;
use crate::proto::auth_service_server::AuthServiceServer;
use crate::proto::device_service_server::DeviceServiceServer;
use crate::proto::health_service_server::HealthServiceServer;
use crate::proto::membership_service_server::MembershipServiceServer;
use crate::proto::org_policy_config_service_server::OrgPolicyConfigServiceServer;
use crate::proto::policy_service_server::PolicyServiceServer;
use crate::proto::session_service_server::SessionServiceServer;
use crate::services::audit_service::AuditServiceImpl;
use crate::services::auth_service::AuthServiceImpl;
use crate::services::device_service::DeviceServiceImpl;
use crate::services::health_service::HealthServiceImpl;
use crate::services::membership_service::MembershipServiceImpl;
use crate::services::org_policy_service::OrgPolicyConfigServiceImpl;
use crate::services::policy_service::PolicyServiceImpl;
use crate::services::session_service::SessionServiceImpl;
use std::sync::Arc;
use tonic::transport::Server;
use zt_auth::{AuditLogger, AuthService, AuthServiceConfig, NoopEventEmitter};
use zt_common::domain::Repositories;
use zt_crypto::{BcryptHasher, TokenProvider};
use zt_policy::RegoPolicyEvaluator;

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load();
    let addr = config.grpc_addr.parse()?;

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install metrics exporter: {e}"))?;

    let repos = Repositories::in_memory();
    let policy_evaluator = Arc::new(RegoPolicyEvaluator::new(repos.policies.clone()));

    let audit_logger = Arc::new(AuditLogger::new(repos.audit.clone(), Arc::new(NoopEventEmitter)));

    let (auth_service, auth_layer) = if config.auth_enabled() {
        tracing::info!("auth enabled: DATABASE_URL and JWT keys configured");
        let signing_key = zt_crypto::load_private_key(&config.jwt_private_key)?;
        let verifying_key = zt_crypto::load_public_key(&config.jwt_public_key)?;
        let tokens = Arc::new(TokenProvider::new(
            signing_key,
            verifying_key,
            config.jwt_issuer.clone(),
            config.jwt_audience.clone(),
            config.jwt_access_ttl,
            config.jwt_refresh_ttl,
        )?);
        let hasher = Arc::new(BcryptHasher::new(config.bcrypt_cost));
        let clock = Arc::new(zt_common::clock::SystemClock);
        let auth_config = AuthServiceConfig {
            challenge_ttl: config.mfa_challenge_ttl,
            otp_return_to_client: config.otp_return_to_client,
        };
        let service = Arc::new(AuthService::new(
            repos.clone(),
            hasher,
            tokens.clone(),
            policy_evaluator.clone(),
            clock,
            None,
            None,
            auth_config,
        ));
        (Some(service), AuthLayer::new(tokens, repos.sessions.clone()))
    } else {
        tracing::warn!("auth disabled: DATABASE_URL or JWT keys not set; auth RPCs return Unimplemented");
        (None, AuthLayer::disabled())
    };

    let layer = tower::ServiceBuilder::new().layer(auth_layer).layer(AuditLayer::new(audit_logger.clone())).into_inner();

    tracing::info!(addr = %config.grpc_addr, "starting ztcpd");

    Server::builder()
        .layer(layer)
        .add_service(AuthServiceServer::new(AuthServiceImpl::new(auth_service, audit_logger)))
        .add_service(MembershipServiceServer::new(MembershipServiceImpl::new(repos.clone())))
        .add_service(SessionServiceServer::new(SessionServiceImpl::new(repos.clone())))
        .add_service(DeviceServiceServer::new(DeviceServiceImpl::new(repos.clone())))
        .add_service(PolicyServiceServer::new(PolicyServiceImpl::new(repos.clone(), policy_evaluator)))
        .add_service(OrgPolicyConfigServiceServer::new(OrgPolicyConfigServiceImpl::new(repos.clone())))
        .add_service(AuditServiceServer::new(AuditServiceImpl::new(repos.clone())))
        .add_service(HealthServiceServer::new(HealthServiceImpl::new(repos)))
        .serve(addr)
        .await?;

    Ok(())
}
