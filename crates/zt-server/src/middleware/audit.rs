//! C12 — the generic post-response audit layer. Runs after the handler
//! completes (§4.12: "the audit write is strictly after the handler
//! completes") and writes nothing for `HealthCheck` or for requests that
//! never resolved an identity, since those carry no `org_id` to attribute
//! the row to.

use std::sync::Arc;
use std::task::{Context, Poll};
use tonic::body::BoxBody;
use tower::{Layer, Service};
use zt_auth::{client_ip, parse_full_method, AuditLogger, RequestIdentity};

#[derive(Clone)]
pub struct AuditLayer {
    logger: Arc<AuditLogger>,
}

impl AuditLayer {
    pub fn new(logger: Arc<AuditLogger>) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for AuditLayer {
    type Service = AuditMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuditMiddleware { inner, logger: self.logger.clone() }
    }
}

#[derive(Clone)]
pub struct AuditMiddleware<S> {
    inner: S,
    logger: Arc<AuditLogger>,
}

impl<S, ReqBody> Service<http::Request<ReqBody>> for AuditMiddleware<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<BoxBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<ReqBody>) -> Self::Future {
        let mut inner = self.inner.clone();
        std::mem::swap(&mut inner, &mut self.inner);
        let logger = self.logger.clone();

        let full_method = req.uri().path().to_string();
        let identity = req.extensions().get::<RequestIdentity>().cloned();
        let ip = client_ip(
            header_value(&req, "x-forwarded-for").as_deref(),
            header_value(&req, "x-real-ip").as_deref(),
            None,
        );

        Box::pin(async move {
            let response = inner.call(req).await?;

            if let Some(identity) = identity {
                if full_method.rsplit('/').next() != Some("HealthCheck") {
                    let parsed = parse_full_method(&full_method);
                    logger
                        .record(&identity.org_id, &identity.user_id, &parsed.action, &parsed.resource, &ip)
                        .await;
                }
            }

            Ok(response)
        })
    }
}

fn header_value<B>(req: &http::Request<B>, name: &str) -> Option<String> {
    req.headers().get(name).and_then(|v| v.to_str().ok()).map(|s| s.to_string())
}
