//! C10 — the authorization layer. `zt_auth::authz::authorize` is pure and
//! synchronous; this layer's only job is resolving the two pieces of async
//! state it needs (token validation, session liveness) before calling it,
//! then attaching the resulting identity to the request's extensions for
//! downstream service handlers and the audit layer to read.

use std::sync::Arc;
use std::task::{Context, Poll};
use tonic::body::BoxBody;
use tonic::Status;
use tower::{Layer, Service};
use zt_auth::RequestIdentity;
use zt_common::domain::SessionRepository;
use zt_crypto::TokenProvider;

/// When `enabled` is `false` (auth disabled per §6: no `DATABASE_URL` or
/// JWT keys configured) this layer degenerates to a pass-through — the
/// spec's "no auth interceptor is registered" is expressed here as a flag
/// rather than a different router type, so the rest of the stack doesn't
/// need two shapes of `Router`.
#[derive(Clone)]
pub struct AuthLayer {
    tokens: Option<Arc<TokenProvider>>,
    sessions: Option<Arc<dyn SessionRepository>>,
    enabled: bool,
}

impl AuthLayer {
    pub fn new(tokens: Arc<TokenProvider>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { tokens: Some(tokens), sessions: Some(sessions), enabled: true }
    }

    pub fn disabled() -> Self {
        Self { tokens: None, sessions: None, enabled: false }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            tokens: self.tokens.clone(),
            sessions: self.sessions.clone(),
            enabled: self.enabled,
        }
    }
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    tokens: Option<Arc<TokenProvider>>,
    sessions: Option<Arc<dyn SessionRepository>>,
    enabled: bool,
}

/// Reduces a canonical `/ztcp.v1.AuthService/Login` gRPC path to the bare
/// method name `authz::is_public_method` matches against.
fn bare_method(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

impl<S, ReqBody> Service<http::Request<ReqBody>> for AuthMiddleware<S>
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

    fn call(&mut self, mut req: http::Request<ReqBody>) -> Self::Future {
        // The tower "clone-then-swap" idiom: the clone we hold below may not
        // be ready, so the ready clone we already polled is the one that
        // actually services this call.
        let mut inner = self.inner.clone();
        std::mem::swap(&mut inner, &mut self.inner);

        let tokens = self.tokens.clone();
        let sessions = self.sessions.clone();
        let enabled = self.enabled;

        Box::pin(async move {
            if !enabled {
                return inner.call(req).await;
            }
            let tokens = tokens.expect("tokens present whenever the layer is enabled");
            let sessions = sessions.expect("sessions present whenever the layer is enabled");

            let method = bare_method(req.uri().path());
            let auth_header = req
                .headers()
                .get(http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            let token = zt_auth::authz::extract_bearer_token(auth_header.as_deref());
            let validated = if token.is_empty() { None } else { tokens.validate(&token).ok() };

            let session_valid = match &validated {
                Some(v) => match sessions.get_by_id(&v.session_id).await {
                    Ok(session) => session.is_active(chrono::Utc::now()),
                    Err(_) => false,
                },
                None => false,
            };

            let identity_candidate = validated.map(|v| RequestIdentity {
                user_id: v.user_id,
                org_id: v.org_id,
                session_id: v.session_id,
            });

            let result = zt_auth::authz::authorize(
                auth_header.as_deref(),
                &method,
                move |_token| identity_candidate,
                move |_session_id| session_valid,
            );

            match result {
                Ok(identity) => {
                    if let Some(identity) = identity {
                        req.extensions_mut().insert(identity);
                    }
                    inner.call(req).await
                }
                Err(err) => {
                    let status: Status = crate::error::auth_error_to_status(err);
                    Ok(status.to_http())
                }
            }
        })
    }
}
