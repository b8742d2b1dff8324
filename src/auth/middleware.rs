//! Authentication middleware for the HTTP surface.
//!
//! Resolves the caller identity exactly once per request and stores it in
//! request extensions for handlers to pick up. Requests carrying invalid
//! credentials are rejected here with 401; requests with no credentials
//! pass through as anonymous and are rejected per-operation by the
//! access-control layer.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{HeaderMap, Request, Response, StatusCode};
use futures::future::BoxFuture;
use http_body::Body as HttpBody;
use tower::{Layer, Service};

use super::{Authenticator, CallerIdentity};

/// Auth middleware layer.
#[derive(Clone)]
pub struct AuthLayer {
    authenticator: Arc<Authenticator>,
}

impl AuthLayer {
    /// Create a new auth layer.
    pub fn new(authenticator: Authenticator) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            authenticator: self.authenticator.clone(),
        }
    }
}

/// Auth middleware service.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    authenticator: Arc<Authenticator>,
}

impl<S> AuthMiddleware<S> {
    /// Resolve the caller identity from request headers.
    ///
    /// `Err` means credentials were present but invalid.
    fn resolve_identity(&self, headers: &HeaderMap) -> Result<CallerIdentity, ()> {
        let auth_header = headers.get("authorization").and_then(|v| v.to_str().ok());
        let api_key_header = headers.get("x-api-key").and_then(|v| v.to_str().ok());

        self.authenticator
            .authenticate(auth_header, api_key_header)
            .map_err(|_| ())
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AuthMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: HttpBody + Default + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let identity = match self.resolve_identity(req.headers()) {
            Ok(identity) => identity,
            Err(()) => {
                return Box::pin(async move {
                    let response = Response::builder()
                        .status(StatusCode::UNAUTHORIZED)
                        .header("WWW-Authenticate", "Bearer")
                        .body(ResBody::default())
                        .unwrap();
                    Ok(response)
                });
            }
        };

        req.extensions_mut().insert(identity);

        let inner = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, inner);

        Box::pin(async move { inner.call(req).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, JwtConfig};

    fn test_authenticator() -> Authenticator {
        Authenticator::new(AuthConfig {
            enabled: true,
            api_keys: vec!["test-key".to_string()],
            jwt: JwtConfig::default(),
            operators: std::collections::HashMap::new(),
            admin_users: vec![],
        })
    }

    #[test]
    fn test_auth_layer_creation() {
        let auth = test_authenticator();
        let _layer = AuthLayer::new(auth);
    }
}
