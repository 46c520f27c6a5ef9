// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bearer token authentication middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, Request},
    response::Response,
};
use tower::{Layer, Service};

use crate::auth::{attach_principal, Authenticator, ContextKey};
use crate::config::GatekitConfig;
use crate::error::{AuthError, AuthResult};
use crate::problem::{default_renderer, ProblemRenderer, SharedRenderer};

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer for bearer token authentication.
///
/// Every request must carry `Authorization: Bearer <token>`. The token is
/// tried as a service token first and as a user token second; the resulting
/// principal is attached under the layer's [`ContextKey`]. Any failure
/// renders a 401 problem and the inner service is never called.
///
/// Service principals pass through without any role check. Routes that need
/// roles or audiences stack an [`AccessGrantLayer`](super::AccessGrantLayer)
/// inside this one.
#[derive(Clone)]
pub struct AuthLayer {
    authenticator: Authenticator,
    header: HeaderName,
    context_key: ContextKey,
    renderer: SharedRenderer,
}

impl AuthLayer {
    /// Creates a new auth layer.
    pub fn new(authenticator: Authenticator) -> Self {
        Self {
            authenticator,
            header: header::AUTHORIZATION,
            context_key: ContextKey::DEFAULT,
            renderer: default_renderer(),
        }
    }

    /// Creates an auth layer from configuration.
    pub fn from_config(config: &GatekitConfig) -> AuthResult<Self> {
        let header = parse_header_name(&config.authorization_header)?;

        Ok(Self::new(Authenticator::from_config(config)?)
            .with_header(header)
            .with_context_key(config.context_key.clone()))
    }

    /// Sets the header the token is read from.
    pub fn with_header(mut self, header: HeaderName) -> Self {
        self.header = header;
        self
    }

    /// Sets the context key principals are attached under.
    pub fn with_context_key(mut self, context_key: ContextKey) -> Self {
        self.context_key = context_key;
        self
    }

    /// Sets the renderer used for failures.
    pub fn with_renderer(mut self, renderer: impl ProblemRenderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            authenticator: self.authenticator.clone(),
            header: self.header.clone(),
            context_key: self.context_key.clone(),
            renderer: self.renderer.clone(),
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Middleware for bearer token authentication.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    authenticator: Authenticator,
    header: HeaderName,
    context_key: ContextKey,
    renderer: SharedRenderer,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        let principal = extract_bearer_token(req.headers(), &self.header)
            .and_then(|token| self.authenticator.authenticate(token));

        match principal {
            Ok(principal) => {
                tracing::trace!(
                    kind = principal.kind(),
                    principal = %principal.id(),
                    "Request authenticated"
                );
                attach_principal(&mut req, &self.context_key, principal);
                Box::pin(inner.call(req))
            }
            Err(e) => {
                let response = reject(&self.renderer, e);
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Extracts the bearer token from `header`.
///
/// The value must be exactly `<scheme> <token>` with a case-insensitive
/// `bearer` scheme. No token parsing happens here.
pub fn extract_bearer_token<'a>(headers: &'a HeaderMap, header: &HeaderName) -> AuthResult<&'a str> {
    let value = match headers.get(header) {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AuthError::missing_header(header_display(header))),
    };

    let malformed = || AuthError::malformed_header(header_display(header));
    let value = value.to_str().map_err(|_| malformed())?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err(malformed()),
    }
}

/// Logs a failure and renders it.
pub(crate) fn reject(renderer: &SharedRenderer, err: AuthError) -> Response {
    if err.is_server_error() {
        tracing::error!(error = %err, "Request rejected");
    } else {
        tracing::debug!(error = %err, status = %err.status_code(), "Request rejected");
    }
    renderer.render(err.problem())
}

pub(crate) fn parse_header_name(name: &str) -> AuthResult<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| AuthError::config(format!("invalid header name: {name}")))
}

/// Canonical spelling for well-known headers in client-facing messages.
fn header_display(header: &HeaderName) -> String {
    if *header == header::AUTHORIZATION {
        "Authorization".to_string()
    } else if header.as_str() == "x-service-authorization" {
        "X-Service-Authorization".to_string()
    } else {
        header.as_str().to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use std::convert::Infallible;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::{
        read_principal, IssueServiceToken, IssueUserToken, Principal, Role,
    };

    fn config() -> GatekitConfig {
        GatekitConfig::new(
            "user-secret-key-that-is-long-enough-for-testing",
            "service-secret-key-that-is-long-enough-for-tests",
        )
    }

    /// Echoes the attached principal kind in a header.
    fn echo_service() -> impl Service<
        Request<Body>,
        Response = Response,
        Error = Infallible,
        Future = impl Future<Output = Result<Response, Infallible>> + Send,
    > + Clone
           + Send {
        tower::service_fn(|req: Request<Body>| async move {
            let kind = read_principal(&req, &ContextKey::DEFAULT)
                .map(|p| p.kind())
                .unwrap_or("none");
            let mut response = Response::new(Body::empty());
            response
                .headers_mut()
                .insert("x-principal-kind", HeaderValue::from_static(kind));
            Ok::<_, Infallible>(response)
        })
    }

    async fn send(layer: &AuthLayer, authorization: Option<&str>) -> Response {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let req = builder.body(Body::empty()).unwrap();

        layer.layer(echo_service()).oneshot(req).await.unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        let name = header::AUTHORIZATION;

        // No header
        assert!(matches!(
            extract_bearer_token(&headers, &name),
            Err(AuthError::MissingHeader { .. })
        ));

        // Empty header
        headers.insert(&name, HeaderValue::from_static(""));
        assert!(matches!(
            extract_bearer_token(&headers, &name),
            Err(AuthError::MissingHeader { .. })
        ));

        // Invalid format
        for value in ["Basic abc", "Bearer", "Bearer ", "Bearer a b", "Bearerabc"] {
            headers.insert(&name, HeaderValue::from_static(value));
            assert!(
                matches!(
                    extract_bearer_token(&headers, &name),
                    Err(AuthError::MalformedHeader { .. })
                ),
                "{value:?} should be malformed"
            );
        }

        // Valid bearer token, any scheme case
        for value in ["Bearer mytoken123", "bearer mytoken123", "BEARER mytoken123"] {
            headers.insert(&name, HeaderValue::from_static(value));
            assert_eq!(extract_bearer_token(&headers, &name), Ok("mytoken123"));
        }
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let layer = AuthLayer::from_config(&config()).unwrap();
        let response = send(&layer, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get("x-principal-kind").is_none());
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let layer = AuthLayer::from_config(&config()).unwrap();
        let response = send(&layer, Some("Bearer not.a.token")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_service_token_attaches_service_principal() {
        let config = config();
        let layer = AuthLayer::from_config(&config).unwrap();
        let token = config
            .service_tokens()
            .unwrap()
            .issue(&IssueServiceToken::new("billing", 60))
            .unwrap();

        let response = send(&layer, Some(&format!("Bearer {token}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-principal-kind"], "service");
    }

    #[tokio::test]
    async fn test_user_token_attaches_user_principal() {
        let config = config();
        let layer = AuthLayer::from_config(&config).unwrap();
        let token = config
            .user_tokens()
            .unwrap()
            .issue(&IssueUserToken::new(
                "accounts",
                Uuid::new_v4(),
                Uuid::new_v4(),
                Role::User,
                60,
            ))
            .unwrap();

        let response = send(&layer, Some(&format!("bearer {token}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-principal-kind"], "user");
    }

    #[tokio::test]
    async fn test_custom_context_key() {
        let config = config();
        let key = ContextKey::from_static("custom");
        let layer = AuthLayer::from_config(&config)
            .unwrap()
            .with_context_key(key.clone());
        let token = config
            .service_tokens()
            .unwrap()
            .issue(&IssueServiceToken::new("billing", 60))
            .unwrap();

        let svc = layer.layer(tower::service_fn(move |req: Request<Body>| {
            let key = key.clone();
            async move {
                assert!(read_principal(&req, &ContextKey::DEFAULT).is_err());
                let principal = read_principal(&req, &key).unwrap();
                assert!(matches!(principal, Principal::Service(_)));
                Ok::<_, Infallible>(Response::new(Body::empty()))
            }
        }));

        let req = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = svc.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
