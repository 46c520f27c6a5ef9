// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Service-to-service authentication middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{HeaderName, Request},
    response::Response,
};
use tower::{Layer, Service};

use super::auth::{extract_bearer_token, parse_header_name, reject};
use crate::auth::{attach_principal, ContextKey, ServicePrincipal, ServiceTokens};
use crate::config::{GatekitConfig, SERVICE_AUTHORIZATION_HEADER};
use crate::error::{AuthError, AuthResult};
use crate::problem::{default_renderer, ProblemRenderer, SharedRenderer};

// =============================================================================
// ServiceAuthLayer
// =============================================================================

/// Layer for pure service-to-service authentication.
///
/// Reads `X-Service-Authorization: Bearer <token>`, verifies it with the
/// service key only and requires this service's own name in the token
/// audience. User tokens never pass.
#[derive(Clone)]
pub struct ServiceAuthLayer {
    tokens: Arc<ServiceTokens>,
    service_name: Arc<str>,
    header: HeaderName,
    context_key: ContextKey,
    renderer: SharedRenderer,
}

impl ServiceAuthLayer {
    /// Creates a layer for the service named `service_name`.
    pub fn new(tokens: ServiceTokens, service_name: impl Into<String>) -> Self {
        Self {
            tokens: Arc::new(tokens),
            service_name: Arc::from(service_name.into()),
            header: HeaderName::from_static("x-service-authorization"),
            context_key: ContextKey::DEFAULT,
            renderer: default_renderer(),
        }
    }

    /// Creates a layer from configuration.
    ///
    /// Fails when `service_name` is not configured.
    pub fn from_config(config: &GatekitConfig) -> AuthResult<Self> {
        let service_name = config
            .service_name
            .clone()
            .ok_or_else(|| AuthError::config("service_name is required for service authentication"))?;
        let header = parse_header_name(&config.service_authorization_header)?;

        Ok(Self::new(config.service_tokens()?, service_name)
            .with_header(header)
            .with_context_key(config.context_key.clone()))
    }

    /// Sets the header the token is read from.
    pub fn with_header(mut self, header: HeaderName) -> Self {
        self.header = header;
        self
    }

    /// Sets the context key the principal is attached under.
    pub fn with_context_key(mut self, context_key: ContextKey) -> Self {
        self.context_key = context_key;
        self
    }

    /// Sets the renderer used for failures.
    pub fn with_renderer(mut self, renderer: impl ProblemRenderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Returns the service name required in the audience.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn authenticate(&self, req: &Request<Body>) -> AuthResult<ServicePrincipal> {
        let token = extract_bearer_token(req.headers(), &self.header)?;
        let principal = ServicePrincipal::from(self.tokens.verify(token)?);

        if !principal.allows(&self.service_name) {
            tracing::warn!(
                service = %principal.subject,
                required = %self.service_name,
                audience = ?principal.audience,
                "Service not in token audience"
            );
            return Err(AuthError::forbidden("Service not allowed for this audience"));
        }
        Ok(principal)
    }
}

impl<S> Layer<S> for ServiceAuthLayer {
    type Service = ServiceAuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ServiceAuthMiddleware {
            inner,
            layer: self.clone(),
        }
    }
}

// =============================================================================
// ServiceAuthMiddleware
// =============================================================================

/// Middleware for service-to-service authentication.
#[derive(Clone)]
pub struct ServiceAuthMiddleware<S> {
    inner: S,
    layer: ServiceAuthLayer,
}

impl<S> Service<Request<Body>> for ServiceAuthMiddleware<S>
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

        match self.layer.authenticate(&req) {
            Ok(principal) => {
                tracing::trace!(service = %principal.subject, "Service authenticated");
                attach_principal(&mut req, &self.layer.context_key, principal);
                Box::pin(inner.call(req))
            }
            Err(e) => {
                let response = reject(&self.layer.renderer, e);
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
