// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Access-grant middleware.
//!
//! Runs after [`AuthLayer`](super::AuthLayer) and decides, from the attached
//! principal alone, whether the request may reach the handler.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{body::Body, http::Request, response::Response};
use tower::{Layer, Service};

use super::auth::reject;
use crate::auth::{ContextKey, Principal, PrincipalContext, Role, UserPrincipal};
use crate::error::{AuthError, AuthResult};
use crate::problem::{default_renderer, ProblemRenderer, SharedRenderer};

// =============================================================================
// Grant
// =============================================================================

/// What a grant requires of the principal.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Grant {
    /// User role must be in the allow-list.
    Roles(Arc<[Role]>),
    /// User role must be at least this privileged.
    MinRole(Role),
    /// Service audience must contain this name.
    Audience(Arc<str>),
    /// User must hold a non-nil subscription.
    Subscription,
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grant::Roles(roles) => {
                let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
                write!(f, "roles [{}]", names.join(", "))
            }
            Grant::MinRole(role) => write!(f, "role >= {role}"),
            Grant::Audience(name) => write!(f, "audience {name}"),
            Grant::Subscription => f.write_str("subscription"),
        }
    }
}

// =============================================================================
// AccessGrantLayer
// =============================================================================

/// Layer for role, audience and subscription access control.
///
/// User-only grants (`roles`, `min_role`, `subscription`) answer a service
/// principal with 401 because it carries no role. Building the grant with
/// [`admit_services`](Self::admit_services) lets service principals through
/// those grants untouched.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/admin", get(handler))
///     .layer(AccessGrantLayer::roles([Role::Admin, Role::Moderator]))
///     .layer(AuthLayer::new(authenticator));
/// ```
#[derive(Clone)]
pub struct AccessGrantLayer {
    grant: Grant,
    admit_services: bool,
    context_key: ContextKey,
    renderer: SharedRenderer,
}

impl AccessGrantLayer {
    fn new(grant: Grant) -> Self {
        Self {
            grant,
            admit_services: false,
            context_key: ContextKey::DEFAULT,
            renderer: default_renderer(),
        }
    }

    /// Admits users whose role is in `roles`.
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self::new(Grant::Roles(roles.into_iter().collect()))
    }

    /// Admits users whose role is at least `minimum`.
    pub fn min_role(minimum: Role) -> Self {
        Self::new(Grant::MinRole(minimum))
    }

    /// Admits services whose token audience contains `service_name`.
    pub fn audience(service_name: impl Into<String>) -> Self {
        Self::new(Grant::Audience(Arc::from(service_name.into())))
    }

    /// Admits users holding an active subscription.
    pub fn subscription() -> Self {
        Self::new(Grant::Subscription)
    }

    /// Lets service principals pass user-only grants.
    pub fn admit_services(mut self) -> Self {
        self.admit_services = true;
        self
    }

    /// Sets the context key the principal is read from.
    pub fn with_context_key(mut self, context_key: ContextKey) -> Self {
        self.context_key = context_key;
        self
    }

    /// Sets the renderer used for failures.
    pub fn with_renderer(mut self, renderer: impl ProblemRenderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Decides whether the principal in `context` satisfies this grant.
    pub fn check(&self, context: Option<&PrincipalContext>) -> AuthResult<()> {
        let context = context
            .ok_or_else(|| AuthError::not_authenticated("Missing Authorization header"))?;
        let principal = context.principal(&self.context_key)?;

        match (&self.grant, principal) {
            (Grant::Audience(name), Principal::Service(service)) => {
                if service.allows(name) {
                    Ok(())
                } else {
                    tracing::warn!(
                        service = %service.subject,
                        required = %name,
                        audience = ?service.audience,
                        "Service not in token audience"
                    );
                    Err(AuthError::forbidden("Service not allowed for this audience"))
                }
            }
            (Grant::Audience(_), Principal::User(_)) => {
                Err(AuthError::not_authenticated("Service not authenticated"))
            }
            (_, Principal::Service(service)) => {
                if self.admit_services {
                    tracing::trace!(service = %service.subject, grant = %self.grant, "Service admitted");
                    Ok(())
                } else {
                    Err(AuthError::not_authenticated("User not authenticated"))
                }
            }
            (grant, Principal::User(user)) => check_user(grant, user),
        }
    }
}

fn check_user(grant: &Grant, user: &UserPrincipal) -> AuthResult<()> {
    let denied = match grant {
        Grant::Roles(allowed) => {
            // Ranking is validated even for plain allow-lists.
            user.role.priority()?;
            (!allowed.contains(&user.role)).then_some("User role not allowed")
        }
        Grant::MinRole(minimum) => {
            (!user.role.at_least(minimum)?).then_some("User role not allowed")
        }
        Grant::Subscription => user
            .active_subscription()
            .is_none()
            .then_some("Not allowed for user subscription"),
        Grant::Audience(_) => Some("User not allowed for this audience"),
    };

    match denied {
        None => Ok(()),
        Some(detail) => {
            tracing::warn!(
                user_id = %user.user_id,
                role = %user.role,
                grant = %grant,
                "Access denied"
            );
            Err(AuthError::forbidden(detail))
        }
    }
}

impl<S> Layer<S> for AccessGrantLayer {
    type Service = AccessGrantMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessGrantMiddleware {
            inner,
            layer: self.clone(),
        }
    }
}

// =============================================================================
// AccessGrantMiddleware
// =============================================================================

/// Middleware for access-grant enforcement.
#[derive(Clone)]
pub struct AccessGrantMiddleware<S> {
    inner: S,
    layer: AccessGrantLayer,
}

impl<S> Service<Request<Body>> for AccessGrantMiddleware<S>
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

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        match self.layer.check(req.extensions().get::<PrincipalContext>()) {
            Ok(()) => Box::pin(inner.call(req)),
            Err(e) => {
                let response = reject(&self.layer.renderer, e);
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

// =============================================================================
// Grant Macro
// =============================================================================

/// Macro for creating access-grant layers.
///
/// ```rust,ignore
/// require_roles!(Role::Admin, Role::Moderator);
/// require_roles!(min: Role::Moderator);
/// ```
#[macro_export]
macro_rules! require_roles {
    (min: $role:expr) => {
        $crate::middleware::AccessGrantLayer::min_role($role)
    };
    ($($role:expr),+ $(,)?) => {
        $crate::middleware::AccessGrantLayer::roles([$($role),+])
    };
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ServicePrincipal;
    use axum::http::StatusCode;
    use std::convert::Infallible;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn mock_service() -> impl Service<
        Request<Body>,
        Response = Response,
        Error = Infallible,
        Future = impl Future<Output = Result<Response, Infallible>> + Send,
    > + Clone
           + Send {
        tower::service_fn(|_req: Request<Body>| async { Ok::<_, Infallible>(Response::new(Body::empty())) })
    }

    fn user(role: Role) -> UserPrincipal {
        UserPrincipal {
            user_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            role,
            verified: true,
            subscription_id: None,
        }
    }

    fn service(audience: &[&str]) -> ServicePrincipal {
        ServicePrincipal {
            subject: "billing".to_string(),
            audience: audience.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn context(principal: impl Into<Principal>) -> PrincipalContext {
        PrincipalContext::new().attach(&ContextKey::DEFAULT, principal)
    }

    async fn status(layer: AccessGrantLayer, principal: Option<Principal>) -> StatusCode {
        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        if let Some(principal) = principal {
            req.extensions_mut().insert(context(principal));
        }
        layer
            .layer(mock_service())
            .oneshot(req)
            .await
            .unwrap()
            .status()
    }

    #[test]
    fn test_roles_allow_list() {
        let grant = AccessGrantLayer::roles([Role::Admin, Role::Moderator]);
        let ctx = context(user(Role::User));
        assert_eq!(
            grant.check(Some(&ctx)),
            Err(AuthError::forbidden("User role not allowed"))
        );

        let grant = AccessGrantLayer::roles([Role::User]);
        assert_eq!(grant.check(Some(&ctx)), Ok(()));
    }

    #[test]
    fn test_min_role() {
        let grant = AccessGrantLayer::min_role(Role::Moderator);
        assert!(grant.check(Some(&context(user(Role::Admin)))).is_ok());
        assert!(grant.check(Some(&context(user(Role::Moderator)))).is_ok());
        assert!(matches!(
            grant.check(Some(&context(user(Role::User)))),
            Err(AuthError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_missing_context_is_unauthenticated() {
        let grant = AccessGrantLayer::roles([Role::User]);
        assert!(matches!(
            grant.check(None),
            Err(AuthError::NotAuthenticated { .. })
        ));
        assert!(matches!(
            grant.check(Some(&PrincipalContext::new())),
            Err(AuthError::NotAuthenticated { .. })
        ));
    }

    #[test]
    fn test_service_on_role_grant() {
        let ctx = context(service(&["inventory"]));

        let grant = AccessGrantLayer::roles([Role::Admin]);
        assert!(matches!(
            grant.check(Some(&ctx)),
            Err(AuthError::NotAuthenticated { .. })
        ));

        let grant = AccessGrantLayer::roles([Role::Admin]).admit_services();
        assert_eq!(grant.check(Some(&ctx)), Ok(()));
    }

    #[test]
    fn test_audience() {
        let ctx = context(service(&["billing"]));
        assert_eq!(AccessGrantLayer::audience("billing").check(Some(&ctx)), Ok(()));
        assert!(matches!(
            AccessGrantLayer::audience("inventory").check(Some(&ctx)),
            Err(AuthError::Forbidden { .. })
        ));

        // Empty audience admits nothing.
        let ctx = context(service(&[]));
        assert!(AccessGrantLayer::audience("billing").check(Some(&ctx)).is_err());

        // Users never satisfy an audience grant.
        let ctx = context(user(Role::SuperUser));
        assert!(matches!(
            AccessGrantLayer::audience("billing").check(Some(&ctx)),
            Err(AuthError::NotAuthenticated { .. })
        ));
    }

    #[test]
    fn test_subscription() {
        let grant = AccessGrantLayer::subscription();
        let mut principal = user(Role::User);
        assert_eq!(
            grant.check(Some(&context(principal.clone()))),
            Err(AuthError::forbidden("Not allowed for user subscription"))
        );

        principal.subscription_id = Some(Uuid::nil());
        assert!(grant.check(Some(&context(principal.clone()))).is_err());

        principal.subscription_id = Some(Uuid::new_v4());
        assert_eq!(grant.check(Some(&context(principal))), Ok(()));
    }

    #[test]
    fn test_context_key_isolation() {
        let other = ContextKey::from_static("other-chain");
        let ctx = context(user(Role::Admin));
        let grant = AccessGrantLayer::roles([Role::Admin]).with_context_key(other);
        assert!(matches!(
            grant.check(Some(&ctx)),
            Err(AuthError::NotAuthenticated { .. })
        ));
    }

    #[test]
    fn test_require_roles_macro() {
        let ctx = context(user(Role::Moderator));
        assert!(require_roles!(Role::Moderator, Role::Admin).check(Some(&ctx)).is_ok());
        assert!(require_roles!(min: Role::Admin).check(Some(&ctx)).is_err());
    }

    #[tokio::test]
    async fn test_middleware_statuses() {
        let gated = || AccessGrantLayer::roles([Role::Admin, Role::Moderator]);

        assert_eq!(
            status(gated(), Some(user(Role::Admin).into())).await,
            StatusCode::OK
        );
        assert_eq!(
            status(gated(), Some(user(Role::User).into())).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(status(gated(), None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(gated(), Some(service(&["billing"]).into())).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(AccessGrantLayer::audience("inventory"), Some(service(&["billing"]).into())).await,
            StatusCode::FORBIDDEN
        );
    }
}
