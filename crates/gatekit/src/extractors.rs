// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Principal extractors for axum handlers.
//!
//! All extractors read the default [`ContextKey`]. Handlers behind a chain
//! with a custom key use [`read_user`](crate::auth::read_user) and friends.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{ContextKey, Principal, PrincipalContext, ServicePrincipal, UserPrincipal};
use crate::error::AuthError;

fn context(parts: &Parts) -> Result<&PrincipalContext, AuthError> {
    parts
        .extensions
        .get::<PrincipalContext>()
        .ok_or_else(|| AuthError::not_authenticated("Missing Authorization header"))
}

// =============================================================================
// CurrentUser
// =============================================================================

/// Extractor for the authenticated user.
///
/// Returns 401 if no user principal is attached.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}", user.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserPrincipal);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context(parts)?
            .user(&ContextKey::DEFAULT)
            .cloned()
            .map(CurrentUser)
    }
}

// =============================================================================
// CurrentService
// =============================================================================

/// Extractor for the authenticated calling service.
#[derive(Debug, Clone)]
pub struct CurrentService(pub ServicePrincipal);

impl<S> FromRequestParts<S> for CurrentService
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context(parts)?
            .service(&ContextKey::DEFAULT)
            .cloned()
            .map(CurrentService)
    }
}

// =============================================================================
// CurrentPrincipal
// =============================================================================

/// Extractor for whichever principal is attached.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context(parts)?
            .principal(&ContextKey::DEFAULT)
            .cloned()
            .map(CurrentPrincipal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{attach_principal, Role};
    use axum::{body::Body, http::Request};
    use uuid::Uuid;

    fn parts_with(principal: Option<Principal>) -> Parts {
        let mut req = Request::builder().uri("/").body(Body::empty()).unwrap();
        if let Some(principal) = principal {
            attach_principal(&mut req, &ContextKey::DEFAULT, principal);
        }
        req.into_parts().0
    }

    fn user() -> UserPrincipal {
        UserPrincipal {
            user_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            role: Role::Moderator,
            verified: false,
            subscription_id: None,
        }
    }

    #[tokio::test]
    async fn test_current_user() {
        let principal = user();
        let mut parts = parts_with(Some(principal.clone().into()));

        let CurrentUser(extracted) = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(extracted, principal);

        let rejected = CurrentService::from_request_parts(&mut parts, &()).await;
        assert!(matches!(rejected, Err(AuthError::NotAuthenticated { .. })));
    }

    #[tokio::test]
    async fn test_unauthenticated_rejection() {
        let mut parts = parts_with(None);
        let err = CurrentPrincipal::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
