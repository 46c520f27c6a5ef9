// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-request principal context.
//!
//! After verification the middleware attaches exactly one [`Principal`] to
//! the request under a [`ContextKey`]. Downstream layers and handlers read it
//! back through typed accessors that fail closed with
//! [`AuthError::NotAuthenticated`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Role, ServiceClaims, UserClaims};
use crate::error::{AuthError, AuthResult};

// =============================================================================
// ContextKey
// =============================================================================

/// Identifies the slot a middleware chain stores its principal in.
///
/// Independent chains on the same request use different keys and never
/// see each other's principals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextKey(Cow<'static, str>);

impl ContextKey {
    /// Key used when none is configured.
    pub const DEFAULT: ContextKey = ContextKey(Cow::Borrowed("gatekit.principal"));

    /// Creates a key from a static name.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates a key from an owned name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Returns the key name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ContextKey {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Principals
// =============================================================================

/// A verified human user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPrincipal {
    /// User ID.
    pub user_id: Uuid,
    /// Session ID.
    pub session_id: Uuid,
    /// User role.
    pub role: Role,
    /// Whether the account is verified.
    pub verified: bool,
    /// Subscription ID, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<Uuid>,
}

impl UserPrincipal {
    /// Returns the subscription ID if the user holds a real one.
    ///
    /// A nil UUID counts as no subscription.
    pub fn active_subscription(&self) -> Option<Uuid> {
        self.subscription_id.filter(|id| !id.is_nil())
    }
}

impl TryFrom<UserClaims> for UserPrincipal {
    type Error = AuthError;

    fn try_from(claims: UserClaims) -> AuthResult<Self> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::not_authenticated("User ID is not valid"))?;
        let role = Role::parse(&claims.role)?;

        Ok(Self {
            user_id,
            session_id: claims.session_id,
            role,
            verified: claims.verified,
            subscription_id: claims.subscription_id,
        })
    }
}

/// A verified backend service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePrincipal {
    /// Acting service identity.
    pub subject: String,
    /// Services the token is valid for.
    pub audience: Vec<String>,
}

impl ServicePrincipal {
    /// Returns `true` if `service` is in the audience.
    pub fn allows(&self, service: &str) -> bool {
        self.audience.iter().any(|aud| aud == service)
    }
}

impl From<ServiceClaims> for ServicePrincipal {
    fn from(claims: ServiceClaims) -> Self {
        Self {
            subject: claims.sub,
            audience: claims.aud,
        }
    }
}

/// The authenticated identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Principal {
    /// A human user.
    User(UserPrincipal),
    /// A backend service.
    Service(ServicePrincipal),
}

impl Principal {
    /// Returns the principal kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            Principal::User(_) => "user",
            Principal::Service(_) => "service",
        }
    }

    /// Returns an identifier suitable for logs.
    pub fn id(&self) -> String {
        match self {
            Principal::User(user) => user.user_id.to_string(),
            Principal::Service(service) => service.subject.clone(),
        }
    }
}

impl From<UserPrincipal> for Principal {
    fn from(user: UserPrincipal) -> Self {
        Principal::User(user)
    }
}

impl From<ServicePrincipal> for Principal {
    fn from(service: ServicePrincipal) -> Self {
        Principal::Service(service)
    }
}

// =============================================================================
// PrincipalContext
// =============================================================================

/// Immutable map from context key to principal.
///
/// Stored in the request extensions. Attaching produces a new context and
/// leaves the original untouched.
#[derive(Debug, Clone, Default)]
pub struct PrincipalContext {
    principals: Arc<HashMap<ContextKey, Principal>>,
}

impl PrincipalContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a derived context with `principal` stored under `key`.
    ///
    /// A principal already stored under the same key is shadowed.
    pub fn attach(&self, key: &ContextKey, principal: impl Into<Principal>) -> Self {
        let mut principals = (*self.principals).clone();
        principals.insert(key.clone(), principal.into());
        Self {
            principals: Arc::new(principals),
        }
    }

    /// Returns the principal stored under `key`, of either kind.
    pub fn principal(&self, key: &ContextKey) -> AuthResult<&Principal> {
        self.principals
            .get(key)
            .ok_or_else(|| AuthError::not_authenticated("Missing Authorization header"))
    }

    /// Returns the user principal stored under `key`.
    pub fn user(&self, key: &ContextKey) -> AuthResult<&UserPrincipal> {
        match self.principals.get(key) {
            Some(Principal::User(user)) => Ok(user),
            _ => Err(AuthError::not_authenticated("User not authenticated")),
        }
    }

    /// Returns the service principal stored under `key`.
    pub fn service(&self, key: &ContextKey) -> AuthResult<&ServicePrincipal> {
        match self.principals.get(key) {
            Some(Principal::Service(service)) => Ok(service),
            _ => Err(AuthError::not_authenticated("Service not authenticated")),
        }
    }

    /// Returns `true` if nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Attaches `principal` under `key` to the request's context.
pub fn attach_principal<B>(req: &mut Request<B>, key: &ContextKey, principal: impl Into<Principal>) {
    let context = req
        .extensions()
        .get::<PrincipalContext>()
        .cloned()
        .unwrap_or_default()
        .attach(key, principal);
    req.extensions_mut().insert(context);
}

/// Reads the user principal stored under `key`.
pub fn read_user<B>(req: &Request<B>, key: &ContextKey) -> AuthResult<UserPrincipal> {
    context_of(req)?.user(key).cloned()
}

/// Reads the service principal stored under `key`.
pub fn read_service<B>(req: &Request<B>, key: &ContextKey) -> AuthResult<ServicePrincipal> {
    context_of(req)?.service(key).cloned()
}

/// Reads the principal stored under `key`, of either kind.
pub fn read_principal<B>(req: &Request<B>, key: &ContextKey) -> AuthResult<Principal> {
    context_of(req)?.principal(key).cloned()
}

fn context_of<B>(req: &Request<B>) -> AuthResult<&PrincipalContext> {
    req.extensions()
        .get::<PrincipalContext>()
        .ok_or_else(|| AuthError::not_authenticated("Missing Authorization header"))
}

// =============================================================================
// Tests
// =============================================================================
