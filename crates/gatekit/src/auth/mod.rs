// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and authorization primitives.
//!
//! This module provides:
//! - The closed role set and its priority order
//! - User and service claim schemas
//! - Token issuance and verification
//! - Service-then-user token classification
//! - The per-request principal context

mod authenticator;
mod claims;
mod context;
mod jwt;
mod role;

pub use authenticator::Authenticator;
pub use claims::{IssueServiceToken, IssueUserToken, ServiceClaims, UserClaims};
pub use context::{
    attach_principal, read_principal, read_service, read_user, ContextKey, Principal,
    PrincipalContext, ServicePrincipal, UserPrincipal,
};
pub use jwt::{ClaimSet, KeyConfig, ServiceTokens, TokenCodec, UserTokens};
pub use role::{compare_roles, Role, RoleError};
