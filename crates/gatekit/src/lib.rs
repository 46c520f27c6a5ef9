// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gatekit
//!
//! Bearer-token authentication and access control for HTTP services.
//!
//! This crate provides signed user and service tokens, a closed role model
//! with a priority order, a typed per-request principal context and tower
//! middleware that authenticates requests and enforces role, audience and
//! subscription grants.
//!
//! ```rust,ignore
//! let config = GatekitConfig::from_file("gatekit.toml")?;
//!
//! let app = Router::new()
//!     .route("/admin", get(admin))
//!     .layer(require_roles!(Role::Admin, Role::Moderator))
//!     .layer(AuthLayer::from_config(&config)?);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod problem;

pub use auth::{
    Authenticator, ContextKey, IssueServiceToken, IssueUserToken, KeyConfig, Principal,
    PrincipalContext, Role, ServiceClaims, ServicePrincipal, ServiceTokens, UserClaims,
    UserPrincipal, UserTokens,
};
pub use config::{ConfigError, GatekitConfig};
pub use error::{AuthError, AuthResult};
pub use extractors::{CurrentPrincipal, CurrentService, CurrentUser};
pub use middleware::{AccessGrantLayer, AuthLayer, ServiceAuthLayer};
pub use problem::{JsonApiRenderer, Problem, ProblemRenderer};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
