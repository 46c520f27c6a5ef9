// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Tower middleware for authentication and access control.
//!
//! Layers compose in this order (outermost first):
//!
//! - [`AuthLayer`]: bearer token authentication, service key then user key
//! - [`ServiceAuthLayer`]: service-only authentication on its own header
//! - [`AccessGrantLayer`]: role, audience and subscription checks
//!
//! Every layer renders a problem response and stops the chain on failure.

mod auth;
mod grant;
mod service;

pub use auth::{extract_bearer_token, AuthLayer, AuthMiddleware};
pub use grant::{AccessGrantLayer, AccessGrantMiddleware};
pub use service::{ServiceAuthLayer, ServiceAuthMiddleware};
