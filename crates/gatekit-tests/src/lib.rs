// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gatekit Integration Tests
//!
//! End-to-end tests for token issuance, verification and the middleware
//! chain mounted on a real axum router.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Keys, tokens and a fully layered test router
//!   - `assertions`: Response and principal assertion helpers
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p gatekit-tests
//!
//! # Run specific test suite
//! cargo test -p gatekit-tests --test integration_tokens
//! cargo test -p gatekit-tests --test integration_middleware
//! cargo test -p gatekit-tests --test integration_config
//! ```
//!
//! ## Test Categories
//!
//! ### Token Tests (`integration_tokens.rs`)
//! - Issue/verify round trips for both kinds
//! - Tampering, foreign keys and algorithm confusion
//! - Expiry and role ordering
//!
//! ### Middleware Tests (`integration_middleware.rs`)
//! - Header extraction failures
//! - Service-before-user classification
//! - Role, audience and subscription grants
//! - Service-to-service header path
//! - JSON:API problem bodies
//!
//! ### Config Tests (`integration_config.rs`)
//! - TOML and JSON loading
//! - Environment overrides
//! - Validation rules
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use gatekit_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let app = RouterFixtures::app();
//!     let token = TokenFixtures::user_token(Role::Admin);
//!     let response = send(&app, "/admin", Some(&bearer(&token))).await;
//!     response.assert_status(StatusCode::OK);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::{init_test_logging, temp_test_dir};
    pub use axum::http::StatusCode;
    pub use gatekit::Role;
}
