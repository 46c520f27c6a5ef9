// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gatekit-cli
//!
//! Operator CLI for gatekit tokens.
//!
//! This crate provides the `gatekit` binary, including:
//!
//! - CLI argument parsing with clap
//! - Configuration loading (file plus `GATEKIT_*` environment)
//! - Logging initialization
//! - Command implementations (issue, verify, roles, validate, version)
//!
//! ## Usage
//!
//! ```bash
//! # Issue an admin token for a user
//! gatekit -c gatekit.toml issue-user --role admin --audience billing
//!
//! # Issue a service token for billing -> inventory calls
//! gatekit issue-service --subject billing --audience inventory
//!
//! # Inspect a token, trying the service key first
//! gatekit verify <TOKEN>
//!
//! # Validate configuration
//! gatekit -c gatekit.toml validate --strict
//! ```
//!
//! Secrets are read from the configuration file or the environment, never
//! from command arguments.

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{CliError, CliResult};
pub use logging::init_logging;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
