// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `issue-user`: Sign a user token
//! - `issue-service`: Sign a service token
//! - `verify`: Verify and inspect a token
//! - `roles`: List the role set and priorities
//! - `validate`: Validate configuration
//! - `version`: Show version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gatekit::Role;
use uuid::Uuid;

// =============================================================================
// Main CLI Structure
// =============================================================================

/// gatekit - bearer token authentication toolkit
///
/// Issues and inspects user and service tokens using the keys from the
/// configuration file or `GATEKIT_*` environment variables.
#[derive(Parser, Debug)]
#[command(
    name = "gatekit",
    author = "Sylvex <contact@sylvex.io>",
    version = gatekit::VERSION,
    about = "Bearer token authentication toolkit",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path (TOML or JSON)
    ///
    /// Without a file, configuration comes from the environment only.
    #[arg(short, long, env = "GATEKIT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "warn",
        env = "GATEKIT_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json, compact)
    #[arg(long, default_value = "text", env = "GATEKIT_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Enable quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands for the gatekit CLI.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Issue a user token
    ///
    /// Signs a token with the user key. User and session IDs are generated
    /// when not given.
    #[command(name = "issue-user")]
    IssueUser(IssueUserArgs),

    /// Issue a service token
    ///
    /// Signs a token with the service key. The audience lists the services
    /// that will accept it.
    #[command(name = "issue-service")]
    IssueService(IssueServiceArgs),

    /// Verify a token and print its claims
    ///
    /// Reports the exact verification failure, which the HTTP middleware
    /// never does.
    Verify(VerifyArgs),

    /// List roles and their priorities
    Roles(RolesArgs),

    /// Validate the configuration
    Validate(ValidateArgs),

    /// Show version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `issue-user` command.
#[derive(Args, Debug, Clone)]
pub struct IssueUserArgs {
    /// User ID (generated when omitted)
    #[arg(long)]
    pub user_id: Option<Uuid>,

    /// Session ID (generated when omitted)
    #[arg(long)]
    pub session_id: Option<Uuid>,

    /// User role
    #[arg(short, long, default_value = "user")]
    pub role: Role,

    /// Mark the account as verified
    #[arg(long)]
    pub verified: bool,

    /// Subscription ID
    #[arg(long)]
    pub subscription: Option<Uuid>,

    /// Audience service name (repeatable)
    #[arg(short, long = "audience")]
    pub audience: Vec<String>,

    /// Issuer (defaults to the configured user issuer)
    #[arg(long)]
    pub issuer: Option<String>,

    /// Lifetime in seconds (defaults to the configured TTL)
    #[arg(short, long)]
    pub ttl: Option<i64>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the `issue-service` command.
#[derive(Args, Debug, Clone)]
pub struct IssueServiceArgs {
    /// Acting identity (defaults to the issuer)
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Audience service name (repeatable)
    #[arg(short, long = "audience")]
    pub audience: Vec<String>,

    /// Issuer (defaults to the configured service issuer)
    #[arg(long)]
    pub issuer: Option<String>,

    /// Lifetime in seconds (defaults to the configured TTL)
    #[arg(short, long)]
    pub ttl: Option<i64>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the `verify` command.
#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Token to verify
    pub token: String,

    /// Which key to verify with
    #[arg(short, long, default_value = "auto")]
    pub kind: TokenKind,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the `roles` command.
#[derive(Args, Debug, Clone, Default)]
pub struct RolesArgs {
    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Strict mode: treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

/// Token kind selection for `verify`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TokenKind {
    /// Service key first, then user key
    #[default]
    Auto,
    /// User key only
    User,
    /// Service key only
    Service,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective log level based on flags.
    pub fn effective_log_level(&self) -> &str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
