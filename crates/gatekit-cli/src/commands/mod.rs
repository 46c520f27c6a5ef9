// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! - `issue-user` / `issue-service`: Sign tokens
//! - `verify`: Verify and inspect a token
//! - `roles`: List roles
//! - `validate`: Validate configuration
//! - `version`: Show version information

mod issue;
mod roles;
mod validate;
mod verify;
mod version;

pub use issue::{issue_service, issue_user};
pub use roles::roles;
pub use validate::validate;
pub use verify::verify;
pub use version::version;

use chrono::{DateTime, TimeDelta, Utc};
use gatekit::config::DEFAULT_ENV_PREFIX;
use gatekit::GatekitConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliResult;

/// Executes the appropriate command based on CLI arguments.
pub fn execute(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::IssueUser(args) => issue::issue_user(&load_config(cli)?, args),
        Commands::IssueService(args) => issue::issue_service(&load_config(cli)?, args),
        Commands::Verify(args) => verify::verify(&load_config(cli)?, args),
        Commands::Roles(args) => roles::roles(args),
        Commands::Validate(args) => validate::validate(cli, args),
        Commands::Version => version::version(cli),
    }
}

/// Loads configuration from the file given with `-c`, or from the
/// environment alone when no file is given.
pub fn load_config(cli: &Cli) -> CliResult<GatekitConfig> {
    let config = match &cli.config {
        Some(path) => GatekitConfig::from_file(path)?,
        None => {
            tracing::debug!("No config file given, using environment only");
            let mut config = GatekitConfig::default();
            config.apply_env_overrides(DEFAULT_ENV_PREFIX)?;
            config.validate()?;
            config
        }
    };
    Ok(config)
}

/// Rejects lifetimes that would produce an already-expired token.
pub(crate) fn positive_ttl(ttl: Option<i64>, default_ttl: i64) -> CliResult<i64> {
    let ttl = ttl.unwrap_or(default_ttl);
    if ttl <= 0 {
        return Err(crate::error::CliError::invalid_argument(format!(
            "ttl must be positive, got {ttl}"
        )));
    }
    Ok(ttl)
}

/// Wall-clock expiry `ttl` seconds from now.
pub(crate) fn expiry_after(ttl: i64) -> CliResult<DateTime<Utc>> {
    TimeDelta::try_seconds(ttl)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| {
            crate::error::CliError::invalid_argument(format!("ttl of {ttl}s is out of range"))
        })
}

#[cfg(test)]
pub(crate) mod test_support {
    use gatekit::GatekitConfig;

    pub const USER_SECRET: &str = "user-secret-key-that-is-long-enough-for-testing";
    pub const SERVICE_SECRET: &str = "service-secret-key-that-is-long-enough-for-tests";

    pub fn config() -> GatekitConfig {
        let mut config = GatekitConfig::new(USER_SECRET, SERVICE_SECRET);
        config.user.issuer = "accounts".to_string();
        config.service.issuer = "billing".to_string();
        config
    }
}
