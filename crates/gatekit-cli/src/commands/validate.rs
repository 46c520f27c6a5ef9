// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use gatekit::GatekitConfig;

use super::load_config;
use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{CliError, CliResult};

/// Secrets shorter than this draw a warning.
const MIN_SECRET_LEN: usize = 32;

/// Default TTLs above this draw a warning.
const MAX_RECOMMENDED_TTL_SECS: i64 = 24 * 60 * 60;

/// Collects warnings for a configuration that already passed validation.
pub fn collect_warnings(config: &GatekitConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    for (name, key) in [("user", &config.user), ("service", &config.service)] {
        if key.secret.len() < MIN_SECRET_LEN {
            warnings.push(format!(
                "{name} secret is shorter than {MIN_SECRET_LEN} bytes"
            ));
        }
        if key.issuer.is_empty() {
            warnings.push(format!("{name} issuer is not set"));
        }
        if key.default_ttl_secs > MAX_RECOMMENDED_TTL_SECS {
            warnings.push(format!(
                "{name} default TTL of {}s exceeds 24h",
                key.default_ttl_secs
            ));
        }
    }

    if config.service_name.is_none() {
        warnings.push("service_name is not set; service authentication is unavailable".to_string());
    }

    warnings
}

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: &ValidateArgs) -> CliResult<()> {
    let config = load_config(cli).map_err(|e| e.with_context("Configuration validation failed"))?;
    let warnings = collect_warnings(&config);
    let source = cli
        .config
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "environment".to_string());

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", source);
            println!();
            println!("Summary:");
            println!("  User issuer:      {}", config.user.issuer);
            println!("  User algorithm:   {:?}", config.user.algorithm);
            println!("  Service issuer:   {}", config.service.issuer);
            println!("  Service algorithm: {:?}", config.service.algorithm);
            println!(
                "  Service name:     {}",
                config.service_name.as_deref().unwrap_or("-")
            );
            println!("  Context key:      {}", config.context_key);
            println!("  Headers:          {}, {}", config.authorization_header, config.service_authorization_header);

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }
        }
        OutputFormat::Json => {
            // Secrets are never serialized.
            let output = serde_json::json!({
                "valid": true,
                "source": source,
                "config": config,
                "warnings": warnings,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    // In strict mode, treat warnings as errors
    if args.strict && !warnings.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
