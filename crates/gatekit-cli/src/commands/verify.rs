// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `verify` command.
//!
//! Unlike the middleware, this reports why a token failed.

use gatekit::{GatekitConfig, Principal, ServiceClaims, ServicePrincipal, UserClaims, UserPrincipal};
use serde::Serialize;

use crate::cli::{OutputFormat, TokenKind, VerifyArgs};
use crate::error::{CliError, CliResult};

/// Claims and principal of a verified token.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Inspection {
    /// A user token.
    User {
        /// Raw claims.
        claims: UserClaims,
        /// Derived principal.
        principal: UserPrincipal,
    },
    /// A service token.
    Service {
        /// Raw claims.
        claims: ServiceClaims,
        /// Derived principal.
        principal: ServicePrincipal,
    },
}

impl Inspection {
    /// Returns the principal carried by the token.
    pub fn principal(&self) -> Principal {
        match self {
            Inspection::User { principal, .. } => Principal::User(principal.clone()),
            Inspection::Service { principal, .. } => Principal::Service(principal.clone()),
        }
    }
}

fn inspect_user(config: &GatekitConfig, token: &str) -> CliResult<Inspection> {
    let claims = config
        .user_tokens()?
        .verify_detailed(token)
        .map_err(|e| CliError::Verification {
            kind: "user",
            reason: e.to_string(),
        })?;
    let principal = UserPrincipal::try_from(claims.clone()).map_err(|e| CliError::Verification {
        kind: "user",
        reason: e.to_string(),
    })?;
    Ok(Inspection::User { claims, principal })
}

fn inspect_service(config: &GatekitConfig, token: &str) -> CliResult<Inspection> {
    let claims = config
        .service_tokens()?
        .verify_detailed(token)
        .map_err(|e| CliError::Verification {
            kind: "service",
            reason: e.to_string(),
        })?;
    let principal = ServicePrincipal::from(claims.clone());
    Ok(Inspection::Service { claims, principal })
}

/// Verifies `token` with the key selected by `kind`.
///
/// `Auto` tries the service key first, like the middleware.
pub fn inspect(config: &GatekitConfig, token: &str, kind: TokenKind) -> CliResult<Inspection> {
    match kind {
        TokenKind::User => inspect_user(config, token),
        TokenKind::Service => inspect_service(config, token),
        TokenKind::Auto => match inspect_service(config, token) {
            Ok(inspection) => Ok(inspection),
            Err(service_err) => inspect_user(config, token).map_err(|user_err| {
                tracing::debug!(service = %service_err, user = %user_err, "Token rejected by both keys");
                CliError::Verification {
                    kind: "auto",
                    reason: format!("not a service token ({service_err}); not a user token ({user_err})"),
                }
            }),
        },
    }
}

/// Executes the `verify` command.
pub fn verify(config: &GatekitConfig, args: &VerifyArgs) -> CliResult<()> {
    let inspection = inspect(config, args.token.trim(), args.kind)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&inspection)?),
        OutputFormat::Text => match &inspection {
            Inspection::User { claims, principal } => {
                println!("✓ Valid user token");
                println!("  Issuer:       {}", claims.iss);
                println!("  User ID:      {}", principal.user_id);
                println!("  Session ID:   {}", principal.session_id);
                println!("  Role:         {}", principal.role);
                println!("  Verified:     {}", principal.verified);
                match principal.active_subscription() {
                    Some(id) => println!("  Subscription: {}", id),
                    None => println!("  Subscription: none"),
                }
                println!("  Audience:     {}", claims.aud.join(", "));
                print_expiry(claims.expires_at());
            }
            Inspection::Service { claims, principal } => {
                println!("✓ Valid service token");
                println!("  Issuer:       {}", claims.iss);
                println!("  Subject:      {}", principal.subject);
                println!("  Audience:     {}", principal.audience.join(", "));
                print_expiry(claims.expires_at());
            }
        },
    }

    Ok(())
}

fn print_expiry(expires_at: Option<chrono::DateTime<chrono::Utc>>) {
    match expires_at {
        Some(at) => println!("  Expires:      {}", at.to_rfc3339()),
        None => println!("  Expires:      invalid"),
    }
}

// =============================================================================
// Tests
// =============================================================================
