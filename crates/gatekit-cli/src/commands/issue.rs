// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `issue-user` and `issue-service` commands.

use chrono::{DateTime, Utc};
use gatekit::{GatekitConfig, IssueServiceToken, IssueUserToken};
use serde::Serialize;
use uuid::Uuid;

use super::{expiry_after, positive_ttl};
use crate::cli::{IssueServiceArgs, IssueUserArgs, OutputFormat};
use crate::error::CliResult;

/// Issued token plus the metadata operators usually want next to it.
#[derive(Debug, Serialize)]
pub struct IssuedToken {
    /// Token kind.
    pub kind: &'static str,
    /// Subject the token was issued for.
    pub subject: String,
    /// Expiry time.
    pub expires_at: DateTime<Utc>,
    /// The signed token.
    pub token: String,
}

/// Builds and signs a user token.
pub fn build_user_token(config: &GatekitConfig, args: &IssueUserArgs) -> CliResult<IssuedToken> {
    let codec = config.user_tokens()?;
    let ttl = positive_ttl(args.ttl, codec.default_ttl_secs())?;
    let expires_at = expiry_after(ttl)?;
    let issuer = args.issuer.as_deref().unwrap_or(codec.issuer());
    let user_id = args.user_id.unwrap_or_else(Uuid::new_v4);
    let session_id = args.session_id.unwrap_or_else(Uuid::new_v4);

    let mut request = IssueUserToken::new(issuer, user_id, session_id, args.role, ttl)
        .with_audience(args.audience.iter().cloned())
        .verified(args.verified);
    if let Some(subscription_id) = args.subscription {
        request = request.with_subscription(subscription_id);
    }

    let token = codec.issue(&request)?;
    tracing::info!(user_id = %user_id, role = %args.role, ttl, "Issued user token");

    Ok(IssuedToken {
        kind: "user",
        subject: user_id.to_string(),
        expires_at,
        token,
    })
}

/// Builds and signs a service token.
pub fn build_service_token(
    config: &GatekitConfig,
    args: &IssueServiceArgs,
) -> CliResult<IssuedToken> {
    let codec = config.service_tokens()?;
    let ttl = positive_ttl(args.ttl, codec.default_ttl_secs())?;
    let expires_at = expiry_after(ttl)?;
    let issuer = args.issuer.as_deref().unwrap_or(codec.issuer());

    let mut request =
        IssueServiceToken::new(issuer, ttl).with_audience(args.audience.iter().cloned());
    if let Some(subject) = &args.subject {
        request = request.with_subject(subject.clone());
    }
    if request.audience.is_empty() {
        tracing::warn!("Service token has an empty audience and will pass no audience check");
    }

    let token = codec.issue(&request)?;
    tracing::info!(subject = %request.subject, audience = ?request.audience, ttl, "Issued service token");

    Ok(IssuedToken {
        kind: "service",
        subject: request.subject,
        expires_at,
        token,
    })
}

/// Executes the `issue-user` command.
pub fn issue_user(config: &GatekitConfig, args: &IssueUserArgs) -> CliResult<()> {
    print_issued(&build_user_token(config, args)?, args.format)
}

/// Executes the `issue-service` command.
pub fn issue_service(config: &GatekitConfig, args: &IssueServiceArgs) -> CliResult<()> {
    print_issued(&build_service_token(config, args)?, args.format)
}

fn print_issued(issued: &IssuedToken, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Text => println!("{}", issued.token),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(issued)?),
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
