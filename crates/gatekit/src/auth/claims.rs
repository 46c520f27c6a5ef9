// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token claim schemas for users and services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;
use crate::error::{AuthError, AuthResult};

/// Expiry `ttl_secs` after `now`; a lifetime past the timestamp range is a
/// signing failure.
fn expiry(now: i64, ttl_secs: i64) -> AuthResult<i64> {
    now.checked_add(ttl_secs)
        .ok_or_else(|| AuthError::signing(format!("ttl of {ttl_secs}s overflows the expiry timestamp")))
}

// =============================================================================
// UserClaims
// =============================================================================

/// Claims carried by a user token.
///
/// `role` is kept as the raw wire string; it is checked against the closed
/// role set when the claims are turned into a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    // =========================================================================
    // Standard JWT Claims (RFC 7519)
    // =========================================================================
    /// Issuer.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iss: String,

    /// Subject - the user ID.
    pub sub: String,

    /// Audience.
    #[serde(
        default,
        with = "audience_serde",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub aud: Vec<String>,

    /// Issued at time (Unix timestamp).
    #[serde(default)]
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    // =========================================================================
    // Custom Claims
    // =========================================================================
    /// Session ID.
    pub session_id: Uuid,

    /// Subscription ID, if the user holds one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<Uuid>,

    /// Whether the account is verified.
    #[serde(default)]
    pub verified: bool,

    /// User role.
    pub role: String,
}

impl UserClaims {
    /// Builds claims from an issue request, stamped at the current time.
    pub fn from_request(request: &IssueUserToken) -> AuthResult<Self> {
        let now = Utc::now().timestamp();

        Ok(Self {
            iss: request.issuer.clone(),
            sub: request.user_id.to_string(),
            aud: request.audience.clone(),
            iat: now,
            exp: expiry(now, request.ttl_secs)?,
            session_id: request.session_id,
            subscription_id: request.subscription_id,
            verified: request.verified,
            role: request.role.as_str().to_string(),
        })
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Returns the issued at time as a DateTime.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }
}

// =============================================================================
// ServiceClaims
// =============================================================================

/// Claims carried by a service token.
///
/// Services have no role; the audience list is the authorization surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceClaims {
    /// Issuer - the calling service.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iss: String,

    /// Subject - the acting identity, usually the issuer.
    pub sub: String,

    /// Services allowed to accept this token.
    #[serde(
        default,
        with = "audience_serde",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub aud: Vec<String>,

    /// Issued at time (Unix timestamp).
    #[serde(default)]
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

impl ServiceClaims {
    /// Builds claims from an issue request, stamped at the current time.
    pub fn from_request(request: &IssueServiceToken) -> AuthResult<Self> {
        let now = Utc::now().timestamp();

        Ok(Self {
            iss: request.issuer.clone(),
            sub: request.subject.clone(),
            aud: request.audience.clone(),
            iat: now,
            exp: expiry(now, request.ttl_secs)?,
        })
    }

    /// Returns `true` if `service` is in the audience.
    ///
    /// An empty audience admits nothing.
    pub fn allows(&self, service: &str) -> bool {
        self.aud.iter().any(|aud| aud == service)
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

// =============================================================================
// Issue Requests
// =============================================================================

/// Parameters for issuing a user token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueUserToken {
    /// Issuing service.
    pub issuer: String,
    /// Intended recipient services.
    #[serde(default)]
    pub audience: Vec<String>,
    /// User ID; becomes the subject.
    pub user_id: Uuid,
    /// Session ID.
    pub session_id: Uuid,
    /// User role.
    pub role: Role,
    /// Whether the account is verified.
    #[serde(default)]
    pub verified: bool,
    /// Subscription ID.
    #[serde(default)]
    pub subscription_id: Option<Uuid>,
    /// Lifetime in whole seconds. Zero or negative yields an expired token.
    pub ttl_secs: i64,
}

impl IssueUserToken {
    /// Creates a request with no audience, subscription or verification.
    pub fn new(
        issuer: impl Into<String>,
        user_id: Uuid,
        session_id: Uuid,
        role: Role,
        ttl_secs: i64,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: Vec::new(),
            user_id,
            session_id,
            role,
            verified: false,
            subscription_id: None,
            ttl_secs,
        }
    }

    /// Sets the audience.
    pub fn with_audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = audience.into_iter().map(Into::into).collect();
        self
    }

    /// Marks the account as verified.
    pub fn verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    /// Sets the subscription ID.
    pub fn with_subscription(mut self, subscription_id: Uuid) -> Self {
        self.subscription_id = Some(subscription_id);
        self
    }
}

/// Parameters for issuing a service token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueServiceToken {
    /// Calling service.
    pub issuer: String,
    /// Acting identity, often the same as the issuer.
    pub subject: String,
    /// Services authorised to accept the token.
    #[serde(default)]
    pub audience: Vec<String>,
    /// Lifetime in whole seconds. Zero or negative yields an expired token.
    pub ttl_secs: i64,
}

impl IssueServiceToken {
    /// Creates a request whose subject is the issuer.
    pub fn new(issuer: impl Into<String>, ttl_secs: i64) -> Self {
        let issuer = issuer.into();
        Self {
            subject: issuer.clone(),
            issuer,
            audience: Vec::new(),
            ttl_secs,
        }
    }

    /// Sets a subject distinct from the issuer.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the audience.
    pub fn with_audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = audience.into_iter().map(Into::into).collect();
        self
    }
}

// =============================================================================
// Audience Serialization
// =============================================================================

/// `aud` is written as an array and read as either a string or an array.
mod audience_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    pub fn serialize<S>(audience: &[String], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(audience)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(aud) => vec![aud],
            OneOrMany::Many(aud) => aud,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
