// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT issuance and verification.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{IssueServiceToken, IssueUserToken, ServiceClaims, UserClaims};
use crate::error::{AuthError, AuthResult};

// =============================================================================
// KeyConfig
// =============================================================================

/// Key and validation settings for one principal kind.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Shared secret for signing and verifying tokens.
    #[serde(skip_serializing)]
    pub secret: String,
    /// HMAC algorithm used for signing.
    #[serde(with = "algorithm_serde")]
    pub algorithm: Algorithm,
    /// Issuer written into tokens this process issues.
    pub issuer: String,
    /// Issuers accepted on verification. Empty accepts any issuer.
    pub expected_issuers: Vec<String>,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
    /// Token lifetime used when the caller does not pick one.
    pub default_ttl_secs: i64,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set by user
            algorithm: Algorithm::HS256,
            issuer: String::new(),
            expected_issuers: Vec::new(),
            leeway_secs: 0,
            default_ttl_secs: 3600, // 1 hour
        }
    }
}

impl KeyConfig {
    /// Creates a new configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Restricts accepted issuers.
    pub fn with_expected_issuers<I, S>(mut self, issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_issuers = issuers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the clock skew tolerance.
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Sets the signing algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> AuthResult<()> {
        if self.secret.is_empty() {
            return Err(AuthError::config("token secret is not configured"));
        }
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::config(format!(
                "algorithm {:?} is not a symmetric HMAC algorithm",
                self.algorithm
            )));
        }
        if self.secret.len() < 32 {
            tracing::warn!("Token secret is shorter than recommended (32 bytes)");
        }
        Ok(())
    }
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("expected_issuers", &self.expected_issuers)
            .field("leeway_secs", &self.leeway_secs)
            .field("default_ttl_secs", &self.default_ttl_secs)
            .finish()
    }
}

// =============================================================================
// ClaimSet
// =============================================================================

/// A claim schema that can be issued and verified by a [`TokenCodec`].
pub trait ClaimSet: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Parameters needed to issue a token.
    type Request;

    /// Principal kind name, for logs.
    const KIND: &'static str;

    /// Builds claims from an issue request at the current time.
    fn from_request(request: &Self::Request) -> AuthResult<Self>;

    /// Expiration time (Unix timestamp).
    fn expiration(&self) -> i64;
}

impl ClaimSet for UserClaims {
    type Request = IssueUserToken;
    const KIND: &'static str = "user";

    fn from_request(request: &IssueUserToken) -> AuthResult<Self> {
        UserClaims::from_request(request)
    }

    fn expiration(&self) -> i64 {
        self.exp
    }
}

impl ClaimSet for ServiceClaims {
    type Request = IssueServiceToken;
    const KIND: &'static str = "service";

    fn from_request(request: &IssueServiceToken) -> AuthResult<Self> {
        ServiceClaims::from_request(request)
    }

    fn expiration(&self) -> i64 {
        self.exp
    }
}

// =============================================================================
// TokenCodec
// =============================================================================

/// Issues and verifies tokens of one claim schema under one symmetric key.
///
/// Cheap to clone; keys and validation settings are shared.
pub struct TokenCodec<C> {
    algorithm: Algorithm,
    issuer: Arc<str>,
    default_ttl_secs: i64,
    leeway_secs: i64,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    _claims: PhantomData<fn() -> C>,
}

/// Codec for user tokens.
pub type UserTokens = TokenCodec<UserClaims>;

/// Codec for service tokens.
pub type ServiceTokens = TokenCodec<ServiceClaims>;

impl<C: ClaimSet> TokenCodec<C> {
    /// Creates a codec from the given key configuration.
    pub fn new(config: &KeyConfig) -> AuthResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        // Only the configured algorithm is accepted; "none" never parses.
        let mut validation = Validation::new(config.algorithm);
        validation.leeway = config.leeway_secs;
        validation.validate_exp = true;
        // Audience membership is a policy decision made by the grant layers.
        validation.validate_aud = false;
        if config.expected_issuers.is_empty() {
            validation.set_required_spec_claims(&["exp", "sub"]);
        } else {
            // A missing `iss` would skip the issuer check entirely.
            validation.set_required_spec_claims(&["exp", "sub", "iss"]);
            validation.set_issuer(&config.expected_issuers);
        }

        Ok(Self {
            algorithm: config.algorithm,
            issuer: Arc::from(config.issuer.as_str()),
            default_ttl_secs: config.default_ttl_secs,
            leeway_secs: i64::try_from(config.leeway_secs).unwrap_or(i64::MAX),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
            _claims: PhantomData,
        })
    }

    /// Signs a token for the given request.
    pub fn issue(&self, request: &C::Request) -> AuthResult<String> {
        let claims = C::from_request(request).inspect_err(|e| {
            tracing::error!(kind = C::KIND, error = %e, "Failed to build claims");
        })?;
        self.sign(&claims)
    }

    /// Signs already-built claims.
    pub fn sign(&self, claims: &C) -> AuthResult<String> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key).map_err(|e| {
            tracing::error!(kind = C::KIND, error = %e, "Failed to sign token");
            AuthError::signing(e.to_string())
        })
    }

    /// Verifies a token and returns its claims.
    ///
    /// Malformed, forged, wrongly-signed and expired tokens all yield
    /// [`AuthError::InvalidToken`].
    pub fn verify(&self, token: &str) -> AuthResult<C> {
        self.verify_detailed(token).map_err(|e| {
            tracing::debug!(kind = C::KIND, reason = ?e.kind(), "Token rejected");
            AuthError::InvalidToken
        })
    }

    /// Verifies a token, keeping the underlying failure reason.
    pub fn verify_detailed(&self, token: &str) -> Result<C, jsonwebtoken::errors::Error> {
        let claims = decode::<C>(token, &self.decoding_key, &self.validation)?.claims;

        // A token is only valid strictly before `exp`.
        if claims.expiration() <= Utc::now().timestamp() - self.leeway_secs {
            return Err(ErrorKind::ExpiredSignature.into());
        }

        Ok(claims)
    }

    /// Returns the issuer written into issued tokens.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the default token lifetime in seconds.
    pub fn default_ttl_secs(&self) -> i64 {
        self.default_ttl_secs
    }

    /// Returns the signing algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

impl<C> Clone for TokenCodec<C> {
    fn clone(&self) -> Self {
        Self {
            algorithm: self.algorithm,
            issuer: self.issuer.clone(),
            default_ttl_secs: self.default_ttl_secs,
            leeway_secs: self.leeway_secs,
            encoding_key: self.encoding_key.clone(),
            decoding_key: self.decoding_key.clone(),
            validation: self.validation.clone(),
            _claims: PhantomData,
        }
    }
}

impl<C: ClaimSet> fmt::Debug for TokenCodec<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("kind", &C::KIND)
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

// =============================================================================
// Algorithm Serialization
// =============================================================================

mod algorithm_serde {
    use jsonwebtoken::Algorithm;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(algorithm: &Algorithm, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = match algorithm {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
            other => {
                return Err(serde::ser::Error::custom(format!(
                    "unsupported algorithm: {other:?}"
                )))
            }
        };
        s.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Algorithm, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            _ => Err(serde::de::Error::custom(format!(
                "unsupported algorithm: {s} (expected HS256, HS384 or HS512)"
            ))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
