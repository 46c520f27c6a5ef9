// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bearer token classification.

use std::sync::Arc;

use super::{Principal, ServicePrincipal, ServiceTokens, UserPrincipal, UserTokens};
use crate::config::GatekitConfig;
use crate::error::{AuthError, AuthResult};

/// Classifies a bearer token as a service or user principal.
///
/// Service verification is attempted first, then user verification. The two
/// kinds are signed with different keys, so at most one attempt can succeed.
#[derive(Debug, Clone)]
pub struct Authenticator {
    service_tokens: Arc<ServiceTokens>,
    user_tokens: Arc<UserTokens>,
}

impl Authenticator {
    /// Creates an authenticator from the two codecs.
    pub fn new(service_tokens: Arc<ServiceTokens>, user_tokens: Arc<UserTokens>) -> Self {
        Self {
            service_tokens,
            user_tokens,
        }
    }

    /// Creates an authenticator from configuration.
    ///
    /// Fails when the configuration does not validate, in particular when
    /// both principal kinds share a secret.
    pub fn from_config(config: &GatekitConfig) -> AuthResult<Self> {
        config.validate()?;

        Ok(Self::new(
            Arc::new(config.service_tokens()?),
            Arc::new(config.user_tokens()?),
        ))
    }

    /// Verifies `token` and returns the principal it represents.
    pub fn authenticate(&self, token: &str) -> AuthResult<Principal> {
        if let Ok(claims) = self.service_tokens.verify(token) {
            return Ok(Principal::Service(ServicePrincipal::from(claims)));
        }

        match self.user_tokens.verify(token) {
            Ok(claims) => Ok(Principal::User(UserPrincipal::try_from(claims)?)),
            Err(_) => Err(AuthError::InvalidToken),
        }
    }

    /// Returns the service token codec.
    pub fn service_tokens(&self) -> &ServiceTokens {
        &self.service_tokens
    }

    /// Returns the user token codec.
    pub fn user_tokens(&self) -> &UserTokens {
        &self.user_tokens
    }
}

// =============================================================================
// Tests
// =============================================================================
