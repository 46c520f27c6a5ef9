// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Gatekit configuration.
//!
//! Configuration is loaded from TOML or JSON and may be overridden from the
//! environment:
//!
//! ```text
//! GATEKIT_USER_SECRET=...
//! GATEKIT_SERVICE_SECRET=...
//! GATEKIT_SERVICE_NAME=billing
//! GATEKIT_USER_ISSUER=accounts
//! GATEKIT_SERVICE_ISSUER=billing
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{ContextKey, KeyConfig, ServiceTokens, UserTokens};
use crate::error::{AuthError, AuthResult};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "GATEKIT";

/// Header carrying user or service bearer tokens.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Header reserved for service-to-service bearer tokens.
pub const SERVICE_AUTHORIZATION_HEADER: &str = "X-Service-Authorization";

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// ConfigError
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the configuration.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Error message.
        message: String,
    },

    /// Unknown file extension.
    #[error("Unsupported config format: '{extension}' (expected toml or json)")]
    UnsupportedFormat {
        /// The extension found.
        extension: String,
    },

    /// An environment override holds an unusable value.
    #[error("Invalid environment variable '{name}': {message}")]
    InvalidEnvVar {
        /// Variable name.
        name: String,
        /// Error message.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ConfigError> for AuthError {
    fn from(err: ConfigError) -> Self {
        AuthError::config(err.to_string())
    }
}

// =============================================================================
// GatekitConfig
// =============================================================================

/// Top-level configuration for token handling and middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatekitConfig {
    /// Key settings for user tokens.
    pub user: KeyConfig,
    /// Key settings for service tokens.
    pub service: KeyConfig,
    /// Name of this service, checked against service token audiences.
    pub service_name: Option<String>,
    /// Slot the middleware stores principals in.
    pub context_key: ContextKey,
    /// Header carrying bearer tokens.
    pub authorization_header: String,
    /// Header carrying service-to-service bearer tokens.
    pub service_authorization_header: String,
}

impl Default for GatekitConfig {
    fn default() -> Self {
        Self {
            user: KeyConfig::default(),
            service: KeyConfig::default(),
            service_name: None,
            context_key: ContextKey::DEFAULT,
            authorization_header: AUTHORIZATION_HEADER.to_string(),
            service_authorization_header: SERVICE_AUTHORIZATION_HEADER.to_string(),
        }
    }
}

impl GatekitConfig {
    /// Creates a configuration with the given user and service secrets.
    pub fn new(user_secret: impl Into<String>, service_secret: impl Into<String>) -> Self {
        Self {
            user: KeyConfig::new(user_secret),
            service: KeyConfig::new(service_secret),
            ..Default::default()
        }
    }

    /// Sets this service's name.
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Sets the context key.
    pub fn with_context_key(mut self, key: ContextKey) -> Self {
        self.context_key = key;
        self
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Loads configuration from a file, applies environment overrides with
    /// the default prefix and validates it.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "Loading configuration");

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_lowercase();

        let mut config = match extension.as_str() {
            "toml" => Self::from_toml_str(&content)?,
            "json" => Self::from_json_str(&content)?,
            _ => return Err(ConfigError::UnsupportedFormat { extension }),
        };

        config.apply_env_overrides(DEFAULT_ENV_PREFIX)?;
        config.validate()?;

        Ok(config)
    }

    /// Parses TOML content without validating it.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Parses JSON content without validating it.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Applies overrides from the process environment.
    pub fn apply_env_overrides(&mut self, prefix: &str) -> ConfigResult<()> {
        self.apply_overrides_from(prefix, |name| env::var(name).ok())
    }

    /// Applies overrides read through `lookup`.
    pub fn apply_overrides_from<F>(&mut self, prefix: &str, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            let name = format!("{prefix}_{suffix}");
            lookup(&name).map(|value| (name, value))
        };

        if let Some((_, value)) = var("USER_SECRET") {
            self.user.secret = value;
        }
        if let Some((_, value)) = var("SERVICE_SECRET") {
            self.service.secret = value;
        }
        if let Some((_, value)) = var("USER_ISSUER") {
            self.user.issuer = value;
        }
        if let Some((_, value)) = var("SERVICE_ISSUER") {
            self.service.issuer = value;
        }
        if let Some((_, value)) = var("SERVICE_NAME") {
            self.service_name = Some(value);
        }
        if let Some((name, value)) = var("LEEWAY_SECS") {
            let leeway: u64 = value.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name,
                message: "expected a non-negative integer".to_string(),
            })?;
            self.user.leeway_secs = leeway;
            self.service.leeway_secs = leeway;
        }

        Ok(())
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.user
            .validate()
            .map_err(|e| ConfigError::validation("user", e.to_string()))?;
        self.service
            .validate()
            .map_err(|e| ConfigError::validation("service", e.to_string()))?;

        // Distinct keys are what keep the two principal kinds apart.
        if self.user.secret == self.service.secret {
            return Err(ConfigError::validation(
                "service.secret",
                "user and service tokens must use different secrets",
            ));
        }
        if self.context_key.as_str().is_empty() {
            return Err(ConfigError::validation("context_key", "must not be empty"));
        }
        if self.authorization_header.is_empty() {
            return Err(ConfigError::validation(
                "authorization_header",
                "must not be empty",
            ));
        }
        if self.service_authorization_header.is_empty() {
            return Err(ConfigError::validation(
                "service_authorization_header",
                "must not be empty",
            ));
        }
        if matches!(self.service_name.as_deref(), Some("")) {
            return Err(ConfigError::validation("service_name", "must not be empty"));
        }

        Ok(())
    }

    // =========================================================================
    // Codecs
    // =========================================================================

    /// Builds the user token codec.
    pub fn user_tokens(&self) -> AuthResult<UserTokens> {
        UserTokens::new(&self.user)
    }

    /// Builds the service token codec.
    pub fn service_tokens(&self) -> AuthResult<ServiceTokens> {
        ServiceTokens::new(&self.service)
    }
}

// =============================================================================
// Tests
// =============================================================================
