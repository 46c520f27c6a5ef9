// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Configuration Integration Tests
//!
//! - `test_load_*`: File loading
//! - `test_env_*`: Environment overrides
//! - `test_validate_*`: Validation rules
//! - `test_layers_*`: Layers built from loaded configuration

use std::collections::HashMap;
use std::fs;

use gatekit::{
    config::DEFAULT_ENV_PREFIX, AuthLayer, ConfigError, ContextKey, GatekitConfig,
    ServiceAuthLayer,
};
use gatekit_tests::prelude::*;
use jsonwebtoken::Algorithm;

const TOML_CONFIG: &str = r#"
service_name = "inventory"
context_key = "inventory.principal"

[user]
secret = "user-secret-key-that-is-long-enough-for-testing"
algorithm = "HS384"
issuer = "accounts"
expected_issuers = ["accounts"]
leeway_secs = 5
default_ttl_secs = 900

[service]
secret = "service-secret-key-that-is-long-enough-for-tests"
issuer = "billing"
"#;

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_load_toml() {
    init_test_logging();
    let dir = temp_test_dir("gatekit-config");
    let path = dir.path().join("gatekit.toml");
    fs::write(&path, TOML_CONFIG).unwrap();

    let config = GatekitConfig::from_file(&path).unwrap();
    assert_eq!(config.service_name.as_deref(), Some("inventory"));
    assert_eq!(config.context_key, ContextKey::new("inventory.principal"));
    assert_eq!(config.user.algorithm, Algorithm::HS384);
    assert_eq!(config.user.leeway_secs, 5);
    assert_eq!(config.user.default_ttl_secs, 900);
    assert_eq!(config.user.expected_issuers, vec!["accounts"]);

    // Defaults fill what the file leaves out.
    assert_eq!(config.service.algorithm, Algorithm::HS256);
    assert_eq!(config.service.default_ttl_secs, 3600);
    assert_eq!(config.authorization_header, "Authorization");
    assert_eq!(config.service_authorization_header, "X-Service-Authorization");
}

#[test]
fn test_load_json() {
    let dir = temp_test_dir("gatekit-config");
    let path = dir.path().join("gatekit.json");
    fs::write(
        &path,
        r#"{
            "user": {"secret": "user-secret-key-that-is-long-enough-for-testing"},
            "service": {"secret": "service-secret-key-that-is-long-enough-for-tests"},
            "authorization_header": "X-Auth"
        }"#,
    )
    .unwrap();

    let config = GatekitConfig::from_file(&path).unwrap();
    assert_eq!(config.authorization_header, "X-Auth");
    assert!(config.service_name.is_none());
}

#[test]
fn test_load_unsupported_extension() {
    let dir = temp_test_dir("gatekit-config");
    let path = dir.path().join("gatekit.yaml");
    fs::write(&path, "user: {}").unwrap();

    assert!(matches!(
        GatekitConfig::from_file(&path),
        Err(ConfigError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_load_missing_file() {
    let dir = temp_test_dir("gatekit-config");
    assert!(matches!(
        GatekitConfig::from_file(dir.path().join("absent.toml")),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn test_load_secret_never_serialized() {
    let config = GatekitConfig::from_toml_str(TOML_CONFIG).unwrap();
    let json = serde_json::to_string(&config).unwrap();
    assert!(!json.contains(KeyFixtures::USER_SECRET));
    assert!(!format!("{config:?}").contains(KeyFixtures::SERVICE_SECRET));
}

// =============================================================================
// Environment Overrides
// =============================================================================

#[test]
fn test_env_overrides() {
    let vars: HashMap<String, String> = [
        ("GATEKIT_USER_SECRET", "env-user-secret-that-is-long-enough-to-use"),
        ("GATEKIT_SERVICE_NAME", "ledger"),
        ("GATEKIT_LEEWAY_SECS", "30"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let mut config = GatekitConfig::from_toml_str(TOML_CONFIG).unwrap();
    config
        .apply_overrides_from(DEFAULT_ENV_PREFIX, |name| vars.get(name).cloned())
        .unwrap();

    assert_eq!(config.user.secret, "env-user-secret-that-is-long-enough-to-use");
    assert_eq!(config.service_name.as_deref(), Some("ledger"));
    assert_eq!(config.user.leeway_secs, 30);
    assert_eq!(config.service.leeway_secs, 30);
    assert!(config.validate().is_ok());
}

#[test]
fn test_env_invalid_value() {
    let mut config = GatekitConfig::from_toml_str(TOML_CONFIG).unwrap();
    let result = config.apply_overrides_from("APP", |name| {
        (name == "APP_LEEWAY_SECS").then(|| "soon".to_string())
    });
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_validate_shared_secret() {
    let config = GatekitConfig::new(KeyFixtures::USER_SECRET, KeyFixtures::USER_SECRET);
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Validation { .. })
    ));
}

#[test]
fn test_validate_missing_secret() {
    let config = GatekitConfig::default();
    assert!(config.validate().is_err());
    assert!(AuthLayer::from_config(&config).is_err());
}

#[test]
fn test_validate_non_hmac_algorithm() {
    let mut config = KeyFixtures::config();
    config.user.algorithm = Algorithm::RS256;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_empty_context_key() {
    let config = KeyFixtures::config().with_context_key(ContextKey::new(""));
    assert!(config.validate().is_err());
}

// =============================================================================
// Layers From Configuration
// =============================================================================

#[tokio::test]
async fn test_layers_custom_header() {
    let mut config = KeyFixtures::config();
    config.authorization_header = "X-Auth".to_string();
    config.service_authorization_header = "X-Internal-Auth".to_string();
    let app = RouterFixtures::app_with(&config);
    let token = bearer(&TokenFixtures::user_token(Role::User));

    send(&app, "/me", Some(&token))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    send_with_header(&app, "/me", "X-Auth", &token)
        .await
        .assert_status(StatusCode::OK);

    let service = bearer(&TokenFixtures::service_token(&[KeyFixtures::SERVICE_NAME]));
    send_with_header(&app, "/internal/sync", "X-Internal-Auth", &service)
        .await
        .assert_status(StatusCode::OK);
}

#[test]
fn test_layers_service_auth_needs_name() {
    let mut config = KeyFixtures::config();
    config.service_name = None;
    assert!(ServiceAuthLayer::from_config(&config).is_err());
    assert!(AuthLayer::from_config(&config).is_ok());
}

#[test]
fn test_layers_invalid_header_name() {
    let mut config = KeyFixtures::config();
    config.authorization_header = "not a header".to_string();
    assert!(AuthLayer::from_config(&config).is_err());
}
