// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Token Integration Tests
//!
//! - `test_roundtrip_*`: Issue then verify
//! - `test_reject_*`: Tokens that must never verify
//! - `test_role_*`: Role ordering and parsing

use std::cmp::Ordering;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use gatekit::{
    auth::compare_roles, AuthError, Authenticator, IssueServiceToken, KeyConfig, Role,
    ServiceTokens, UserTokens,
};
use gatekit_tests::prelude::*;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use uuid::Uuid;

fn user_tokens() -> UserTokens {
    KeyFixtures::config().user_tokens().unwrap()
}

fn service_tokens() -> ServiceTokens {
    KeyFixtures::config().service_tokens().unwrap()
}

// =============================================================================
// Round Trip
// =============================================================================

#[test]
fn test_roundtrip_user_claims() {
    init_test_logging();

    let subscription = Uuid::new_v4();
    let request = TokenFixtures::user_request(Role::Moderator).with_subscription(subscription);
    let before = Utc::now().timestamp();
    let token = user_tokens().issue(&request).unwrap();
    let claims = user_tokens().verify(&token).unwrap();

    assert_eq!(claims.iss, request.issuer);
    assert_eq!(claims.sub, request.user_id.to_string());
    assert_eq!(claims.aud, request.audience);
    assert_eq!(claims.session_id, request.session_id);
    assert_eq!(claims.role, "moderator");
    assert!(claims.verified);
    assert_eq!(claims.subscription_id, Some(subscription));

    // Expiry lands within the ttl window of issuance.
    let after = Utc::now().timestamp();
    assert!(claims.iat >= before && claims.iat <= after);
    assert!(claims.exp >= before + request.ttl_secs && claims.exp <= after + request.ttl_secs);
}

#[test]
fn test_roundtrip_service_claims() {
    let request = IssueServiceToken::new("billing", 60)
        .with_subject("billing-worker")
        .with_audience(["inventory", "ledger"]);
    let token = service_tokens().issue(&request).unwrap();
    let claims = service_tokens().verify(&token).unwrap();

    assert_eq!(claims.iss, "billing");
    assert_eq!(claims.sub, "billing-worker");
    assert_eq!(claims.aud, vec!["inventory", "ledger"]);
    assert!(claims.allows("ledger"));
    assert!(!claims.allows("billing"));
}

// =============================================================================
// Rejection
// =============================================================================

#[test]
fn test_reject_tampered_signature() {
    let token = TokenFixtures::user_token(Role::Admin);
    let len = TokenFixtures::signature_len(&token);
    assert_eq!(len, 32);

    for index in 0..len {
        let tampered = TokenFixtures::tamper_signature_at(&token, index);
        assert_ne!(token, tampered);
        assert_eq!(
            user_tokens().verify(&tampered),
            Err(AuthError::InvalidToken),
            "signature byte {index}"
        );
    }
}

#[test]
fn test_reject_foreign_key() {
    let token = TokenFixtures::user_token_from(
        &KeyFixtures::foreign_config(),
        &TokenFixtures::user_request(Role::Admin),
    );
    assert_eq!(user_tokens().verify(&token), Err(AuthError::InvalidToken));
}

#[test]
fn test_reject_expired() {
    let token = TokenFixtures::user_token_with_ttl(-1);
    assert_eq!(user_tokens().verify(&token), Err(AuthError::InvalidToken));

    let token = TokenFixtures::user_token_with_ttl(0);
    assert_eq!(user_tokens().verify(&token), Err(AuthError::InvalidToken));
}

#[test]
fn test_reject_algorithm_confusion() {
    let request = TokenFixtures::user_request(Role::Admin);
    let claims = gatekit::UserClaims::from_request(&request).unwrap();

    // Same secret, different HMAC variant.
    let token = encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(KeyFixtures::USER_SECRET.as_bytes()),
    )
    .unwrap();
    assert_eq!(user_tokens().verify(&token), Err(AuthError::InvalidToken));

    // Unsigned token with alg "none".
    let header = r#"{"alg":"none","typ":"JWT"}"#;
    let payload = serde_json::to_string(&claims).unwrap();
    let unsigned = format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(payload)
    );
    assert_eq!(user_tokens().verify(&unsigned), Err(AuthError::InvalidToken));
}

#[test]
fn test_reject_cross_kind() {
    let user = TokenFixtures::user_token(Role::SuperUser);
    let service = TokenFixtures::service_token(&["inventory"]);

    assert!(service_tokens().verify(&user).is_err());
    assert!(user_tokens().verify(&service).is_err());
}

#[test]
fn test_reject_unexpected_issuer() {
    let config = KeyConfig::new(KeyFixtures::USER_SECRET).with_expected_issuers(["sso"]);
    let strict = UserTokens::new(&config).unwrap();
    let token = TokenFixtures::user_token(Role::User);
    assert_eq!(strict.verify(&token), Err(AuthError::InvalidToken));
}

#[test]
fn test_reject_missing_issuer() {
    let config = KeyConfig::new(KeyFixtures::USER_SECRET)
        .with_expected_issuers([KeyFixtures::USER_ISSUER]);
    let strict = UserTokens::new(&config).unwrap();

    let mut request = TokenFixtures::user_request(Role::Admin);
    request.issuer = String::new();
    let token = strict.issue(&request).unwrap();
    assert_eq!(strict.verify(&token), Err(AuthError::InvalidToken));

    let token = strict.issue(&TokenFixtures::user_request(Role::Admin)).unwrap();
    assert!(strict.verify(&token).is_ok());
}

#[test]
fn test_authenticator_classifies_by_key() {
    let auth = Authenticator::from_config(&KeyFixtures::config()).unwrap();

    auth.authenticate(&TokenFixtures::service_token(&["billing"]))
        .unwrap()
        .assert_service(KeyFixtures::SERVICE_ISSUER);
    auth.authenticate(&TokenFixtures::user_token(Role::Admin))
        .unwrap()
        .assert_user(Role::Admin);
}

// =============================================================================
// Roles
// =============================================================================

#[test]
fn test_role_ordering() {
    assert_eq!(Role::Admin.compare(&Role::User), Ok(Ordering::Greater));
    assert_eq!(Role::User.compare(&Role::User), Ok(Ordering::Equal));
    assert_eq!(Role::Moderator.compare(&Role::Admin), Ok(Ordering::Less));
    assert_eq!(compare_roles("admin", "moderator"), Ok(Ordering::Greater));
}

#[test]
fn test_role_unknown_is_error() {
    assert!(compare_roles("admin", "owner").is_err());
    assert!(compare_roles("owner", "user").is_err());
    assert!(Role::parse("Admin").is_err());
    assert!(Role::parse(" admin").is_err());
}

#[test]
fn test_role_enumeration() {
    let names: Vec<_> = Role::all().iter().map(Role::as_str).collect();
    assert_eq!(names, ["user", "moderator", "admin", "super_user"]);
}
