// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Keys, tokens and a router with every layer mounted.
//!
//! Fixtures use fixed secrets so tokens minted by one fixture verify in any
//! other.

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use gatekit::{
    require_roles, AccessGrantLayer, AuthLayer, CurrentPrincipal, CurrentService, GatekitConfig,
    IssueServiceToken, IssueUserToken, Principal, Role, ServiceAuthLayer,
};
use tower::ServiceExt;
use uuid::Uuid;

// =============================================================================
// Key Fixtures
// =============================================================================

/// Fixture providing key material and configuration.
pub struct KeyFixtures;

impl KeyFixtures {
    /// Secret for user tokens.
    pub const USER_SECRET: &'static str = "user-secret-key-that-is-long-enough-for-testing";
    /// Secret for service tokens.
    pub const SERVICE_SECRET: &'static str = "service-secret-key-that-is-long-enough-for-tests";
    /// A secret nobody configured.
    pub const FOREIGN_SECRET: &'static str = "foreign-secret-key-that-nobody-has-configured";
    /// Issuer of user tokens.
    pub const USER_ISSUER: &'static str = "accounts";
    /// Issuer of service tokens.
    pub const SERVICE_ISSUER: &'static str = "billing";
    /// Name of the service the test router plays.
    pub const SERVICE_NAME: &'static str = "inventory";

    /// Standard configuration.
    pub fn config() -> GatekitConfig {
        let mut config = GatekitConfig::new(Self::USER_SECRET, Self::SERVICE_SECRET)
            .with_service_name(Self::SERVICE_NAME);
        config.user.issuer = Self::USER_ISSUER.to_string();
        config.service.issuer = Self::SERVICE_ISSUER.to_string();
        config
    }

    /// Configuration whose user key is the foreign secret.
    pub fn foreign_config() -> GatekitConfig {
        let mut config = Self::config();
        config.user.secret = Self::FOREIGN_SECRET.to_string();
        config
    }
}

// =============================================================================
// Token Fixtures
// =============================================================================

/// Fixture minting tokens with the standard keys.
pub struct TokenFixtures;

impl TokenFixtures {
    /// Standard user token request for `role`.
    pub fn user_request(role: Role) -> IssueUserToken {
        IssueUserToken::new(KeyFixtures::USER_ISSUER, Uuid::new_v4(), Uuid::new_v4(), role, 300)
            .with_audience([KeyFixtures::SERVICE_NAME])
            .verified(true)
    }

    /// Signs `request` with the user key of `config`.
    pub fn user_token_from(config: &GatekitConfig, request: &IssueUserToken) -> String {
        config
            .user_tokens()
            .expect("user codec")
            .issue(request)
            .expect("user token")
    }

    /// A fresh user token with `role`.
    pub fn user_token(role: Role) -> String {
        Self::user_token_from(&KeyFixtures::config(), &Self::user_request(role))
    }

    /// A user token holding an active subscription.
    pub fn subscribed_user_token(role: Role) -> String {
        let request = Self::user_request(role).with_subscription(Uuid::new_v4());
        Self::user_token_from(&KeyFixtures::config(), &request)
    }

    /// A user token issued with `ttl_secs`.
    pub fn user_token_with_ttl(ttl_secs: i64) -> String {
        let mut request = Self::user_request(Role::User);
        request.ttl_secs = ttl_secs;
        Self::user_token_from(&KeyFixtures::config(), &request)
    }

    /// A service token whose audience is `audience`.
    pub fn service_token(audience: &[&str]) -> String {
        Self::service_token_from(&KeyFixtures::config(), audience)
    }

    /// Signs a service token with the service key of `config`.
    pub fn service_token_from(config: &GatekitConfig, audience: &[&str]) -> String {
        config
            .service_tokens()
            .expect("service codec")
            .issue(
                &IssueServiceToken::new(KeyFixtures::SERVICE_ISSUER, 300)
                    .with_audience(audience.iter().copied()),
            )
            .expect("service token")
    }

    /// Flips the low bit of the middle signature byte.
    pub fn tamper_signature(token: &str) -> String {
        let len = Self::signature_len(token);
        Self::tamper_signature_at(token, len / 2)
    }

    /// Number of decoded bytes in the signature segment.
    pub fn signature_len(token: &str) -> usize {
        let (_, signature) = token.rsplit_once('.').expect("three-part token");
        URL_SAFE_NO_PAD
            .decode(signature)
            .expect("base64url signature")
            .len()
    }

    /// Flips the low bit of signature byte `index` and re-encodes the token.
    pub fn tamper_signature_at(token: &str, index: usize) -> String {
        let (head, signature) = token.rsplit_once('.').expect("three-part token");
        let mut bytes = URL_SAFE_NO_PAD.decode(signature).expect("base64url signature");
        bytes[index] ^= 0x01;
        format!("{head}.{}", URL_SAFE_NO_PAD.encode(bytes))
    }
}

// =============================================================================
// Router Fixtures
// =============================================================================

/// Fixture providing an axum router with the full middleware chain.
///
/// | path | grant |
/// |---|---|
/// | `/me` | any principal |
/// | `/user` | roles {user} |
/// | `/admin` | roles {admin, moderator} |
/// | `/staff` | role >= moderator |
/// | `/reports` | roles {admin}, services admitted |
/// | `/billing` | audience billing |
/// | `/inventory` | audience inventory |
/// | `/premium` | active subscription |
/// | `/internal/sync` | `X-Service-Authorization`, audience inventory |
pub struct RouterFixtures;

impl RouterFixtures {
    /// Router built from the standard configuration.
    pub fn app() -> Router {
        Self::app_with(&KeyFixtures::config())
    }

    /// Router built from `config`.
    pub fn app_with(config: &GatekitConfig) -> Router {
        let protected = Router::new()
            .route("/me", get(whoami))
            .route("/user", get(ok).layer(AccessGrantLayer::roles([Role::User])))
            .route("/admin", get(ok).layer(require_roles!(Role::Admin, Role::Moderator)))
            .route("/staff", get(ok).layer(require_roles!(min: Role::Moderator)))
            .route(
                "/reports",
                get(ok).layer(AccessGrantLayer::roles([Role::Admin]).admit_services()),
            )
            .route("/billing", get(ok).layer(AccessGrantLayer::audience("billing")))
            .route("/inventory", get(ok).layer(AccessGrantLayer::audience("inventory")))
            .route("/premium", get(ok).layer(AccessGrantLayer::subscription()))
            .layer(AuthLayer::from_config(config).expect("auth layer"));

        let internal = Router::new()
            .route("/internal/sync", get(calling_service))
            .layer(ServiceAuthLayer::from_config(config).expect("service auth layer"));

        protected.merge(internal)
    }
}

async fn ok() -> &'static str {
    "ok"
}

async fn whoami(CurrentPrincipal(principal): CurrentPrincipal) -> Json<Principal> {
    Json(principal)
}

async fn calling_service(CurrentService(service): CurrentService) -> String {
    service.subject
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Formats a bearer header value.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Sends a GET with an optional `Authorization` value.
pub async fn send(app: &Router, path: &str, authorization: Option<&str>) -> Response {
    match authorization {
        Some(value) => send_with_header(app, path, header::AUTHORIZATION.as_str(), value).await,
        None => oneshot(app, Request::builder().uri(path)).await,
    }
}

/// Sends a GET carrying `name: value`.
pub async fn send_with_header(app: &Router, path: &str, name: &str, value: &str) -> Response {
    oneshot(app, Request::builder().uri(path).header(name, value)).await
}

async fn oneshot(app: &Router, builder: axum::http::request::Builder) -> Response {
    let request = builder.body(Body::empty()).expect("request");
    app.clone().oneshot(request).await.expect("infallible")
}
