// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Test Assertions
//!
//! Assertion helpers with failure messages that name what was expected.

use axum::{http::StatusCode, response::Response};
use gatekit::{Principal, Role};
use http_body_util::BodyExt;
use serde_json::Value;

// =============================================================================
// Response Assertions
// =============================================================================

/// Assertion extensions for responses.
pub trait ResponseAssertions {
    /// Assert the status code.
    fn assert_status(&self, expected: StatusCode);

    /// Assert the response is a JSON:API problem document.
    fn assert_problem_media_type(&self);
}

impl ResponseAssertions for Response {
    fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status(),
            expected,
            "Expected status {}, but got {}",
            expected,
            self.status()
        );
    }

    fn assert_problem_media_type(&self) {
        let content_type = self
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert_eq!(
            content_type,
            gatekit::problem::JSONAPI_MEDIA_TYPE,
            "Expected a JSON:API problem response"
        );
    }
}

/// Reads the response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("JSON body")
}

/// Asserts `response` is a problem with `status` and returns its single
/// error object.
pub async fn assert_problem(response: Response, status: StatusCode) -> Value {
    response.assert_status(status);
    response.assert_problem_media_type();

    let body = body_json(response).await;
    let errors = body["errors"].as_array().expect("errors array");
    assert_eq!(errors.len(), 1, "Expected exactly one error object: {body}");

    let error = errors[0].clone();
    assert_eq!(error["status"], status.as_u16().to_string());

    let timestamp = error["meta"]["timestamp"].as_str().expect("meta.timestamp");
    assert!(
        chrono::DateTime::parse_from_rfc3339(timestamp).is_ok(),
        "Expected an RFC 3339 timestamp, got {timestamp}"
    );
    error
}

// =============================================================================
// Principal Assertions
// =============================================================================

/// Assertion extensions for principals.
pub trait PrincipalAssertions {
    /// Assert a user principal with `role`.
    fn assert_user(&self, role: Role);

    /// Assert a service principal acting as `subject`.
    fn assert_service(&self, subject: &str);
}

impl PrincipalAssertions for Principal {
    fn assert_user(&self, role: Role) {
        match self {
            Principal::User(user) => assert_eq!(
                user.role, role,
                "Expected role {}, but got {}",
                role, user.role
            ),
            other => panic!("Expected user principal, but got {other:?}"),
        }
    }

    fn assert_service(&self, subject: &str) {
        match self {
            Principal::Service(service) => assert_eq!(service.subject, subject),
            other => panic!("Expected service principal, but got {other:?}"),
        }
    }
}
