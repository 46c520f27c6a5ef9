// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Problem responses.
//!
//! The middleware never formats error bodies itself. It hands a [`Problem`]
//! to a [`ProblemRenderer`], so services can plug in whatever error envelope
//! they already use. [`JsonApiRenderer`] is the default and emits JSON:API
//! error documents.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// JSON:API media type.
pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

// =============================================================================
// Problem
// =============================================================================

/// A client-facing description of a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// HTTP status code.
    pub status: StatusCode,
    /// Short, stable summary; the canonical reason phrase by default.
    pub title: String,
    /// Human-readable explanation of this occurrence.
    pub detail: String,
    /// Application-specific error code.
    pub code: Option<String>,
}

impl Problem {
    /// Creates a problem titled with the status' reason phrase.
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            detail: detail.into(),
            code: None,
        }
    }

    /// Creates a 401 problem.
    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, detail)
    }

    /// Creates a 403 problem.
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, detail)
    }

    /// Sets the error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Overrides the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

// =============================================================================
// ProblemRenderer
// =============================================================================

/// Turns a [`Problem`] into an HTTP response.
pub trait ProblemRenderer: Send + Sync + 'static {
    /// Renders the problem.
    fn render(&self, problem: Problem) -> Response;
}

/// Shared renderer handle used by the layers.
pub type SharedRenderer = Arc<dyn ProblemRenderer>;

/// Returns the default renderer.
pub fn default_renderer() -> SharedRenderer {
    Arc::new(JsonApiRenderer)
}

impl<F> ProblemRenderer for F
where
    F: Fn(Problem) -> Response + Send + Sync + 'static,
{
    fn render(&self, problem: Problem) -> Response {
        self(problem)
    }
}

// =============================================================================
// JsonApiRenderer
// =============================================================================

/// Renders problems as JSON:API error documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonApiRenderer;

impl ProblemRenderer for JsonApiRenderer {
    fn render(&self, problem: Problem) -> Response {
        let status = problem.status;
        let document = ErrorDocument::from(problem);

        match serde_json::to_vec(&document) {
            Ok(body) => {
                let mut response = Response::new(Body::from(body));
                *response.status_mut() = status;
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(JSONAPI_MEDIA_TYPE),
                );
                response
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode problem document");
                status.into_response()
            }
        }
    }
}

/// Top-level JSON:API error document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDocument {
    /// Error objects; the middleware always emits exactly one.
    pub errors: Vec<ErrorObject>,
}

/// A single JSON:API error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorObject {
    /// HTTP status as a string.
    pub status: String,
    /// Application-specific error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short summary.
    pub title: String,
    /// Occurrence-specific explanation.
    pub detail: String,
    /// Extra metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl From<Problem> for ErrorDocument {
    fn from(problem: Problem) -> Self {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        Self {
            errors: vec![ErrorObject {
                status: problem.status.as_u16().to_string(),
                code: problem.code,
                title: problem.title,
                detail: problem.detail,
                meta: Some(serde_json::json!({ "timestamp": timestamp })),
            }],
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
