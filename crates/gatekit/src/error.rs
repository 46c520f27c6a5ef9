// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and authorization error types.
//!
//! Every failure in the crate is an [`AuthError`]. Each variant maps to an
//! HTTP status and a [`Problem`] whose `detail` is safe to show to clients:
//! it never carries key material, token bytes or library error text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::RoleError;
use crate::problem::{JsonApiRenderer, Problem, ProblemRenderer};

/// Result type alias for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

// =============================================================================
// AuthError
// =============================================================================

/// Authentication and authorization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The credential header is absent or empty (401).
    #[error("Missing {header} header")]
    MissingHeader {
        /// Name of the header that was expected.
        header: String,
    },

    /// The credential header is not of the form `Bearer <token>` (401).
    #[error("Invalid {header} header")]
    MalformedHeader {
        /// Name of the offending header.
        header: String,
    },

    /// Bad signature, wrong algorithm, expired or unparseable token (401).
    #[error("Token validation failed")]
    InvalidToken,

    /// The role claim names no role in the closed set (401).
    #[error("Unrecognized role: {role}")]
    UnrecognizedRole {
        /// The rejected role string.
        role: String,
    },

    /// The role exists but cannot be ranked (401).
    #[error("Role has no priority: {role}")]
    UnrankedRole {
        /// The role name.
        role: String,
    },

    /// No principal of the required kind is attached to the request (401).
    #[error("Not authenticated: {message}")]
    NotAuthenticated {
        /// Client-facing explanation.
        message: String,
    },

    /// The principal is authenticated but policy denies access (403).
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Client-facing explanation.
        message: String,
    },

    /// Signing a token failed (500).
    #[error("Failed to sign token: {message}")]
    Signing {
        /// Error message (for logging, not user-facing).
        message: String,
    },

    /// Invalid key or middleware configuration (500).
    #[error("Configuration error: {message}")]
    Config {
        /// Error message (for logging, not user-facing).
        message: String,
    },
}

impl AuthError {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a missing header error.
    pub fn missing_header(header: impl Into<String>) -> Self {
        Self::MissingHeader {
            header: header.into(),
        }
    }

    /// Creates a malformed header error.
    pub fn malformed_header(header: impl Into<String>) -> Self {
        Self::MalformedHeader {
            header: header.into(),
        }
    }

    /// Creates a not authenticated error.
    pub fn not_authenticated(message: impl Into<String>) -> Self {
        Self::NotAuthenticated {
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a signing error.
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingHeader { .. }
            | AuthError::MalformedHeader { .. }
            | AuthError::InvalidToken
            | AuthError::UnrecognizedRole { .. }
            | AuthError::UnrankedRole { .. }
            | AuthError::NotAuthenticated { .. } => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AuthError::Signing { .. } | AuthError::Config { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the machine-stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader { .. } | AuthError::MalformedHeader { .. } => {
                "MALFORMED_REQUEST"
            }
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::UnrecognizedRole { .. } | AuthError::UnrankedRole { .. } => {
                "UNRECOGNIZED_ROLE"
            }
            AuthError::NotAuthenticated { .. } => "NOT_AUTHENTICATED",
            AuthError::Forbidden { .. } => "POLICY_DENIED",
            AuthError::Signing { .. } => "SIGNING_FAILED",
            AuthError::Config { .. } => "CONFIGURATION_ERROR",
        }
    }

    /// Returns the client-facing detail string.
    ///
    /// Server-side failures get a fixed message; their cause stays in logs.
    pub fn detail(&self) -> String {
        match self {
            AuthError::MissingHeader { .. }
            | AuthError::MalformedHeader { .. }
            | AuthError::InvalidToken => self.to_string(),
            AuthError::UnrecognizedRole { .. } | AuthError::UnrankedRole { .. } => {
                "User role not valid".to_string()
            }
            AuthError::NotAuthenticated { message } | AuthError::Forbidden { message } => {
                message.clone()
            }
            AuthError::Signing { .. } | AuthError::Config { .. } => {
                "The server could not complete the request".to_string()
            }
        }
    }

    /// Returns `true` if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Builds the problem description handed to a [`ProblemRenderer`].
    pub fn problem(&self) -> Problem {
        Problem::new(self.status_code(), self.detail()).with_code(self.error_code())
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<RoleError> for AuthError {
    fn from(err: RoleError) -> Self {
        match err {
            RoleError::Unrecognized { role } => AuthError::UnrecognizedRole { role },
            RoleError::Unranked { role } => AuthError::UnrankedRole {
                role: role.to_string(),
            },
        }
    }
}

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            tracing::error!(error = %self, error_code = self.error_code(), "Server error occurred");
        } else {
            tracing::debug!(error = %self, error_code = self.error_code(), "Client error occurred");
        }

        JsonApiRenderer.render(self.problem())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AuthError::missing_header("Authorization").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::malformed_header("Authorization").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::UnrecognizedRole {
                role: "owner".into()
            }
            .status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::forbidden("nope").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::signing("bad key").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_codes() {
        let cases = [
            (AuthError::missing_header("Authorization"), "MALFORMED_REQUEST"),
            (AuthError::malformed_header("Authorization"), "MALFORMED_REQUEST"),
            (AuthError::InvalidToken, "INVALID_TOKEN"),
            (
                AuthError::UnrankedRole {
                    role: "admin".into(),
                },
                "UNRECOGNIZED_ROLE",
            ),
            (AuthError::not_authenticated("no user"), "NOT_AUTHENTICATED"),
            (AuthError::forbidden("nope"), "POLICY_DENIED"),
            (AuthError::signing("overflow"), "SIGNING_FAILED"),
            (AuthError::config("short secret"), "CONFIGURATION_ERROR"),
        ];
        for (err, code) in cases {
            assert_eq!(err.error_code(), code, "{err}");
            assert_eq!(err.problem().code.as_deref(), Some(code));
        }
    }

    #[test]
    fn test_detail_hides_internal_messages() {
        let err = AuthError::signing("InvalidKeyFormat: secret=hunter2");
        assert!(!err.detail().contains("hunter2"));
        assert!(err.to_string().contains("InvalidKeyFormat"));
    }

    #[test]
    fn test_detail_for_header_errors() {
        assert_eq!(
            AuthError::missing_header("Authorization").detail(),
            "Missing Authorization header"
        );
        assert_eq!(
            AuthError::malformed_header("X-Service-Authorization").detail(),
            "Invalid X-Service-Authorization header"
        );
    }

    #[test]
    fn test_from_role_error() {
        let err: AuthError = Role::parse("owner").unwrap_err().into();
        assert_eq!(
            err,
            AuthError::UnrecognizedRole {
                role: "owner".into()
            }
        );

        let err: AuthError = RoleError::Unranked { role: Role::Admin }.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_problem_carries_code_and_title() {
        let problem = AuthError::forbidden("User role not allowed").problem();
        assert_eq!(problem.status, StatusCode::FORBIDDEN);
        assert_eq!(problem.title, "Forbidden");
        assert_eq!(problem.code.as_deref(), Some("POLICY_DENIED"));
        assert_eq!(problem.detail, "User role not allowed");
    }
}
