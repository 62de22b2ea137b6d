// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::AwardedAchievement;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    /// Awards that stand despite the error
    #[serde(skip_serializing_if = "Vec::is_empty")]
    committed: Vec<AwardedAchievement>,
}

impl AppError {
    fn response_parts(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = self.response_parts();
        let body = ErrorResponse {
            error: error.to_string(),
            details,
            committed: Vec::new(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

/// An award pass that stopped early.
///
/// `committed` holds the awards durably written before `source` occurred.
/// They stand; the caller should retry the pass later.
#[derive(Debug, thiserror::Error)]
#[error("award pass aborted after {} committed award(s): {source}", .committed.len())]
pub struct AwardError {
    pub committed: Vec<AwardedAchievement>,
    #[source]
    pub source: AppError,
}

impl From<AppError> for AwardError {
    fn from(source: AppError) -> Self {
        Self {
            committed: Vec::new(),
            source,
        }
    }
}

impl IntoResponse for AwardError {
    fn into_response(self) -> Response {
        if !self.committed.is_empty() {
            tracing::warn!(
                committed = self.committed.len(),
                "Award pass partially committed before failure"
            );
        }

        let (status, error, details) = self.source.response_parts();
        let body = ErrorResponse {
            error: error.to_string(),
            details,
            committed: self.committed,
        };

        (status, Json(body)).into_response()
    }
}
