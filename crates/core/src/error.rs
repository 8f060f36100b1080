// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds for the adherence API.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Error kinds for the adherence API, one per response envelope code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    MissingCredentials,
    InvalidCredentials,
    WrongDeviceKind,
    DeviceOffline,
    NotFound,
    Conflict,
    InvalidInput { message: String },
    /// A dose transition was rejected; `current` names the state it was
    /// rejected from.
    IllegalTransition { current: String },
    Internal,
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput { message: message.into() }
    }

    pub fn illegal_transition(current: impl Into<String>) -> Self {
        Self::IllegalTransition { current: current.into() }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::MissingCredentials | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::WrongDeviceKind => StatusCode::FORBIDDEN,
            Self::DeviceOffline => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::IllegalTransition { .. } => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing-credentials",
            Self::InvalidCredentials => "invalid-credentials",
            Self::WrongDeviceKind => "wrong-device-kind",
            Self::DeviceOffline => "device-offline",
            Self::NotFound => "not-found",
            Self::Conflict => "conflict",
            Self::InvalidInput { .. } => "invalid-input",
            Self::IllegalTransition { .. } => "illegal-transition",
            Self::Internal => "internal-error",
        }
    }

    /// Human-readable message. Never includes stored credential material,
    /// password hashes, or API-key hashes.
    pub fn message(&self) -> String {
        match self {
            Self::MissingCredentials => "required credentials were not supplied".to_owned(),
            Self::InvalidCredentials => "credentials are invalid or expired".to_owned(),
            Self::WrongDeviceKind => "this endpoint requires a different device kind".to_owned(),
            Self::DeviceOffline => "device is marked offline".to_owned(),
            Self::NotFound => "the requested record was not found".to_owned(),
            Self::Conflict => "the request conflicts with an existing record".to_owned(),
            Self::InvalidInput { message } => message.clone(),
            Self::IllegalTransition { current } => {
                format!("illegal transition from current state '{current}'")
            }
            Self::Internal => "an internal error occurred".to_owned(),
        }
    }

    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: self.message() }
    }

    pub fn to_http_response(&self) -> (StatusCode, Json<ErrorResponse>) {
        (self.http_status(), Json(ErrorResponse { error: self.to_error_body() }))
    }

    /// Wrap an unexpected failure: the cause is logged, never returned.
    pub fn internal(cause: impl fmt::Display) -> Self {
        tracing::error!(err = %cause, "internal error");
        Self::Internal
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_http_response().into_response()
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_transition_names_current_state() {
        let err = AppError::illegal_transition("taken");
        assert_eq!(err.as_str(), "illegal-transition");
        assert_eq!(err.http_status(), StatusCode::CONFLICT);
        assert!(err.message().contains("taken"));
    }

    #[test]
    fn conflict_maps_to_409() {
        assert_eq!(AppError::Conflict.http_status(), StatusCode::CONFLICT);
    }
}
