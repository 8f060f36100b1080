// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auth gateway: three independent credential modes, each expressed as an
//! axum extractor so handlers declare their required mode by the type they
//! take, rather than running behind one blanket middleware layer.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::identity::DeviceKind;
use crate::error::AppError;
use crate::ids::{DeviceId, UserId};
use crate::state::AppState;

/// Constant-time string comparison to avoid timing side channels on
/// device/API-key token comparisons.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::MissingCredentials)
}

/// Device-mode credential: `X-Device-ID` + `X-Device-Auth-Token` headers.
/// Refuses unknown, mismatched, or offline devices; marks the device
/// online with a fresh `last_seen` on success.
pub struct DeviceAuth {
    pub device_id: DeviceId,
    pub user_id: UserId,
    pub kind: DeviceKind,
}

impl DeviceAuth {
    /// Reject unless the authenticated device is of `expected` kind.
    pub fn require_kind(self, expected: DeviceKind) -> Result<Self, AppError> {
        if self.kind == expected {
            Ok(self)
        } else {
            Err(AppError::WrongDeviceKind)
        }
    }
}

impl FromRequestParts<Arc<AppState>> for DeviceAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let device_id_header = parts
            .headers
            .get("x-device-id")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::MissingCredentials)?;
        let device_id: DeviceId =
            device_id_header.parse().map_err(|_| AppError::InvalidCredentials)?;
        let token = parts
            .headers
            .get("x-device-auth-token")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::MissingCredentials)?;

        let device = state.identity.get_device(device_id).await.ok_or(AppError::InvalidCredentials)?;
        if !constant_time_eq(token, &device.auth_token) {
            return Err(AppError::InvalidCredentials);
        }
        if device.liveness == crate::domain::identity::DeviceLiveness::Offline {
            return Err(AppError::DeviceOffline);
        }

        state.identity.mark_device_online(device_id, state.now()).await;
        Ok(DeviceAuth { device_id, user_id: device.user_id, kind: device.kind })
    }
}

/// User-session mode: `Authorization: Bearer session-for-<id>`.
pub struct UserAuth {
    pub user_id: UserId,
}

impl FromRequestParts<Arc<AppState>> for UserAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user_id = crate::domain::identity::resolve_session_token(token)
            .ok_or(AppError::InvalidCredentials)?;
        state.identity.get_user(user_id).await.ok_or(AppError::InvalidCredentials)?;
        Ok(UserAuth { user_id })
    }
}

/// API-key mode: `Authorization: Bearer <plaintext key>`, looked up by
/// one-way hash. Valid only while `active` and not yet expired.
pub struct ApiKeyAuth {
    pub user_id: UserId,
    pub key_id: crate::ids::ApiKeyId,
}

impl FromRequestParts<Arc<AppState>> for ApiKeyAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let hash = crate::domain::identity::hash_api_key(token);
        let key = state.identity.find_api_key_by_hash(&hash).await.ok_or(AppError::InvalidCredentials)?;
        if !key.is_valid(state.now()) {
            return Err(AppError::InvalidCredentials);
        }
        state.identity.touch_api_key(key.id, state.now()).await;
        Ok(ApiKeyAuth { user_id: key.user_id, key_id: key.id })
    }
}
