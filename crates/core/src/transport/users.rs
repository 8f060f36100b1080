// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User lifecycle and API-key issuance handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::auth::UserAuth;
use crate::domain::identity::{
    generate_api_key, hash_password, issue_session_token, verify_password, ApiKey, User,
};
use crate::error::AppError;
use crate::ids::UserId;
use crate::state::AppState;
use crate::transport::dto::{
    AuthResponse, GenerateKeyRequest, GenerateKeyResponse, LoginRequest, RegisterRequest,
};

/// `POST /api/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let now = state.now();
    let user = User {
        id: UserId::new(),
        email: req.email,
        password_hash: hash_password(&req.password)?,
        display_name: req.display_name,
        created_at: now,
    };
    let user = state.identity.register(user).await?;
    let token = issue_session_token(user.id);
    Ok(Json(AuthResponse {
        user_id: user.id.to_string(),
        email: user.email,
        display_name: user.display_name,
        token,
    }))
}

/// `POST /api/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state.identity.find_by_email(&req.email).await.ok_or(AppError::InvalidCredentials)?;
    if !verify_password(&req.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }
    let token = issue_session_token(user.id);
    Ok(Json(AuthResponse {
        user_id: user.id.to_string(),
        email: user.email,
        display_name: user.display_name,
        token,
    }))
}

/// `DELETE /api/users/{email}` — unauthenticated by reference behavior.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.identity.delete_by_email(&email).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// `POST /api/keys/generate`
pub async fn generate_key(
    State(state): State<Arc<AppState>>,
    auth: UserAuth,
    Json(req): Json<GenerateKeyRequest>,
) -> Result<Json<GenerateKeyResponse>, AppError> {
    let now = state.now();
    let (plaintext, hash) = generate_api_key(now);
    let key = ApiKey {
        id: crate::ids::ApiKeyId::new(),
        user_id: auth.user_id,
        name: req.name,
        key_hash: hash,
        permissions: req.permissions,
        active: true,
        last_used_at: None,
        expires_at: now + crate::domain::identity::API_KEY_LIFETIME,
        created_at: now,
    };
    let key = state.identity.create_api_key(key).await;
    Ok(Json(GenerateKeyResponse { id: key.id.to_string(), plaintext_key: plaintext }))
}

/// `GET /api/keys` — hashes are never serialized (`ApiKey::key_hash` is
/// `#[serde(skip)]`).
pub async fn list_keys(
    State(state): State<Arc<AppState>>,
    auth: UserAuth,
) -> Json<Vec<ApiKey>> {
    Json(state.identity.keys_for_user(auth.user_id).await)
}

/// `DELETE /api/keys/{id}`
pub async fn revoke_key(
    State(state): State<Arc<AppState>>,
    auth: UserAuth,
    Path(id): Path<crate::ids::ApiKeyId>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.identity.revoke_api_key(auth.user_id, id).await?;
    Ok(Json(serde_json::json!({ "revoked": true })))
}
