// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity store: users, devices, and API keys.

use std::collections::HashMap;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::ids::{ApiKeyId, DeviceId, UserId};

// -- Users ---------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(AppError::internal)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else { return false };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

/// Issue an opaque session token that resolves 1:1 to `user_id`. Kept in
/// the documented `session-for-<id>` shape for interface fidelity —
/// trivially forgeable, retained only as the reference
/// interface shape. Isolated in this one function so swapping in a signed
/// token is a one-function change.
pub fn issue_session_token(user_id: UserId) -> String {
    format!("session-for-{user_id}")
}

/// Resolve a session token back to a user id. The only place that
/// understands the token's shape.
pub fn resolve_session_token(token: &str) -> Option<UserId> {
    token.strip_prefix("session-for-")?.parse().ok()
}

// -- Devices ---------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Dispenser,
    Band,
}

impl DeviceKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dispenser" => Some(Self::Dispenser),
            "band" => Some(Self::Band),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dispenser => "dispenser",
            Self::Band => "band",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceLiveness {
    Online,
    Offline,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Device {
    pub id: DeviceId,
    pub user_id: UserId,
    pub kind: DeviceKind,
    #[serde(skip)]
    pub auth_token: String,
    pub liveness: DeviceLiveness,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// -- API keys ---------------------------------------------------------------

pub const API_KEY_LIFETIME: Duration = Duration::days(14);

#[derive(Debug, Clone, Serialize)]
pub struct ApiKey {
    pub id: ApiKeyId,
    pub user_id: UserId,
    pub name: String,
    #[serde(skip)]
    pub key_hash: String,
    pub permissions: Vec<String>,
    pub active: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ApiKey {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at > now
    }
}

/// Generate a new API key of the form `<prefix>_<base36-time>_<random>`
/// and its one-way hash. Plaintext is returned once and never
/// stored; only `key_hash` lands in the `ApiKey` record.
pub fn generate_api_key(now: DateTime<Utc>) -> (String, String) {
    use rand::Rng;
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let time_b36 = to_base36(now.timestamp() as u64);
    let mut rng = rand::rng();
    let random: String =
        (0..14).map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char).collect();
    let plaintext = format!("cpk_{time_b36}_{random}");
    let hash = hash_api_key(&plaintext);
    (plaintext, hash)
}

pub fn hash_api_key(plaintext: &str) -> String {
    let digest = Sha256::digest(plaintext.as_bytes());
    hex_encode(&digest)
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_owned();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

// -- Store ---------------------------------------------------------------

#[derive(Default)]
pub struct IdentityStore {
    users: RwLock<HashMap<UserId, User>>,
    emails: RwLock<HashMap<String, UserId>>,
    devices: RwLock<HashMap<DeviceId, Device>>,
    api_keys: RwLock<HashMap<ApiKeyId, ApiKey>>,
    api_key_hashes: RwLock<HashMap<String, ApiKeyId>>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn register(&self, user: User) -> Result<User, AppError> {
        let mut emails = self.emails.write().await;
        if emails.contains_key(&user.email) {
            return Err(AppError::Conflict);
        }
        let mut users = self.users.write().await;
        emails.insert(user.email.clone(), user.id);
        let snapshot = user.clone();
        users.insert(user.id, user);
        Ok(snapshot)
    }

    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        let id = *self.emails.read().await.get(email)?;
        self.users.read().await.get(&id).cloned()
    }

    pub async fn get_user(&self, id: UserId) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }

    pub async fn delete_by_email(&self, email: &str) -> Result<UserId, AppError> {
        let id = self.emails.write().await.remove(email).ok_or(AppError::NotFound)?;
        self.users.write().await.remove(&id);
        Ok(id)
    }

    pub async fn register_device(&self, device: Device) -> Device {
        let snapshot = device.clone();
        self.devices.write().await.insert(device.id, device);
        snapshot
    }

    pub async fn get_device(&self, id: DeviceId) -> Option<Device> {
        self.devices.read().await.get(&id).cloned()
    }

    pub async fn mark_device_online(&self, id: DeviceId, now: DateTime<Utc>) {
        if let Some(device) = self.devices.write().await.get_mut(&id) {
            device.liveness = DeviceLiveness::Online;
            device.last_seen = now;
        }
    }

    pub async fn create_api_key(&self, key: ApiKey) -> ApiKey {
        let snapshot = key.clone();
        self.api_key_hashes.write().await.insert(key.key_hash.clone(), key.id);
        self.api_keys.write().await.insert(key.id, key);
        snapshot
    }

    pub async fn find_api_key_by_hash(&self, hash: &str) -> Option<ApiKey> {
        let id = *self.api_key_hashes.read().await.get(hash)?;
        self.api_keys.read().await.get(&id).cloned()
    }

    pub async fn touch_api_key(&self, id: ApiKeyId, now: DateTime<Utc>) {
        if let Some(key) = self.api_keys.write().await.get_mut(&id) {
            key.last_used_at = Some(now);
        }
    }

    pub async fn keys_for_user(&self, user_id: UserId) -> Vec<ApiKey> {
        self.api_keys.read().await.values().filter(|k| k.user_id == user_id).cloned().collect()
    }

    pub async fn revoke_api_key(&self, user_id: UserId, id: ApiKeyId) -> Result<(), AppError> {
        let mut keys = self.api_keys.write().await;
        match keys.get(&id) {
            Some(key) if key.user_id == user_id => {}
            Some(_) => return Err(AppError::NotFound),
            None => return Err(AppError::NotFound),
        }
        if let Some(key) = keys.remove(&id) {
            self.api_key_hashes.write().await.remove(&key.key_hash);
        }
        Ok(())
    }
}
