//! Credential checks and login sessions.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::AuthConfig;

const DEFAULT_PASSWORD: &str = "admin123";

/// Decides whether a username/password pair may log in.
pub trait AuthProvider: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// A single configured account, stored as a password digest.
pub struct StaticCredentials {
    username: String,
    password_digest: [u8; 32],
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            password_digest: sha256(password),
        }
    }

    /// # Errors
    ///
    /// Fails when `password_sha256` is not 64 hex characters.
    pub fn from_config(config: &AuthConfig) -> anyhow::Result<Self> {
        let password_digest = match (&config.password_sha256, &config.password) {
            (Some(hex), _) => parse_hex_digest(hex)
                .ok_or_else(|| anyhow::anyhow!("auth.password_sha256 must be 64 hex characters"))?,
            (None, Some(plain)) => sha256(plain),
            (None, None) => sha256(DEFAULT_PASSWORD),
        };
        Ok(Self {
            username: config.username.clone(),
            password_digest,
        })
    }
}

impl AuthProvider for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(&sha256(password), &self.password_digest);
        user_ok & pass_ok
    }
}

fn sha256(input: &str) -> [u8; 32] {
    Sha256::digest(input.as_bytes()).into()
}

fn parse_hex_digest(hex: &str) -> Option<[u8; 32]> {
    let hex = hex.trim();
    if hex.len() != 64 || !hex.is_ascii() {
        return None;
    }
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(out)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// In-memory session tokens. Lost on restart.
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn issue(&self, username: &str) -> String {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut sessions = self.lock();
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(
            token.clone(),
            Session {
                username: username.to_string(),
                expires_at,
            },
        );
        token
    }

    /// Returns the live session for `token`, dropping it if expired.
    pub fn validate(&self, token: &str) -> Option<Session> {
        self.validate_at(token, Utc::now())
    }

    fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let mut sessions = self.lock();
        match sessions.get(token).cloned() {
            Some(s) if s.expires_at > now => Some(s),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.lock().remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
