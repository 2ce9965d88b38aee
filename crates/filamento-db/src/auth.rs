//! # Authentication
//!
//! The session provider contract and its local implementation over the
//! `users` table.
//!
//! ## Sign-in Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sign_in(email, password)                                               │
//! │     │                                                                   │
//! │     ├── users.find_credentials(email) ── none ──► InvalidCredentials    │
//! │     ├── argon2 verify(password, hash) ── fail ──► InvalidCredentials    │
//! │     ├── is_active? ────────────────────── no ───► InactiveUser          │
//! │     ├── HS256 token { sub, email, iat, exp = now + lifetime }           │
//! │     ├── users.touch_last_login                                          │
//! │     └── current session := Session { user_id, token, expires_at }      │
//! │                                                                         │
//! │  get_session()                                                          │
//! │     └── decode token, compare exp with the injected clock               │
//! │           └── expired ──► forget session, return None                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::DbError;
use crate::repository::user::{NewUser, UserRepository, DEFAULT_ROLE};
use filamento_core::validation::validate_email;
use filamento_core::ValidationError;

/// Shortest password accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("User account is disabled")]
    InactiveUser,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] DbError),
}

pub type AuthResult<T> = Result<T, AuthError>;

// =============================================================================
// Contract
// =============================================================================

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Session operations the application relies on.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The current session, or `None` when signed out or expired.
    async fn get_session(&self) -> AuthResult<Option<Session>>;

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session>;

    /// Creates an account and signs it in.
    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> AuthResult<Session>;

    async fn sign_out(&self) -> AuthResult<()>;
}

// =============================================================================
// Tokens
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
    jti: String,
}

/// Issues and reads HS256 access tokens. Expiry is judged by the caller's
/// clock, not by the library's.
#[derive(Clone)]
struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenSigner {
    fn new(secret: &str, lifetime: Duration) -> Self {
        TokenSigner {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    fn issue(&self, user_id: &str, email: &str, now: DateTime<Utc>) -> AuthResult<(String, DateTime<Utc>)> {
        let expires_at = now + self.lifetime;
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InvalidToken(format!("failed to sign: {}", e)))?;

        Ok((token, expires_at))
    }

    fn read(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

// =============================================================================
// Passwords
// =============================================================================

fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// =============================================================================
// Local Provider
// =============================================================================

/// [`AuthProvider`] backed by the local `users` table.
pub struct LocalAuthProvider {
    users: UserRepository,
    signer: TokenSigner,
    clock: Arc<dyn Clock>,
    current: RwLock<Option<Session>>,
}

impl LocalAuthProvider {
    pub fn new(
        users: UserRepository,
        jwt_secret: &str,
        token_lifetime: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        LocalAuthProvider {
            users,
            signer: TokenSigner::new(jwt_secret, token_lifetime),
            clock,
            current: RwLock::new(None),
        }
    }

    fn set_current(&self, session: Option<Session>) {
        match self.current.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }

    fn current(&self) -> Option<Session> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn open_session(&self, user_id: &str, email: &str, now: DateTime<Utc>) -> AuthResult<Session> {
        let (access_token, expires_at) = self.signer.issue(user_id, email, now)?;
        let session = Session {
            user_id: user_id.to_string(),
            email: email.to_string(),
            access_token,
            expires_at,
        };
        self.set_current(Some(session.clone()));
        Ok(session)
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn get_session(&self) -> AuthResult<Option<Session>> {
        let Some(session) = self.current() else {
            return Ok(None);
        };

        let now = self.clock.now();
        let expired = match self.signer.read(&session.access_token) {
            Ok(claims) => claims.exp <= now.timestamp(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session token");
                true
            }
        };

        if expired {
            debug!(user_id = %session.user_id, "Session expired");
            self.set_current(None);
            return Ok(None);
        }

        Ok(Some(session))
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        let creds = self
            .users
            .find_credentials(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &creds.password_hash) {
            warn!(email = %email.trim(), "Rejected sign-in");
            return Err(AuthError::InvalidCredentials);
        }

        if !creds.is_active {
            return Err(AuthError::InactiveUser);
        }

        let now = self.clock.now();
        self.users.touch_last_login(&creds.id, now).await?;
        let session = self.open_session(&creds.id, &creds.email, now)?;

        info!(user_id = %creds.id, "Signed in");
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> AuthResult<Session> {
        let email = email.trim();
        validate_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::InvalidFormat {
                field: "password".to_string(),
                reason: format!("must be at least {} characters", MIN_PASSWORD_LEN),
            }
            .into());
        }

        let new_user = NewUser {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            full_name: full_name.trim().to_string(),
            role: DEFAULT_ROLE.to_string(),
        };

        let now = self.clock.now();
        let profile = self.users.insert(&new_user, now).await.map_err(|e| match e {
            DbError::UniqueViolation { .. } => AuthError::EmailTaken(email.to_string()),
            other => AuthError::Store(other),
        })?;

        let session = self.open_session(&profile.id, &profile.email, now)?;
        info!(user_id = %profile.id, "Signed up");
        Ok(session)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        if let Some(session) = self.current() {
            info!(user_id = %session.user_id, "Signed out");
        }
        self.set_current(None);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
