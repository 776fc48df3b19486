//! services/api/src/adapters/identity.rs
//!
//! The self-hosted identity store: accounts, one-time login codes and browser
//! sessions, all kept in Postgres. Implements the `IdentityService` port.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::Rng;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use studio_core::domain::{AuthSession, User};
use studio_core::ports::{IdentityService, PortError, PortResult};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adapters::mailer::CodeMailer;

/// What a caller is told for any wrong, used or expired code.
pub(crate) const INVALID_CODE: &str = "Token has expired or is invalid";

/// Guesses allowed against one code before it stops verifying.
pub(crate) const MAX_CODE_ATTEMPTS: i32 = 5;

//=========================================================================================
// Code Helpers (shared with the in-memory store)
//=========================================================================================

pub(crate) fn normalize_email(email: &str) -> PortResult<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(PortError::Unexpected(format!("Invalid email address '{email}'")));
    }
    Ok(email)
}

/// A uniformly random six-digit code, zero padded.
pub(crate) fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}

pub(crate) fn hash_code(code: &str) -> PortResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(code.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PortError::Unexpected(format!("Failed to hash code: {e}")))
}

pub(crate) fn code_matches(code: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(code.trim().as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!("Stored code hash is unreadable: {:?}", e);
            false
        }
    }
}

//=========================================================================================
// The Adapter
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
        }
    }
}

#[derive(Clone)]
pub struct PgIdentityAdapter {
    pool: PgPool,
    mailer: Arc<dyn CodeMailer>,
    otp_ttl: Duration,
    session_ttl: Duration,
}

impl PgIdentityAdapter {
    pub fn new(
        pool: PgPool,
        mailer: Arc<dyn CodeMailer>,
        otp_ttl: Duration,
        session_ttl: Duration,
    ) -> Self {
        Self {
            pool,
            mailer,
            otp_ttl,
            session_ttl,
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

#[async_trait]
impl IdentityService for PgIdentityAdapter {
    async fn get_user_by_session(&self, session_token: &str) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT u.id, u.email FROM auth_sessions s JOIN users u ON u.id = s.user_id \
             WHERE s.id = $1 AND s.expires_at > now()",
        )
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn send_one_time_code(&self, email: &str) -> PortResult<()> {
        let email = normalize_email(email)?;

        // Create-or-reuse: the unique index on email makes this idempotent.
        sqlx::query("INSERT INTO users (id, email) VALUES ($1, $2) ON CONFLICT (email) DO NOTHING")
            .bind(Uuid::new_v4())
            .bind(&email)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        let code = generate_code();
        sqlx::query(
            "INSERT INTO otp_codes (id, email, code_hash, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(hash_code(&code)?)
        .bind(Utc::now() + self.otp_ttl)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        self.mailer.send_code(&email, &code).await.map_err(|e| {
            error!(email = %email, "Failed to deliver sign-in code: {:?}", e);
            PortError::Unexpected(format!("Failed to send code: {e}"))
        })?;
        info!(email = %email, "Sign-in code issued");
        Ok(())
    }

    async fn verify_one_time_code(&self, email: &str, code: &str) -> PortResult<User> {
        let email = normalize_email(email)?;

        // Each guess spends one attempt on the latest code, right or wrong.
        let code_hash = sqlx::query_scalar::<_, String>(
            "UPDATE otp_codes SET attempts = attempts + 1 \
             WHERE id = (SELECT id FROM otp_codes WHERE email = $1 ORDER BY created_at DESC LIMIT 1) \
             AND expires_at > now() AND attempts < $2 \
             RETURNING code_hash",
        )
        .bind(&email)
        .bind(MAX_CODE_ATTEMPTS)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::InvalidToken(INVALID_CODE.to_string()))?;

        if !code_matches(code, &code_hash) {
            warn!(email = %email, "Wrong sign-in code");
            return Err(PortError::InvalidToken(INVALID_CODE.to_string()));
        }

        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query("DELETE FROM otp_codes WHERE email = $1")
            .bind(&email)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        let user = sqlx::query_as::<_, UserRecord>(
            "UPDATE users SET email_confirmed_at = COALESCE(email_confirmed_at, now()) \
             WHERE email = $1 RETURNING id, email",
        )
        .bind(&email)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::InvalidToken(INVALID_CODE.to_string()),
            other => unexpected(other),
        })?
        .to_domain();
        sqlx::query(
            "INSERT INTO profiles (id, email, role) VALUES ($1, $2, 'user') \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(user.id)
        .bind(&user.email)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;

        info!(user_id = %user.id, "One-time code verified");
        Ok(user)
    }

    async fn create_session(&self, user_id: Uuid) -> PortResult<AuthSession> {
        let session = AuthSession {
            token: Uuid::new_v4().to_string(),
            user_id,
            expires_at: Utc::now() + self.session_ttl,
        };
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&session.token)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(session)
    }

    async fn sign_out(&self, session_token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_token)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn hashed_code_verifies_only_itself() {
        let hash = hash_code("123456").unwrap();
        assert!(code_matches("123456", &hash));
        assert!(code_matches(" 123456 ", &hash));
        assert!(!code_matches("654321", &hash));
        assert!(!code_matches("123456", "not-a-hash"));
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Jo@Example.COM ").unwrap(), "jo@example.com");
        assert!(normalize_email("nobody").is_err());
        assert!(normalize_email("   ").is_err());
    }
}
