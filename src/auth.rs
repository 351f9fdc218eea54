//! Email/password accounts and bearer-token sessions.
//!
//! Passwords are stored as Argon2id PHC strings. Access tokens are random
//! UUIDs handed to the client once; the database only keeps their SHA-256
//! digest.

use crate::error::{AppError, AppResult};
use crate::model::{Principal, User};
use crate::repo::users::{self, PROVIDER_EMAIL};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use sha2::{Digest, Sha256};

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("invalid password hash format: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn issue_token(conn: &Connection, user_id: &str, email: &str) -> AppResult<String> {
    let token = uuid::Uuid::new_v4().to_string();
    users::insert_session(conn, &token_digest(&token), user_id, email)?;
    Ok(token)
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub date_of_birth: Option<NaiveDate>,
}

/// Creates the user and its email credential, then signs the user in.
pub fn register(conn: &Connection, reg: &Registration) -> AppResult<String> {
    if reg.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_param(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    let tx = conn.unchecked_transaction()?;
    if users::find_auth(&tx, &reg.email, PROVIDER_EMAIL)?.is_some() {
        return Err(AppError::Conflict("email already registered".to_string()));
    }
    let user = users::insert_user(&tx, &reg.display_name, reg.date_of_birth)?;
    let hash = hash_password(&reg.password)?;
    users::insert_auth(&tx, &user.id, &reg.email, &hash, PROVIDER_EMAIL)?;
    let token = issue_token(&tx, &user.id, &reg.email)?;
    tx.commit()?;
    tracing::info!(user_id = %user.id, "teacher registered");
    Ok(token)
}

pub fn login(conn: &Connection, email: &str, password: &str) -> AppResult<String> {
    let denied = || AppError::Unauthorized("invalid email or password".to_string());
    let Some(row) = users::find_auth(conn, email, PROVIDER_EMAIL)? else {
        tracing::debug!("login for unknown email");
        return Err(denied());
    };
    let Some(hash) = row.credential.as_deref() else {
        return Err(denied());
    };
    if !verify_password(password, hash)? {
        tracing::warn!(user_id = %row.user_id, "password mismatch");
        return Err(denied());
    }
    issue_token(conn, &row.user_id, &row.identifier)
}

pub fn logout(conn: &Connection, token: &str) -> AppResult<()> {
    users::delete_session(conn, &token_digest(token))?;
    Ok(())
}

/// Maps a presented token to the teacher it belongs to.
pub fn resolve_principal(conn: &Connection, token: Option<&str>) -> AppResult<Principal> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing access token".to_string()))?;
    let (user_id, email) = users::find_session(conn, &token_digest(token))?
        .ok_or_else(|| AppError::Unauthorized("invalid or expired access token".to_string()))?;
    Ok(Principal { user_id, email })
}

pub fn profile(conn: &Connection, principal: &Principal) -> AppResult<User> {
    users::get(conn, &principal.user_id)
}
