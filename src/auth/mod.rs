//! Staff accounts and session tokens.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Role, Session, User};

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Password(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| Error::Password(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Create an account. Usernames are case-sensitive and trimmed.
pub fn create_user(db: &Database, username: &str, password: &str, role: Role) -> Result<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::validation("username is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let user = db.insert_user(username, &hash_password(password)?, role)?;
    info!(username, role = %role, "user created");
    Ok(user)
}

/// Check credentials and open a session lasting `session_hours`.
pub fn login(db: &Database, username: &str, password: &str, session_hours: i64) -> Result<(Session, User)> {
    let rejected = || Error::Unauthorized("invalid username or password".to_string());
    let Some(user) = db.find_user(username.trim())? else {
        warn!(username, "login for unknown user");
        return Err(rejected());
    };
    if !verify_password(password, &user.password_hash)? {
        warn!(username, "login with wrong password");
        return Err(rejected());
    }

    let now = Utc::now();
    let expires_at = Duration::try_hours(session_hours)
        .filter(|d| *d > Duration::zero())
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| Error::validation(format!("invalid session length: {session_hours} hours")))?;
    let session = Session {
        token: uuid::Uuid::new_v4().to_string(),
        user_id: user.id,
        created_at: now,
        expires_at,
    };
    db.insert_session(&session)?;
    info!(username = %user.username, "logged in");
    Ok((session, user))
}

pub fn logout(db: &Database, token: &str) -> Result<()> {
    if db.delete_session(token)? {
        debug!("session closed");
    }
    Ok(())
}

/// Resolve a session token to its user, dropping expired sessions on the way.
pub fn authenticate(db: &Database, token: &str) -> Result<User> {
    let now = Utc::now();
    let purged = db.purge_expired_sessions(now)?;
    if purged > 0 {
        debug!(purged, "expired sessions removed");
    }
    let session = db
        .get_session(token)?
        .filter(|s| !s.is_expired(now))
        .ok_or_else(|| Error::Unauthorized("session expired or missing".to_string()))?;
    db.get_user(session.user_id)?
        .ok_or_else(|| Error::Unauthorized("session user no longer exists".to_string()))
}
