//! Credentials, bearer tokens and the request guard.

use crate::config::Config;
use crate::db::{format_time, parse_time, parse_uuid, DbConnection};
use crate::error::{AppError, FieldError};
use crate::models::{Caller, Credentials, User};
use crate::users;
use crate::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use bcrypt::{hash, verify, BcryptError};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

const TOKEN_LEN: usize = 32;
const MIN_PASSWORD_LEN: usize = 6;

pub fn hash_password(password: &str, cost: u32) -> Result<String, BcryptError> {
    hash(password, cost)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    verify(password, hash).unwrap_or(false)
}

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn expiry_cutoff(ttl_hours: i64) -> Option<DateTime<Utc>> {
    Duration::try_hours(ttl_hours).and_then(|ttl| Utc::now().checked_sub_signed(ttl))
}

/// Issues a new token for `user_id` and drops the user's tokens that have
/// outlived `ttl_hours`.
pub fn create_auth_token(
    conn: &Connection,
    user_id: &Uuid,
    ttl_hours: i64,
) -> Result<String, rusqlite::Error> {
    if let Some(cutoff) = expiry_cutoff(ttl_hours) {
        let purged = conn.execute(
            "DELETE FROM auth_tokens WHERE user_id = ? AND created_at <= ?",
            params![user_id.to_string(), format_time(&cutoff)],
        )?;
        if purged > 0 {
            tracing::debug!(%user_id, purged, "purged expired tokens");
        }
    }

    let token = generate_token();
    conn.execute(
        "INSERT INTO auth_tokens (token, user_id, created_at) VALUES (?, ?, ?)",
        params![token, user_id.to_string(), format_time(&Utc::now())],
    )?;
    Ok(token)
}

/// Resolves a token to its user. Unknown tokens, expired tokens and tokens
/// whose user has disappeared all yield `None`. Expired tokens are deleted.
pub fn verify_auth_token(
    conn: &Connection,
    token: &str,
    ttl_hours: i64,
) -> Result<Option<User>, rusqlite::Error> {
    let found = conn
        .query_row(
            "SELECT t.user_id, t.created_at FROM auth_tokens t WHERE t.token = ?",
            [token],
            |row| {
                let user_id = parse_uuid(0, &row.get::<_, String>(0)?)?;
                let issued_at = parse_time(1, &row.get::<_, String>(1)?)?;
                Ok((user_id, issued_at))
            },
        )
        .optional()?;

    let Some((user_id, issued_at)) = found else {
        return Ok(None);
    };
    if expiry_cutoff(ttl_hours).is_some_and(|cutoff| issued_at <= cutoff) {
        conn.execute("DELETE FROM auth_tokens WHERE token = ?", [token])?;
        tracing::debug!(%user_id, "rejected expired token");
        return Ok(None);
    }
    users::find_by_id(conn, &user_id)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Extractor that rejects the request unless it carries a valid bearer token.
pub struct AuthUser(pub Caller);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthenticated("Not authorized, no token".to_string()))?;

        let ttl_hours = state.config.token_ttl_hours;
        let user = verify_auth_token(&*state.db.lock().await, token, ttl_hours)?
            .ok_or_else(|| AppError::Unauthenticated("Not authorized, token failed".to_string()))?;

        Ok(Self(user.into()))
    }
}

fn validate_registration(credentials: &Credentials) -> Result<String, AppError> {
    let username = credentials.username.trim();
    let mut errors = Vec::new();
    if username.is_empty() {
        errors.push(FieldError::new("username", "Username is required"));
    }
    if credentials.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if errors.is_empty() {
        Ok(username.to_string())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Runs bcrypt on the blocking pool.
async fn hash_blocking(password: String, cost: u32) -> Result<String, AppError> {
    Ok(tokio::task::spawn_blocking(move || hash_password(&password, cost)).await??)
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, AppError> {
    Ok(tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?)
}

pub async fn register(
    db: &DbConnection,
    config: &Config,
    credentials: Credentials,
) -> Result<(String, Caller), AppError> {
    let username = validate_registration(&credentials)?;
    let user = User {
        id: Uuid::new_v4(),
        username,
        password_hash: hash_blocking(credentials.password, config.bcrypt_cost).await?,
        created_at: Utc::now(),
    };

    let conn = db.lock().await;
    if let Err(err) = users::insert_user(&conn, &user) {
        return Err(if users::is_constraint_violation(&err) {
            AppError::BadRequest("User already exists".to_string())
        } else {
            err.into()
        });
    }
    let token = create_auth_token(&conn, &user.id, config.token_ttl_hours)?;
    tracing::info!(user_id = %user.id, "registered user");
    Ok((token, user.into()))
}

pub async fn login(
    db: &DbConnection,
    config: &Config,
    credentials: Credentials,
) -> Result<(String, Caller), AppError> {
    let invalid = || AppError::Unauthenticated("Invalid credentials".to_string());

    let found = {
        let conn = db.lock().await;
        users::find_by_username(&conn, credentials.username.trim())?
    };
    let user = found.ok_or_else(invalid)?;

    if !verify_blocking(credentials.password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    let token = create_auth_token(&*db.lock().await, &user.id, config.token_ttl_hours)?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok((token, user.into()))
}
