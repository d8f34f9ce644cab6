use crate::db::{format_time, parse_time, parse_uuid};
use crate::models::User;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Result, Row};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, password_hash, created_at";

fn user_from_row(row: &Row<'_>) -> Result<User> {
    Ok(User {
        id: parse_uuid(0, &row.get::<_, String>(0)?)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: parse_time(3, &row.get::<_, String>(3)?)?,
    })
}

pub fn insert_user(conn: &Connection, user: &User) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, ?, ?)",
        params![
            user.id.to_string(),
            user.username,
            user.password_hash,
            format_time(&user.created_at)
        ],
    )?;
    Ok(())
}

pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"),
        [username],
        user_from_row,
    )
    .optional()
}

pub fn find_by_id(conn: &Connection, id: &Uuid) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
        [id.to_string()],
        user_from_row,
    )
    .optional()
}

/// True when the error came from a UNIQUE or other constraint.
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _) if inner.code == ErrorCode::ConstraintViolation
    )
}
