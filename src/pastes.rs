use crate::db::{format_time, parse_time, parse_uuid};
use crate::models::{OwnerName, Paste, PublicPaste};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use uuid::Uuid;

const PASTE_COLUMNS: &str = "id, owner_id, title, content, is_public, created_at, updated_at";

fn paste_from_row(row: &Row<'_>) -> Result<Paste> {
    Ok(Paste {
        id: parse_uuid(0, &row.get::<_, String>(0)?)?,
        owner: parse_uuid(1, &row.get::<_, String>(1)?)?,
        title: row.get(2)?,
        content: row.get(3)?,
        is_public: row.get(4)?,
        created_at: parse_time(5, &row.get::<_, String>(5)?)?,
        updated_at: parse_time(6, &row.get::<_, String>(6)?)?,
    })
}

pub fn insert_paste(conn: &Connection, paste: &Paste) -> Result<()> {
    conn.execute(
        "INSERT INTO pastes (id, owner_id, title, content, is_public, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            paste.id.to_string(),
            paste.owner.to_string(),
            paste.title,
            paste.content,
            paste.is_public,
            format_time(&paste.created_at),
            format_time(&paste.updated_at)
        ],
    )?;
    Ok(())
}

pub fn find_paste(conn: &Connection, id: &Uuid) -> Result<Option<Paste>> {
    conn.query_row(
        &format!("SELECT {PASTE_COLUMNS} FROM pastes WHERE id = ?"),
        [id.to_string()],
        paste_from_row,
    )
    .optional()
}

/// Newest first; rows created at the same instant come back newest-inserted first.
pub fn list_by_owner(conn: &Connection, owner: &Uuid) -> Result<Vec<Paste>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PASTE_COLUMNS} FROM pastes WHERE owner_id = ? ORDER BY created_at DESC, rowid DESC"
    ))?;
    let pastes = stmt.query_map([owner.to_string()], paste_from_row)?;
    pastes.collect()
}

/// Writes the editable fields of `paste` back. Returns false if the row is gone.
pub fn update_paste(conn: &Connection, paste: &Paste) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE pastes SET title = ?, content = ?, is_public = ?, updated_at = ? WHERE id = ?",
        params![
            paste.title,
            paste.content,
            paste.is_public,
            format_time(&paste.updated_at),
            paste.id.to_string()
        ],
    )?;
    Ok(updated > 0)
}

pub fn delete_paste(conn: &Connection, id: &Uuid) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM pastes WHERE id = ?", [id.to_string()])?;
    Ok(deleted > 0)
}

pub fn list_public(conn: &Connection, limit: usize) -> Result<Vec<PublicPaste>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, u.username, p.title, p.content, p.is_public, p.created_at, p.updated_at
         FROM pastes p
         JOIN users u ON u.id = p.owner_id
         WHERE p.is_public = 1
         ORDER BY p.created_at DESC, p.rowid DESC
         LIMIT ?",
    )?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let pastes = stmt.query_map([limit], |row| {
        Ok(PublicPaste {
            id: parse_uuid(0, &row.get::<_, String>(0)?)?,
            owner: OwnerName {
                username: row.get(1)?,
            },
            title: row.get(2)?,
            content: row.get(3)?,
            is_public: row.get(4)?,
            created_at: parse_time(5, &row.get::<_, String>(5)?)?,
            updated_at: parse_time(6, &row.get::<_, String>(6)?)?,
        })
    })?;
    pastes.collect()
}
