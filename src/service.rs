//! Paste operations with their ownership and visibility rules.
//!
//! Every read or mutation of an existing paste goes through [`can_access`];
//! handlers never compare owners themselves.

use crate::db::DbConnection;
use crate::error::{AppError, FieldError};
use crate::models::{Caller, CreatePasteRequest, Paste, PublicPaste, UpdatePasteRequest};
use crate::pastes;
use chrono::{Duration, Utc};
use uuid::Uuid;

/// Size of the public feed.
pub const PUBLIC_FEED_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Owners may do anything with their pastes; everyone else may only read public ones.
pub fn can_access(paste: &Paste, caller: &Caller, access: Access) -> bool {
    paste.owner == caller.id || (access == Access::Read && paste.is_public)
}

fn authorize(paste: &Paste, caller: &Caller, access: Access) -> Result<(), AppError> {
    if can_access(paste, caller, access) {
        Ok(())
    } else {
        tracing::debug!(paste_id = %paste.id, caller = %caller.id, ?access, "access denied");
        Err(AppError::Forbidden)
    }
}

/// Validated title and content, ready to be written.
struct PasteFields {
    title: String,
    content: String,
}

fn validate(
    title: Option<String>,
    content: Option<String>,
    max_size: usize,
) -> (Vec<FieldError>, PasteFields) {
    let mut errors = Vec::new();
    let title = title.unwrap_or_default();
    let content = content.unwrap_or_default();

    if title.trim().is_empty() {
        errors.push(FieldError::new("title", "Title is required"));
    }
    if content.trim().is_empty() {
        errors.push(FieldError::new("content", "Content is required"));
    } else if content.len() > max_size {
        errors.push(FieldError::new(
            "content",
            format!("Content exceeds maximum of {max_size} bytes"),
        ));
    }
    (errors, PasteFields { title, content })
}

/// Ids that are not UUIDs can never name a paste.
fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::NotFound)
}

#[derive(Clone)]
pub struct PasteService {
    db: DbConnection,
    max_paste_size: usize,
}

impl PasteService {
    pub fn new(db: DbConnection, max_paste_size: usize) -> Self {
        Self { db, max_paste_size }
    }

    pub async fn create(
        &self,
        req: CreatePasteRequest,
        caller: &Caller,
    ) -> Result<Paste, AppError> {
        let (errors, fields) = validate(req.title, req.content, self.max_paste_size);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let now = Utc::now();
        let paste = Paste {
            id: Uuid::new_v4(),
            title: fields.title,
            content: fields.content,
            owner: caller.id,
            is_public: req.is_public.unwrap_or(false),
            created_at: now,
            updated_at: now,
        };
        pastes::insert_paste(&*self.db.lock().await, &paste)?;
        tracing::info!(paste_id = %paste.id, owner = %caller.id, "created paste");
        Ok(paste)
    }

    pub async fn list_mine(&self, caller: &Caller) -> Result<Vec<Paste>, AppError> {
        Ok(pastes::list_by_owner(&*self.db.lock().await, &caller.id)?)
    }

    pub async fn get(&self, id: &str, caller: &Caller) -> Result<Paste, AppError> {
        let id = parse_id(id)?;
        let paste = pastes::find_paste(&*self.db.lock().await, &id)?.ok_or(AppError::NotFound)?;
        authorize(&paste, caller, Access::Read)?;
        Ok(paste)
    }

    /// Replaces title, content and visibility. All three must be supplied.
    pub async fn update(
        &self,
        id: &str,
        req: UpdatePasteRequest,
        caller: &Caller,
    ) -> Result<Paste, AppError> {
        let (mut errors, fields) = validate(req.title, req.content, self.max_paste_size);
        if req.is_public.is_none() {
            errors.push(FieldError::new("isPublic", "isPublic is required"));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        let id = parse_id(id)?;

        let conn = self.db.lock().await;
        let mut paste = pastes::find_paste(&conn, &id)?.ok_or(AppError::NotFound)?;
        authorize(&paste, caller, Access::Write)?;

        let now = Utc::now();
        paste.title = fields.title;
        paste.content = fields.content;
        paste.is_public = req.is_public.unwrap_or(paste.is_public);
        // A coarse clock must still move updated_at forward.
        paste.updated_at = if now > paste.updated_at {
            now
        } else {
            paste.updated_at + Duration::nanoseconds(1)
        };

        if !pastes::update_paste(&conn, &paste)? {
            return Err(AppError::NotFound);
        }
        tracing::info!(paste_id = %paste.id, "updated paste");
        Ok(paste)
    }

    pub async fn delete(&self, id: &str, caller: &Caller) -> Result<(), AppError> {
        let id = parse_id(id)?;

        let conn = self.db.lock().await;
        let paste = pastes::find_paste(&conn, &id)?.ok_or(AppError::NotFound)?;
        authorize(&paste, caller, Access::Write)?;

        if !pastes::delete_paste(&conn, &id)? {
            return Err(AppError::NotFound);
        }
        tracing::info!(paste_id = %id, "deleted paste");
        Ok(())
    }

    /// The most recent public pastes, capped at [`PUBLIC_FEED_LIMIT`].
    pub async fn list_public(&self) -> Result<Vec<PublicPaste>, AppError> {
        Ok(pastes::list_public(&*self.db.lock().await, PUBLIC_FEED_LIMIT)?)
    }
}
