//! Client-side cache of the caller's own pastes.
//!
//! The server stays the source of truth. The cache is rebuilt from a full
//! listing and patched from each successful response: prepend on create,
//! replace by id on update, remove by id on delete. A failed call leaves the
//! list alone and only records the error and a notice.
//!
//! [`AuthState`] keeps the credential sent as `Authorization: Bearer` on every
//! call. Logging out through [`reduce_session`] also empties the paste cache.

use crate::models::{Caller, Paste};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    Create,
    Update,
    Delete,
}

impl Operation {
    fn failure_default(self) -> &'static str {
        match self {
            Operation::Fetch => "Failed to fetch pastes",
            Operation::Create => "Failed to create paste",
            Operation::Update => "Failed to update paste",
            Operation::Delete => "Failed to delete paste",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Short user-facing feedback, shown once and then dropped by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn success(text: &str) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.to_string(),
        }
    }

    fn error(text: &str) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MirrorEvent {
    Started(Operation),
    Loaded(Vec<Paste>),
    Created(Paste),
    Updated(Paste),
    Deleted(Uuid),
    Failed { op: Operation, message: Option<String> },
    ClearError,
    Reset,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasteListState {
    pub pastes: Vec<Paste>,
    pub loading: bool,
    pub error: Option<String>,
    pub notices: Vec<Notice>,
}

impl PasteListState {
    pub fn find(&self, id: &Uuid) -> Option<&Paste> {
        self.pastes.iter().find(|paste| paste.id == *id)
    }

    /// Hands pending notices to the UI.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

pub fn reduce(mut state: PasteListState, event: MirrorEvent) -> PasteListState {
    match event {
        MirrorEvent::Started(_) => {
            state.loading = true;
            state.error = None;
        }
        MirrorEvent::Loaded(pastes) => {
            state.loading = false;
            state.pastes = pastes;
            state.notices.push(Notice::success("Pastes loaded successfully!"));
        }
        MirrorEvent::Created(paste) => {
            state.loading = false;
            state.pastes.insert(0, paste);
            state.notices.push(Notice::success("Paste created successfully!"));
        }
        MirrorEvent::Updated(paste) => {
            state.loading = false;
            if let Some(slot) = state.pastes.iter_mut().find(|p| p.id == paste.id) {
                *slot = paste;
            }
            state.notices.push(Notice::success("Paste updated successfully!"));
        }
        MirrorEvent::Deleted(id) => {
            state.loading = false;
            state.pastes.retain(|paste| paste.id != id);
            state.notices.push(Notice::success("Paste deleted successfully!"));
        }
        MirrorEvent::Failed { op, message } => {
            let message = message.unwrap_or_else(|| op.failure_default().to_string());
            state.loading = false;
            state.notices.push(Notice::error(&message));
            state.error = Some(message);
        }
        MirrorEvent::ClearError => state.error = None,
        MirrorEvent::Reset => {
            state.pastes.clear();
            state.loading = false;
            state.error = None;
        }
    }
    state
}

/// Turns an API error body into the message shown to the user.
pub fn failure_message(op: Operation, body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| op.failure_default())
        .to_string()
}

/// Maps a successful API response body onto the event it produces.
pub fn success_event(
    op: Operation,
    body: &Value,
    target: Option<Uuid>,
) -> Result<MirrorEvent, serde_json::Error> {
    Ok(match op {
        Operation::Fetch => MirrorEvent::Loaded(serde_json::from_value(body["pastes"].clone())?),
        Operation::Create => MirrorEvent::Created(serde_json::from_value(body["paste"].clone())?),
        Operation::Update => MirrorEvent::Updated(serde_json::from_value(body["paste"].clone())?),
        Operation::Delete => MirrorEvent::Deleted(match target {
            Some(id) => id,
            None => serde_json::from_value(body["id"].clone())?,
        }),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    LoginStarted,
    LoginSucceeded { user: Caller, token: String },
    LoginFailed(Option<String>),
    RegisterStarted,
    RegisterSucceeded { user: Caller, token: String },
    RegisterFailed(Option<String>),
    Logout,
    ClearError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<Caller>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub notices: Vec<Notice>,
}

impl AuthState {
    /// Value for the `Authorization` header, if signed in.
    pub fn authorization(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {token}"))
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn sign_in(&mut self, user: Caller, token: String, notice: &str) {
        self.loading = false;
        self.is_authenticated = true;
        self.user = Some(user);
        self.token = Some(token);
        self.notices.push(Notice::success(notice));
    }

    fn fail(&mut self, message: Option<String>, fallback: &str) {
        let message = message.unwrap_or_else(|| fallback.to_string());
        self.loading = false;
        self.notices.push(Notice::error(&message));
        self.error = Some(message);
    }
}

pub fn reduce_auth(mut state: AuthState, event: AuthEvent) -> AuthState {
    match event {
        AuthEvent::LoginStarted | AuthEvent::RegisterStarted => {
            state.loading = true;
            state.error = None;
        }
        AuthEvent::LoginSucceeded { user, token } => {
            state.sign_in(user, token, "Login successful!");
        }
        AuthEvent::RegisterSucceeded { user, token } => {
            state.sign_in(user, token, "Registration successful!");
        }
        AuthEvent::LoginFailed(message) => state.fail(message, "Login failed"),
        AuthEvent::RegisterFailed(message) => state.fail(message, "Registration failed"),
        AuthEvent::Logout => {
            state.user = None;
            state.token = None;
            state.is_authenticated = false;
            state.notices.push(Notice::success("Logged out successfully"));
        }
        AuthEvent::ClearError => state.error = None,
    }
    state
}

/// Reads `{token, user}` from a register or login response.
pub fn auth_success(body: &Value) -> Result<(Caller, String), serde_json::Error> {
    let user = serde_json::from_value(body["user"].clone())?;
    let token = serde_json::from_value(body["token"].clone())?;
    Ok((user, token))
}

/// Everything the client caches for one signed-in user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    pub auth: AuthState,
    pub pastes: PasteListState,
}

pub fn reduce_session(state: ClientState, event: AuthEvent) -> ClientState {
    let logout = event == AuthEvent::Logout;
    let auth = reduce_auth(state.auth, event);
    let pastes = if logout {
        reduce(state.pastes, MirrorEvent::Reset)
    } else {
        state.pastes
    };
    ClientState { auth, pastes }
}
