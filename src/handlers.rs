use crate::auth::{self, AuthUser};
use crate::error::AppError;
use crate::models::{
    AuthResponse, CreatePasteRequest, Credentials, Paste, PasteListResponse, PasteResponse,
    PublicPaste, UpdatePasteRequest,
};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "message": "NoteSaver API is running" }))
}

pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(credentials) = payload?;
    let (token, user) = auth::register(&state.db, &state.config, credentials).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            token,
            user,
        }),
    ))
}

pub async fn login_user(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(credentials) = payload?;
    let (token, user) = auth::login(&state.db, &state.config, credentials).await?;
    Ok(Json(AuthResponse {
        success: true,
        token,
        user,
    }))
}

pub async fn current_user(AuthUser(caller): AuthUser) -> Json<Value> {
    Json(json!({ "success": true, "user": caller }))
}

pub async fn create_paste(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    payload: Result<Json<CreatePasteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PasteResponse>), AppError> {
    let Json(req) = payload?;
    let paste = state.pastes.create(req, &caller).await?;
    Ok((
        StatusCode::CREATED,
        Json(PasteResponse {
            success: true,
            paste,
        }),
    ))
}

pub async fn list_pastes(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<PasteListResponse<Paste>>, AppError> {
    let pastes = state.pastes.list_mine(&caller).await?;
    Ok(Json(PasteListResponse::new(pastes)))
}

pub async fn get_paste(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PasteResponse>, AppError> {
    let paste = state.pastes.get(&id, &caller).await?;
    Ok(Json(PasteResponse {
        success: true,
        paste,
    }))
}

pub async fn update_paste(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePasteRequest>, JsonRejection>,
) -> Result<Json<PasteResponse>, AppError> {
    let Json(req) = payload?;
    let paste = state.pastes.update(&id, req, &caller).await?;
    Ok(Json(PasteResponse {
        success: true,
        paste,
    }))
}

pub async fn delete_paste(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.pastes.delete(&id, &caller).await?;
    Ok(Json(
        json!({ "success": true, "message": "Paste deleted successfully" }),
    ))
}

/// Public feed. Still requires a valid token, like every other paste route.
pub async fn list_public_pastes(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
) -> Result<Json<PasteListResponse<PublicPaste>>, AppError> {
    let pastes = state.pastes.list_public().await?;
    Ok(Json(PasteListResponse::new(pastes)))
}
