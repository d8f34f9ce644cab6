//! NoteSaver: a small paste-sharing API with per-user ownership and public pastes.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod mirror;
pub mod models;
pub mod pastes;
pub mod service;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use db::DbConnection;
pub use error::AppError;
pub use service::PasteService;

#[derive(Clone)]
pub struct AppState {
    pub db: DbConnection,
    pub config: Arc<Config>,
    pub pastes: PasteService,
}

impl AppState {
    pub fn new(config: Config, db: DbConnection) -> Self {
        let pastes = PasteService::new(db.clone(), config.max_paste_size);
        Self {
            db,
            config: Arc::new(config),
            pastes,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let body_limit = state.config.body_limit();

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/auth/register", post(handlers::register_user))
        .route("/api/auth/login", post(handlers::login_user))
        .route("/api/auth/me", get(handlers::current_user))
        .route(
            "/api/pastes",
            get(handlers::list_pastes).post(handlers::create_paste),
        )
        .route("/api/pastes/public/all", get(handlers::list_public_pastes))
        .route(
            "/api/pastes/:id",
            get(handlers::get_paste)
                .put(handlers::update_paste)
                .delete(handlers::delete_paste),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
