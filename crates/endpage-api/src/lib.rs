pub mod auth;
pub mod error;
pub mod media;
pub mod middleware;
pub mod pages;
pub mod users;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use endpage_store::{PageStore, UserStore};

use crate::media::MediaStore;

/// Shared application state, constructed once in `main` and passed by
/// reference to every handler. Configuration is injected here; handlers
/// never read the environment.
pub struct AppStateInner {
    pub users: UserStore,
    pub pages: PageStore,
    pub media: MediaStore,
    pub jwt_secret: String,
    pub max_upload_bytes: u64,
}

pub type AppState = Arc<AppStateInner>;

async fn hello() -> &'static str {
    "Hello World"
}

/// Assemble the full `/api` surface plus static serving of uploads.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api", get(hello))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/upload", post(media::upload))
        .route("/api/pages", get(pages::list_pages))
        .route("/api/pages/top-liked/{n}", get(pages::top_liked))
        .route("/api/pages/{id}", get(pages::get_page))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/api/pages", post(pages::create_page))
        .route("/api/pages/{id}", put(pages::update_page))
        .route("/api/pages/{id}", delete(pages::delete_page))
        .route("/api/pages/{id}/like", post(pages::like_page))
        .route("/api/pages/{id}/unlike", post(pages::unlike_page))
        .route("/api/users", get(users::list_users))
        .route("/api/users/{id}", get(users::get_user))
        .route("/api/users/{id}", put(users::update_user))
        .route("/api/users/{id}", delete(users::delete_user))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state.clone());

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service("/uploads", ServeDir::new(state.media.dir()))
}
