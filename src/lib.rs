pub mod assets;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod validation;

use std::path::Path;
use std::sync::Arc;

use axum::{routing::get, Router};
use db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Development only: serve frontend files from here before the embedded copies.
    pub frontend_dir: Option<Arc<Path>>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/todos",
            get(handlers::api::list_all_todos).post(handlers::api::create_new_todo),
        )
        .route(
            "/api/todos/{id}",
            get(handlers::api::get_single_todo)
                .put(handlers::api::update_existing_todo)
                .delete(handlers::api::delete_existing_todo),
        )
        .route("/static/{*path}", get(handlers::web::static_file))
        .fallback(handlers::web::index)
        .layer(
            tower::ServiceBuilder::new()
                .layer(tower_http::trace::TraceLayer::new_for_http())
                .layer(tower_http::compression::CompressionLayer::new()),
        )
        .with_state(state)
}
