// src/routes/mod.rs
pub mod chat;

use std::path::Path;

use crate::state::SharedState;
use axum::{
    Router,
    response::Html,
    routing::{get, post},
};
use chat::chat_handler;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

const INDEX_HTML: &str = include_str!("../../public/index.html");

pub fn create_router(static_dir: impl AsRef<Path>) -> Router<SharedState> {
    Router::new()
        .route("/", get(index_handler))
        .route("/chat", post(chat_handler))
        .route("/health", get(|| async { "OK" }))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
