// src/routes/mod.rs
pub mod chat;
pub mod profile;

use crate::{config::Mode, state::SharedState};
use axum::{
    Router,
    routing::{any, get},
};
use chat::{chat_proxy_handler, dev_rewrite_handler};
use profile::user_profile_handler;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(mode: Mode) -> Router<SharedState> {
    // Method checks live in the handlers so every verb gets the JSON error body.
    let mut router = Router::new()
        .route("/api/chat", any(chat_proxy_handler))
        .route("/api/user-profile", any(user_profile_handler))
        .route("/health", get(|| async { "OK" }));

    if mode == Mode::Development {
        router = router.route("/chatapi/{*path}", any(dev_rewrite_handler));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
}
