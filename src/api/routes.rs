//! 陣取りAPIルート

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::middleware::{cors, logging};
use super::service::TerritoryService;

pub fn create_router(service: Arc<TerritoryService>) -> Router {
    Router::new()
        .route("/api/games", post(handlers::create_game).get(handlers::get_sessions))
        .route("/api/colors", get(handlers::get_colors))

        .route("/api/games/:game_id", get(handlers::get_game_state).delete(handlers::delete_game))
        .route("/api/games/:game_id/color", put(handlers::choose_color))
        .route("/api/games/:game_id/pause", post(handlers::pause_game))
        .route("/api/games/:game_id/resume", post(handlers::resume_game))
        .route("/api/games/:game_id/reset", post(handlers::reset_game))
        .route("/api/games/:game_id/save", post(handlers::save_game))
        .route("/api/games/:game_id/load", post(handlers::load_game))

        .route("/health", get(handlers::health_check))
        .with_state(service)
        .layer(middleware::from_fn(cors))
        .layer(middleware::from_fn(logging))
}
