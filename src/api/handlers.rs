//! 陣取りAPIハンドラー

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use super::dto::{
    ChooseColorRequest, ColorsResponse, CreateGameRequest, ErrorResponse, GameResponse,
    HealthResponse, SaveResponse, SaveSlotRequest, SessionListResponse, TurnResponse,
};
use super::service::TerritoryService;

type HandlerError = (StatusCode, Json<ErrorResponse>);

pub async fn create_game(
    State(service): State<Arc<TerritoryService>>,
    Json(request): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameResponse>), HandlerError> {
    match service.create_game(request) {
        Ok(response) => Ok((StatusCode::CREATED, Json(response))),
        Err(err) => Err(err.into()),
    }
}

pub async fn get_game_state(
    State(service): State<Arc<TerritoryService>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<GameResponse>, HandlerError> {
    match service.get_game_state(game_id) {
        Ok(response) => Ok(Json(response)),
        Err(err) => Err(err.into()),
    }
}

pub async fn choose_color(
    State(service): State<Arc<TerritoryService>>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<ChooseColorRequest>,
) -> Result<Json<TurnResponse>, HandlerError> {
    match service.choose_color(game_id, request.color) {
        Ok(response) => Ok(Json(response)),
        Err(err) => Err(err.into()),
    }
}

pub async fn pause_game(
    State(service): State<Arc<TerritoryService>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<GameResponse>, HandlerError> {
    service.pause(game_id).map(Json).map_err(Into::into)
}

pub async fn resume_game(
    State(service): State<Arc<TerritoryService>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<GameResponse>, HandlerError> {
    service.resume(game_id).map(Json).map_err(Into::into)
}

pub async fn reset_game(
    State(service): State<Arc<TerritoryService>>,
    Path(game_id): Path<Uuid>,
) -> Result<Json<GameResponse>, HandlerError> {
    service.reset(game_id).map(Json).map_err(Into::into)
}

pub async fn save_game(
    State(service): State<Arc<TerritoryService>>,
    Path(game_id): Path<Uuid>,
    Query(request): Query<SaveSlotRequest>,
) -> Result<Json<SaveResponse>, HandlerError> {
    service.save(game_id, request.slot).map(Json).map_err(Into::into)
}

pub async fn load_game(
    State(service): State<Arc<TerritoryService>>,
    Path(game_id): Path<Uuid>,
    Query(request): Query<SaveSlotRequest>,
) -> Result<Json<GameResponse>, HandlerError> {
    service.load(game_id, request.slot).map(Json).map_err(Into::into)
}

pub async fn delete_game(
    State(service): State<Arc<TerritoryService>>,
    Path(game_id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    match service.delete_game(game_id) {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(err) => Err(err.into()),
    }
}

pub async fn get_sessions(State(service): State<Arc<TerritoryService>>) -> Json<SessionListResponse> {
    Json(service.list_sessions())
}

pub async fn get_colors() -> Json<ColorsResponse> {
    Json(ColorsResponse::new())
}

pub async fn health_check(State(service): State<Arc<TerritoryService>>) -> Json<HealthResponse> {
    let manager = service.session_manager();
    let mut details = BTreeMap::new();
    details.insert("max_sessions", manager.max_sessions().to_string());
    details.insert("version", env!("CARGO_PKG_VERSION").to_string());

    Json(HealthResponse {
        status: "ok",
        sessions: manager.session_count(),
        details,
    })
}
