//! 陣取りAPI データ転送オブジェクト (DTO)

use axum::{http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{GameError, PersistenceError};
use crate::game::{Color, GameState, IgnoredReason, Owner, Status, Turn, TurnOutcome, TurnState};
use crate::session::SessionSummary as ManagerSessionSummary;

/// 省略したフィールドはサーバー設定の値を使う
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateGameRequest {
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ChooseColorRequest {
    pub color: Color,
}

/// 保存・読み込みのスロット指定
/// 省略時はゲームIDをスロット名に使う
#[derive(Debug, Default, Deserialize)]
pub struct SaveSlotRequest {
    pub slot: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CellView {
    pub owner: Owner,
    pub color: Color,
}

#[derive(Debug, Serialize)]
pub struct TerritoryView {
    pub player_percent: f32,
    pub ai_percent: f32,
    pub player_text: String,
    pub ai_text: String,
}

impl TerritoryView {
    fn from_game(game: &GameState) -> Self {
        let player_percent = game.board().occupied_by(Owner::Player) * 100.0;
        let ai_percent = game.board().occupied_by(Owner::AI) * 100.0;

        Self {
            player_percent,
            ai_percent,
            player_text: format!("player: {:.1}%", player_percent),
            ai_text: format!("ai: {:.1}%", ai_percent),
        }
    }
}

/// 色選択ボタン1つ分の状態
#[derive(Debug, Serialize)]
pub struct ColorOption {
    pub color: Color,
    pub rgb: [u8; 3],
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct BannerView {
    pub visible: bool,
    pub opacity: f32,
    pub message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct GameResponse {
    pub game_id: Uuid,
    pub width: usize,
    pub height: usize,
    pub grid: Vec<Vec<CellView>>,
    pub status: Status,
    pub turn_state: TurnState,
    pub player_color: Color,
    pub ai_color: Color,
    pub in_contact: bool,
    pub territory: TerritoryView,
    pub colors: Vec<ColorOption>,
    pub banner: BannerView,
    pub ai_name: &'static str,
    pub turn_count: usize,
}

impl GameResponse {
    pub fn from_game(game: &GameState, now: DateTime<Utc>) -> Self {
        let board = game.board();
        let grid = board
            .cells()
            .chunks(board.width())
            .map(|row| {
                row.iter()
                    .map(|cell| CellView {
                        owner: cell.owner,
                        color: cell.color,
                    })
                    .collect()
            })
            .collect();

        let in_contact = board.is_player_and_ai_in_contact();
        let active = game.is_active() && game.status().is_running();

        // プレイヤーの現在色と、接触中のAIの色は選べない
        let colors = Color::ALL
            .iter()
            .map(|&color| ColorOption {
                color,
                rgb: color.rgb(),
                enabled: active
                    && color != game.player_color()
                    && !(in_contact && color == game.ai_color()),
            })
            .collect();

        let banner = game.banner();

        Self {
            game_id: game.id,
            width: board.width(),
            height: board.height(),
            grid,
            status: game.status(),
            turn_state: game.turn_state(),
            player_color: game.player_color(),
            ai_color: game.ai_color(),
            in_contact,
            territory: TerritoryView::from_game(game),
            colors,
            banner: BannerView {
                visible: banner.visible(),
                opacity: banner.opacity(now),
                message: banner.visible().then(|| banner_message(game.status())).flatten(),
            },
            ai_name: game.ai_name(),
            turn_count: game.history().len(),
        }
    }
}

/// 終局バナーの文言
pub fn banner_message(status: Status) -> Option<&'static str> {
    match status {
        Status::Running => None,
        Status::Win => Some("You won !"),
        Status::Draw => Some("It's a draw !"),
        Status::Lost => Some("You lost !"),
    }
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub played: bool,
    pub turn: Option<Turn>,
    pub ignored_reason: Option<IgnoredReason>,
    pub game_state: GameResponse,
}

impl TurnResponse {
    pub fn new(outcome: TurnOutcome, game: &GameState, now: DateTime<Utc>) -> Self {
        let (turn, ignored_reason) = match outcome {
            TurnOutcome::Played(turn) => (Some(turn), None),
            TurnOutcome::Ignored(reason) => (None, Some(reason)),
        };

        Self {
            played: turn.is_some(),
            turn,
            ignored_reason,
            game_state: GameResponse::from_game(game, now),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub game_id: Uuid,
    pub slot: String,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub game_id: Uuid,
    pub width: usize,
    pub height: usize,
    pub status: Status,
    pub turn_state: TurnState,
    pub turn_count: usize,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<ManagerSessionSummary> for SessionSummary {
    fn from(summary: ManagerSessionSummary) -> Self {
        Self {
            game_id: summary.id,
            width: summary.width,
            height: summary.height,
            status: summary.status,
            turn_state: summary.turn_state,
            turn_count: summary.turns,
            created_at: summary.created_at,
            last_updated: summary.last_updated,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
    pub total_count: usize,
    pub max_sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct ColorInfo {
    pub id: Color,
    pub name: &'static str,
    pub rgb: [u8; 3],
}

#[derive(Debug, Serialize)]
pub struct ColorsResponse {
    pub colors: Vec<ColorInfo>,
}

impl ColorsResponse {
    pub fn new() -> Self {
        Self {
            colors: Color::ALL
                .iter()
                .map(|&color| ColorInfo {
                    id: color,
                    name: color.name(),
                    rgb: color.rgb(),
                })
                .collect(),
        }
    }
}

impl Default for ColorsResponse {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
    pub details: BTreeMap<&'static str, String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub error_code: Option<String>,
}

impl ErrorResponse {
    pub fn with_code(error: impl Into<String>, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            timestamp: Utc::now(),
            error_code: Some(code.into()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("ゲームセッションが見つかりません: {game_id}")]
    GameNotFound { game_id: Uuid },

    #[error("セッション制限に達しています (最大: {max})")]
    MaxSessionsReached { max: usize },

    #[error("無効な盤面サイズです: {details}")]
    InvalidDimensions { details: String },

    #[error("無効な保存スロット名です: {slot}")]
    InvalidSlot { slot: String },

    #[error("保存データが見つかりません: {slot}")]
    SaveNotFound { slot: String },

    #[error("保存データが壊れています: {details}")]
    CorruptSave { details: String },

    #[error("サーバー内部エラー: {details}")]
    InternalError { details: String },
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::GameNotFound { .. } => "GAME_NOT_FOUND",
            ApiError::MaxSessionsReached { .. } => "MAX_SESSIONS_REACHED",
            ApiError::InvalidDimensions { .. } => "INVALID_DIMENSIONS",
            ApiError::InvalidSlot { .. } => "INVALID_SLOT",
            ApiError::SaveNotFound { .. } => "SAVE_NOT_FOUND",
            ApiError::CorruptSave { .. } => "CORRUPT_SAVE",
            ApiError::InternalError { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::GameNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::MaxSessionsReached { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InvalidDimensions { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidSlot { .. } => StatusCode::BAD_REQUEST,
            ApiError::SaveNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::CorruptSave { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 盤面ファイルのエラーを保存スロットの文脈で変換する
    pub fn from_persistence(err: PersistenceError, slot: &str) -> Self {
        match err {
            PersistenceError::IoError { source } if source.kind() == std::io::ErrorKind::NotFound => {
                ApiError::SaveNotFound { slot: slot.to_string() }
            }
            PersistenceError::IoError { source } => ApiError::InternalError {
                details: source.to_string(),
            },
            other => ApiError::CorruptSave {
                details: other.to_string(),
            },
        }
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::GameNotFound { game_id } => ApiError::GameNotFound { game_id },
            GameError::SessionLimitExceeded { max } => ApiError::MaxSessionsReached { max },
            GameError::InvalidDimensions { .. } => ApiError::InvalidDimensions {
                details: err.to_string(),
            },
            GameError::PersistenceError { source } => ApiError::from_persistence(source, ""),
            other => ApiError::InternalError {
                details: other.to_string(),
            },
        }
    }
}

impl From<ApiError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: ApiError) -> Self {
        let status_code = err.status_code();
        let error_response = ErrorResponse::with_code(err.error_code(), err.to_string(), err.error_code());

        (status_code, Json(error_response))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Board, Cell, GameSettings};

    fn game(start_paused: bool) -> GameState {
        let cells = vec![
            Cell::new(Owner::Player, Color::Red),
            Cell::new(Owner::AI, Color::Blue),
            Cell::new(Owner::Nobody, Color::Green),
            Cell::new(Owner::AI, Color::Blue),
        ];
        let board = Board::from_cells(2, 2, cells).unwrap();
        let settings = GameSettings {
            start_paused,
            seed: Some(0),
            ..GameSettings::default()
        };
        GameState::from_board(board, &settings).unwrap()
    }

    #[test]
    fn test_game_response_grid_shape() {
        let response = GameResponse::from_game(&game(false), Utc::now());

        assert_eq!(response.grid.len(), 2);
        assert!(response.grid.iter().all(|row| row.len() == 2));
        assert_eq!(response.grid[0][1].owner, Owner::AI);
        assert_eq!(response.territory.player_percent, 25.0);
        assert_eq!(response.territory.ai_text, "ai: 50.0%");
    }

    #[test]
    fn test_color_selector_disables_current_and_contact_colors() {
        let response = GameResponse::from_game(&game(false), Utc::now());
        assert!(response.in_contact);

        let enabled = |color: Color| response.colors[color.index()].enabled;
        assert!(!enabled(Color::Red));
        assert!(!enabled(Color::Blue));
        assert!(enabled(Color::Green));
    }

    #[test]
    fn test_color_selector_disabled_while_paused() {
        let response = GameResponse::from_game(&game(true), Utc::now());
        assert!(response.colors.iter().all(|option| !option.enabled));
    }

    #[test]
    fn test_banner_message() {
        assert_eq!(banner_message(Status::Running), None);
        assert_eq!(banner_message(Status::Win), Some("You won !"));
        assert_eq!(banner_message(Status::Lost), Some("You lost !"));
    }

    #[test]
    fn test_api_error_mapping() {
        let err: ApiError = GameError::SessionLimitExceeded { max: 3 }.into();
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.error_code(), "MAX_SESSIONS_REACHED");

        let err: ApiError = GameError::GameNotFound { game_id: Uuid::new_v4() }.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = ApiError::from_persistence(
            PersistenceError::SizeMismatch { expected: 8, actual: 3 },
            "slot",
        );
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = ApiError::from_persistence(PersistenceError::IoError { source: io }, "slot");
        assert!(matches!(err, ApiError::SaveNotFound { .. }));
    }

    #[test]
    fn test_colors_response() {
        let response = ColorsResponse::new();
        assert_eq!(response.colors.len(), Color::COUNT);
        assert_eq!(response.colors[0].name, Color::Red.name());
    }
}
