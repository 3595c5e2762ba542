//! 陣取りゲームサービス
//! セッションマネージャーを介してゲームを操作し、APIレスポンスを組み立てる。

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::game::{Color, GameSettings};
use crate::session::GameSessionManager;

use super::dto::{
    ApiError, ApiResult, CreateGameRequest, GameResponse, SaveResponse, SessionListResponse,
    SessionSummary, TurnResponse,
};

/// 保存ファイルの拡張子
const SAVE_EXTENSION: &str = "board";

#[derive(Debug)]
pub struct TerritoryService {
    session_manager: Arc<GameSessionManager>,
    defaults: GameSettings,
    save_dir: PathBuf,
}

impl TerritoryService {
    pub fn new(session_manager: Arc<GameSessionManager>, defaults: GameSettings, save_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_manager,
            defaults,
            save_dir: save_dir.into(),
        }
    }

    pub fn session_manager(&self) -> &Arc<GameSessionManager> {
        &self.session_manager
    }

    pub fn create_game(&self, request: CreateGameRequest) -> ApiResult<GameResponse> {
        let settings = GameSettings {
            width: request.width.unwrap_or(self.defaults.width),
            height: request.height.unwrap_or(self.defaults.height),
            seed: request.seed.or(self.defaults.seed),
            ..self.defaults.clone()
        };

        let game_id = self.session_manager.create_session(&settings)?;
        self.game_view(game_id)
    }

    /// ゲームを1フレーム進めてから現在の状態を返す
    /// 状態の取得もアクセスとして扱い、最終更新時刻を進める
    pub fn get_game_state(&self, game_id: Uuid) -> ApiResult<GameResponse> {
        let now = Utc::now();
        let response = self.session_manager.with_session_mut(&game_id, |game| {
            game.step(now);
            game.last_updated = now;
            GameResponse::from_game(game, now)
        })?;

        Ok(response)
    }

    pub fn choose_color(&self, game_id: Uuid, color: Color) -> ApiResult<TurnResponse> {
        let response = self.session_manager.with_session_mut(&game_id, |game| {
            let outcome = game.set_player_color(color)?;
            Ok::<_, crate::error::GameError>(TurnResponse::new(outcome, game, Utc::now()))
        })??;

        Ok(response)
    }

    pub fn pause(&self, game_id: Uuid) -> ApiResult<GameResponse> {
        self.session_manager.with_session_mut(&game_id, |game| game.pause())?;
        self.game_view(game_id)
    }

    pub fn resume(&self, game_id: Uuid) -> ApiResult<GameResponse> {
        self.session_manager.with_session_mut(&game_id, |game| game.resume())?;
        self.game_view(game_id)
    }

    pub fn reset(&self, game_id: Uuid) -> ApiResult<GameResponse> {
        self.session_manager.with_session_mut(&game_id, |game| game.reset())??;
        self.game_view(game_id)
    }

    pub fn save(&self, game_id: Uuid, slot: Option<String>) -> ApiResult<SaveResponse> {
        let slot = self.resolve_slot(game_id, slot)?;
        let path = self.slot_path(&slot);

        std::fs::create_dir_all(&self.save_dir).map_err(|e| ApiError::InternalError {
            details: e.to_string(),
        })?;

        self.session_manager
            .with_session(&game_id, |game| game.board().save(&path))?
            .map_err(|e| ApiError::from_persistence(e, &slot))?;

        info!(%game_id, slot = %slot, "saved game");
        Ok(SaveResponse { game_id, slot })
    }

    pub fn load(&self, game_id: Uuid, slot: Option<String>) -> ApiResult<GameResponse> {
        let slot = self.resolve_slot(game_id, slot)?;
        let path = self.slot_path(&slot);

        self.session_manager
            .with_session_mut(&game_id, |game| game.load(&path))?
            .map_err(|e| match e {
                crate::error::GameError::PersistenceError { source } => ApiError::from_persistence(source, &slot),
                other => ApiError::from(other),
            })?;

        info!(%game_id, slot = %slot, "loaded game");
        self.game_view(game_id)
    }

    pub fn delete_game(&self, game_id: Uuid) -> ApiResult<()> {
        self.session_manager.remove_session(&game_id)?;
        Ok(())
    }

    pub fn list_sessions(&self) -> SessionListResponse {
        let sessions: Vec<SessionSummary> = self
            .session_manager
            .list_sessions()
            .into_iter()
            .map(SessionSummary::from)
            .collect();

        SessionListResponse {
            total_count: sessions.len(),
            sessions,
            max_sessions: self.session_manager.max_sessions(),
        }
    }

    fn game_view(&self, game_id: Uuid) -> ApiResult<GameResponse> {
        let now = Utc::now();
        let response = self
            .session_manager
            .with_session(&game_id, |game| GameResponse::from_game(game, now))?;

        Ok(response)
    }

    /// スロット名は英数字、'-'、'_'のみ許可する
    fn resolve_slot(&self, game_id: Uuid, slot: Option<String>) -> ApiResult<String> {
        let slot = slot.unwrap_or_else(|| game_id.to_string());

        let valid = !slot.is_empty()
            && slot.len() <= 64
            && slot.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !valid {
            return Err(ApiError::InvalidSlot { slot });
        }

        Ok(slot)
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.save_dir.join(format!("{}.{}", slot, SAVE_EXTENSION))
    }
}
