//! ゲームセッション管理モジュール
//! 同時に進行する複数のゲームを管理し、
//! セッション数制限、タイムアウト処理、クリーンアップを担当する。

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{GameError, Result};
use crate::game::{GameSettings, GameState, Status, TurnState};

/// 一覧表示用のセッション要約
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub id: Uuid,
    pub width: usize,
    pub height: usize,
    pub status: Status,
    pub turn_state: TurnState,
    pub turns: usize,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<&GameState> for SessionSummary {
    fn from(game: &GameState) -> Self {
        Self {
            id: game.id,
            width: game.board().width(),
            height: game.board().height(),
            status: game.status(),
            turn_state: game.turn_state(),
            turns: game.history().len(),
            created_at: game.created_at,
            last_updated: game.last_updated,
        }
    }
}

/// ゲームセッションの管理を行うメイン構造体
/// 各ゲームはDashMapのエントリロックの下でのみ変更される
#[derive(Debug, Clone)]
pub struct GameSessionManager {
    sessions: Arc<DashMap<Uuid, GameState>>,
    /// 同時存在可能な最大セッション数
    max_sessions: usize,
    /// セッションのタイムアウト時間（分）
    session_timeout_minutes: i64,
}

impl GameSessionManager {
    /// デフォルトタイムアウト（30分）でセッションマネージャーを作成
    pub fn new(max_sessions: usize) -> Self {
        Self::with_timeout(max_sessions, 30)
    }

    /// カスタムタイムアウトでセッションマネージャーを作成
    pub fn with_timeout(max_sessions: usize, timeout_minutes: i64) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            max_sessions,
            session_timeout_minutes: timeout_minutes,
        }
    }

    /// 新しいゲームを作成して登録する
    /// 最大セッション数に達している場合はエラーを返す
    pub fn create_session(&self, settings: &GameSettings) -> Result<Uuid> {
        if self.sessions.len() >= self.max_sessions {
            return Err(GameError::SessionLimitExceeded { max: self.max_sessions });
        }

        let game = GameState::new(settings)?;
        Ok(self.insert(game))
    }

    /// 作成済みのゲームを登録する
    pub fn insert(&self, game: GameState) -> Uuid {
        let game_id = game.id;
        self.sessions.insert(game_id, game);
        game_id
    }

    /// セッションを読み取り専用で参照する
    pub fn with_session<T>(&self, game_id: &Uuid, f: impl FnOnce(&GameState) -> T) -> Result<T> {
        match self.sessions.get(game_id) {
            Some(game) => Ok(f(&game)),
            None => Err(GameError::GameNotFound { game_id: *game_id }),
        }
    }

    /// セッションのエントリをロックして変更する
    pub fn with_session_mut<T>(&self, game_id: &Uuid, f: impl FnOnce(&mut GameState) -> T) -> Result<T> {
        match self.sessions.get_mut(game_id) {
            Some(mut game) => Ok(f(&mut game)),
            None => Err(GameError::GameNotFound { game_id: *game_id }),
        }
    }

    pub fn remove_session(&self, game_id: &Uuid) -> Result<SessionSummary> {
        match self.sessions.remove(game_id) {
            Some((_, game)) => Ok(SessionSummary::from(&game)),
            None => Err(GameError::GameNotFound { game_id: *game_id }),
        }
    }

    /// 全セッションの要約を作成日時の順に返す
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let mut sessions: Vec<SessionSummary> = self
            .sessions
            .iter()
            .map(|entry| SessionSummary::from(entry.value()))
            .collect();
        sessions.sort_by_key(|summary| summary.created_at);
        sessions
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub fn session_exists(&self, game_id: &Uuid) -> bool {
        self.sessions.contains_key(game_id)
    }

    /// 最終更新からタイムアウト時間を過ぎたセッションを削除する
    pub fn cleanup_inactive_sessions(&self) -> usize {
        let cutoff_time = Utc::now() - Duration::minutes(self.session_timeout_minutes);

        let expired_ids: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().last_updated < cutoff_time)
            .map(|entry| *entry.key())
            .collect();

        let removed_count = expired_ids
            .iter()
            .filter(|game_id| self.sessions.remove(game_id).is_some())
            .count();

        if removed_count > 0 {
            info!(removed_count, "cleaned up inactive sessions");
        }

        removed_count
    }
}

impl Default for GameSessionManager {
    fn default() -> Self {
        Self::new(100)
    }
}
