//! アプリケーション全体のエラー定義モジュール
//! 盤面操作、セッション管理、盤面ファイルの永続化などのエラーを統一管理。

use thiserror::Error;
use uuid::Uuid;

use crate::game::Owner;

/// ゲームロジックに関連するエラー
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Invalid board dimensions {width}x{height}: {reason}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        reason: String,
    },

    #[error("Invalid coordinates {x}x{y} for a {width}x{height} board")]
    OutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("Owner {owner:?} cannot be used here")]
    InvalidOwner { owner: Owner },

    #[error("Game not found: {game_id}")]
    GameNotFound { game_id: Uuid },

    #[error("Session limit exceeded (max: {max})")]
    SessionLimitExceeded { max: usize },

    #[error("Persistence error: {source}")]
    PersistenceError {
        #[from]
        source: PersistenceError,
    },
}

/// 盤面ファイルの読み書きに関連するエラー
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("File I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Corrupt board dimensions {width}x{height}")]
    CorruptDimensions { width: u32, height: u32 },

    #[error("Board data size mismatch: expected {expected} bytes, found {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Invalid owner value {value} at cell {index}")]
    InvalidOwner { value: u32, index: usize },

    #[error("Invalid color value {value} at cell {index}")]
    InvalidColor { value: u32, index: usize },
}

/// ゲームエラーをベースとした結果型
pub type Result<T> = std::result::Result<T, GameError>;
