//! アプリケーション設定管理モジュール
//! サーバー、盤面、ゲーム進行、セッション、保存先、ログの設定を
//! 設定ファイルと環境変数から読み込んで管理する。

use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf, str::FromStr, time::Duration};

use crate::game::{validate_dimensions, GameSettings};

/// 設定ファイルの探索順
const CONFIG_PATHS: [&str; 3] = ["config.json", "config/app.json", "/etc/square_color/config.json"];

/// Duration型をJSONでシリアライズするためのモジュール
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    /// Durationを(secs, nanos)のタプルとしてシリアライズ
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_secs(), duration.subsec_nanos()).serialize(serializer)
    }

    /// (secs, nanos)のタプルからDurationをデシリアライズ
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (secs, nanos) = <(u64, u32)>::deserialize(deserializer)?;
        Ok(Duration::new(secs, nanos))
    }
}

/// サーバーの設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// 新規ゲームの盤面設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    /// 固定の乱数の種。未指定ならゲームごとにランダム
    pub seed: Option<u64>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 32,
            seed: None,
        }
    }
}

/// ゲーム進行の設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub start_paused: bool,
    /// 終局バナーの表示時間
    #[serde(with = "duration_serde")]
    pub banner_duration: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            start_paused: true,
            banner_duration: Duration::from_millis(3000),
        }
    }
}

/// ゲームセッションの設定
/// セッション数制限、タイムアウト、クリーンアップ設定など
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub max_sessions: usize,
    pub session_timeout_minutes: i64,
    pub enable_session_cleanup: bool,
    pub cleanup_interval_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: 100,
            session_timeout_minutes: 30,
            enable_session_cleanup: true,
            cleanup_interval_minutes: 5,
        }
    }
}

/// 盤面ファイルの保存先
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub save_dir: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("saves"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing-subscriberのEnvFilter書式
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// アプリケーションの全設定を統合するメイン設定構造体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub board: BoardConfig,
    pub game: GameConfig,
    pub sessions: SessionConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

/// 設定関連のエラーを表すenum
/// ファイル読み込み、パース、検証エラーなどを含む
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("設定ファイル読み込みエラー: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("設定ファイル解析エラー: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("環境変数エラー: {name} = {value}")]
    EnvVarError { name: String, value: String },

    #[error("設定値が無効です: {field} = {value}")]
    InvalidValue { field: String, value: String },
}

/// 環境変数を読み、設定されていればパースする
fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map(Some).map_err(|_| ConfigError::EnvVarError {
            name: name.to_string(),
            value,
        }),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// 指定したファイルパスから設定を読み込む
    /// ファイルにないフィールドはデフォルト値になる
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 環境変数で設定を上書きする
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(port) = env_parse("SERVER_PORT")? {
            self.server.port = port;
        }

        if let Ok(host) = env::var("SERVER_HOST") {
            self.server.host = host;
        }

        if let Some(width) = env_parse("BOARD_WIDTH")? {
            self.board.width = width;
        }

        if let Some(height) = env_parse("BOARD_HEIGHT")? {
            self.board.height = height;
        }

        if let Some(seed) = env_parse("GAME_SEED")? {
            self.board.seed = Some(seed);
        }

        if let Some(max_sessions) = env_parse("MAX_SESSIONS")? {
            self.sessions.max_sessions = max_sessions;
        }

        if let Some(timeout) = env_parse("SESSION_TIMEOUT_MINUTES")? {
            self.sessions.session_timeout_minutes = timeout;
        }

        if let Ok(save_dir) = env::var("SAVE_DIR") {
            self.persistence.save_dir = PathBuf::from(save_dir);
        }

        if let Ok(filter) = env::var("LOG_FILTER") {
            self.logging.filter = filter;
        }

        Ok(())
    }

    /// デフォルト値に環境変数を適用した設定
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    /// 設定ファイルと環境変数を結合して設定を読み込む
    /// 設定ファイルがなくてもデフォルト値で動作する
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = CONFIG_PATHS
            .iter()
            .find_map(|path| Self::from_file(path).ok())
            .unwrap_or_default();

        config.apply_env()?;
        Ok(config)
    }

    /// 現在の設定を指定したファイルに保存する
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 設定値の妥当性をチェックする
    /// 不正な値がある場合はConfigErrorを返す
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                value: self.server.port.to_string(),
            });
        }

        if let Err(e) = validate_dimensions(self.board.width, self.board.height) {
            return Err(ConfigError::InvalidValue {
                field: "board".to_string(),
                value: e.to_string(),
            });
        }

        if self.sessions.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sessions.max_sessions".to_string(),
                value: self.sessions.max_sessions.to_string(),
            });
        }

        if self.game.banner_duration.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "game.banner_duration".to_string(),
                value: format!("{:?}", self.game.banner_duration),
            });
        }

        Ok(())
    }

    /// 新規ゲーム作成時の設定
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            width: self.board.width,
            height: self.board.height,
            banner_duration: chrono::Duration::from_std(self.game.banner_duration)
                .unwrap_or_else(|_| chrono::Duration::milliseconds(crate::game::DEFAULT_BANNER_DURATION_MS)),
            start_paused: self.game.start_paused,
            seed: self.board.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.board.width, 32);
        assert_eq!(config.game.banner_duration, Duration::from_millis(3000));
    }

    #[test]
    fn test_validate_rejects_bad_board() {
        let mut config = Config::default();
        config.board.width = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "board"));

        config.board.width = 4096;
        config.board.height = 4096;
        assert!(config.validate().is_err());

        // 初期陣地が重なる小さな盤面も作れる
        config.board.width = 3;
        config.board.height = 3;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_banner() {
        let mut config = Config::default();
        config.game.banner_duration = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_game_settings_conversion() {
        let mut config = Config::default();
        config.board.seed = Some(9);
        config.game.start_paused = false;

        let settings = config.game_settings();
        assert_eq!(settings.width, 32);
        assert_eq!(settings.seed, Some(9));
        assert!(!settings.start_paused);
        assert_eq!(settings.banner_duration, chrono::Duration::milliseconds(3000));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"board": {"width": 12}}"#).unwrap();
        assert_eq!(config.board.width, 12);
        assert_eq!(config.board.height, 32);
        assert_eq!(config.server.port, 3000);
    }
}
