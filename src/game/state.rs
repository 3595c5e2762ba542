//! ゲーム進行管理モジュール
//! 盤面、一時停止・進行中・終了の状態遷移、終局バナー、手の履歴を管理し、
//! プレイヤーの色選択からAIの応手までの1ターンを実行する。

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::board::Board;
use super::types::{Color, Owner, Status};
use crate::ai::{AIStrategy, GreedyAI};
use crate::error::Result;

/// 終局バナーのデフォルト表示時間（ミリ秒）
pub const DEFAULT_BANNER_DURATION_MS: i64 = 3000;

/// ゲームの進行状態を表すenum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    /// 一時停止中。色の選択を受け付けない
    Paused,
    /// 進行中
    Active,
    /// 終局し、バナーの表示も終わった
    Over,
}

/// ゲーム作成時の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    pub width: usize,
    pub height: usize,
    pub banner_duration: Duration,
    pub start_paused: bool,
    /// 乱数の種。Noneならエントロピーから生成する
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            width: 32,
            height: 32,
            banner_duration: Duration::milliseconds(DEFAULT_BANNER_DURATION_MS),
            start_paused: true,
            seed: None,
        }
    }
}

/// 1ターン（プレイヤーとAIの色選択）の記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub player_color: Color,
    pub ai_color: Color,
    pub player_gain: usize,
    pub ai_gain: usize,
    pub timestamp: DateTime<Utc>,
}

/// 色の選択が無視された理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IgnoredReason {
    /// ゲームが進行中ではない
    NotActive,
    /// 盤面の勝敗が既に決まっている
    Finished,
    /// プレイヤーが既にその色を持っている
    SameColor,
}

/// 色の選択の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Played(Turn),
    Ignored(IgnoredReason),
}

/// 終局時に一定時間だけ表示される勝敗バナー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOverBanner {
    duration: Duration,
    shown_at: Option<DateTime<Utc>>,
    visible: bool,
}

impl GameOverBanner {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            shown_at: None,
            visible: false,
        }
    }

    /// バナーの表示状態を更新する
    /// 表示すべき状態になった最初の呼び出しで表示を開始し、
    /// 表示時間を過ぎたら隠す
    pub fn update(&mut self, active: bool, now: DateTime<Utc>) -> bool {
        match (active, self.shown_at) {
            (true, None) => {
                self.shown_at = Some(now);
                self.visible = true;
            }
            (true, Some(shown_at)) => {
                if now > shown_at + self.duration {
                    self.visible = false;
                }
            }
            (false, Some(_)) => {
                self.shown_at = None;
                self.visible = false;
            }
            (false, None) => {}
        }

        self.visible
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// 表示中のバナーの不透明度（1.0から0.0へ線形に減衰）
    pub fn opacity(&self, now: DateTime<Utc>) -> f32 {
        match self.shown_at {
            Some(shown_at) if self.visible => {
                let elapsed = (now - shown_at).num_milliseconds() as f32;
                let total = self.duration.num_milliseconds().max(1) as f32;
                (1.0 - elapsed / total).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.shown_at = None;
        self.visible = false;
    }
}

/// ゲーム全体の状態を保持する構造体
/// 盤面はこの構造体だけが所有し、変更は全てここを経由する
pub struct GameState {
    pub id: Uuid,
    board: Board,
    turn_state: TurnState,
    player_color: Color,
    ai_color: Color,
    ai: Box<dyn AIStrategy>,
    rng: StdRng,
    banner: GameOverBanner,
    history: Vec<Turn>,
    /// リセット時に使う設定上の寸法
    width: usize,
    height: usize,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("id", &self.id)
            .field("turn_state", &self.turn_state)
            .field("status", &self.board.status())
            .field("player_color", &self.player_color)
            .field("ai_color", &self.ai_color)
            .field("ai", &self.ai.get_name())
            .field("turns", &self.history.len())
            .finish()
    }
}

impl GameState {
    /// 新しいゲームを作成する
    /// 盤面は設定の寸法でランダムに生成される
    pub fn new(settings: &GameSettings) -> Result<Self> {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let board = Board::new(settings.width, settings.height, &mut rng)?;

        Self::with_board(board, settings, rng)
    }

    /// 既存の盤面からゲームを作成する
    pub fn from_board(board: Board, settings: &GameSettings) -> Result<Self> {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self::with_board(board, settings, rng)
    }

    fn with_board(board: Board, settings: &GameSettings, rng: StdRng) -> Result<Self> {
        let now = Utc::now();
        let game = Self {
            id: Uuid::new_v4(),
            player_color: board.color_of(Owner::Player)?,
            ai_color: board.color_of(Owner::AI)?,
            width: settings.width,
            height: settings.height,
            board,
            turn_state: if settings.start_paused {
                TurnState::Paused
            } else {
                TurnState::Active
            },
            ai: Box::new(GreedyAI::new()),
            rng,
            banner: GameOverBanner::new(settings.banner_duration),
            history: Vec::new(),
            created_at: now,
            last_updated: now,
        };

        info!(
            game_id = %game.id,
            width = game.board.width(),
            height = game.board.height(),
            "created game"
        );
        Ok(game)
    }

    /// AI戦略を差し替える
    pub fn with_strategy(mut self, ai: Box<dyn AIStrategy>) -> Self {
        self.ai = ai;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn_state(&self) -> TurnState {
        self.turn_state
    }

    pub fn status(&self) -> Status {
        self.board.status()
    }

    pub fn player_color(&self) -> Color {
        self.player_color
    }

    pub fn ai_color(&self) -> Color {
        self.ai_color
    }

    pub fn ai_name(&self) -> &'static str {
        self.ai.get_name()
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn banner(&self) -> &GameOverBanner {
        &self.banner
    }

    pub fn is_active(&self) -> bool {
        self.turn_state == TurnState::Active
    }

    /// プレイヤーの色を変更し、続けてAIの応手を適用する
    ///
    /// 進行中でない場合、勝敗が決まっている場合、同じ色を選んだ場合は
    /// 何もせずに理由を返す。
    pub fn set_player_color(&mut self, color: Color) -> Result<TurnOutcome> {
        if !self.is_active() {
            debug!(game_id = %self.id, state = ?self.turn_state, "ignoring action while game is not active");
            return Ok(TurnOutcome::Ignored(IgnoredReason::NotActive));
        }

        if !self.board.status().is_running() {
            debug!(game_id = %self.id, status = ?self.board.status(), "ignoring action on a finished board");
            return Ok(TurnOutcome::Ignored(IgnoredReason::Finished));
        }

        if self.player_color == color {
            warn!(game_id = %self.id, %color, "ignoring change to color, player already has this color");
            return Ok(TurnOutcome::Ignored(IgnoredReason::SameColor));
        }

        let player_gain = self.board.change_color_of(Owner::Player, color)?;
        let ai_color = self.ai.choose_color(&self.board, Owner::AI, &mut self.rng)?;
        let ai_gain = self.board.change_color_of(Owner::AI, ai_color)?;

        self.player_color = color;
        self.ai_color = ai_color;

        info!(game_id = %self.id, %color, player_gain, "player now has color");
        info!(game_id = %self.id, color = %ai_color, ai_gain, "ai chooses color");

        let turn = Turn {
            player_color: color,
            ai_color,
            player_gain,
            ai_gain,
            timestamp: Utc::now(),
        };
        self.history.push(turn.clone());
        self.last_updated = turn.timestamp;

        Ok(TurnOutcome::Played(turn))
    }

    /// フレームごとの更新処理
    /// 終局してバナーの表示が終わったら終了状態に移る。
    /// ゲームがまだ続いているかを返す
    pub fn step(&mut self, now: DateTime<Utc>) -> bool {
        match self.turn_state {
            TurnState::Paused => return true,
            TurnState::Over => return false,
            TurnState::Active => {}
        }

        let finished = !self.board.status().is_running();
        self.banner.update(finished, now);

        if finished && !self.banner.visible() {
            self.turn_state = TurnState::Over;
            self.last_updated = now;
            info!(game_id = %self.id, status = ?self.board.status(), "game over");
            return false;
        }

        true
    }

    /// ゲームを一時停止する
    pub fn pause(&mut self) {
        if self.turn_state != TurnState::Paused {
            self.turn_state = TurnState::Paused;
            self.last_updated = Utc::now();
            debug!(game_id = %self.id, "paused game");
        }
    }

    /// 一時停止中のゲームを再開する
    /// 勝敗が決まった盤面では再開できない
    pub fn resume(&mut self) {
        if self.turn_state != TurnState::Paused {
            return;
        }

        if !self.board.status().is_running() {
            warn!(game_id = %self.id, status = ?self.board.status(), "cannot resume a finished board");
            return;
        }

        self.turn_state = TurnState::Active;
        self.last_updated = Utc::now();
        debug!(game_id = %self.id, "resumed game");
    }

    pub fn toggle_pause(&mut self) {
        if self.turn_state == TurnState::Paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// 設定の寸法で新しい盤面を作ってやり直す
    /// 読み込んだ盤面の寸法は引き継がない
    pub fn reset(&mut self) -> Result<()> {
        info!(game_id = %self.id, "reset board");
        let board = Board::new(self.width, self.height, &mut self.rng)?;
        self.replace_board(board)
    }

    /// 盤面をファイルに保存する
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.board.save(path)?;
        Ok(())
    }

    /// ファイルから盤面を読み込む
    /// 失敗した場合は現在の盤面がそのまま残る
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let mut board = self.board.clone();
        board.load(path)?;
        self.replace_board(board)
    }

    fn replace_board(&mut self, board: Board) -> Result<()> {
        let player_color = board.color_of(Owner::Player)?;
        let ai_color = board.color_of(Owner::AI)?;

        self.board = board;
        self.player_color = player_color;
        self.ai_color = ai_color;
        self.history.clear();
        self.banner.reset();
        if self.turn_state == TurnState::Over {
            self.turn_state = TurnState::Paused;
        }
        self.last_updated = Utc::now();

        Ok(())
    }
}
