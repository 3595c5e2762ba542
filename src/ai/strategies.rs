//! AI戦略の実装モジュール
//! 貪欲法（1手先の獲得数最大化）による色選択と、
//! テスト用の固定色戦略を統一されたインターフェースで提供する。

use rand::RngCore;
use tracing::{debug, warn};

use super::evaluation::ColorEvaluator;
use crate::error::{GameError, Result};
use crate::game::{Board, Color, Owner};

/// AI戦略の共通インターフェース
/// 盤面を変更せずに次に選ぶ色だけを返す。適用は呼び出し側が行う
pub trait AIStrategy: Send + Sync {
    /// 盤面から指定した所有者が選ぶべき色を計算する
    fn choose_color(&self, board: &Board, owner: Owner, rng: &mut dyn RngCore) -> Result<Color>;
    /// AIの名前を返す
    fn get_name(&self) -> &'static str;
}

/// 即座の獲得セル数を最大化する色を選ぶAI
#[derive(Debug, Clone, Default)]
pub struct GreedyAI;

impl GreedyAI {
    pub fn new() -> Self {
        GreedyAI
    }

    /// 獲得数が最大の色を返す
    ///
    /// 相手と接触中は相手の色を候補から外す。どの色でも獲得数が0なら
    /// 相手と異なる色をランダムに選び、色の数だけ引き直しても
    /// 見つからなければ最後に引いた色をそのまま使う。
    pub fn best_color_for(board: &Board, owner: Owner, rng: &mut dyn RngCore) -> Result<Color> {
        let opponent = owner.opponent().ok_or(GameError::InvalidOwner { owner })?;
        let opponent_color = board.color_of(opponent)?;

        let gains = ColorEvaluator::evaluate_gains(board, owner)?;
        let ranked = ColorEvaluator::rank(&gains);

        if let Some(best) = ranked.first().filter(|best| best.gain > 0) {
            debug!(?owner, color = %best.color, gain = best.gain, "selected best color");
            return Ok(best.color);
        }

        warn!(?owner, "no color yields any gain, picking a random color");

        let mut color = Color::random(rng);
        let mut attempts = 1;
        while color == opponent_color && attempts < Color::COUNT {
            color = Color::random(rng);
            attempts += 1;
        }

        if color == opponent_color {
            warn!(?owner, %color, attempts, "random fallback kept the opponent's color");
        }

        Ok(color)
    }
}

impl AIStrategy for GreedyAI {
    fn choose_color(&self, board: &Board, owner: Owner, rng: &mut dyn RngCore) -> Result<Color> {
        Self::best_color_for(board, owner, rng)
    }

    fn get_name(&self) -> &'static str {
        "GreedyAI"
    }
}

/// 常に同じ色を返すAI
/// 進行管理のテストで相手の応手を固定するために使用
#[derive(Debug, Clone)]
pub struct FixedColorAI {
    pub color: Color,
}

impl FixedColorAI {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl AIStrategy for FixedColorAI {
    fn choose_color(&self, _board: &Board, _owner: Owner, _rng: &mut dyn RngCore) -> Result<Color> {
        Ok(self.color)
    }

    fn get_name(&self) -> &'static str {
        "FixedColorAI"
    }
}
