//! AIの色評価システム
//! 各色を今すぐ選んだ場合に獲得できるセル数を、盤面を変更せずに見積もる。

use crate::error::{GameError, Result};
use crate::game::{Board, Color, Owner};

/// 1色分の評価結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorGain {
    pub color: Color,
    /// 即座に獲得できる空きセル数
    pub gain: usize,
    /// 相手と接触中に相手の色を選ぶ候補は順位付けから除外される
    pub excluded: bool,
}

/// 色の評価を行うスタティックメソッド集
pub struct ColorEvaluator;

impl ColorEvaluator {
    /// 全色について獲得数を宣言順に評価する
    pub fn evaluate_gains(board: &Board, owner: Owner) -> Result<Vec<ColorGain>> {
        let opponent = owner.opponent().ok_or(GameError::InvalidOwner { owner })?;
        let opponent_color = board.color_of(opponent)?;
        let in_contact = board.is_player_and_ai_in_contact();

        let mut visited = vec![false; board.cells().len()];

        let gains = Color::ALL
            .iter()
            .map(|&color| {
                if in_contact && color == opponent_color {
                    return ColorGain {
                        color,
                        gain: 0,
                        excluded: true,
                    };
                }

                visited.fill(false);
                ColorGain {
                    color,
                    gain: Self::claimable_count(board, owner, color, &mut visited),
                    excluded: false,
                }
            })
            .collect();

        Ok(gains)
    }

    /// 除外されていない候補を獲得数の降順に並べる
    /// 安定ソートなので同点は宣言順の早い色が先に来る
    pub fn rank(gains: &[ColorGain]) -> Vec<ColorGain> {
        let mut ranked: Vec<ColorGain> = gains.iter().filter(|g| !g.excluded).copied().collect();
        ranked.sort_by(|a, b| b.gain.cmp(&a.gain));
        ranked
    }

    /// 所有セルの4近傍にある、指定色の空きセルの数を数える
    /// 複数の所有セルから見える同じセルは一度だけ数える
    pub fn claimable_count(board: &Board, owner: Owner, color: Color, visited: &mut [bool]) -> usize {
        let width = board.width();
        let mut count = 0;

        for (index, cell) in board.cells().iter().enumerate() {
            if cell.owner != owner {
                continue;
            }

            let (x, y) = (index % width, index / width);
            for (nx, ny) in board.neighbors(x, y) {
                let neighbor_index = board.linear(nx, ny);
                let neighbor = board.cells()[neighbor_index];

                if neighbor.owner == Owner::Nobody && neighbor.color == color && !visited[neighbor_index] {
                    visited[neighbor_index] = true;
                    count += 1;
                }
            }
        }

        count
    }
}
