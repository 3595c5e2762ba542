//! ゲームの基本型定義モジュール
//! 陣取りゲームで使用される所有者、色、セル、盤面状態の型を定義する。

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// セルの所有者を表すenum
/// 保存形式では宣言順の整数値（Nobody=0, AI=1, Player=2）で表現される
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Nobody,
    AI,
    Player,
}

impl Owner {
    /// 対戦相手を返す
    /// Nobodyには相手がいないのでNoneを返す
    pub fn opponent(self) -> Option<Owner> {
        match self {
            Owner::Player => Some(Owner::AI),
            Owner::AI => Some(Owner::Player),
            Owner::Nobody => None,
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            Owner::Nobody => 0,
            Owner::AI => 1,
            Owner::Player => 2,
        }
    }

    pub fn from_raw(value: u32) -> Option<Owner> {
        match value {
            0 => Some(Owner::Nobody),
            1 => Some(Owner::AI),
            2 => Some(Owner::Player),
            _ => None,
        }
    }
}

/// セルの色を表すenum
/// 宣言順がAIの同点時の優先順位になる
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Cyan,
    Magenta,
    Black,
    White,
}

impl Color {
    /// 色の総数
    pub const COUNT: usize = 8;

    /// 宣言順に並んだ全色
    pub const ALL: [Color; Color::COUNT] = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Cyan,
        Color::Magenta,
        Color::Black,
        Color::White,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Color> {
        Color::ALL.get(index).copied()
    }

    /// 一様分布でランダムな色を選ぶ
    /// 乱数源は呼び出し側から注入する
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Color {
        Color::ALL[rng.gen_range(0..Color::COUNT)]
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Cyan => "cyan",
            Color::Magenta => "magenta",
            Color::Black => "black",
            Color::White => "white",
        }
    }

    /// 描画用の表示色（RGB）を返す
    pub fn rgb(self) -> [u8; 3] {
        match self {
            Color::Red => [255, 0, 0],
            Color::Green => [0, 255, 0],
            Color::Blue => [0, 0, 255],
            Color::Yellow => [255, 255, 0],
            Color::Cyan => [0, 255, 255],
            Color::Magenta => [255, 0, 255],
            Color::Black => [0, 0, 0],
            Color::White => [255, 255, 255],
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        Color::ALL
            .iter()
            .copied()
            .find(|color| color.name() == lowered)
            .ok_or_else(|| format!("Invalid color: {}", s))
    }
}

/// 盤面の1マスを表す構造体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub owner: Owner,
    pub color: Color,
}

impl Cell {
    pub fn new(owner: Owner, color: Color) -> Self {
        Self { owner, color }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            owner: Owner::Nobody,
            color: Color::Black,
        }
    }
}

/// 盤面から導出されるゲームの勝敗状態
/// 呼び出し側が直接設定することはない
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Running,
    Win,
    Draw,
    Lost,
}

impl Status {
    pub fn is_running(self) -> bool {
        matches!(self, Status::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_owner_opponent() {
        assert_eq!(Owner::Player.opponent(), Some(Owner::AI));
        assert_eq!(Owner::AI.opponent(), Some(Owner::Player));
        assert_eq!(Owner::Nobody.opponent(), None);
    }

    #[test]
    fn test_owner_raw_values() {
        assert_eq!(Owner::Nobody.to_raw(), 0);
        assert_eq!(Owner::AI.to_raw(), 1);
        assert_eq!(Owner::Player.to_raw(), 2);
        assert_eq!(Owner::from_raw(2), Some(Owner::Player));
        assert_eq!(Owner::from_raw(3), None);
    }

    #[test]
    fn test_color_declaration_order() {
        for (index, color) in Color::ALL.iter().enumerate() {
            assert_eq!(color.index(), index);
            assert_eq!(Color::from_index(index), Some(*color));
        }
        assert_eq!(Color::from_index(Color::COUNT), None);
    }

    #[test]
    fn test_color_from_str() {
        assert_eq!("red".parse::<Color>().unwrap(), Color::Red);
        assert_eq!("MAGENTA".parse::<Color>().unwrap(), Color::Magenta);
        assert!("purple".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_random_stays_in_enumeration() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; Color::COUNT];
        for _ in 0..500 {
            seen[Color::random(&mut rng).index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_color_serialization_lowercase() {
        let json = serde_json::to_string(&Color::Cyan).unwrap();
        assert_eq!(json, "\"cyan\"");
        let color: Color = serde_json::from_str("\"white\"").unwrap();
        assert_eq!(color, Color::White);
    }

    #[test]
    fn test_cell_default() {
        let cell = Cell::default();
        assert_eq!(cell.owner, Owner::Nobody);
        assert_eq!(cell.color, Color::Black);
    }

    #[test]
    fn test_status_is_running() {
        assert!(Status::Running.is_running());
        assert!(!Status::Win.is_running());
        assert!(!Status::Draw.is_running());
        assert!(!Status::Lost.is_running());
    }
}
