//! 陣取りゲームの盤面状態を管理するモジュール
//! width×heightのグリッドとセルの所有・色、盤面の問い合わせと
//! 唯一の状態変更操作である塗り替え（change_color_of）を担当する。

use rand::Rng;
use tracing::debug;

use super::types::{Cell, Color, Owner, Status};
use crate::error::{GameError, Result};

/// 上下左右の4近傍への移動ベクトル
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (0, -1), (-1, 0), (1, 0)];

/// 初期配置ブロックの一辺の長さ
const SEED_BLOCK: usize = 2;

/// 新規作成できる盤面のセル数の上限
pub const MAX_BOARD_CELLS: usize = 1 << 20;

/// 陣取りゲームの盤面を表現する構造体
/// セルは行優先（index = y * width + x）で保持する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    status: Status,
}

impl Board {
    /// ランダムな色で新しい盤面を作成する
    /// 左上の2x2をプレイヤー、右下の2x2をAIの初期陣地とする。
    /// 盤面からはみ出す部分は切り捨て、重なったセルはAIが上書きする
    pub fn new<R: Rng + ?Sized>(width: usize, height: usize, rng: &mut R) -> Result<Self> {
        let count = validate_dimensions(width, height)?;

        let cells = (0..count)
            .map(|_| Cell::new(Owner::Nobody, Color::random(rng)))
            .collect();

        let mut board = Board {
            width,
            height,
            cells,
            status: Status::Running,
        };

        let player = Cell::new(Owner::Player, board.cells[0].color);
        board.fill_block(0, 0, player);

        let mut ai_color = board.cells[board.linear(width - 1, height - 1)].color;
        while ai_color == player.color {
            ai_color = Color::random(rng);
        }
        board.fill_block(
            width.saturating_sub(SEED_BLOCK),
            height.saturating_sub(SEED_BLOCK),
            Cell::new(Owner::AI, ai_color),
        );

        board.update_status();
        Ok(board)
    }

    /// 既存のセル列から盤面を組み立てる
    /// 盤面ファイルの読み込みやテストで使用する
    pub fn from_cells(width: usize, height: usize, cells: Vec<Cell>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GameError::InvalidDimensions {
                width,
                height,
                reason: "dimensions must be positive".to_string(),
            });
        }

        let expected = width.checked_mul(height);
        if expected != Some(cells.len()) {
            return Err(GameError::InvalidDimensions {
                width,
                height,
                reason: format!("expected {} cells, got {}", width.saturating_mul(height), cells.len()),
            });
        }

        let mut board = Board {
            width,
            height,
            cells,
            status: Status::Running,
        };
        board.update_status();
        Ok(board)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// 行優先で並んだ全セル
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// 指定した座標のセルを取得する
    pub fn at(&self, x: usize, y: usize) -> Result<Cell> {
        if !self.contains(x, y) {
            return Err(GameError::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        Ok(self.cells[self.linear(x, y)])
    }

    /// 所有者の基準セルの色を返す
    /// プレイヤーは(0,0)、AIは(width-1,height-1)が基準セル
    pub fn color_of(&self, owner: Owner) -> Result<Color> {
        let (x, y) = self.anchor(owner)?;
        self.at(x, y).map(|cell| cell.color)
    }

    /// 所有者の基準セルの座標
    pub fn anchor(&self, owner: Owner) -> Result<(usize, usize)> {
        match owner {
            Owner::Player => Ok((0, 0)),
            Owner::AI => Ok((self.width - 1, self.height - 1)),
            Owner::Nobody => Err(GameError::InvalidOwner { owner }),
        }
    }

    pub fn count_owned(&self, owner: Owner) -> usize {
        self.cells.iter().filter(|cell| cell.owner == owner).count()
    }

    /// 所有者が占める割合を[0, 1]で返す
    pub fn occupied_by(&self, owner: Owner) -> f32 {
        self.count_owned(owner) as f32 / self.cells.len() as f32
    }

    /// プレイヤーとAIの陣地が接しているか
    pub fn is_player_and_ai_in_contact(&self) -> bool {
        self.coordinates()
            .filter(|&(x, y)| self.cells[self.linear(x, y)].owner == Owner::Player)
            .any(|(x, y)| self.has_border_with(x, y, Owner::AI))
    }

    /// 所有者のセルを全て指定色に塗り替え、隣接する同色の空きセルを獲得する
    ///
    /// 獲得判定は呼び出し開始時点の所有状態だけを見る。同じ呼び出しで
    /// 獲得したセル経由の連鎖は起こらず、前線は1手につき1層だけ進む。
    /// 戻り値は新たに獲得したセル数。
    pub fn change_color_of(&mut self, owner: Owner, color: Color) -> Result<usize> {
        if owner == Owner::Nobody {
            return Err(GameError::InvalidOwner { owner });
        }

        for cell in self.cells.iter_mut().filter(|cell| cell.owner == owner) {
            cell.color = color;
        }

        let claimed: Vec<usize> = self
            .coordinates()
            .filter(|&(x, y)| {
                let cell = self.cells[self.linear(x, y)];
                cell.owner == Owner::Nobody && cell.color == color && self.has_border_with(x, y, owner)
            })
            .map(|(x, y)| self.linear(x, y))
            .collect();

        for &index in &claimed {
            self.cells[index].owner = owner;
        }

        debug!(?owner, %color, gained = claimed.len(), "changed color");

        self.update_status();
        Ok(claimed.len())
    }

    /// 盤面の状態を再計算する
    /// 所有セルに隣接する空きセルが1つでもあれば進行中、
    /// なければ所有セル数の比較で勝敗を決める
    pub fn update_status(&mut self) {
        let open_frontier = self.coordinates().any(|(x, y)| {
            self.cells[self.linear(x, y)].owner == Owner::Nobody
                && (self.has_border_with(x, y, Owner::Player) || self.has_border_with(x, y, Owner::AI))
        });

        if open_frontier {
            self.status = Status::Running;
            return;
        }

        let player = self.count_owned(Owner::Player);
        let ai = self.count_owned(Owner::AI);

        self.status = if player > ai {
            Status::Win
        } else if player < ai {
            Status::Lost
        } else {
            Status::Draw
        };
    }

    /// 指定セルの盤面内の4近傍に所有者のセルがあるか
    pub(crate) fn has_border_with(&self, x: usize, y: usize, owner: Owner) -> bool {
        self.neighbors(x, y)
            .any(|(nx, ny)| self.cells[self.linear(nx, ny)].owner == owner)
    }

    /// 盤面内に収まる4近傍の座標
    pub(crate) fn neighbors(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        DIRECTIONS.iter().filter_map(move |&(dx, dy)| {
            let nx = x.checked_add_signed(dx)?;
            let ny = y.checked_add_signed(dy)?;
            self.contains(nx, ny).then_some((nx, ny))
        })
    }

    pub(crate) fn linear(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// 行優先の全座標
    fn coordinates(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| (x, y)))
    }

    /// 盤面内に収まる部分だけを塗る
    fn fill_block(&mut self, x0: usize, y0: usize, cell: Cell) {
        for y in y0..(y0 + SEED_BLOCK).min(self.height) {
            for x in x0..(x0 + SEED_BLOCK).min(self.width) {
                let index = self.linear(x, y);
                self.cells[index] = cell;
            }
        }
    }

    /// デバッグ用の盤面表示文字列を生成する
    /// 所有者（P/A/.）と色の頭文字を並べる
    pub fn display(&self) -> String {
        let mut result = String::new();

        for y in 0..self.height {
            for x in 0..self.width {
                let cell = self.cells[self.linear(x, y)];
                let owner = match cell.owner {
                    Owner::Player => 'P',
                    Owner::AI => 'A',
                    Owner::Nobody => '.',
                };
                let color = cell.color.name().chars().next().unwrap_or('?');
                result.push(owner);
                result.push(color);
                result.push(' ');
            }
            result.push('\n');
        }

        result
    }
}

/// 新しい盤面が作れる寸法かチェックし、セル数を返す
pub fn validate_dimensions(width: usize, height: usize) -> Result<usize> {
    let reason = if width == 0 || height == 0 {
        "dimensions must be positive".to_string()
    } else {
        match width.checked_mul(height) {
            Some(count) if count <= MAX_BOARD_CELLS => return Ok(count),
            _ => format!("board exceeds {} cells", MAX_BOARD_CELLS),
        }
    };

    Err(GameError::InvalidDimensions { width, height, reason })
}
