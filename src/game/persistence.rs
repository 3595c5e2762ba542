//! 盤面の保存・読み込みモジュール
//!
//! ファイル形式（全てリトルエンディアンのu32、ヘッダなし）:
//! - width
//! - height
//! - 各セルについて行優先で owner, color
//!
//! 読み込みはファイル全体を検証してから盤面を置き換えるので、
//! 失敗しても元の盤面は変更されない。

use std::fs;
use std::path::Path;

use tracing::info;

use super::board::Board;
use super::types::{Cell, Color, Owner};
use crate::error::PersistenceError;

const FIELD_SIZE: usize = 4;
const HEADER_SIZE: usize = 2 * FIELD_SIZE;
const CELL_SIZE: usize = 2 * FIELD_SIZE;

/// 盤面をバイト列にエンコードする
pub fn encode(board: &Board) -> Vec<u8> {
    let mut data = Vec::with_capacity(HEADER_SIZE + board.cells().len() * CELL_SIZE);

    data.extend_from_slice(&(board.width() as u32).to_le_bytes());
    data.extend_from_slice(&(board.height() as u32).to_le_bytes());

    for cell in board.cells() {
        data.extend_from_slice(&cell.owner.to_raw().to_le_bytes());
        data.extend_from_slice(&(cell.color.index() as u32).to_le_bytes());
    }

    data
}

/// バイト列から盤面をデコードする
/// 寸法、データ長、各フィールドの値を全て検証する
pub fn decode(data: &[u8]) -> Result<Board, PersistenceError> {
    if data.len() < HEADER_SIZE {
        return Err(PersistenceError::SizeMismatch {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }

    let width = read_u32(data, 0);
    let height = read_u32(data, FIELD_SIZE);
    if width == 0 || height == 0 {
        return Err(PersistenceError::CorruptDimensions { width, height });
    }

    let cell_count = (width as usize)
        .checked_mul(height as usize)
        .ok_or(PersistenceError::CorruptDimensions { width, height })?;
    let expected = cell_count
        .checked_mul(CELL_SIZE)
        .and_then(|size| size.checked_add(HEADER_SIZE))
        .ok_or(PersistenceError::CorruptDimensions { width, height })?;

    if data.len() != expected {
        return Err(PersistenceError::SizeMismatch {
            expected,
            actual: data.len(),
        });
    }

    let cells = data[HEADER_SIZE..]
        .chunks_exact(CELL_SIZE)
        .enumerate()
        .map(|(index, chunk)| {
            let owner_raw = read_u32(chunk, 0);
            let color_raw = read_u32(chunk, FIELD_SIZE);

            let owner = Owner::from_raw(owner_raw)
                .ok_or(PersistenceError::InvalidOwner { value: owner_raw, index })?;
            let color = Color::from_index(color_raw as usize)
                .ok_or(PersistenceError::InvalidColor { value: color_raw, index })?;

            Ok(Cell::new(owner, color))
        })
        .collect::<Result<Vec<_>, PersistenceError>>()?;

    Board::from_cells(width as usize, height as usize, cells)
        .map_err(|_| PersistenceError::CorruptDimensions { width, height })
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; FIELD_SIZE];
    bytes.copy_from_slice(&data[offset..offset + FIELD_SIZE]);
    u32::from_le_bytes(bytes)
}

impl Board {
    /// 盤面をファイルに保存する
    /// 一時ファイルに書き切ってからリネームするので途中状態のファイルは残らない
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");

        fs::write(&tmp_path, encode(self))?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        info!(path = %path.display(), width = self.width(), height = self.height(), "saved board");
        Ok(())
    }

    /// ファイルから盤面を読み込んで現在の盤面を置き換える
    /// 状態は読み込んだセルから再計算される
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let loaded = decode(&data)?;

        *self = loaded;

        info!(path = %path.display(), width = self.width(), height = self.height(), "loaded board");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Status;

    fn sample_board() -> Board {
        let cells = vec![
            Cell::new(Owner::Player, Color::Red),
            Cell::new(Owner::Nobody, Color::Green),
            Cell::new(Owner::Nobody, Color::White),
            Cell::new(Owner::AI, Color::Blue),
        ];
        Board::from_cells(2, 2, cells).unwrap()
    }

    #[test]
    fn test_encode_layout() {
        let data = encode(&sample_board());

        assert_eq!(data.len(), HEADER_SIZE + 4 * CELL_SIZE);
        assert_eq!(read_u32(&data, 0), 2);
        assert_eq!(read_u32(&data, 4), 2);
        // 先頭セル: Player(2), Red(0)
        assert_eq!(read_u32(&data, 8), 2);
        assert_eq!(read_u32(&data, 12), 0);
        // 末尾セル: AI(1), Blue(2)
        assert_eq!(read_u32(&data, 32), 1);
        assert_eq!(read_u32(&data, 36), 2);
    }

    #[test]
    fn test_decode_restores_board_and_status() {
        let board = sample_board();
        let decoded = decode(&encode(&board)).unwrap();

        assert_eq!(decoded, board);
        assert_eq!(decoded.status(), Status::Running);
    }

    #[test]
    fn test_decode_zero_dimensions() {
        let mut data = encode(&sample_board());
        data[0..4].copy_from_slice(&0u32.to_le_bytes());

        let result = decode(&data);
        assert!(matches!(result, Err(PersistenceError::CorruptDimensions { width: 0, height: 2 })));
    }

    #[test]
    fn test_decode_truncated() {
        let data = encode(&sample_board());

        let result = decode(&data[..data.len() - 1]);
        assert!(matches!(result, Err(PersistenceError::SizeMismatch { .. })));

        let result = decode(&data[..3]);
        assert!(matches!(result, Err(PersistenceError::SizeMismatch { expected: 8, actual: 3 })));
    }

    #[test]
    fn test_decode_trailing_bytes() {
        let mut data = encode(&sample_board());
        data.push(0);

        assert!(matches!(decode(&data), Err(PersistenceError::SizeMismatch { .. })));
    }

    #[test]
    fn test_decode_invalid_owner_and_color() {
        let mut data = encode(&sample_board());
        data[16..20].copy_from_slice(&7u32.to_le_bytes());
        assert!(matches!(decode(&data), Err(PersistenceError::InvalidOwner { value: 7, index: 1 })));

        let mut data = encode(&sample_board());
        data[20..24].copy_from_slice(&8u32.to_le_bytes());
        assert!(matches!(decode(&data), Err(PersistenceError::InvalidColor { value: 8, index: 1 })));
    }

    #[test]
    fn test_decode_huge_dimensions_rejected_without_allocating() {
        let mut data = Vec::new();
        data.extend_from_slice(&u32::MAX.to_le_bytes());
        data.extend_from_slice(&u32::MAX.to_le_bytes());

        assert!(decode(&data).is_err());
    }
}
