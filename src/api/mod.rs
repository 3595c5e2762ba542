//! 陣取りAPI モジュール
//!
//! ゲームの作成、色の選択、一時停止・再開、保存・読み込みをWebAPI経由で提供する。

pub mod dto;
pub mod service;
pub mod handlers;
pub mod routes;
pub mod middleware;

pub use dto::*;
pub use service::*;
pub use routes::*;
