pub mod types;
pub mod board;
pub mod persistence;
pub mod state;

pub use types::*;
pub use board::*;
pub use state::*;
