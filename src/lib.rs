pub mod game;
pub mod ai;
pub mod api;
pub mod session;
pub mod error;
pub mod config;

pub use error::{GameError, PersistenceError, Result};
pub use config::{Config, ConfigError};
