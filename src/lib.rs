//! Fixed-timestep maze chase simulation: a player agent, personality-driven
//! enemies, timed power-ups and a best-score store.
//!
//! [`game::Game`] owns everything and is driven one tick at a time with
//! [`game::Game::step`]; front ends read [`game::Snapshot`]s and drain
//! [`game::GameEvent`]s.

pub mod components;
pub mod config;
pub mod error;
pub mod game;
pub mod ghost;
pub mod level;
pub mod motion;
pub mod player;
pub mod powerups;
pub mod storage;
pub mod timers;

pub use components::{Cell, Direction, GridPos, Personality, Position, PowerUpKind};
pub use config::{Difficulty, GameConfig};
pub use error::{GameError, GameResult};
pub use game::{Game, GameEvent, GameState, Phase, Snapshot};
pub use level::{Layout, Maze};
pub use storage::{BestScoreStore, JsonFileStore, MemoryScoreStore};
