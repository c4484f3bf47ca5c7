use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::components::PowerUpKind;
use crate::error::{GameError, GameResult};

pub const DEFAULT_CELL_SIZE: f32 = 20.0;
pub const DEFAULT_TICK_RATE: u32 = 60;
pub const DEFAULT_LIVES: u32 = 3;
pub const SPEED_BOOST_FACTOR: f32 = 1.5;
pub const LEVEL_SPEED_STEP: f32 = 0.1;
pub const AMBUSH_LOOKAHEAD_CELLS: f32 = 4.0;
pub const SHY_RADIUS_CELLS: f32 = 8.0;
pub const RANDOM_KEEP_CHANCE: f64 = 0.8;
pub const MAX_WALL_MODIFICATIONS: u32 = 5;
pub const MAX_EXTRA_ENEMIES: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Speeds {
    pub player: f32,
    pub enemy: f32,
}

impl Difficulty {
    pub fn speeds(self) -> Speeds {
        match self {
            Difficulty::Easy => Speeds {
                player: 2.0,
                enemy: 1.5,
            },
            Difficulty::Medium => Speeds {
                player: 3.0,
                enemy: 2.5,
            },
            Difficulty::Hard => Speeds {
                player: 4.0,
                enemy: 3.5,
            },
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{other}' (easy, medium, hard)")),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTable {
    pub dot: u64,
    pub power_pellet: u64,
    pub enemy: u64,
    pub fruit: u64,
    pub level_clear: u64,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            dot: 1,
            power_pellet: 10,
            enemy: 50,
            fruit: 100,
            level_clear: 500,
        }
    }
}

/// Every duration is in milliseconds of simulated time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub cell_size: f32,
    pub tick_rate: u32,
    pub difficulty: Difficulty,
    pub lives: u32,
    pub ghost_vulnerability_ms: u64,
    pub speed_boost_ms: u64,
    pub shield_ms: u64,
    pub enemy_respawn_ms: u64,
    pub death_delay_ms: u64,
    pub level_transition_ms: u64,
    pub scores: ScoreTable,
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            tick_rate: DEFAULT_TICK_RATE,
            difficulty: Difficulty::Easy,
            lives: DEFAULT_LIVES,
            ghost_vulnerability_ms: 10_000,
            speed_boost_ms: 5_000,
            shield_ms: 10_000,
            enemy_respawn_ms: 5_000,
            death_delay_ms: 1_000,
            level_transition_ms: 1_000,
            scores: ScoreTable::default(),
            seed: 0x5eed,
        }
    }
}

impl GameConfig {
    pub fn load(path: &Path) -> GameResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| GameError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| GameError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `PACMON_TICK_RATE`, `PACMON_DIFFICULTY` and `PACMON_SEED`.
    /// Unparseable values are ignored.
    pub fn apply_env(&mut self) {
        if let Some(rate) = std::env::var("PACMON_TICK_RATE")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
        {
            self.tick_rate = rate;
        }
        if let Ok(raw) = std::env::var("PACMON_DIFFICULTY") {
            match raw.parse::<Difficulty>() {
                Ok(difficulty) => self.difficulty = difficulty,
                Err(err) => tracing::warn!("ignoring PACMON_DIFFICULTY: {err}"),
            }
        }
        if let Some(seed) = std::env::var("PACMON_SEED")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.seed = seed;
        }
    }

    pub fn ticks_for(&self, ms: u64) -> u32 {
        let rate = u64::from(self.tick_rate.max(1));
        ms.saturating_mul(rate)
            .div_ceil(1000)
            .min(u64::from(u32::MAX)) as u32
    }

    pub fn power_up_ticks(&self, kind: PowerUpKind) -> u32 {
        match kind {
            PowerUpKind::GhostVulnerability => self.ticks_for(self.ghost_vulnerability_ms),
            PowerUpKind::SpeedBoost => self.ticks_for(self.speed_boost_ms),
            PowerUpKind::Shield => self.ticks_for(self.shield_ms),
            PowerUpKind::BonusFruit => 0,
        }
    }

    pub fn collision_threshold(&self) -> f32 {
        self.cell_size / 2.0
    }

    /// Base speed multiplier for `level` (1-based): +10% per level.
    pub fn level_speed_multiplier(level: u32) -> f32 {
        1.0 + level.saturating_sub(1) as f32 * LEVEL_SPEED_STEP
    }
}
