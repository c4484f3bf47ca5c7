use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

/// Keeps the single persisted value: the best score ever reached.
///
/// `submit` runs inside the simulation step and must not block, so stores that
/// write somewhere slow defer the write to `flush`.
pub trait BestScoreStore {
    fn best(&self) -> u64;

    /// Records `score` if it beats the stored best. Returns whether it did.
    fn submit(&mut self, score: u64) -> bool;

    fn flush(&mut self) -> GameResult<()> {
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryScoreStore {
    best: u64,
}

impl MemoryScoreStore {
    pub fn new(best: u64) -> Self {
        Self { best }
    }
}

impl BestScoreStore for MemoryScoreStore {
    fn best(&self) -> u64 {
        self.best
    }

    fn submit(&mut self, score: u64) -> bool {
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ScoreFile {
    best_score: u64,
}

/// Best score kept in a small JSON document, `{ "best_score": n }`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    best: u64,
    dirty: bool,
}

impl JsonFileStore {
    /// Opens `path`. A missing file is a fresh store with a best of zero.
    pub fn open(path: impl Into<PathBuf>) -> GameResult<Self> {
        let path = path.into();
        let best = match fs::read_to_string(&path) {
            Ok(raw) => {
                let file: ScoreFile =
                    serde_json::from_str(&raw).map_err(|source| GameError::Json {
                        path: path.clone(),
                        source,
                    })?;
                file.best_score
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => 0,
            Err(source) => return Err(GameError::Io { path, source }),
        };
        Ok(Self {
            path,
            best,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BestScoreStore for JsonFileStore {
    fn best(&self) -> u64 {
        self.best
    }

    fn submit(&mut self, score: u64) -> bool {
        if score > self.best {
            self.best = score;
            self.dirty = true;
            true
        } else {
            false
        }
    }

    fn flush(&mut self) -> GameResult<()> {
        if !self.dirty {
            return Ok(());
        }
        let file = ScoreFile {
            best_score: self.best,
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| GameError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| GameError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.dirty = false;
        tracing::debug!(path = %self.path.display(), best = self.best, "best score saved");
        Ok(())
    }
}
