use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("layout is empty")]
    EmptyLayout,
    #[error("layout row {row} has {found} cells, expected {expected}")]
    RaggedLayout {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown layout character {ch:?} at column {col}, row {row}")]
    UnknownCell { ch: char, col: usize, row: usize },
    #[error("layout has no {0} spawn marker")]
    MissingSpawn(&'static str),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type GameResult<T> = Result<T, GameError>;
