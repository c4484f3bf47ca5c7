use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Wall,
    Dot,
    PowerPellet,
    Tunnel,
    EnemySpawn,
    PlayerSpawn,
}

impl Cell {
    pub fn from_char(ch: char) -> Option<Cell> {
        match ch {
            ' ' => Some(Cell::Empty),
            '#' => Some(Cell::Wall),
            '.' => Some(Cell::Dot),
            'o' => Some(Cell::PowerPellet),
            'T' => Some(Cell::Tunnel),
            'G' => Some(Cell::EnemySpawn),
            'P' => Some(Cell::PlayerSpawn),
            _ => None,
        }
    }
}

/// Integer grid coordinate. Signed so that probes past the maze edge stay
/// representable and simply answer "out of bounds".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub col: i32,
    pub row: i32,
}

impl GridPos {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

/// Continuous position in pixel units.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dir: Direction, amount: f32) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx as f32 * amount,
            y: self.y + dy as f32 * amount,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    /// Enumeration order doubles as the tie-break order for enemy decisions.
    pub const CARDINAL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::None => (0, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::None => Direction::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    GhostVulnerability,
    SpeedBoost,
    Shield,
    BonusFruit,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::GhostVulnerability,
        PowerUpKind::SpeedBoost,
        PowerUpKind::Shield,
        PowerUpKind::BonusFruit,
    ];

    pub fn index(self) -> usize {
        match self {
            PowerUpKind::GhostVulnerability => 0,
            PowerUpKind::SpeedBoost => 1,
            PowerUpKind::Shield => 2,
            PowerUpKind::BonusFruit => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Personality {
    Chaser,
    Ambusher,
    Random,
    Shy,
}

impl Personality {
    pub const ALL: [Personality; 4] = [
        Personality::Chaser,
        Personality::Ambusher,
        Personality::Random,
        Personality::Shy,
    ];
}
