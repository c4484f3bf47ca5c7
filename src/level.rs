use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::components::{Cell, GridPos};
use crate::config::MAX_WALL_MODIFICATIONS;
use crate::error::{GameError, GameResult};

/// The classic 28x31 board. `#` wall, `.` dot, `o` power pellet, `T` tunnel,
/// `G` enemy spawn, `P` player spawn, space empty.
pub const CLASSIC_LAYOUT: [&str; 31] = [
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "     #.##### ## #####.#     ",
    "     #.##          ##.#     ",
    "     #.## ###GG### ##.#     ",
    "######.## #      # ##.######",
    "T     .   #      #   .     T",
    "######.## #      # ##.######",
    "     #.## ######## ##.#     ",
    "     #.##          ##.#     ",
    "     #.## ######## ##.#     ",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#o..##.......P .......##..o#",
    "###.##.##.########.##.##.###",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
];

/// Immutable cell table a level is built from.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Layout {
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> GameResult<Layout> {
        let width = rows
            .first()
            .map(|row| row.as_ref().chars().count())
            .filter(|w| *w > 0)
            .ok_or(GameError::EmptyLayout)?;
        let mut cells = Vec::with_capacity(width * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(GameError::RaggedLayout {
                    row,
                    expected: width,
                    found,
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let cell = Cell::from_char(ch).ok_or(GameError::UnknownCell { ch, col, row })?;
                cells.push(cell);
            }
        }
        if !cells.contains(&Cell::PlayerSpawn) {
            return Err(GameError::MissingSpawn("player"));
        }
        if !cells.contains(&Cell::EnemySpawn) {
            return Err(GameError::MissingSpawn("enemy"));
        }
        Ok(Layout {
            width,
            height: rows.len(),
            cells,
        })
    }

    pub fn classic() -> Layout {
        Layout::parse(&CLASSIC_LAYOUT).expect("classic layout is well-formed")
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

/// Grid state for the level in play: static topology plus what is left to
/// collect.
#[derive(Clone, Debug)]
pub struct Maze {
    layout: Layout,
    cells: Vec<Cell>,
    dot_count: usize,
    dots_collected: usize,
    power_pellets: Vec<GridPos>,
    fruits: Vec<GridPos>,
    tunnels: Vec<GridPos>,
    player_spawn: GridPos,
    enemy_spawn: GridPos,
}

impl Maze {
    /// Builds the first level. Level one carries no random perturbation.
    pub fn new(layout: Layout) -> Maze {
        let mut maze = Maze {
            cells: layout.cells.clone(),
            layout,
            dot_count: 0,
            dots_collected: 0,
            power_pellets: Vec::new(),
            fruits: Vec::new(),
            tunnels: Vec::new(),
            player_spawn: GridPos::new(0, 0),
            enemy_spawn: GridPos::new(0, 0),
        };
        maze.rebuild();
        maze
    }

    /// Restores the layout and applies the perturbation for `level`.
    pub fn initialize(&mut self, level: u32, rng: &mut impl Rng) {
        self.cells = self.layout.cells.clone();
        self.fruits.clear();
        self.rebuild();
        if level > 1 {
            self.densify(level, rng);
            if level % 2 == 0 {
                self.add_random_fruit(rng);
            }
            self.dot_count = self.count(Cell::Dot);
        }
    }

    fn rebuild(&mut self) {
        self.dots_collected = 0;
        self.power_pellets.clear();
        self.tunnels.clear();
        for row in 0..self.height() {
            for col in 0..self.width() {
                let pos = GridPos::new(col as i32, row as i32);
                match self.cells[row * self.width() + col] {
                    Cell::PlayerSpawn => self.player_spawn = pos,
                    Cell::EnemySpawn => self.enemy_spawn = pos,
                    Cell::Tunnel => self.tunnels.push(pos),
                    Cell::PowerPellet => self.power_pellets.push(pos),
                    _ => {}
                }
            }
        }
        self.dot_count = self.count(Cell::Dot);
    }

    fn count(&self, kind: Cell) -> usize {
        self.cells.iter().filter(|c| **c == kind).count()
    }

    /// Turns up to `min(5, level - 1)` random dot cells into walls, skipping
    /// any conversion that would strand a collectible.
    fn densify(&mut self, level: u32, rng: &mut impl Rng) {
        let modifications = MAX_WALL_MODIFICATIONS.min(level - 1);
        for _ in 0..modifications {
            let col = rng.gen_range(0..self.width());
            let row = rng.gen_range(0..self.height());
            let idx = row * self.width() + col;
            if self.cells[idx] != Cell::Dot {
                continue;
            }
            self.cells[idx] = Cell::Wall;
            if self.strands_collectible() {
                self.cells[idx] = Cell::Dot;
            } else {
                tracing::debug!(col, row, level, "dot cell walled off");
            }
        }
    }

    fn strands_collectible(&self) -> bool {
        let reachable = self.reachable_from(self.player_spawn);
        self.cells
            .iter()
            .zip(&reachable)
            .any(|(cell, seen)| matches!(cell, Cell::Dot | Cell::PowerPellet) && !seen)
    }

    /// Flood fill over non-wall cells, following tunnel links across edges.
    fn reachable_from(&self, start: GridPos) -> Vec<bool> {
        let mut seen = vec![false; self.cells.len()];
        let Some(start_idx) = self.index(start.col, start.row) else {
            return seen;
        };
        let mut q = VecDeque::new();
        seen[start_idx] = true;
        q.push_back(start);
        while let Some(pos) = q.pop_front() {
            let tunnel = self.cell(pos.col, pos.row) == Some(Cell::Tunnel);
            for (dx, dy) in [(0, -1), (0, 1), (-1, 0), (1, 0)] {
                let mut next = GridPos::new(pos.col + dx, pos.row + dy);
                if tunnel {
                    next.col = next.col.rem_euclid(self.width() as i32);
                    next.row = next.row.rem_euclid(self.height() as i32);
                }
                let Some(idx) = self.index(next.col, next.row) else {
                    continue;
                };
                if seen[idx] || self.cells[idx] == Cell::Wall {
                    continue;
                }
                seen[idx] = true;
                q.push_back(next);
            }
        }
        seen
    }

    /// Places a fruit on a random Empty or Dot cell the player can reach.
    pub fn add_random_fruit(&mut self, rng: &mut impl Rng) -> Option<GridPos> {
        let reachable = self.reachable_from(self.player_spawn);
        let mut candidates = Vec::new();
        for row in 0..self.height() {
            for col in 0..self.width() {
                let pos = GridPos::new(col as i32, row as i32);
                let idx = row * self.width() + col;
                let open = matches!(self.cells[idx], Cell::Empty | Cell::Dot);
                if open && reachable[idx] && !self.fruits.contains(&pos) {
                    candidates.push(pos);
                }
            }
        }
        let pos = candidates.choose(rng).copied()?;
        self.fruits.push(pos);
        tracing::debug!(col = pos.col, row = pos.row, "fruit placed");
        Some(pos)
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col as usize >= self.width() || row as usize >= self.height() {
            return None;
        }
        Some(row as usize * self.width() + col as usize)
    }

    pub fn cell(&self, col: i32, row: i32) -> Option<Cell> {
        self.index(col, row).map(|idx| self.cells[idx])
    }

    pub fn is_wall(&self, col: i32, row: i32) -> bool {
        self.cell(col, row) == Some(Cell::Wall)
    }

    pub fn has_dot(&self, col: i32, row: i32) -> bool {
        self.cell(col, row) == Some(Cell::Dot)
    }

    pub fn has_power_pellet(&self, col: i32, row: i32) -> bool {
        self.cell(col, row) == Some(Cell::PowerPellet)
    }

    pub fn has_fruit(&self, col: i32, row: i32) -> bool {
        self.fruits.contains(&GridPos::new(col, row))
    }

    pub fn collect_dot(&mut self, col: i32, row: i32) -> bool {
        if !self.has_dot(col, row) {
            return false;
        }
        if let Some(idx) = self.index(col, row) {
            self.cells[idx] = Cell::Empty;
        }
        self.dots_collected += 1;
        true
    }

    pub fn collect_power_pellet(&mut self, col: i32, row: i32) -> bool {
        if !self.has_power_pellet(col, row) {
            return false;
        }
        if let Some(idx) = self.index(col, row) {
            self.cells[idx] = Cell::Empty;
        }
        self.power_pellets
            .retain(|p| *p != GridPos::new(col, row));
        true
    }

    pub fn collect_fruit(&mut self, col: i32, row: i32) -> bool {
        match self.fruits.iter().position(|f| *f == GridPos::new(col, row)) {
            Some(idx) => {
                self.fruits.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn all_dots_collected(&self) -> bool {
        self.dots_collected >= self.dot_count
    }

    pub fn dot_count(&self) -> usize {
        self.dot_count
    }

    pub fn dots_remaining(&self) -> usize {
        self.dot_count.saturating_sub(self.dots_collected)
    }

    pub fn width(&self) -> usize {
        self.layout.width
    }

    pub fn height(&self) -> usize {
        self.layout.height
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn fruits(&self) -> &[GridPos] {
        &self.fruits
    }

    pub fn power_pellets(&self) -> &[GridPos] {
        &self.power_pellets
    }

    pub fn tunnels(&self) -> &[GridPos] {
        &self.tunnels
    }

    pub fn player_spawn(&self) -> GridPos {
        self.player_spawn
    }

    pub fn enemy_spawn(&self) -> GridPos {
        self.enemy_spawn
    }
}
