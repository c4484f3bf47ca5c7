use rand::seq::SliceRandom;
use rand::Rng;

use crate::components::{Direction, Personality, Position};
use crate::config::{AMBUSH_LOOKAHEAD_CELLS, RANDOM_KEEP_CHANCE, SHY_RADIUS_CELLS};
use crate::level::Maze;
use crate::motion;
use crate::timers::{self, Countdown};

/// What an enemy is allowed to know about the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerView {
    pub position: Position,
    pub direction: Direction,
}

/// Inputs to a single direction decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecisionContext {
    pub position: Position,
    pub direction: Direction,
    pub player: PlayerView,
    pub cell_size: f32,
}

/// Picks a direction out of `candidates`. Distance-based choices look one
/// cell ahead and break ties in favor of the earliest candidate, so with
/// candidates in `Direction::CARDINAL` order the result is deterministic.
/// Returns `None` only when there is nothing to choose from.
pub fn choose_direction(
    personality: Personality,
    vulnerable: bool,
    ctx: &DecisionContext,
    candidates: &[Direction],
    rng: &mut impl Rng,
) -> Option<Direction> {
    if candidates.is_empty() {
        return None;
    }
    if vulnerable {
        return flee(ctx, candidates);
    }
    match personality {
        Personality::Chaser => approach(ctx, ctx.player.position, candidates),
        Personality::Ambusher => {
            let lookahead = ctx.cell_size * AMBUSH_LOOKAHEAD_CELLS;
            let predicted = ctx.player.position.offset(ctx.player.direction, lookahead);
            approach(ctx, predicted, candidates)
        }
        Personality::Random => wander(ctx, candidates, rng),
        Personality::Shy => {
            let gap = motion::distance(ctx.position, ctx.player.position);
            if gap > ctx.cell_size * SHY_RADIUS_CELLS {
                wander(ctx, candidates, rng)
            } else {
                flee(ctx, candidates)
            }
        }
    }
}

fn approach(ctx: &DecisionContext, target: Position, candidates: &[Direction]) -> Option<Direction> {
    let mut best = None;
    let mut best_dist = f32::INFINITY;
    for &dir in candidates {
        let d = motion::distance(ctx.position.offset(dir, ctx.cell_size), target);
        if d < best_dist {
            best_dist = d;
            best = Some(dir);
        }
    }
    best.or_else(|| candidates.first().copied())
}

fn flee(ctx: &DecisionContext, candidates: &[Direction]) -> Option<Direction> {
    let mut best = None;
    let mut best_dist = f32::NEG_INFINITY;
    for &dir in candidates {
        let d = motion::distance(ctx.position.offset(dir, ctx.cell_size), ctx.player.position);
        if d > best_dist {
            best_dist = d;
            best = Some(dir);
        }
    }
    best.or_else(|| candidates.first().copied())
}

fn wander(ctx: &DecisionContext, candidates: &[Direction], rng: &mut impl Rng) -> Option<Direction> {
    if ctx.direction != Direction::None
        && candidates.contains(&ctx.direction)
        && rng.gen_bool(RANDOM_KEEP_CHANCE)
    {
        return Some(ctx.direction);
    }
    candidates.choose(rng).copied()
}

/// Timers that fired during one [`Enemy::tick_timers`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnemyTimers {
    pub vulnerability_ended: bool,
    pub respawned: bool,
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub position: Position,
    pub direction: Direction,
    personality: Personality,
    home: Position,
    base_speed: f32,
    speed: f32,
    cell_size: f32,
    vulnerable: bool,
    vulnerable_timer: Option<Countdown>,
    eaten: bool,
    respawn_timer: Option<Countdown>,
    respawn_at: Position,
}

impl Enemy {
    pub fn new(personality: Personality, home: Position, speed: f32, cell_size: f32) -> Self {
        Self {
            position: home,
            direction: Direction::None,
            personality,
            home,
            base_speed: speed,
            speed,
            cell_size,
            vulnerable: false,
            vulnerable_timer: None,
            eaten: false,
            respawn_timer: None,
            respawn_at: home,
        }
    }

    pub fn update(&mut self, maze: &Maze, player: PlayerView, rng: &mut impl Rng) {
        if self.eaten {
            return;
        }

        if motion::at_cell_center(self.position, self.cell_size) {
            self.decide(maze, player, rng);
        }

        if self.direction != Direction::None
            && motion::is_valid_move(self.position, self.direction, maze, self.cell_size)
        {
            let step = motion::advance(
                self.position,
                self.direction,
                self.speed,
                maze,
                self.cell_size,
                true,
            );
            self.position = step.position;
        } else {
            // Blocked: any open direction will do, reversal included.
            let open = motion::available_directions(self.position, maze, self.cell_size);
            if let Some(dir) = self.pick(&open, player, rng) {
                self.direction = dir;
            }
        }
    }

    fn decide(&mut self, maze: &Maze, player: PlayerView, rng: &mut impl Rng) {
        let open = motion::available_directions(self.position, maze, self.cell_size);
        let reverse = self.direction.opposite();
        let forward: Vec<Direction> = open
            .iter()
            .copied()
            .filter(|dir| self.direction == Direction::None || *dir != reverse)
            .collect();
        let candidates = if forward.is_empty() { open } else { forward };
        if let Some(dir) = self.pick(&candidates, player, rng) {
            self.direction = dir;
        }
    }

    fn pick(
        &self,
        candidates: &[Direction],
        player: PlayerView,
        rng: &mut impl Rng,
    ) -> Option<Direction> {
        let ctx = DecisionContext {
            position: self.position,
            direction: self.direction,
            player,
            cell_size: self.cell_size,
        };
        choose_direction(self.personality, self.vulnerable, &ctx, candidates, rng)
    }

    /// Ignored while eaten: an eaten enemy is never vulnerable.
    pub fn make_vulnerable(&mut self, duration_ticks: u32) {
        if self.eaten {
            return;
        }
        self.vulnerable = true;
        self.speed = self.base_speed * 0.5;
        self.vulnerable_timer = Some(Countdown::new(duration_ticks));
    }

    pub fn clear_vulnerability(&mut self) {
        self.vulnerable = false;
        self.vulnerable_timer = None;
        self.speed = self.base_speed;
    }

    pub fn get_eaten(&mut self, respawn_ticks: u32, spawn: Position) {
        self.clear_vulnerability();
        self.eaten = true;
        self.respawn_timer = Some(Countdown::new(respawn_ticks));
        self.respawn_at = spawn;
    }

    pub fn tick_timers(&mut self) -> EnemyTimers {
        let mut fired = EnemyTimers::default();
        if timers::drain(&mut self.vulnerable_timer) {
            self.vulnerable = false;
            self.speed = self.base_speed;
            fired.vulnerability_ended = true;
        }
        if timers::drain(&mut self.respawn_timer) {
            self.position = self.respawn_at;
            self.direction = Direction::None;
            self.eaten = false;
            self.speed = self.base_speed;
            fired.respawned = true;
        }
        fired
    }

    pub fn reset(&mut self, position: Position) {
        self.vulnerable_timer = None;
        self.respawn_timer = None;
        self.position = position;
        self.direction = Direction::None;
        self.vulnerable = false;
        self.eaten = false;
        self.speed = self.base_speed;
    }

    pub fn personality(&self) -> Personality {
        self.personality
    }

    pub fn home(&self) -> Position {
        self.home
    }

    pub fn is_vulnerable(&self) -> bool {
        self.vulnerable
    }

    pub fn is_eaten(&self) -> bool {
        self.eaten
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }

    pub fn vulnerable_fraction_remaining(&self) -> f32 {
        self.vulnerable_timer
            .map_or(0.0, |t| t.fraction_remaining())
    }
}
