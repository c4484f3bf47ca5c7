use crate::components::{Direction, Position, PowerUpKind};
use crate::config::SPEED_BOOST_FACTOR;
use crate::level::Maze;
use crate::motion;
use crate::timers::{self, Countdown};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeathOutcome {
    /// A shield absorbed the hit; nothing changed.
    Shielded,
    /// A life was lost and at least one remains.
    Respawn,
    GameOver,
}

#[derive(Clone, Copy, Debug, Default)]
struct PowerUpSlot {
    active: bool,
    timer: Option<Countdown>,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub position: Position,
    pub direction: Direction,
    pub next_direction: Direction,
    base_speed: f32,
    speed: f32,
    alive: bool,
    lives: u32,
    cell_size: f32,
    power_ups: [PowerUpSlot; 4],
}

impl Player {
    pub fn new(position: Position, speed: f32, lives: u32, cell_size: f32) -> Self {
        Self {
            position,
            direction: Direction::None,
            next_direction: Direction::None,
            base_speed: speed,
            speed,
            alive: true,
            lives,
            cell_size,
            power_ups: [PowerUpSlot::default(); 4],
        }
    }

    pub fn update(&mut self, maze: &Maze) {
        if !self.alive {
            return;
        }

        // Turn-ahead: a queued turn waits until it becomes legal.
        if self.next_direction != Direction::None
            && motion::is_valid_move(self.position, self.next_direction, maze, self.cell_size)
        {
            self.direction = self.next_direction;
            self.next_direction = Direction::None;
        }

        if self.direction != Direction::None {
            let step = motion::advance(
                self.position,
                self.direction,
                self.speed,
                maze,
                self.cell_size,
                false,
            );
            self.position = step.position;
        }
    }

    pub fn set_intended_direction(&mut self, dir: Direction) {
        self.next_direction = dir;
    }

    pub fn die(&mut self) -> DeathOutcome {
        if self.has_power_up(PowerUpKind::Shield) {
            return DeathOutcome::Shielded;
        }
        self.alive = false;
        self.lives = self.lives.saturating_sub(1);
        if self.lives > 0 {
            DeathOutcome::Respawn
        } else {
            DeathOutcome::GameOver
        }
    }

    /// Activates `kind` for `duration_ticks`, replacing any pending expiry.
    pub fn activate_power_up(&mut self, kind: PowerUpKind, duration_ticks: u32) {
        let slot = &mut self.power_ups[kind.index()];
        slot.active = true;
        slot.timer = Some(Countdown::new(duration_ticks));
        if kind == PowerUpKind::SpeedBoost {
            self.speed = self.base_speed * SPEED_BOOST_FACTOR;
        }
    }

    pub fn deactivate_power_up(&mut self, kind: PowerUpKind) {
        let slot = &mut self.power_ups[kind.index()];
        slot.active = false;
        slot.timer = None;
        if kind == PowerUpKind::SpeedBoost {
            self.speed = self.base_speed;
        }
    }

    pub fn clear_power_ups(&mut self) {
        for slot in &mut self.power_ups {
            *slot = PowerUpSlot::default();
        }
        self.speed = self.base_speed;
    }

    /// Advances every power-up countdown one tick and returns what expired.
    pub fn tick_timers(&mut self) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        for kind in PowerUpKind::ALL {
            if timers::drain(&mut self.power_ups[kind.index()].timer) {
                self.deactivate_power_up(kind);
                expired.push(kind);
            }
        }
        expired
    }

    pub fn has_power_up(&self, kind: PowerUpKind) -> bool {
        self.power_ups[kind.index()].active
    }

    pub fn power_up_fraction_remaining(&self, kind: PowerUpKind) -> f32 {
        self.power_ups[kind.index()]
            .timer
            .map_or(0.0, |t| t.fraction_remaining())
    }

    pub fn reset(&mut self, position: Position) {
        self.position = position;
        self.direction = Direction::None;
        self.next_direction = Direction::None;
        self.alive = true;
        self.clear_power_ups();
    }

    pub fn set_base_speed(&mut self, speed: f32) {
        self.base_speed = speed;
        self.speed = if self.has_power_up(PowerUpKind::SpeedBoost) {
            speed * SPEED_BOOST_FACTOR
        } else {
            speed
        };
    }

    pub fn set_lives(&mut self, lives: u32) {
        self.lives = lives;
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }
}
