use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::components::{Cell, Direction, GridPos, Personality, Position, PowerUpKind};
use crate::config::{GameConfig, MAX_EXTRA_ENEMIES};
use crate::error::GameResult;
use crate::ghost::{Enemy, PlayerView};
use crate::level::{Layout, Maze};
use crate::motion::{self, cell_center, cell_of};
use crate::player::{DeathOutcome, Player};
use crate::powerups::PowerUpCoordinator;
use crate::storage::BestScoreStore;
use crate::timers::{self, Countdown};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Ready,
    Playing,
    Paused,
    GameOver,
}

/// What the simulation is doing while `Playing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Running,
    /// The player is down and the board resets when the delay runs out.
    Dying,
    /// The level is cleared; the next one starts when the delay runs out.
    LevelTransition,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    DotCollected,
    PowerUpCollected(PowerUpKind),
    FruitCollected,
    GhostEaten,
    PlayerDeath,
    LevelUp(u32),
    GameStart,
    GameOver(u64),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub position: Position,
    pub direction: Direction,
    pub alive: bool,
    pub shielded: bool,
    pub speed_boosted: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnemySnapshot {
    pub position: Position,
    pub direction: Direction,
    pub personality: Personality,
    pub vulnerable: bool,
    pub eaten: bool,
    pub vulnerable_remaining: f32,
}

/// Read-only view of one moment of the simulation, for renderers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub width: usize,
    pub height: usize,
    pub cell_size: f32,
    pub cells: Vec<Cell>,
    pub fruits: Vec<GridPos>,
    pub player: PlayerSnapshot,
    pub enemies: Vec<EnemySnapshot>,
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    pub best_score: u64,
    pub dots_remaining: usize,
    pub active_power_ups: Vec<PowerUpKind>,
    pub state: GameState,
    pub phase: Phase,
}

impl Snapshot {
    pub fn cell(&self, col: usize, row: usize) -> Option<Cell> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.cells.get(row * self.width + col).copied()
    }
}

pub struct Game {
    config: GameConfig,
    maze: Maze,
    player: Player,
    enemies: Vec<Enemy>,
    power_ups: PowerUpCoordinator,
    rng: StdRng,
    store: Box<dyn BestScoreStore>,
    events: Vec<GameEvent>,
    state: GameState,
    phase: Phase,
    phase_timer: Option<Countdown>,
    score: u64,
    level: u32,
    ticks: u64,
}

impl Game {
    pub fn new(config: GameConfig, layout: Layout, store: Box<dyn BestScoreStore>) -> Self {
        let maze = Maze::new(layout);
        let cs = config.cell_size;
        let speeds = config.difficulty.speeds();
        let player = Player::new(
            cell_center(maze.player_spawn(), cs),
            speeds.player,
            config.lives,
            cs,
        );
        let mut game = Self {
            rng: StdRng::seed_from_u64(config.seed),
            maze,
            player,
            enemies: Vec::new(),
            power_ups: PowerUpCoordinator::new(),
            store,
            events: Vec::new(),
            state: GameState::Ready,
            phase: Phase::Running,
            phase_timer: None,
            score: 0,
            level: 1,
            ticks: 0,
            config,
        };
        game.start_level();
        game
    }

    /// Begins a fresh game at level one. Also restarts after game over.
    pub fn start(&mut self) {
        self.score = 0;
        self.level = 1;
        self.ticks = 0;
        self.player.set_lives(self.config.lives);
        self.start_level();
        self.state = GameState::Playing;
        self.events.push(GameEvent::GameStart);
        tracing::info!(
            difficulty = %self.config.difficulty,
            seed = self.config.seed,
            "game started"
        );
    }

    pub fn toggle_pause(&mut self) {
        self.state = match self.state {
            GameState::Playing => GameState::Paused,
            GameState::Paused => GameState::Playing,
            other => other,
        };
    }

    pub fn resume(&mut self) {
        if self.state == GameState::Paused {
            self.state = GameState::Playing;
        }
    }

    pub fn set_intended_direction(&mut self, dir: Direction) {
        self.player.set_intended_direction(dir);
    }

    pub fn grant_power_up(&mut self, kind: PowerUpKind) {
        self.power_ups
            .activate(kind, &mut self.player, &mut self.enemies, &self.config);
    }

    /// Advances the simulation by one fixed tick.
    pub fn step(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        self.ticks += 1;

        if self.phase == Phase::LevelTransition {
            if timers::drain(&mut self.phase_timer) {
                self.start_level();
            }
            return;
        }
        self.tick_timers();

        self.player.update(&self.maze);
        let view = PlayerView {
            position: self.player.position,
            direction: self.player.direction,
        };
        for enemy in &mut self.enemies {
            enemy.update(&self.maze, view, &mut self.rng);
        }

        self.resolve_collisions();
        if self.state != GameState::Playing {
            return;
        }
        self.check_level_complete();
    }

    fn tick_timers(&mut self) {
        for kind in self.player.tick_timers() {
            tracing::debug!(?kind, "power-up expired");
        }
        self.power_ups.prune(&self.player);
        for enemy in &mut self.enemies {
            if enemy.tick_timers().respawned {
                tracing::debug!(personality = ?enemy.personality(), "enemy respawned");
            }
        }
        if timers::drain(&mut self.phase_timer) && self.phase == Phase::Dying {
            self.recover_from_death();
        }
    }

    fn resolve_collisions(&mut self) {
        let cell = cell_of(self.player.position, self.config.cell_size);
        if self.player.is_alive() {
            self.collect_items(cell);
        }

        let threshold = self.config.collision_threshold();
        let respawn_ticks = self.config.ticks_for(self.config.enemy_respawn_ms);
        let spawn = cell_center(self.maze.enemy_spawn(), self.config.cell_size);
        for idx in 0..self.enemies.len() {
            let enemy = &mut self.enemies[idx];
            if enemy.is_eaten() || !motion::collides(self.player.position, enemy.position, threshold)
            {
                continue;
            }
            if enemy.is_vulnerable() {
                enemy.get_eaten(respawn_ticks, spawn);
                self.score += self.config.scores.enemy;
                self.events.push(GameEvent::GhostEaten);
                tracing::debug!(personality = ?enemy.personality(), "enemy eaten");
            } else if self.player.is_alive() {
                self.player_hit();
                if self.state != GameState::Playing {
                    return;
                }
            }
        }
    }

    fn collect_items(&mut self, cell: GridPos) {
        let scores = self.config.scores;
        if self.maze.collect_dot(cell.col, cell.row) {
            self.score += scores.dot;
            self.events.push(GameEvent::DotCollected);
        }
        if self.maze.collect_power_pellet(cell.col, cell.row) {
            self.score += scores.power_pellet;
            self.grant_power_up(PowerUpKind::GhostVulnerability);
            self.events
                .push(GameEvent::PowerUpCollected(PowerUpKind::GhostVulnerability));
        }
        if self.maze.collect_fruit(cell.col, cell.row) {
            self.score += scores.fruit;
            self.events.push(GameEvent::FruitCollected);
        }
    }

    fn player_hit(&mut self) {
        match self.player.die() {
            DeathOutcome::Shielded => {
                tracing::debug!("shield absorbed a hit");
            }
            DeathOutcome::Respawn => {
                self.events.push(GameEvent::PlayerDeath);
                self.phase = Phase::Dying;
                self.phase_timer = Some(Countdown::new(
                    self.config.ticks_for(self.config.death_delay_ms),
                ));
                tracing::debug!(lives = self.player.lives(), "player died");
            }
            DeathOutcome::GameOver => {
                self.events.push(GameEvent::PlayerDeath);
                self.events.push(GameEvent::GameOver(self.score));
                self.state = GameState::GameOver;
                self.phase = Phase::Running;
                self.phase_timer = None;
                tracing::info!(score = self.score, level = self.level, "game over");
                if self.store.submit(self.score) {
                    tracing::info!(best = self.score, "new best score");
                }
            }
        }
    }

    fn recover_from_death(&mut self) {
        self.phase = Phase::Running;
        let cs = self.config.cell_size;
        self.player.reset(cell_center(self.maze.player_spawn(), cs));
        for enemy in &mut self.enemies {
            let home = enemy.home();
            enemy.reset(home);
        }
        self.power_ups.clear_all(&mut self.player, &mut self.enemies);
    }

    fn check_level_complete(&mut self) {
        if self.phase != Phase::Running || !self.maze.all_dots_collected() {
            return;
        }
        self.score += self.config.scores.level_clear;
        self.level += 1;
        self.events.push(GameEvent::LevelUp(self.level));
        self.phase = Phase::LevelTransition;
        self.phase_timer = Some(Countdown::new(
            self.config.ticks_for(self.config.level_transition_ms),
        ));
        tracing::info!(level = self.level, score = self.score, "level cleared");
    }

    fn start_level(&mut self) {
        self.maze.initialize(self.level, &mut self.rng);
        let cs = self.config.cell_size;
        let multiplier = GameConfig::level_speed_multiplier(self.level);
        let speeds = self.config.difficulty.speeds();

        self.player.set_base_speed(speeds.player * multiplier);
        self.player.reset(cell_center(self.maze.player_spawn(), cs));
        self.enemies = self.spawn_enemies(speeds.enemy * multiplier);
        self.power_ups.clear_all(&mut self.player, &mut self.enemies);
        self.phase = Phase::Running;
        self.phase_timer = None;
        tracing::debug!(
            level = self.level,
            enemies = self.enemies.len(),
            dots = self.maze.dot_count(),
            "level started"
        );
    }

    fn spawn_enemies(&mut self, speed: f32) -> Vec<Enemy> {
        let cs = self.config.cell_size;
        let spawn = self.maze.enemy_spawn();
        let home_for = |maze: &Maze, (dc, dr): (i32, i32)| {
            let cell = GridPos::new(spawn.col + dc, spawn.row + dr);
            match maze.cell(cell.col, cell.row) {
                None | Some(Cell::Wall) => spawn,
                Some(_) => cell,
            }
        };
        let mut enemies: Vec<Enemy> = [
            (Personality::Chaser, (0, 0)),
            (Personality::Ambusher, (0, -1)),
            (Personality::Random, (-1, 0)),
            (Personality::Shy, (1, 0)),
        ]
        .into_iter()
        .map(|(personality, offset)| {
            let home = cell_center(home_for(&self.maze, offset), cs);
            Enemy::new(personality, home, speed, cs)
        })
        .collect();

        let extra = (self.level / 3).min(MAX_EXTRA_ENEMIES);
        for _ in 0..extra {
            let personality = *Personality::ALL
                .choose(&mut self.rng)
                .unwrap_or(&Personality::Random);
            enemies.push(Enemy::new(personality, cell_center(spawn, cs), speed, cs));
        }
        enemies
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.maze.width(),
            height: self.maze.height(),
            cell_size: self.config.cell_size,
            cells: self.maze.cells().to_vec(),
            fruits: self.maze.fruits().to_vec(),
            player: PlayerSnapshot {
                position: self.player.position,
                direction: self.player.direction,
                alive: self.player.is_alive(),
                shielded: self.player.has_power_up(PowerUpKind::Shield),
                speed_boosted: self.player.has_power_up(PowerUpKind::SpeedBoost),
            },
            enemies: self
                .enemies
                .iter()
                .map(|enemy| EnemySnapshot {
                    position: enemy.position,
                    direction: enemy.direction,
                    personality: enemy.personality(),
                    vulnerable: enemy.is_vulnerable(),
                    eaten: enemy.is_eaten(),
                    vulnerable_remaining: enemy.vulnerable_fraction_remaining(),
                })
                .collect(),
            score: self.score,
            lives: self.player.lives(),
            level: self.level,
            best_score: self.store.best(),
            dots_remaining: self.maze.dots_remaining(),
            active_power_ups: self.power_ups.active_kinds().to_vec(),
            state: self.state,
            phase: self.phase,
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Persists the best score if the store deferred a write.
    pub fn flush_best_score(&mut self) -> GameResult<()> {
        self.store.flush()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemies_mut(&mut self) -> &mut [Enemy] {
        &mut self.enemies
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn maze_mut(&mut self) -> &mut Maze {
        &mut self.maze
    }

    pub fn power_ups(&self) -> &PowerUpCoordinator {
        &self.power_ups
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.player.lives()
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn best_score(&self) -> u64 {
        self.store.best()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryScoreStore;

    fn new_game() -> Game {
        Game::new(
            GameConfig::default(),
            Layout::classic(),
            Box::new(MemoryScoreStore::default()),
        )
    }

    fn playing() -> Game {
        let mut game = new_game();
        game.start();
        game.drain_events();
        game
    }

    #[test]
    fn nothing_moves_before_start() {
        let mut game = new_game();
        assert_eq!(game.state(), GameState::Ready);
        game.set_intended_direction(Direction::Left);
        let before = game.snapshot();
        game.step();
        assert_eq!(game.snapshot(), before);
        assert_eq!(game.ticks(), 0);
    }

    #[test]
    fn start_emits_game_start_and_resets_counters() {
        let mut game = new_game();
        game.start();
        assert_eq!(game.drain_events(), vec![GameEvent::GameStart]);
        assert!(game.drain_events().is_empty());
        assert_eq!(game.score(), 0);
        assert_eq!(game.lives(), 3);
        assert_eq!(game.level(), 1);
        assert_eq!(game.state(), GameState::Playing);
    }

    #[test]
    fn classic_board_places_four_enemies_off_the_walls() {
        let game = playing();
        let personalities: Vec<_> = game.enemies().iter().map(Enemy::personality).collect();
        assert_eq!(personalities, Personality::ALL.to_vec());
        let cs = game.config().cell_size;
        let homes: Vec<GridPos> = game.enemies().iter().map(|e| cell_of(e.home(), cs)).collect();
        // The cell right of the spawn is wall, so Shy starts on the spawn.
        assert_eq!(
            homes,
            vec![
                GridPos::new(14, 12),
                GridPos::new(14, 11),
                GridPos::new(13, 12),
                GridPos::new(14, 12),
            ]
        );
        for home in homes {
            assert!(!game.maze().is_wall(home.col, home.row));
        }
    }

    #[test]
    fn pause_freezes_the_simulation() {
        let mut game = playing();
        game.set_intended_direction(Direction::Left);
        game.toggle_pause();
        assert_eq!(game.state(), GameState::Paused);
        let before = game.player().position;
        for _ in 0..10 {
            game.step();
        }
        assert_eq!(game.player().position, before);
        game.resume();
        game.step();
        assert_ne!(game.player().position, before);
        game.toggle_pause();
        game.toggle_pause();
        assert_eq!(game.state(), GameState::Playing);
    }

    #[test]
    fn power_pellet_scores_and_frightens_enemies() {
        let mut game = playing();
        let cs = game.config().cell_size;
        let pellet = game.maze().power_pellets()[0];
        game.player_mut().position = cell_center(pellet, cs);
        game.step();
        assert_eq!(game.score(), 10);
        assert_eq!(
            game.drain_events(),
            vec![GameEvent::PowerUpCollected(PowerUpKind::GhostVulnerability)]
        );
        assert!(game.enemies().iter().all(Enemy::is_vulnerable));
        assert!(game
            .power_ups()
            .is_active(PowerUpKind::GhostVulnerability, game.player()));
        assert!(game.snapshot().enemies.iter().all(|e| e.vulnerable_remaining > 0.99));
    }

    #[test]
    fn fruit_is_worth_a_hundred() {
        let mut game = playing();
        let cs = game.config().cell_size;
        // Level one never has fruit; place one by hand next to the player.
        let mut rng = StdRng::seed_from_u64(3);
        let fruit = game.maze_mut().add_random_fruit(&mut rng).unwrap();
        game.player_mut().position = cell_center(fruit, cs);
        game.step();
        let events = game.drain_events();
        assert!(events.contains(&GameEvent::FruitCollected));
        assert!(game.score() >= 100);
        assert!(!game.maze().has_fruit(fruit.col, fruit.row));
    }

    #[test]
    fn dead_players_collect_nothing() {
        let mut game = playing();
        let cs = game.config().cell_size;
        game.player_mut().die();
        let dot = GridPos::new(1, 1);
        game.player_mut().position = cell_center(dot, cs);
        game.step();
        assert!(game.maze().has_dot(1, 1));
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn granted_shield_blocks_a_hit() {
        let mut game = playing();
        game.grant_power_up(PowerUpKind::Shield);
        let at = game.player().position;
        game.enemies_mut()[0].position = at;
        game.step();
        assert_eq!(game.lives(), 3);
        assert!(game.player().is_alive());
        assert!(!game.drain_events().contains(&GameEvent::PlayerDeath));
        assert_eq!(game.phase(), Phase::Running);
    }

    #[test]
    fn last_life_ends_the_game_and_records_the_best() {
        let mut game = playing();
        game.player_mut().set_lives(1);
        let at = game.player().position;
        game.enemies_mut()[0].position = at;
        game.step();
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(
            game.drain_events(),
            vec![GameEvent::PlayerDeath, GameEvent::GameOver(0)]
        );
        let frozen = game.snapshot();
        game.step();
        assert_eq!(game.snapshot(), frozen);
    }

    #[test]
    fn best_score_updates_only_when_beaten() {
        let mut game = Game::new(
            GameConfig::default(),
            Layout::classic(),
            Box::new(MemoryScoreStore::new(5)),
        );
        game.start();
        game.player_mut().set_lives(1);
        let at = game.player().position;
        game.enemies_mut()[0].position = at;
        game.step();
        assert_eq!(game.best_score(), 5);

        game.start();
        let cs = game.config().cell_size;
        let pellet = game.maze().power_pellets()[0];
        game.player_mut().position = cell_center(pellet, cs);
        game.step();
        game.player_mut().set_lives(1);
        game.enemies_mut()[1].clear_vulnerability();
        let at = game.player().position;
        game.enemies_mut()[1].position = at;
        game.step();
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.best_score(), 10);
        assert_eq!(game.snapshot().best_score, 10);
    }

    #[test]
    fn higher_levels_are_faster_and_more_crowded() {
        let mut game = playing();
        game.level = 6;
        game.start_level();
        let speeds = game.config().difficulty.speeds();
        let multiplier = GameConfig::level_speed_multiplier(6);
        assert_eq!(game.enemies().len(), 6);
        assert!((game.player().base_speed() - speeds.player * multiplier).abs() < 1e-5);
        assert!(game
            .enemies()
            .iter()
            .all(|e| (e.base_speed() - speeds.enemy * multiplier).abs() < 1e-5));
        assert_eq!(game.maze().fruits().len(), 1);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let game = playing();
        let json = serde_json::to_value(game.snapshot()).unwrap();
        assert_eq!(json["width"], 28);
        assert_eq!(json["height"], 31);
        assert_eq!(json["state"], "Playing");
        assert_eq!(json["enemies"].as_array().map(Vec::len), Some(4));
        let snapshot = game.snapshot();
        assert_eq!(snapshot.cell(13, 23), Some(Cell::PlayerSpawn));
        assert_eq!(snapshot.cell(28, 0), None);
    }
}
