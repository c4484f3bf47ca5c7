use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use pacmon::motion;
use pacmon::{
    BestScoreStore, Difficulty, Direction, Game, GameConfig, GameEvent, GameState, JsonFileStore,
    Layout, MemoryScoreStore,
};

mod terminal;

/// Chance per tick that the autopilot turns even though it could keep going.
const AUTOPILOT_TURN_CHANCE: f64 = 0.05;

#[derive(Parser, Debug)]
#[command(name = "pacmon", version)]
#[command(about = "Maze chase game for the terminal")]
struct Cli {
    /// JSON file with game settings; missing keys keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// easy, medium or hard
    #[arg(long, global = true)]
    difficulty: Option<Difficulty>,
    /// Seed for every random choice the game makes
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Where the best score is kept between runs
    #[arg(long, global = true)]
    best_score_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play in the terminal (default)
    Play,
    /// Run headless under a random autopilot and print a JSON summary
    Simulate {
        #[arg(long, default_value_t = 3_600)]
        ticks: u64,
    },
}

#[derive(Debug, Default, Serialize)]
struct EventTally {
    dots: u64,
    power_ups: u64,
    fruits: u64,
    enemies_eaten: u64,
    deaths: u64,
    level_ups: u64,
}

impl EventTally {
    fn record(&mut self, event: GameEvent) {
        match event {
            GameEvent::DotCollected => self.dots += 1,
            GameEvent::PowerUpCollected(_) => self.power_ups += 1,
            GameEvent::FruitCollected => self.fruits += 1,
            GameEvent::GhostEaten => self.enemies_eaten += 1,
            GameEvent::PlayerDeath => self.deaths += 1,
            GameEvent::LevelUp(_) => self.level_ups += 1,
            GameEvent::GameStart | GameEvent::GameOver(_) => {}
        }
    }
}

#[derive(Debug, Serialize)]
struct SimulationSummary {
    seed: u64,
    difficulty: Difficulty,
    ticks: u64,
    state: GameState,
    score: u64,
    best_score: u64,
    level: u32,
    lives: u32,
    dots_remaining: usize,
    events: EventTally,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let store = open_store(cli.best_score_file.as_deref())?;
    let mut game = Game::new(config, Layout::classic(), store);

    match cli.command.unwrap_or(Commands::Play) {
        Commands::Play => terminal::play(&mut game)?,
        Commands::Simulate { ticks } => {
            let summary = simulate(&mut game, ticks);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    game.flush_best_score().context("saving best score")?;
    Ok(())
}

/// Defaults, then the config file, then the environment, then flags.
fn load_config(cli: &Cli) -> Result<GameConfig> {
    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GameConfig::default(),
    };
    config.apply_env();
    if let Some(difficulty) = cli.difficulty {
        config.difficulty = difficulty;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn open_store(path: Option<&Path>) -> Result<Box<dyn BestScoreStore>> {
    let Some(path) = path else {
        return Ok(Box::new(MemoryScoreStore::default()));
    };
    let store = JsonFileStore::open(path)
        .with_context(|| format!("opening best score file {}", path.display()))?;
    Ok(Box::new(store))
}

fn simulate(game: &mut Game, ticks: u64) -> SimulationSummary {
    let mut rng = StdRng::seed_from_u64(game.config().seed.rotate_left(17));
    let mut tally = EventTally::default();
    game.start();
    let mut last = game.player().position;
    let mut ran = 0;
    while ran < ticks && game.state() == GameState::Playing {
        if let Some(dir) = autopilot(game, last, &mut rng) {
            game.set_intended_direction(dir);
        }
        last = game.player().position;
        game.step();
        ran += 1;
        for event in game.drain_events() {
            tally.record(event);
        }
    }
    tracing::info!(ticks = ran, score = game.score(), "simulation finished");

    let snapshot = game.snapshot();
    SimulationSummary {
        seed: game.config().seed,
        difficulty: game.config().difficulty,
        ticks: ran,
        state: snapshot.state,
        score: snapshot.score,
        best_score: snapshot.best_score,
        level: snapshot.level,
        lives: snapshot.lives,
        dots_remaining: snapshot.dots_remaining,
        events: tally,
    }
}

/// Picks a fresh heading when the player is stuck, and now and then at a
/// cell center so it explores instead of bouncing along one corridor.
fn autopilot(game: &Game, last: pacmon::Position, rng: &mut StdRng) -> Option<Direction> {
    let player = game.player();
    let cs = game.config().cell_size;
    let stuck = player.position == last;
    let at_center = motion::at_cell_center(player.position, cs);
    if !stuck && !(at_center && rng.gen_bool(AUTOPILOT_TURN_CHANCE)) {
        return None;
    }
    let options = motion::available_directions(player.position, game.maze(), cs);
    let fresh: Vec<Direction> = options
        .iter()
        .copied()
        .filter(|dir| *dir != player.direction)
        .collect();
    let pool = if fresh.is_empty() { &options } else { &fresh };
    pool.choose(rng).copied()
}
