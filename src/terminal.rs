use std::io::{self, Stdout, Write};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use unicode_width::UnicodeWidthStr;

use pacmon::game::{GameEvent, GameState, Phase, Snapshot};
use pacmon::motion::cell_of;
use pacmon::{Cell as Tile, Direction, Game, GridPos, Personality, PowerUpKind};

const CELL_W: usize = 2;
/// Screen rows besides the board: HUD, status line and one spare.
const CHROME_ROWS: usize = 3;
const DEFAULT_RENDER_FPS: u64 = 60;
/// Vulnerable enemies start flashing once this little of the effect is left.
const FLASH_BELOW: f32 = 0.25;

#[derive(Clone, Copy, PartialEq, Debug)]
enum Glyph {
    Player,
    Shielded,
    Dead,
    Enemy,
    Frightened,
    Eyes,
    Wall,
    Empty,
    Dot,
    Pellet,
    Gate,
    Fruit,
}

impl Glyph {
    fn text(self) -> &'static str {
        match self {
            Glyph::Player => "😃",
            Glyph::Shielded => "😎",
            Glyph::Dead => "💀",
            Glyph::Enemy | Glyph::Frightened => "ᗣ",
            Glyph::Eyes => "°",
            Glyph::Wall => "██",
            Glyph::Empty => "",
            Glyph::Dot => "·",
            Glyph::Pellet => "●",
            Glyph::Gate => "==",
            Glyph::Fruit => "🍒",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Command {
    Steer(Direction),
    Pause,
    Start,
    Quit,
}

/// Where the board goes on screen for a given terminal size.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Fit {
    At { x: u16, y: u16 },
    TooSmall { need_w: u16, need_h: u16 },
}

fn fit(term_w: u16, term_h: u16, width: usize, height: usize) -> Fit {
    let need_w = (width * CELL_W) as u16;
    let need_h = (height + CHROME_ROWS) as u16;
    if term_w < need_w || term_h < need_h {
        return Fit::TooSmall { need_w, need_h };
    }
    // Row above the board is the HUD.
    Fit::At {
        x: (term_w - need_w) / 2,
        y: (term_h - need_h) / 2 + 1,
    }
}

struct Renderer {
    last: Vec<Cell>,
    last_hud: String,
    last_status: String,
    needs_full: bool,
    origin: (u16, u16),
}

impl Renderer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            last: vec![
                Cell {
                    glyph: Glyph::Empty,
                    color: Color::Reset,
                };
                width * height
            ],
            last_hud: String::new(),
            last_status: String::new(),
            needs_full: true,
            origin: (0, 1),
        }
    }

    /// Moves the board; everything is redrawn after a move.
    fn place(&mut self, x: u16, y: u16) {
        if self.origin != (x, y) {
            self.origin = (x, y);
            self.needs_full = true;
        }
    }
}

/// Takes over the terminal, runs the game until the user quits and restores
/// the terminal even when the loop fails.
pub fn play(game: &mut Game) -> Result<()> {
    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, game);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn run(stdout: &mut Stdout, game: &mut Game) -> Result<()> {
    let tick = Duration::from_micros(1_000_000 / u64::from(game.config().tick_rate.max(1)));
    let frame_time = Duration::from_micros(1_000_000 / read_render_fps());
    let first = game.snapshot();
    let mut renderer = Renderer::new(first.width, first.height);
    let mut status = String::from("Press Enter or an arrow key to start");
    let mut last_tick = Instant::now();
    let mut frame: u64 = 0;

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                continue;
            }
            match command_for(key.code) {
                Some(Command::Quit) => return Ok(()),
                Some(Command::Pause) => game.toggle_pause(),
                Some(Command::Start) => match game.state() {
                    GameState::Ready | GameState::GameOver => game.start(),
                    _ => game.resume(),
                },
                Some(Command::Steer(dir)) => {
                    if game.state() == GameState::Ready {
                        game.start();
                    }
                    game.set_intended_direction(dir);
                }
                None => {}
            }
        }

        if last_tick.elapsed() >= tick {
            last_tick = Instant::now();
            game.step();
            for event in game.drain_events() {
                if matches!(event, GameEvent::GameOver(_)) {
                    game.flush_best_score()?;
                }
                if let Some(message) = describe(event) {
                    status = message;
                }
            }
        }

        frame = frame.wrapping_add(1);
        render(stdout, &game.snapshot(), &status, frame, &mut renderer)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

fn read_render_fps() -> u64 {
    std::env::var("PACMON_FPS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_RENDER_FPS)
}

fn command_for(code: KeyCode) -> Option<Command> {
    let command = match code {
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('w') => Command::Steer(Direction::Up),
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('s') => {
            Command::Steer(Direction::Down)
        }
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('a') => {
            Command::Steer(Direction::Left)
        }
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('d') => {
            Command::Steer(Direction::Right)
        }
        KeyCode::Char('p') | KeyCode::Esc => Command::Pause,
        KeyCode::Enter | KeyCode::Char(' ') => Command::Start,
        KeyCode::Char('q') => Command::Quit,
        _ => return None,
    };
    Some(command)
}

fn describe(event: GameEvent) -> Option<String> {
    let message = match event {
        GameEvent::DotCollected => return None,
        GameEvent::GameStart => "Go!".to_string(),
        GameEvent::PowerUpCollected(PowerUpKind::GhostVulnerability) => {
            "Power pellet! Enemies are vulnerable".to_string()
        }
        GameEvent::PowerUpCollected(kind) => format!("{kind:?} active"),
        GameEvent::FruitCollected => "Fruit!".to_string(),
        GameEvent::GhostEaten => "Enemy eaten".to_string(),
        GameEvent::PlayerDeath => "Caught!".to_string(),
        GameEvent::LevelUp(level) => format!("Level {level}"),
        GameEvent::GameOver(score) => {
            format!("GAME OVER - final score {score} (Enter to restart, q to quit)")
        }
    };
    Some(message)
}

fn hud_line(snapshot: &Snapshot) -> String {
    let mut hud = format!(
        "Score: {}  Best: {}  Lives: {}  Level: {}  Dots: {}",
        snapshot.score, snapshot.best_score, snapshot.lives, snapshot.level, snapshot.dots_remaining
    );
    for kind in &snapshot.active_power_ups {
        let tag = match kind {
            PowerUpKind::GhostVulnerability => "POWER",
            PowerUpKind::SpeedBoost => "SPEED",
            PowerUpKind::Shield => "SHIELD",
            PowerUpKind::BonusFruit => "BONUS",
        };
        hud.push_str("  ");
        hud.push_str(tag);
    }
    match snapshot.state {
        GameState::Paused => hud.push_str("  PAUSED"),
        GameState::Playing if snapshot.phase == Phase::LevelTransition => {
            hud.push_str("  LEVEL CLEAR")
        }
        _ => {}
    }
    hud.push_str("  (p pause, q quit)");
    hud
}

fn render(
    stdout: &mut Stdout,
    snapshot: &Snapshot,
    status: &str,
    frame: u64,
    renderer: &mut Renderer,
) -> io::Result<()> {
    let (term_w, term_h) = terminal::size()?;
    let (x, y) = match fit(term_w, term_h, snapshot.width, snapshot.height) {
        Fit::At { x, y } => (x, y),
        Fit::TooSmall { need_w, need_h } => {
            stdout
                .queue(MoveTo(0, 0))?
                .queue(Clear(ClearType::All))?
                .queue(Print(format!(
                    "Terminal too small: need {need_w}x{need_h} (cols x rows), have {term_w}x{term_h}."
                )))?;
            renderer.needs_full = true;
            return stdout.flush();
        }
    };
    renderer.place(x, y);
    let full = renderer.needs_full;

    let hud = hud_line(snapshot);
    draw_text(stdout, (x, y - 1), &hud, Color::White, &mut renderer.last_hud, full)?;

    for (idx, last) in renderer.last.iter_mut().enumerate() {
        let (col, row) = (idx % snapshot.width, idx / snapshot.width);
        let cell = cell_for(snapshot, col, row, frame);
        if full || cell != *last {
            *last = cell;
            draw_cell(stdout, (x + (col * CELL_W) as u16, y + row as u16), cell)?;
        }
    }

    let status_y = y + snapshot.height as u16;
    draw_text(stdout, (x, status_y), status, Color::Reset, &mut renderer.last_status, full)?;
    renderer.needs_full = false;
    stdout.flush()
}

/// Rewrites one screen line when its text changed or the screen is stale.
fn draw_text(
    stdout: &mut Stdout,
    (x, y): (u16, u16),
    text: &str,
    color: Color,
    last: &mut String,
    force: bool,
) -> io::Result<()> {
    if !force && last.as_str() == text {
        return Ok(());
    }
    stdout
        .queue(MoveTo(x, y))?
        .queue(Clear(ClearType::CurrentLine))?
        .queue(SetForegroundColor(color))?
        .queue(Print(text))?
        .queue(ResetColor)?;
    last.clear();
    last.push_str(text);
    Ok(())
}

fn enemy_color(personality: Personality) -> Color {
    match personality {
        Personality::Chaser => Color::Red,
        Personality::Ambusher => Color::Magenta,
        Personality::Random => Color::Cyan,
        Personality::Shy => Color::DarkYellow,
    }
}

fn cell_for(snapshot: &Snapshot, col: usize, row: usize, frame: u64) -> Cell {
    let here = GridPos::new(col as i32, row as i32);
    let player = &snapshot.player;
    if cell_of(player.position, snapshot.cell_size) == here {
        let glyph = if !player.alive {
            Glyph::Dead
        } else if player.shielded {
            Glyph::Shielded
        } else {
            Glyph::Player
        };
        return Cell {
            glyph,
            color: Color::Yellow,
        };
    }
    if let Some(enemy) = snapshot
        .enemies
        .iter()
        .find(|e| cell_of(e.position, snapshot.cell_size) == here)
    {
        if enemy.eaten {
            return Cell {
                glyph: Glyph::Eyes,
                color: Color::White,
            };
        }
        if enemy.vulnerable {
            let flashing = enemy.vulnerable_remaining < FLASH_BELOW && (frame / 8) % 2 == 0;
            return Cell {
                glyph: Glyph::Frightened,
                color: if flashing { Color::White } else { Color::Blue },
            };
        }
        return Cell {
            glyph: Glyph::Enemy,
            color: enemy_color(enemy.personality),
        };
    }
    if snapshot.fruits.contains(&here) {
        return Cell {
            glyph: Glyph::Fruit,
            color: Color::Green,
        };
    }
    match snapshot.cell(col, row).unwrap_or(Tile::Empty) {
        Tile::Wall => Cell {
            glyph: Glyph::Wall,
            color: Color::Blue,
        },
        Tile::EnemySpawn => Cell {
            glyph: Glyph::Gate,
            color: Color::Cyan,
        },
        Tile::Dot => Cell {
            glyph: Glyph::Dot,
            color: Color::White,
        },
        Tile::PowerPellet => Cell {
            glyph: Glyph::Pellet,
            color: Color::Magenta,
        },
        Tile::Empty | Tile::Tunnel | Tile::PlayerSpawn => Cell {
            glyph: Glyph::Empty,
            color: Color::Reset,
        },
    }
}

/// Pads a glyph out to a full board cell.
fn padded(text: &str) -> String {
    let pad = CELL_W.saturating_sub(UnicodeWidthStr::width(text));
    format!("{text}{:pad$}", "")
}

fn draw_cell(stdout: &mut Stdout, (x, y): (u16, u16), cell: Cell) -> io::Result<()> {
    stdout
        .queue(MoveTo(x, y))?
        .queue(SetForegroundColor(cell.color))?
        .queue(Print(padded(cell.glyph.text())))?
        .queue(ResetColor)?;
    Ok(())
}
