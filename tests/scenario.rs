use pacmon::motion::{cell_center, cell_of};
use pacmon::{
    BestScoreStore, Cell, Direction, Game, GameConfig, GameEvent, GameState, GridPos,
    JsonFileStore, Layout, MemoryScoreStore, Phase, PowerUpKind,
};
use tempfile::TempDir;

fn started(store: Box<dyn BestScoreStore>) -> Game {
    let mut game = Game::new(GameConfig::default(), Layout::classic(), store);
    game.start();
    assert_eq!(game.drain_events(), vec![GameEvent::GameStart]);
    game
}

fn classic_game() -> Game {
    started(Box::new(MemoryScoreStore::default()))
}

fn step_until(game: &mut Game, limit: usize, mut done: impl FnMut(&Game) -> bool) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..limit {
        game.step();
        events.extend(game.drain_events());
        if done(game) {
            return events;
        }
    }
    panic!("condition not reached within {limit} ticks");
}

fn step_n(game: &mut Game, ticks: usize) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        game.step();
        events.extend(game.drain_events());
    }
    events
}

fn put_enemy_on_player(game: &mut Game, idx: usize) {
    let at = game.player().position;
    game.enemies_mut()[idx].position = at;
}

#[test]
fn first_dot_left_of_spawn() {
    let mut game = classic_game();
    assert_eq!(cell_of(game.player().position, 20.0), GridPos::new(13, 23));

    game.set_intended_direction(Direction::Left);
    let events = step_until(&mut game, 20, |g| g.score() > 0);
    assert_eq!(events, vec![GameEvent::DotCollected]);
    assert_eq!(game.score(), 1);
    assert_eq!(game.lives(), 3);
    assert!(!game.maze().has_dot(12, 23));
    assert_eq!(game.player().direction, Direction::Left);
}

#[test]
fn collision_costs_a_life_and_resets_after_the_delay() {
    let mut game = classic_game();
    game.set_intended_direction(Direction::Left);
    step_n(&mut game, 3);
    put_enemy_on_player(&mut game, 0);

    let events = step_n(&mut game, 1);
    assert_eq!(events, vec![GameEvent::PlayerDeath]);
    assert_eq!(game.lives(), 2);
    assert!(!game.player().is_alive());
    assert_eq!(game.phase(), Phase::Dying);

    // 1 s at 60 ticks per second.
    step_n(&mut game, 59);
    assert!(!game.player().is_alive());
    step_n(&mut game, 1);
    assert!(game.player().is_alive());
    assert_eq!(game.phase(), Phase::Running);
    assert_eq!(game.player().position, cell_center(GridPos::new(13, 23), 20.0));
    // Enemies go back to their own start cells, not all to the spawn.
    let homes: Vec<GridPos> = game
        .enemies()
        .iter()
        .map(|enemy| cell_of(enemy.position, 20.0))
        .collect();
    assert_eq!(
        homes,
        vec![
            GridPos::new(14, 12),
            GridPos::new(14, 11),
            GridPos::new(13, 12),
            GridPos::new(14, 12),
        ]
    );
    for enemy in game.enemies() {
        assert_eq!(cell_of(enemy.position, 20.0), cell_of(enemy.home(), 20.0));
        assert!(!enemy.is_vulnerable());
        assert!(!enemy.is_eaten());
    }
}

#[test]
fn eaten_enemy_returns_to_the_spawn_cell() {
    let mut game = classic_game();
    game.grant_power_up(PowerUpKind::GhostVulnerability);
    put_enemy_on_player(&mut game, 1);

    let events = step_n(&mut game, 1);
    assert_eq!(events, vec![GameEvent::GhostEaten]);
    assert_eq!(game.score(), 50);
    assert!(game.enemies()[1].is_eaten());
    assert!(!game.enemies()[1].is_vulnerable());
    let frozen = game.enemies()[1].position;

    // 5 s respawn: the countdown is drained once per tick from the next tick on.
    step_n(&mut game, 299);
    assert!(game.enemies()[1].is_eaten());
    assert_eq!(game.enemies()[1].position, frozen);
    step_n(&mut game, 1);
    let enemy = &game.enemies()[1];
    assert!(!enemy.is_eaten());
    assert!(!enemy.is_vulnerable());
    assert_eq!(cell_of(enemy.position, 20.0), GridPos::new(14, 12));
}

#[test]
fn shield_absorbs_a_hit() {
    let mut game = classic_game();
    game.grant_power_up(PowerUpKind::Shield);
    put_enemy_on_player(&mut game, 0);
    let events = step_n(&mut game, 1);
    assert!(events.is_empty());
    assert_eq!(game.lives(), 3);
    assert!(game.player().is_alive());
    assert_eq!(game.state(), GameState::Playing);
}

#[test]
fn clearing_the_board_levels_up_exactly_once() {
    let mut game = classic_game();
    let (width, height) = (game.maze().width() as i32, game.maze().height() as i32);
    for row in 0..height {
        for col in 0..width {
            if (col, row) != (12, 23) && game.maze().cell(col, row) == Some(Cell::Dot) {
                game.maze_mut().collect_dot(col, row);
            }
        }
    }
    assert_eq!(game.maze().dots_remaining(), 1);

    game.set_intended_direction(Direction::Left);
    let mut events = step_until(&mut game, 20, |g| g.phase() == Phase::LevelTransition);
    assert_eq!(game.score(), 501);
    assert_eq!(game.level(), 2);

    events.extend(step_n(&mut game, 100));
    let level_ups: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, GameEvent::LevelUp(_)))
        .collect();
    assert_eq!(level_ups, vec![&GameEvent::LevelUp(2)]);
    assert_eq!(game.phase(), Phase::Running);
    assert_eq!(game.level(), 2);
    assert!(game.maze().dots_remaining() > 0);
    assert_eq!(game.maze().fruits().len(), 1);
}

#[test]
fn game_over_persists_a_new_best_score() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("best.json");
    let store = JsonFileStore::open(&path).unwrap();
    let mut game = started(Box::new(store));

    game.set_intended_direction(Direction::Left);
    step_until(&mut game, 20, |g| g.score() > 0);
    game.player_mut().set_lives(1);
    put_enemy_on_player(&mut game, 0);
    let events = step_n(&mut game, 1);
    assert_eq!(
        events,
        vec![GameEvent::PlayerDeath, GameEvent::GameOver(1)]
    );
    assert_eq!(game.state(), GameState::GameOver);
    assert_eq!(game.best_score(), 1);

    game.flush_best_score().unwrap();
    assert_eq!(JsonFileStore::open(&path).unwrap().best(), 1);

    // Restarting keeps the best score but resets everything else.
    game.start();
    assert_eq!(game.score(), 0);
    assert_eq!(game.lives(), 3);
    assert_eq!(game.best_score(), 1);
}

#[test]
fn same_seed_same_game() {
    let run = || {
        let mut game = classic_game();
        game.set_intended_direction(Direction::Left);
        step_n(&mut game, 400);
        serde_json::to_string(&game.snapshot()).unwrap()
    };
    assert_eq!(run(), run());
}
