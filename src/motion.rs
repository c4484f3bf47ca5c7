//! Pure movement rules shared by the player and the enemies.

use crate::components::{Cell, Direction, GridPos, Position};
use crate::level::Maze;

/// Largest displacement applied before validity is checked again.
const SUB_STEP: f32 = 1.0;
/// Distance from a cell center that still counts as "at" the center.
const CENTER_EPSILON: f32 = 1.0;

pub fn cell_of(pos: Position, cell_size: f32) -> GridPos {
    GridPos::new(
        (pos.x / cell_size).floor() as i32,
        (pos.y / cell_size).floor() as i32,
    )
}

pub fn cell_center(cell: GridPos, cell_size: f32) -> Position {
    Position::new(
        cell.col as f32 * cell_size + cell_size / 2.0,
        cell.row as f32 * cell_size + cell_size / 2.0,
    )
}

pub fn distance(a: Position, b: Position) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

pub fn collides(a: Position, b: Position, threshold: f32) -> bool {
    distance(a, b) < threshold
}

pub fn at_cell_center(pos: Position, cell_size: f32) -> bool {
    let center = cell_center(cell_of(pos, cell_size), cell_size);
    (pos.x - center.x).abs() < CENTER_EPSILON && (pos.y - center.y).abs() < CENTER_EPSILON
}

/// Probes one unit ahead; independent of how fast the agent moves.
pub fn is_valid_move(pos: Position, dir: Direction, maze: &Maze, cell_size: f32) -> bool {
    let cell = cell_of(pos.offset(dir, SUB_STEP), cell_size);
    match maze.cell(cell.col, cell.row) {
        None | Some(Cell::Wall) => false,
        Some(_) => true,
    }
}

pub fn available_directions(pos: Position, maze: &Maze, cell_size: f32) -> Vec<Direction> {
    Direction::CARDINAL
        .into_iter()
        .filter(|dir| is_valid_move(pos, *dir, maze, cell_size))
        .collect()
}

/// Teleports an agent leaving the maze through a tunnel cell to the matching
/// cell center on the opposite edge. Only the axis of travel changes.
pub fn wrap_tunnel(pos: Position, dir: Direction, maze: &Maze, cell_size: f32) -> Position {
    let cell = cell_of(pos, cell_size);
    if maze.cell(cell.col, cell.row) != Some(Cell::Tunnel) {
        return pos;
    }
    let last_col = maze.width() as i32 - 1;
    let last_row = maze.height() as i32 - 1;
    let mut out = pos;
    match dir {
        Direction::Left if cell.col <= 0 => {
            out.x = cell_center(GridPos::new(last_col, cell.row), cell_size).x;
        }
        Direction::Right if cell.col >= last_col => {
            out.x = cell_center(GridPos::new(0, cell.row), cell_size).x;
        }
        Direction::Up if cell.row <= 0 => {
            out.y = cell_center(GridPos::new(cell.col, last_row), cell_size).y;
        }
        Direction::Down if cell.row >= last_row => {
            out.y = cell_center(GridPos::new(cell.col, 0), cell_size).y;
        }
        _ => {}
    }
    out
}

/// Distance along `dir` to the next cell center strictly ahead of `pos`,
/// together with that center's coordinate on the axis of travel.
fn next_center(pos: Position, dir: Direction, cell_size: f32) -> Option<(f32, f32)> {
    let (coord, forward) = match dir {
        Direction::Left => (pos.x, false),
        Direction::Right => (pos.x, true),
        Direction::Up => (pos.y, false),
        Direction::Down => (pos.y, true),
        Direction::None => return None,
    };
    let half = cell_size / 2.0;
    // Centers sit at k * cell_size + half.
    let k = (coord - half) / cell_size;
    let target = if forward {
        let mut k = k.floor() + 1.0;
        if k * cell_size + half <= coord {
            k += 1.0;
        }
        k * cell_size + half
    } else {
        let mut k = k.ceil() - 1.0;
        if k * cell_size + half >= coord {
            k -= 1.0;
        }
        k * cell_size + half
    };
    Some(((target - coord).abs(), target))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Advance {
    pub position: Position,
    pub moved: bool,
}

/// Moves up to `distance` along `dir` in sub-steps of at most one unit,
/// re-validating before each one so fast agents cannot skip past a wall.
/// With `stop_at_center` the move ends on the first cell center reached.
pub fn advance(
    pos: Position,
    dir: Direction,
    distance: f32,
    maze: &Maze,
    cell_size: f32,
    stop_at_center: bool,
) -> Advance {
    let mut position = pos;
    let mut moved = false;
    if dir == Direction::None {
        return Advance { position, moved };
    }
    let mut remaining = distance;
    while remaining > f32::EPSILON {
        if !is_valid_move(position, dir, maze, cell_size) {
            break;
        }
        let mut step = remaining.min(SUB_STEP);
        let mut landing = None;
        if stop_at_center {
            if let Some((to_center, target)) = next_center(position, dir, cell_size) {
                if to_center <= step {
                    step = to_center;
                    landing = Some(target);
                }
            }
        }
        let mut next = position.offset(dir, step);
        if let Some(target) = landing {
            match dir {
                Direction::Left | Direction::Right => next.x = target,
                _ => next.y = target,
            }
        }
        position = wrap_tunnel(next, dir, maze, cell_size);
        moved = true;
        remaining -= step;
        if landing.is_some() {
            break;
        }
    }
    Advance { position, moved }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Layout;

    const CS: f32 = 20.0;

    fn classic() -> Maze {
        Maze::new(Layout::classic())
    }

    fn center(col: i32, row: i32) -> Position {
        cell_center(GridPos::new(col, row), CS)
    }

    #[test]
    fn moves_into_walls_are_rejected_everywhere() {
        let maze = classic();
        for row in 0..maze.height() as i32 {
            for col in 0..maze.width() as i32 {
                if maze.is_wall(col, row) {
                    continue;
                }
                for dir in Direction::CARDINAL {
                    let (dx, dy) = dir.delta();
                    if maze.is_wall(col + dx, row + dy) {
                        let edge = center(col, row).offset(dir, CS / 2.0 - 0.5);
                        assert!(!is_valid_move(edge, dir, &maze, CS));
                    }
                }
            }
        }
    }

    #[test]
    fn leaving_the_grid_without_a_tunnel_is_invalid() {
        let maze = classic();
        // (0, 10) is open floor on the left edge but not a tunnel.
        let edge = Position::new(0.5, center(0, 10).y);
        assert!(!is_valid_move(edge, Direction::Left, &maze, CS));
    }

    #[test]
    fn available_directions_follow_enumeration_order() {
        let maze = classic();
        // Probing is sub-cell: from the center of (1, 1) every probe stays
        // inside the cell.
        assert_eq!(
            available_directions(center(1, 1), &maze, CS),
            vec![Direction::Up, Direction::Down, Direction::Left, Direction::Right]
        );
        // Tucked into the corner the border walls are within reach.
        assert_eq!(
            available_directions(Position::new(20.5, 20.5), &maze, CS),
            vec![Direction::Down, Direction::Right]
        );
    }

    #[test]
    fn tunnel_round_trip_preserves_direction() {
        let maze = classic();
        let start = Position::new(CS / 2.0 - 1.0, center(0, 14).y);
        let wrapped = wrap_tunnel(start, Direction::Left, &maze, CS);
        assert_eq!(wrapped, center(27, 14));
        assert_eq!(cell_of(wrapped, CS), GridPos::new(27, 14));

        let next = advance(wrapped, Direction::Left, 2.0, &maze, CS, false);
        assert!(next.moved);
        assert!(next.position.x < wrapped.x);
        assert_eq!(cell_of(next.position, CS), GridPos::new(27, 14));
    }

    #[test]
    fn wrap_only_triggers_toward_the_exited_edge() {
        let maze = classic();
        let at_left = center(0, 14);
        assert_eq!(wrap_tunnel(at_left, Direction::Right, &maze, CS), at_left);
        assert_eq!(wrap_tunnel(center(6, 14), Direction::Left, &maze, CS), center(6, 14));
    }

    #[test]
    fn fast_agents_stop_at_the_wall_boundary() {
        let maze = classic();
        // Heading left from (1, 1) toward the border wall at 7 units per tick.
        let mut pos = center(1, 1);
        for _ in 0..5 {
            pos = advance(pos, Direction::Left, 7.0, &maze, CS, false).position;
            let cell = cell_of(pos, CS);
            assert!(!maze.is_wall(cell.col, cell.row));
        }
        assert_eq!(pos.x, CS);
    }

    #[test]
    fn stop_at_center_lands_exactly_on_the_next_center() {
        let maze = classic();
        let start = center(1, 5).offset(Direction::Right, 0.5);
        let mut pos = start;
        let mut ticks = 0;
        loop {
            pos = advance(pos, Direction::Right, 1.65, &maze, CS, true).position;
            ticks += 1;
            if at_cell_center(pos, CS) {
                break;
            }
            assert!(ticks < 20);
        }
        assert_eq!(pos, center(2, 5));
    }

    #[test]
    fn collision_uses_a_strict_threshold() {
        let a = Position::new(0.0, 0.0);
        assert!(collides(a, Position::new(9.9, 0.0), 10.0));
        assert!(!collides(a, Position::new(10.0, 0.0), 10.0));
    }
}
