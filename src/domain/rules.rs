/// Movement and placement rules, as truth tables.
///
/// Pure functions over the grid. They decide what is legal without
/// mutating anything; the session applies the result.
///
/// ## Character step
/// ┌───────────────────────────┬─────────┐
/// │ Condition                  │ Result  │
/// ├───────────────────────────┼─────────┤
/// │ debounce not elapsed       │ REJECT  │
/// │ dest outside the board     │ REJECT  │
/// │ dest cell Blocking         │ REJECT  │
/// │ otherwise                  │ ACCEPT  │
/// └───────────────────────────┴─────────┘
///
/// ## Direction choice (several keys held)
///   Priority Up, Down, Left, Right. A held direction that leads off the
///   board is skipped; one that leads into a wall is still chosen and the
///   step is then rejected.
///
/// ## Orb placement
/// ┌───────────────────────────┬───────────────────────┐
/// │ Condition (in order)       │ Orb cell              │
/// ├───────────────────────────┼───────────────────────┤
/// │ raw pointer off the board  │ clamp into [0, N-1]²  │
/// │ clamped cell Blocking      │ nearest Open cell     │
/// │ otherwise                  │ clamped cell          │
/// └───────────────────────────┴───────────────────────┘

use super::entity::{DirSet, MoveDir};
use super::grid::Grid;

/// Where a step from (x, y) in `dir` lands, if legal.
pub fn step_target(grid: &Grid, x: usize, y: usize, dir: MoveDir) -> Option<(usize, usize)> {
    let (dx, dy) = dir.delta();
    let nx = x as i32 + dx;
    let ny = y as i32 + dy;
    if !grid.in_bounds(nx, ny) || grid.is_blocking(nx, ny) {
        return None;
    }
    Some((nx as usize, ny as usize))
}

/// First held direction, in priority order, whose destination is on the board.
pub fn choose_direction(grid: &Grid, x: usize, y: usize, held: DirSet) -> Option<MoveDir> {
    MoveDir::pick(|d| {
        let (dx, dy) = d.delta();
        held.contains(d) && grid.in_bounds(x as i32 + dx, y as i32 + dy)
    })
}

/// Has enough time passed since the last accepted move?
#[inline]
pub fn debounce_elapsed(since_move: f32, delay: f32) -> bool {
    since_move >= delay
}

/// Resolve a raw pointer cell to the cell the orb may occupy.
pub fn place_orb(grid: &Grid, raw_x: i32, raw_y: i32) -> (usize, usize) {
    let max = grid.size() as i32 - 1;
    let x = raw_x.clamp(0, max) as usize;
    let y = raw_y.clamp(0, max) as usize;
    if grid.is_blocking(x as i32, y as i32) {
        grid.nearest_open(x, y).unwrap_or((x, y))
    } else {
        (x, y)
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::{Level, GRID_SIZE};

    // ── Character steps ──

    #[test]
    fn step_on_open_board() {
        let g = Grid::open(5);
        assert_eq!(step_target(&g, 2, 2, MoveDir::Up), Some((2, 1)));
        assert_eq!(step_target(&g, 2, 2, MoveDir::Down), Some((2, 3)));
        assert_eq!(step_target(&g, 2, 2, MoveDir::Left), Some((1, 2)));
        assert_eq!(step_target(&g, 2, 2, MoveDir::Right), Some((3, 2)));
    }

    #[test]
    fn step_off_board_rejected() {
        let g = Grid::open(5);
        assert_eq!(step_target(&g, 0, 0, MoveDir::Up), None);
        assert_eq!(step_target(&g, 0, 0, MoveDir::Left), None);
        assert_eq!(step_target(&g, 4, 4, MoveDir::Down), None);
        assert_eq!(step_target(&g, 4, 4, MoveDir::Right), None);
    }

    #[test]
    fn step_into_wall_rejected() {
        let g = Grid::initialize(Level::One);
        // (7,9) sits just left of the block
        assert_eq!(step_target(&g, 7, 9, MoveDir::Right), None);
        assert_eq!(step_target(&g, 7, 9, MoveDir::Left), Some((6, 9)));
        // (9,12) sits just below the block
        assert_eq!(step_target(&g, 9, 12, MoveDir::Up), None);
    }

    #[test]
    fn off_board_direction_yields_to_next_held() {
        let g = Grid::open(GRID_SIZE);
        let up_down = DirSet::from_fn(|d| matches!(d, MoveDir::Up | MoveDir::Down));
        assert_eq!(choose_direction(&g, 0, 0, up_down), Some(MoveDir::Down));
        assert_eq!(choose_direction(&g, 5, 5, up_down), Some(MoveDir::Up));

        let up_left = DirSet::from_fn(|d| matches!(d, MoveDir::Up | MoveDir::Left));
        assert_eq!(choose_direction(&g, 0, 0, up_left), None);
        assert_eq!(choose_direction(&g, 0, 0, DirSet::default()), None);
    }

    #[test]
    fn wall_direction_does_not_yield() {
        let g = Grid::initialize(Level::One);
        let down_right = DirSet::from_fn(|d| matches!(d, MoveDir::Right | MoveDir::Down));
        // Down outranks Right; at (7,9) Right would hit the block
        assert_eq!(choose_direction(&g, 7, 9, down_right), Some(MoveDir::Down));
        let up_right = DirSet::from_fn(|d| matches!(d, MoveDir::Up | MoveDir::Right));
        // (9,12): Up is a wall, still chosen
        assert_eq!(choose_direction(&g, 9, 12, up_right), Some(MoveDir::Up));
    }

    #[test]
    fn debounce_boundary_is_inclusive() {
        assert!(debounce_elapsed(0.15, 0.15));
        assert!(!debounce_elapsed(0.149, 0.15));
        assert!(debounce_elapsed(2.0, 0.15));
    }

    // ── Orb placement ──

    #[test]
    fn orb_clamps_to_board() {
        let g = Grid::initialize(Level::One);
        assert_eq!(place_orb(&g, -3, -1), (0, 0));
        assert_eq!(place_orb(&g, 40, 5), (GRID_SIZE - 1, 5));
        assert_eq!(place_orb(&g, 4, 99), (4, GRID_SIZE - 1));
    }

    #[test]
    fn orb_redirected_off_walls() {
        let g = Grid::initialize(Level::One);
        let (x, y) = place_orb(&g, 9, 9);
        assert!(!g.is_blocking(x as i32, y as i32));
        assert_eq!((x, y), (7, 9));
    }

    #[test]
    fn orb_on_open_cell_unchanged() {
        let g = Grid::initialize(Level::Two);
        assert_eq!(place_orb(&g, 3, 15), (3, 15));
    }
}
