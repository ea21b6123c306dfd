/// Line-of-sight from the orb to every cell of the board.
///
/// ## Ray test
///   From the orb's cell center to the target's cell center, sample
///   `steps = floor(distance / CELL_PX * 2)` points at `step / steps` for
///   `step in 1..steps` (both endpoints excluded). A sample that falls in an
///   in-bounds Blocking cell occludes the target.
///
///   `steps` truncates, so a target with no interior samples is visible by
///   default. On an integer grid that only happens for the orb's own cell.
///
/// ## Classification
///   | cell       | ray clear | ray occluded |
///   |------------|-----------|--------------|
///   | Blocking   | Blocking  | Blocking     |
///   | Open       | Lit       | Unlit        |
///
/// Work is O(N² · steps) per recompute.

use super::cell::Light;
use super::grid::Grid;

/// Logical pixel size of one cell.
pub const CELL_PX: f64 = 40.0;

/// Pixel-space center of cell (x, y).
#[inline]
fn center(x: usize, y: usize) -> (f64, f64) {
    ((x as f64 + 0.5) * CELL_PX, (y as f64 + 0.5) * CELL_PX)
}

/// Number of interior samples between two pixel points, plus one.
#[inline]
pub fn ray_steps(from: (f64, f64), to: (f64, f64)) -> usize {
    let distance = (to.0 - from.0).hypot(to.1 - from.1);
    (distance / CELL_PX * 2.0) as usize
}

/// Can light travel from `light` to `target` without hitting a wall?
pub fn can_see(grid: &Grid, light: (usize, usize), target: (usize, usize)) -> bool {
    let (x1, y1) = center(light.0, light.1);
    let (x2, y2) = center(target.0, target.1);
    let dx = x2 - x1;
    let dy = y2 - y1;

    let steps = ray_steps((x1, y1), (x2, y2));
    for step in 1..steps {
        let t = step as f64 / steps as f64;
        let px = x1 + dx * t;
        let py = y1 + dy * t;
        let gx = (px / CELL_PX).floor() as i32;
        let gy = (py / CELL_PX).floor() as i32;
        if grid.is_blocking(gx, gy) {
            return false;
        }
    }
    true
}

/// Per-cell light classification for one orb position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightMap {
    /// Orb cell this map was computed for.
    pub source: (usize, usize),
    cells: Vec<Vec<Light>>,
    size: usize,
}

impl LightMap {
    /// Classification at (x, y). Out of bounds reads as Blocking.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> Light {
        if x < self.size && y < self.size {
            self.cells[y][x]
        } else {
            Light::Blocking
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn lit_count(&self) -> usize {
        self.cells.iter().flatten().filter(|l| l.is_lit()).count()
    }
}

/// Classify every cell of `grid` against the orb at `light`.
pub fn compute_visibility(grid: &Grid, light: (usize, usize)) -> LightMap {
    let size = grid.size();
    let mut cells = vec![vec![Light::Unlit; size]; size];
    for (y, row) in cells.iter_mut().enumerate() {
        for (x, out) in row.iter_mut().enumerate() {
            *out = if grid.is_blocking(x as i32, y as i32) {
                Light::Blocking
            } else if can_see(grid, light, (x, y)) {
                Light::Lit
            } else {
                Light::Unlit
            };
        }
    }
    LightMap { source: light, cells, size }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::{Level, GRID_SIZE};
    use proptest::prelude::*;

    #[test]
    fn self_cell_has_no_samples_and_is_visible() {
        let g = Grid::initialize(Level::One);
        assert_eq!(ray_steps(center(3, 3), center(3, 3)), 0);
        assert!(can_see(&g, (3, 3), (3, 3)));
        // Ray test passes even on a wall; classification still says wall.
        assert!(can_see(&g, (10, 10), (10, 10)));
        let map = compute_visibility(&g, (10, 10));
        assert_eq!(map.at(10, 10), Light::Blocking);
    }

    #[test]
    fn neighbor_rays_sample_once() {
        assert_eq!(ray_steps(center(0, 0), center(1, 0)), 2);
        assert_eq!(ray_steps(center(0, 0), center(1, 1)), 2);
        assert_eq!(ray_steps(center(0, 0), center(10, 0)), 20);
    }

    #[test]
    fn open_board_is_fully_lit() {
        let g = Grid::open(GRID_SIZE);
        let map = compute_visibility(&g, (4, 17));
        assert_eq!(map.lit_count(), GRID_SIZE * GRID_SIZE);
    }

    #[test]
    fn clear_ray_along_top_row_is_lit() {
        let g = Grid::initialize(Level::One);
        let map = compute_visibility(&g, (0, 0));
        assert_eq!(map.at(19, 0), Light::Lit);
        assert_eq!(map.at(0, 19), Light::Lit);
        assert_eq!(map.at(0, 0), Light::Lit);
    }

    #[test]
    fn ray_through_block_center_is_unlit() {
        let g = Grid::initialize(Level::One);
        // vertical ray down column 10 crosses rows 8..=11
        let map = compute_visibility(&g, (10, 2));
        assert_eq!(map.at(10, 18), Light::Unlit);
        // horizontal ray across row 9
        let map = compute_visibility(&g, (2, 9));
        assert_eq!(map.at(17, 9), Light::Unlit);
        // cells on the orb's side of the block stay lit
        assert_eq!(map.at(7, 9), Light::Lit);
    }

    #[test]
    fn corner_from_orb_beside_block() {
        let g = Grid::initialize(Level::One);
        // orb at the nearest open cell to the board center
        let orb = g.nearest_open(10, 10).unwrap();
        let map = compute_visibility(&g, orb);
        assert_eq!(map.at(orb.0, orb.1), Light::Lit);
        assert_eq!(orb, (10, 12));
        // Straight up column 10 runs through the block; the open bottom
        // corner is in plain view.
        assert_eq!(map.at(10, 0), Light::Unlit);
        assert_eq!(map.at(0, 0), Light::Unlit);
        assert_eq!(map.at(19, 19), Light::Lit);
    }

    #[test]
    fn corner_visible_when_ray_misses_block() {
        let g = Grid::initialize(Level::One);
        // (0,19) -> (0,0) runs along the left edge, far from the block
        let map = compute_visibility(&g, (0, 19));
        assert_eq!(map.at(0, 0), Light::Lit);
        // Diagonal through the block is occluded
        let map = compute_visibility(&g, (19, 19));
        assert_eq!(map.at(0, 0), Light::Unlit);
    }

    #[test]
    fn level2_line_casts_shadow() {
        let g = Grid::initialize(Level::Two);
        let map = compute_visibility(&g, (5, 9));
        assert_eq!(map.at(15, 9), Light::Unlit);
        // Above the bloomed top end (y < 6) light passes
        let map = compute_visibility(&g, (5, 2));
        assert_eq!(map.at(15, 2), Light::Lit);
    }

    #[test]
    fn out_of_range_reads_blocking() {
        let g = Grid::open(4);
        let map = compute_visibility(&g, (0, 0));
        assert_eq!(map.at(4, 0), Light::Blocking);
        assert_eq!(map.size(), 4);
    }

    proptest! {
        #[test]
        fn prop_walls_always_classify_blocking(
            lx in 0usize..GRID_SIZE,
            ly in 0usize..GRID_SIZE,
            two in any::<bool>(),
        ) {
            let level = if two { Level::Two } else { Level::One };
            let g = Grid::initialize(level);
            let map = compute_visibility(&g, (lx, ly));
            for y in 0..GRID_SIZE {
                for x in 0..GRID_SIZE {
                    let wall = g.is_blocking(x as i32, y as i32);
                    prop_assert_eq!(map.at(x, y) == Light::Blocking, wall);
                }
            }
        }

        #[test]
        fn prop_open_orb_cell_is_lit(
            lx in 0usize..GRID_SIZE,
            ly in 0usize..GRID_SIZE,
        ) {
            let g = Grid::initialize(Level::One);
            prop_assume!(!g.is_blocking(lx as i32, ly as i32));
            let map = compute_visibility(&g, (lx, ly));
            prop_assert_eq!(map.at(lx, ly), Light::Lit);
        }
    }
}
