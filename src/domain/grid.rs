/// Grid model: a fixed N×N board of cells, one predefined layout per level.
///
/// ## Layout
///   Cells are stored row-major as `cells[y][x]`, matching how the renderer
///   walks the board. Coordinates are `(x, y)` everywhere else.
///
/// ## Level shapes
///   - Level 1: a centered 4×4 block, `c-2 .. c+2` on both axes.
///   - Level 2: a centered vertical line of length 6 at `x = c`, then a single
///     bloom pass that adds `(x-1, y)`, `(x, y-1)`, `(x-1, y-1)` for every cell
///     of the base line. One pass only, so the shape thickens up and left
///     but never right or down.
///
/// A grid is never mutated after `initialize`; replaying a level builds a
/// fresh one.

use super::cell::Cell;

/// Board side length.
pub const GRID_SIZE: usize = 20;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Level {
    One,
    Two,
}

impl Level {
    pub const ALL: [Level; 2] = [Level::One, Level::Two];

    pub fn number(self) -> u8 {
        match self {
            Level::One => 1,
            Level::Two => 2,
        }
    }

    /// Blocking cells for this level, in stamping order.
    pub fn blocking_shape(self, size: usize) -> Vec<(usize, usize)> {
        let c = size / 2;
        match self {
            Level::One => {
                let mut out = Vec::with_capacity(16);
                for x in c - 2..c + 2 {
                    for y in c - 2..c + 2 {
                        out.push((x, y));
                    }
                }
                out
            }
            Level::Two => {
                let line: Vec<(usize, usize)> = (c - 3..c + 3).map(|y| (c, y)).collect();
                let mut out = line.clone();
                out.extend(bloom(&line));
                out
            }
        }
    }
}

/// One-shot neighbor expansion over `base`.
/// Only membership in `base` is checked, so a neighbor reachable from two
/// base cells may appear twice; stamping onto a grid makes that harmless.
pub fn bloom(base: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut extra = Vec::with_capacity(base.len() * 3);
    for &(x, y) in base {
        let left = x.checked_sub(1).map(|xl| (xl, y));
        let up = y.checked_sub(1).map(|yu| (x, yu));
        let diag = x.checked_sub(1).zip(y.checked_sub(1));
        for n in [left, up, diag].into_iter().flatten() {
            if !base.contains(&n) {
                extra.push(n);
            }
        }
    }
    extra
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Vec<Cell>>,
    size: usize,
}

impl Grid {
    /// All-open board of the given size.
    pub fn open(size: usize) -> Self {
        Grid {
            cells: vec![vec![Cell::Open; size]; size],
            size,
        }
    }

    /// Build the board for `level` at the standard size.
    pub fn initialize(level: Level) -> Self {
        let mut grid = Grid::open(GRID_SIZE);
        for (x, y) in level.blocking_shape(GRID_SIZE) {
            grid.stamp(x, y);
        }
        grid
    }

    fn stamp(&mut self, x: usize, y: usize) {
        if x < self.size && y < self.size {
            self.cells[y][x] = Cell::Blocking;
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.size && (y as usize) < self.size
    }

    /// Cell at (x, y), or None outside the board.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        if self.in_bounds(x, y) {
            Some(self.cells[y as usize][x as usize])
        } else {
            None
        }
    }

    /// The single wall query shared by movement, visibility and spawning.
    /// Out-of-bounds is not blocking; callers that care check bounds.
    #[inline]
    pub fn is_blocking(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(Cell::is_blocking)
    }

    /// Open cells in x-major order.
    pub fn open_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.size).flat_map(move |x| {
            (0..self.size)
                .filter(move |&y| self.cells[y][x].is_passable())
                .map(move |y| (x, y))
        })
    }

    pub fn blocking_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_blocking()).count()
    }

    /// Nearest open cell to (x, y) by squared distance.
    /// Ties resolve to the first candidate in x-major order.
    pub fn nearest_open(&self, x: usize, y: usize) -> Option<(usize, usize)> {
        let mut best: Option<((usize, usize), usize)> = None;
        for (ox, oy) in self.open_cells() {
            let d = ox.abs_diff(x).pow(2) + oy.abs_diff(y).pow(2);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some(((ox, oy), d));
            }
        }
        best.map(|(p, _)| p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocking_set(g: &Grid) -> Vec<(usize, usize)> {
        let mut v = vec![];
        for y in 0..g.size() {
            for x in 0..g.size() {
                if g.is_blocking(x as i32, y as i32) {
                    v.push((x, y));
                }
            }
        }
        v
    }

    #[test]
    fn level1_is_centered_4x4_block() {
        let g = Grid::initialize(Level::One);
        assert_eq!(g.blocking_count(), 16);
        for x in 0..GRID_SIZE as i32 {
            for y in 0..GRID_SIZE as i32 {
                let inside = (8..=11).contains(&x) && (8..=11).contains(&y);
                assert_eq!(g.is_blocking(x, y), inside, "cell ({x},{y})");
            }
        }
    }

    #[test]
    fn level2_line_plus_single_bloom_pass() {
        let g = Grid::initialize(Level::Two);
        // line x=10, y=7..=12, grown up/left to x=9..=10, y=6..=12
        let mut expected = vec![];
        for y in 6..=12 {
            for x in 9..=10 {
                expected.push((x, y));
            }
        }
        expected.sort_by_key(|&(x, y)| (y, x));
        assert_eq!(blocking_set(&g), expected);
        assert_eq!(g.blocking_count(), 14);
    }

    #[test]
    fn bloom_never_grows_right_or_down() {
        let g = Grid::initialize(Level::Two);
        for y in 0..GRID_SIZE as i32 {
            assert!(!g.is_blocking(11, y));
        }
        assert!(!g.is_blocking(10, 13));
        assert!(!g.is_blocking(9, 13));
    }

    #[test]
    fn bloom_skips_cells_already_in_base() {
        let extra = bloom(&[(5, 5), (5, 6)]);
        // (5,5) is the up-neighbor of (5,6): must not be re-added
        assert!(!extra.contains(&(5, 5)));
        assert!(extra.contains(&(4, 5)));
        assert!(extra.contains(&(4, 6)));
        assert!(extra.contains(&(5, 4)));
        assert!(extra.contains(&(4, 4)));
    }

    #[test]
    fn out_of_bounds_is_not_blocking() {
        let g = Grid::initialize(Level::One);
        assert!(!g.is_blocking(-1, 0));
        assert!(!g.is_blocking(0, GRID_SIZE as i32));
        assert_eq!(g.get(-1, -1), None);
        assert_eq!(g.get(0, 0), Some(Cell::Open));
    }

    #[test]
    fn reinitialize_yields_identical_grid() {
        assert_eq!(Grid::initialize(Level::Two), Grid::initialize(Level::Two));
        assert_ne!(Grid::initialize(Level::One), Grid::initialize(Level::Two));
    }

    #[test]
    fn nearest_open_from_block_center() {
        let g = Grid::initialize(Level::One);
        // (9,9) is two steps from the top-left edge of the block
        assert_eq!(g.nearest_open(9, 9), Some((7, 9)));
        assert_eq!(g.nearest_open(3, 3), Some((3, 3)));
        let (x, y) = g.nearest_open(10, 10).unwrap();
        assert!(!g.is_blocking(x as i32, y as i32));
    }

    #[test]
    fn open_cells_excludes_walls() {
        let g = Grid::initialize(Level::One);
        assert_eq!(g.open_cells().count(), GRID_SIZE * GRID_SIZE - 16);
        assert!(g.open_cells().all(|(x, y)| !g.is_blocking(x as i32, y as i32)));
    }
}
