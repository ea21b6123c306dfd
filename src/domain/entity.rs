/// Entities and per-frame input: Character, Coin, Orb.
/// Positions are grid cells; the orb is cell-quantized like everything else.

/// Movement direction (one cardinal step per accepted move).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDir {
    /// Priority order when several directions are held at once.
    pub const PRIORITY: [MoveDir; 4] = [MoveDir::Up, MoveDir::Down, MoveDir::Left, MoveDir::Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Up => (0, -1),
            MoveDir::Down => (0, 1),
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
        }
    }

    /// First held direction in priority order. No diagonals.
    pub fn pick(held: impl Fn(MoveDir) -> bool) -> Option<MoveDir> {
        Self::PRIORITY.into_iter().find(|&d| held(d))
    }

    fn bit(self) -> u8 {
        match self {
            MoveDir::Up => 1,
            MoveDir::Down => 2,
            MoveDir::Left => 4,
            MoveDir::Right => 8,
        }
    }
}

/// Directions held this frame. The session picks one of them.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DirSet(u8);

impl DirSet {
    pub fn from_fn(held: impl Fn(MoveDir) -> bool) -> Self {
        let bits = MoveDir::PRIORITY.into_iter()
            .filter(|&d| held(d))
            .fold(0, |acc, d| acc | d.bit());
        DirSet(bits)
    }

    pub fn contains(self, dir: MoveDir) -> bool {
        self.0 & dir.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Frame input for the play phase.
/// `pointer` is the raw pointer cell, possibly outside the board.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub movement: DirSet,
    pub pointer: Option<(i32, i32)>,
}

/// Discrete menu / text actions, edge-triggered.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuAction {
    Up,
    Down,
    Confirm,
    Back,
    /// Pointer click on menu item `i`.
    Select(usize),
    Char(char),
    Backspace,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Character {
    pub x: usize,
    pub y: usize,
    /// Seconds since the last accepted move.
    pub since_move: f32,
}

impl Character {
    /// `ready_after` primes the debounce so the first move is accepted.
    pub fn new(x: usize, y: usize, ready_after: f32) -> Self {
        Character { x, y, since_move: ready_after }
    }

    pub fn pos(&self) -> (usize, usize) {
        (self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Coin {
    pub x: usize,
    pub y: usize,
}

impl Coin {
    pub fn pos(&self) -> (usize, usize) {
        (self.x, self.y)
    }
}

/// Light source driven by the pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Orb {
    pub x: usize,
    pub y: usize,
}

impl Orb {
    pub fn pos(&self) -> (usize, usize) {
        (self.x, self.y)
    }
}
