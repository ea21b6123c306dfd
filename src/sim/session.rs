/// Session: the complete state of one playthrough.
///
/// ## Ownership
///   One `Session` owns its grid, character, coin, orb and light map.
///   It is created when a level starts and dropped when a new level starts
///   or the player returns to the menu. Nothing here is global.
///
/// ## Light map
///   The orb is cell-quantized, so the light map only changes when the orb
///   changes cell. `refresh_light()` recomputes on that condition only.
///
/// ## Time
///   All timers advance from the frame delta passed to `tick()`. The session
///   never reads the clock itself.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::{RulesConfig, TimingConfig};
use crate::domain::cell::Light;
use crate::domain::entity::{Character, Coin, MoveDir, Orb};
use crate::domain::grid::{Grid, Level};
use crate::domain::rules;
use crate::domain::visibility::{self, LightMap};

/// Fallback coin cell when rejection sampling gives up.
pub const COIN_FALLBACK: (usize, usize) = (0, 0);

/// How a session ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionEnd {
    Caught,
    TimeUp,
}

pub struct Session {
    pub level: Level,
    pub grid: Grid,

    // ── Entities ──
    pub character: Character,
    pub coin: Coin,
    pub orb: Orb,

    // ── Derived: light map for the current orb cell ──
    pub light: LightMap,

    // ── Game tracking ──
    pub score: u32,
    pub time_remaining: f32,
    pub invincible: bool,
    pub end: Option<SessionEnd>,

    timing: TimingConfig,
    coin_attempts: u32,
    rng: Pcg32,
}

// ── Construction ──

impl Session {
    /// Fresh session for `level`. Seeds the coin RNG from config or at random.
    pub fn new(level: Level, timing: &TimingConfig, rules: &RulesConfig) -> Self {
        let seed = rules.seed.unwrap_or_else(rand::random);
        Self::with_seed(level, timing, rules.coin_spawn_attempts, seed)
    }

    pub fn with_seed(level: Level, timing: &TimingConfig, coin_attempts: u32, seed: u64) -> Self {
        let grid = Grid::initialize(level);
        let center = grid.size() as i32 / 2;
        let (ox, oy) = rules::place_orb(&grid, center, center);
        let light = visibility::compute_visibility(&grid, (ox, oy));

        let mut session = Session {
            level,
            grid,
            character: Character::new(0, 0, timing.move_delay),
            coin: Coin { x: COIN_FALLBACK.0, y: COIN_FALLBACK.1 },
            orb: Orb { x: ox, y: oy },
            light,
            score: 0,
            time_remaining: timing.start_time,
            invincible: true,
            end: None,
            timing: timing.clone(),
            coin_attempts,
            rng: Pcg32::seed_from_u64(seed),
        };
        let (coin, _) = session.spawn_coin();
        session.coin = coin;
        session
    }

    pub fn is_over(&self) -> bool {
        self.end.is_some()
    }

    /// Light classification under the character.
    pub fn character_light(&self) -> Light {
        self.light.at(self.character.x, self.character.y)
    }
}

// ── Timers ──

impl Session {
    /// Advance clocks by `dt` seconds.
    /// Returns true on the frame invincibility switches off.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.time_remaining -= dt;
        self.character.since_move += dt;

        // One-way: never re-enabled for this session
        if self.invincible && self.time_remaining <= self.timing.start_time - self.timing.immunity_time {
            self.invincible = false;
            return true;
        }
        false
    }
}

// ── Entity updates ──

impl Session {
    /// Try one step. Rejected (returns false) when the debounce has not
    /// elapsed, the step leaves the board, or it lands on a wall.
    pub fn move_character(&mut self, dir: MoveDir) -> bool {
        if !rules::debounce_elapsed(self.character.since_move, self.timing.move_delay) {
            return false;
        }
        match rules::step_target(&self.grid, self.character.x, self.character.y, dir) {
            Some((x, y)) => {
                self.character.x = x;
                self.character.y = y;
                self.character.since_move = 0.0;
                true
            }
            None => false,
        }
    }

    /// Move the orb toward a raw pointer cell (clamped, kept off walls).
    pub fn place_orb(&mut self, raw_x: i32, raw_y: i32) {
        let (x, y) = rules::place_orb(&self.grid, raw_x, raw_y);
        self.orb = Orb { x, y };
    }

    /// Recompute the light map if the orb changed cell.
    pub fn refresh_light(&mut self) {
        if self.light.source != self.orb.pos() {
            self.light = visibility::compute_visibility(&self.grid, self.orb.pos());
        }
    }

    /// Score and respawn the coin when the character stands on it.
    /// Returns `Some(fallback_used)` on a pickup.
    pub fn check_coin_collision(&mut self) -> Option<bool> {
        if self.character.pos() != self.coin.pos() {
            return None;
        }
        self.score += 1;
        let (coin, fallback) = self.spawn_coin();
        self.coin = coin;
        Some(fallback)
    }

    /// Caught outside the light once the grace window is over.
    pub fn check_loss_condition(&self) -> bool {
        !self.invincible && self.character_light() == Light::Unlit
    }

    pub fn check_timeout(&self) -> bool {
        self.time_remaining <= 0.0
    }

    /// Uniform pick over the board, rejecting walls.
    /// Gives up after `coin_attempts` draws and uses the fallback cell.
    fn spawn_coin(&mut self) -> (Coin, bool) {
        let size = self.grid.size();
        for _ in 0..self.coin_attempts {
            let x = self.rng.random_range(0..size);
            let y = self.rng.random_range(0..size);
            if !self.grid.is_blocking(x as i32, y as i32) {
                return (Coin { x, y }, false);
            }
        }
        let (fx, fy) = if self.grid.is_blocking(COIN_FALLBACK.0 as i32, COIN_FALLBACK.1 as i32) {
            self.grid.open_cells().next().unwrap_or(COIN_FALLBACK)
        } else {
            COIN_FALLBACK
        };
        (Coin { x: fx, y: fy }, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(level: Level) -> Session {
        Session::with_seed(level, &TimingConfig::default(), 100, 42)
    }

    #[test]
    fn new_session_starting_values() {
        let s = session(Level::One);
        assert_eq!(s.score, 0);
        assert_eq!(s.time_remaining, 30.0);
        assert!(s.invincible);
        assert_eq!(s.character.pos(), (0, 0));
        assert!(!s.grid.is_blocking(s.coin.x as i32, s.coin.y as i32));
        assert!(!s.grid.is_blocking(s.orb.x as i32, s.orb.y as i32));
        assert_eq!(s.light.source, s.orb.pos());
    }

    #[test]
    fn initial_orb_avoids_center_walls() {
        assert_eq!(session(Level::One).orb.pos(), (10, 12));
        assert_eq!(session(Level::Two).orb.pos(), (11, 10));
    }

    #[test]
    fn invincibility_ends_after_grace_window() {
        let mut s = session(Level::One);
        assert!(!s.tick(1.0));
        assert!(!s.tick(1.0));
        assert!(s.invincible);
        assert!(s.tick(1.0)); // 3s elapsed
        assert!(!s.invincible);
        // never flips back
        assert!(!s.tick(1.0));
        assert!(!s.invincible);
    }

    #[test]
    fn move_debounced() {
        let mut s = session(Level::One);
        assert!(s.move_character(MoveDir::Right));
        assert_eq!(s.character.pos(), (1, 0));
        // no time has passed since the last move
        assert!(!s.move_character(MoveDir::Right));
        s.tick(0.1);
        assert!(!s.move_character(MoveDir::Right));
        s.tick(0.06);
        assert!(s.move_character(MoveDir::Right));
        assert_eq!(s.character.pos(), (2, 0));
    }

    #[test]
    fn rejected_move_keeps_position_and_debounce() {
        let mut s = session(Level::One);
        assert!(!s.move_character(MoveDir::Up)); // off the top edge
        assert_eq!(s.character.pos(), (0, 0));
        // a rejected move does not consume the debounce window
        assert!(s.move_character(MoveDir::Down));
    }

    #[test]
    fn wall_blocks_character() {
        let mut s = session(Level::One);
        s.character = Character::new(7, 9, 1.0);
        assert!(!s.move_character(MoveDir::Right));
        assert_eq!(s.character.pos(), (7, 9));
    }

    #[test]
    fn coin_pickup_scores_and_respawns() {
        let mut s = session(Level::Two);
        s.coin = Coin { x: 3, y: 3 };
        assert_eq!(s.check_coin_collision(), None);
        s.character = Character::new(3, 3, 1.0);
        assert_eq!(s.check_coin_collision(), Some(false));
        assert_eq!(s.score, 1);
        assert!(!s.grid.is_blocking(s.coin.x as i32, s.coin.y as i32));
    }

    #[test]
    fn coin_fallback_when_attempts_exhausted() {
        let mut s = Session::with_seed(Level::One, &TimingConfig::default(), 0, 1);
        assert_eq!(s.coin.pos(), COIN_FALLBACK);
        s.character = Character::new(0, 0, 1.0);
        assert_eq!(s.check_coin_collision(), Some(true));
        assert_eq!(s.coin.pos(), COIN_FALLBACK);
    }

    #[test]
    fn same_seed_same_coins() {
        let a = session(Level::One);
        let b = session(Level::One);
        assert_eq!(a.coin, b.coin);
    }

    #[test]
    fn loss_only_in_dark_after_grace() {
        let mut s = session(Level::One);
        // orb above the block, character below it in its shadow
        s.place_orb(10, 2);
        s.refresh_light();
        s.character = Character::new(10, 18, 1.0);
        assert_eq!(s.character_light(), Light::Unlit);
        assert!(!s.check_loss_condition()); // still invincible

        s.tick(3.0);
        assert!(s.check_loss_condition());

        // step into the light
        s.character = Character::new(0, 0, 1.0);
        assert_eq!(s.character_light(), Light::Lit);
        assert!(!s.check_loss_condition());
    }

    #[test]
    fn refresh_light_follows_orb() {
        let mut s = session(Level::One);
        s.place_orb(0, 0);
        assert_ne!(s.light.source, (0, 0));
        s.refresh_light();
        assert_eq!(s.light.source, (0, 0));
        s.place_orb(-5, 50);
        s.refresh_light();
        assert_eq!(s.light.source, (0, 19));
    }

    #[test]
    fn timeout_at_zero() {
        let mut s = session(Level::One);
        s.tick(29.0);
        assert!(!s.check_timeout());
        s.tick(1.0);
        assert!(s.check_timeout());
    }
}
