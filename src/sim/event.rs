/// Events emitted during a simulation step or a state transition.
/// The frame loop consumes these for logging and persistence.

use crate::domain::grid::Level;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    LevelStarted(Level),
    CoinCollected { x: usize, y: usize, score: u32 },
    /// Rejection sampling ran out of attempts; coin placed on the fallback cell.
    CoinFallback { x: usize, y: usize },
    InvincibilityEnded,
    CaughtInDark { x: usize, y: usize },
    TimeUp { score: u32 },
    NewTopScore(u32),
    ScoreSubmitted { id: u64, score: u32, name: String },
    Quit,
}
