/// The step function: advances a play session by one frame.
///
/// Processing order:
///   1. Timers (countdown, debounce, invincibility)
///   2. Orb placement from the pointer
///   3. Character movement
///   4. Light map refresh
///   5. Coin pickup
///   6. Loss check (caught in the dark)
///   7. Timeout check (+ top score)
///
/// A session that has ended is frozen: further steps are no-ops.

use crate::domain::entity::{DirSet, FrameInput};
use crate::domain::rules;
use super::event::GameEvent;
use super::session::{Session, SessionEnd};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(session: &mut Session, input: FrameInput, dt: f32, top_score: &mut u32) -> Vec<GameEvent> {
    if session.is_over() { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();

    resolve_timers(session, dt, &mut events);
    resolve_orb(session, input.pointer);
    resolve_movement(session, input.movement);
    session.refresh_light();
    resolve_coin(session, &mut events);
    if resolve_loss(session, &mut events) { return events; }
    resolve_timeout(session, top_score, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Phases
// ══════════════════════════════════════════════════════════════

fn resolve_timers(session: &mut Session, dt: f32, events: &mut Vec<GameEvent>) {
    if session.tick(dt) {
        events.push(GameEvent::InvincibilityEnded);
    }
}

fn resolve_orb(session: &mut Session, pointer: Option<(i32, i32)>) {
    if let Some((px, py)) = pointer {
        session.place_orb(px, py);
    }
}

fn resolve_movement(session: &mut Session, held: DirSet) {
    if held.is_empty() { return; }
    let (x, y) = session.character.pos();
    if let Some(dir) = rules::choose_direction(&session.grid, x, y, held) {
        // Rejected moves are silently ignored
        session.move_character(dir);
    }
}

fn resolve_coin(session: &mut Session, events: &mut Vec<GameEvent>) {
    let (x, y) = session.character.pos();
    if let Some(fallback) = session.check_coin_collision() {
        events.push(GameEvent::CoinCollected { x, y, score: session.score });
        if fallback {
            events.push(GameEvent::CoinFallback { x: session.coin.x, y: session.coin.y });
        }
    }
}

/// Returns true if the session just ended.
fn resolve_loss(session: &mut Session, events: &mut Vec<GameEvent>) -> bool {
    if !session.check_loss_condition() { return false; }
    let (x, y) = session.character.pos();
    session.end = Some(SessionEnd::Caught);
    events.push(GameEvent::CaughtInDark { x, y });
    true
}

fn resolve_timeout(session: &mut Session, top_score: &mut u32, events: &mut Vec<GameEvent>) {
    if !session.check_timeout() { return; }
    if session.score > *top_score {
        *top_score = session.score;
        events.push(GameEvent::NewTopScore(session.score));
    }
    session.end = Some(SessionEnd::TimeUp);
    events.push(GameEvent::TimeUp { score: session.score });
}
