/// Keyboard and mouse input tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement while a key is held (debounced by the session)
///   - Edge-triggered menu keys (only fire on initial press)
///   - Text entry from raw key events
///
/// Terminals rarely report key Release events, so a key counts as held until
/// `HOLD_TIMEOUT` passes without a Press/Repeat for it.
///
/// Keys still held across a phase change are marked stale: their repeats are
/// swallowed until the key is released, so a movement key held when a session
/// ends does not type into the name field.
///
/// The mouse position is the last Moved/Drag/Down event, in terminal
/// (column, row). Left clicks are queued for the frame.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

/// After this duration without a Press/Repeat event, consider the key released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Held keys whose repeats are ignored until they are released.
    stale: HashSet<KeyCode>,

    /// Keys that went from "not held" to "held" during the last drain.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for text entry.
    pub raw_events: Vec<KeyEvent>,

    /// Last known pointer position (column, row).
    pub pointer: Option<(u16, u16)>,

    /// Left-button presses this frame (column, row).
    pub clicks: Vec<(u16, u16)>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            stale: HashSet::new(),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            pointer: None,
            clicks: Vec::with_capacity(2),
        }
    }

    /// Drain all pending terminal events and update key and pointer state.
    /// Call this once per frame, before the update.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
        self.clicks.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.on_key(key, Instant::now()),
                Ok(Event::Mouse(m)) => match m.kind {
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                        self.pointer = Some((m.column, m.row));
                    }
                    MouseEventKind::Down(MouseButton::Left) => {
                        self.pointer = Some((m.column, m.row));
                        self.clicks.push((m.column, m.row));
                    }
                    _ => {}
                },
                Ok(_) => {}
                Err(e) => {
                    log::warn!("terminal event read failed: {e}");
                    break;
                }
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        let active = &self.last_active;
        self.stale.retain(|c| active.contains_key(c));
    }

    /// Mark every held key stale. Call on a phase change.
    pub fn mark_held_stale(&mut self) {
        let now = Instant::now();
        let held: Vec<KeyCode> = self.last_active.keys()
            .copied()
            .filter(|&c| self.is_held_at(c, now))
            .collect();
        self.stale.extend(held);
    }

    fn on_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind == KeyEventKind::Release {
            self.stale.remove(&key.code);
            return;
        }
        let was_held = self.is_held_at(key.code, now);
        self.last_active.insert(key.code, now);
        if self.stale.contains(&key.code) {
            if was_held {
                return;
            }
            self.stale.remove(&key.code);
        }
        self.raw_events.push(key);
        if !was_held {
            self.fresh_presses.push(key.code);
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.is_held_at(code, Instant::now())
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active.get(&code)
            .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}
