/// Game state machine: menus, tutorial, play, name entry, leaderboard.
///
/// ## Phases
///
///   MainMenu ──Level Select──► LevelSelect ──Level 1/2──► Playing(level)
///      │  ▲                       │                          │
///      │  └─────────Back──────────┘                 caught / time up
///      │                                                     ▼
///      ├──Tutorial──► Tutorial ──done──► MainMenu     GameOver{score}
///      │                                                     │ Enter
///      └──Quit / Back──► GameEvent::Quit                     ▼
///                                      MainMenu ◄─continue── Leaderboard
///
/// Exactly one phase is active. Transitions happen inside `handle()` /
/// `update()` and take effect immediately.
///
/// Persistence is left to the caller: a `ScoreSubmitted` event means the
/// in-memory table changed and should be written out.

use crate::config::{RulesConfig, TimingConfig};
use crate::domain::entity::{FrameInput, MenuAction, Orb};
use crate::domain::grid::{Grid, Level, GRID_SIZE};
use crate::domain::rules;
use crate::domain::visibility::{self, LightMap};
use super::event::GameEvent;
use super::scores::ScoreTable;
use super::session::Session;
use super::step;

pub const MAIN_MENU: [&str; 3] = ["LEVEL SELECT", "TUTORIAL", "QUIT"];
pub const LEVEL_MENU: [&str; 3] = ["LEVEL 1", "LEVEL 2", "BACK"];

pub const TUTORIAL_TEXT: &str = "You can control the orb with your mouse";
/// Seconds the fully revealed tutorial text stays up.
pub const TUTORIAL_HOLD: f32 = 1.5;

/// Max player name length, in characters.
pub const NAME_MAX: usize = 20;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    MainMenu,
    LevelSelect,
    Tutorial,
    Playing(Level),
    GameOver { final_score: u32 },
    Leaderboard,
}

/// Scripted tutorial: typewriter text over an open board with a live orb.
pub struct Tutorial {
    pub elapsed: f32,
    pub grid: Grid,
    pub orb: Orb,
    pub light: LightMap,
}

impl Tutorial {
    fn new() -> Self {
        let grid = Grid::open(GRID_SIZE);
        let c = GRID_SIZE / 2;
        let light = visibility::compute_visibility(&grid, (c, c));
        Tutorial { elapsed: 0.0, grid, orb: Orb { x: c, y: c }, light }
    }

    /// Number of characters of `TUTORIAL_TEXT` revealed so far.
    pub fn visible_chars(&self, char_delay: f32) -> usize {
        let total = TUTORIAL_TEXT.chars().count();
        if char_delay <= 0.0 {
            return total;
        }
        ((self.elapsed / char_delay) as usize).min(total)
    }

    fn finished(&self, char_delay: f32) -> bool {
        let reveal = TUTORIAL_TEXT.chars().count() as f32 * char_delay.max(0.0);
        self.elapsed >= reveal + TUTORIAL_HOLD
    }

    fn follow_pointer(&mut self, pointer: Option<(i32, i32)>) {
        if let Some((px, py)) = pointer {
            let (x, y) = rules::place_orb(&self.grid, px, py);
            self.orb = Orb { x, y };
        }
        if self.light.source != self.orb.pos() {
            self.light = visibility::compute_visibility(&self.grid, self.orb.pos());
        }
    }
}

pub struct Game {
    pub phase: Phase,
    pub session: Option<Session>,
    pub tutorial: Option<Tutorial>,
    /// Highlighted menu item in MainMenu / LevelSelect.
    pub cursor: usize,
    /// Name being typed on the game over screen.
    pub name: String,
    pub top_score: u32,
    pub scores: ScoreTable,
    /// Frame counter for blinking UI elements.
    pub anim_tick: u32,
    timing: TimingConfig,
    rules: RulesConfig,
}

impl Game {
    pub fn new(timing: TimingConfig, rules: RulesConfig, scores: ScoreTable) -> Self {
        Game {
            phase: Phase::MainMenu,
            session: None,
            tutorial: None,
            cursor: 0,
            name: String::new(),
            top_score: scores.best().unwrap_or(0),
            scores,
            anim_tick: 0,
            timing,
            rules,
        }
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Items of the menu shown in the current phase (empty outside menus).
    pub fn menu_items(&self) -> &'static [&'static str] {
        match self.phase {
            Phase::MainMenu => &MAIN_MENU,
            Phase::LevelSelect => &LEVEL_MENU,
            _ => &[],
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Discrete actions
// ══════════════════════════════════════════════════════════════

impl Game {
    pub fn handle(&mut self, action: MenuAction) -> Vec<GameEvent> {
        match self.phase {
            Phase::MainMenu => self.handle_main_menu(action),
            Phase::LevelSelect => self.handle_level_select(action),
            Phase::Tutorial => {
                if matches!(action, MenuAction::Back | MenuAction::Confirm) {
                    self.return_to_menu();
                }
                vec![]
            }
            Phase::Playing(_) => {
                if action == MenuAction::Back {
                    self.return_to_menu();
                }
                vec![]
            }
            Phase::GameOver { final_score } => self.handle_name_entry(action, final_score),
            Phase::Leaderboard => {
                if matches!(action, MenuAction::Confirm | MenuAction::Select(_)) {
                    self.return_to_menu();
                }
                vec![]
            }
        }
    }

    fn handle_main_menu(&mut self, action: MenuAction) -> Vec<GameEvent> {
        let choice = match self.menu_choice(action) {
            Some(i) => i,
            None if action == MenuAction::Back => return vec![GameEvent::Quit],
            None => return vec![],
        };
        match choice {
            0 => {
                self.phase = Phase::LevelSelect;
                self.cursor = 0;
            }
            1 => {
                self.phase = Phase::Tutorial;
                self.tutorial = Some(Tutorial::new());
            }
            _ => return vec![GameEvent::Quit],
        }
        vec![]
    }

    fn handle_level_select(&mut self, action: MenuAction) -> Vec<GameEvent> {
        if action == MenuAction::Back {
            self.return_to_menu();
            return vec![];
        }
        match self.menu_choice(action) {
            Some(i) => match Level::ALL.get(i) {
                Some(&level) => self.start_level(level),
                None => {
                    self.return_to_menu();
                    vec![]
                }
            },
            None => vec![],
        }
    }

    /// Cursor movement for menu phases. Returns the chosen index on
    /// Confirm or a click.
    fn menu_choice(&mut self, action: MenuAction) -> Option<usize> {
        let count = self.menu_items().len();
        match action {
            MenuAction::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            MenuAction::Down => {
                if self.cursor + 1 < count {
                    self.cursor += 1;
                }
                None
            }
            MenuAction::Confirm => Some(self.cursor),
            MenuAction::Select(i) if i < count => {
                self.cursor = i;
                Some(i)
            }
            _ => None,
        }
    }

    fn handle_name_entry(&mut self, action: MenuAction, final_score: u32) -> Vec<GameEvent> {
        match action {
            MenuAction::Char(c) if !c.is_control() => {
                // Overflow is dropped per character
                if self.name.chars().count() < NAME_MAX {
                    self.name.push(c);
                }
                vec![]
            }
            MenuAction::Backspace => {
                self.name.pop();
                vec![]
            }
            MenuAction::Confirm => {
                let name = std::mem::take(&mut self.name);
                self.phase = Phase::Leaderboard;
                self.session = None;
                match self.scores.insert(final_score, &name) {
                    Some(id) => vec![GameEvent::ScoreSubmitted { id, score: final_score, name }],
                    None => vec![],
                }
            }
            _ => vec![],
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Per-frame update
// ══════════════════════════════════════════════════════════════

impl Game {
    pub fn update(&mut self, input: FrameInput, dt: f32) -> Vec<GameEvent> {
        self.anim_tick = self.anim_tick.wrapping_add(1);

        match self.phase {
            Phase::Playing(_) => self.update_playing(input, dt),
            Phase::Tutorial => {
                let char_delay = self.timing.tutorial_char;
                let done = match self.tutorial.as_mut() {
                    Some(t) => {
                        t.elapsed += dt;
                        t.follow_pointer(input.pointer);
                        t.finished(char_delay)
                    }
                    None => true,
                };
                if done {
                    self.return_to_menu();
                }
                vec![]
            }
            _ => vec![],
        }
    }

    fn update_playing(&mut self, input: FrameInput, dt: f32) -> Vec<GameEvent> {
        let session = match self.session.as_mut() {
            Some(s) => s,
            None => {
                self.return_to_menu();
                return vec![];
            }
        };

        let events = step::step(session, input, dt, &mut self.top_score);
        if session.is_over() {
            self.phase = Phase::GameOver { final_score: session.score };
            self.name.clear();
        }
        events
    }

    /// Fresh session for `level`; any previous session is dropped.
    pub fn start_level(&mut self, level: Level) -> Vec<GameEvent> {
        self.session = Some(Session::new(level, &self.timing, &self.rules));
        self.tutorial = None;
        self.phase = Phase::Playing(level);
        vec![GameEvent::LevelStarted(level)]
    }

    pub fn return_to_menu(&mut self) {
        self.phase = Phase::MainMenu;
        self.session = None;
        self.tutorial = None;
        self.cursor = 0;
        self.name.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Character, Coin, DirSet};

    fn game() -> Game {
        let rules = RulesConfig { seed: Some(3), ..RulesConfig::default() };
        Game::new(TimingConfig::default(), rules, ScoreTable::new())
    }

    fn typed(g: &mut Game, text: &str) {
        for c in text.chars() {
            g.handle(MenuAction::Char(c));
        }
    }

    #[test]
    fn main_menu_to_level_and_back() {
        let mut g = game();
        assert_eq!(g.phase, Phase::MainMenu);
        g.handle(MenuAction::Confirm);
        assert_eq!(g.phase, Phase::LevelSelect);
        g.handle(MenuAction::Down);
        g.handle(MenuAction::Down);
        g.handle(MenuAction::Down); // clamped on BACK
        assert_eq!(g.cursor, 2);
        g.handle(MenuAction::Confirm);
        assert_eq!(g.phase, Phase::MainMenu);
    }

    #[test]
    fn level_pick_starts_fresh_session() {
        let mut g = game();
        g.handle(MenuAction::Select(0));
        let events = g.handle(MenuAction::Select(1));
        assert_eq!(events, vec![GameEvent::LevelStarted(Level::Two)]);
        assert_eq!(g.phase, Phase::Playing(Level::Two));
        let s = g.session.as_ref().unwrap();
        assert_eq!(s.score, 0);
        assert_eq!(s.level, Level::Two);
    }

    #[test]
    fn escape_from_level_select_and_play() {
        let mut g = game();
        g.handle(MenuAction::Confirm);
        g.handle(MenuAction::Back);
        assert_eq!(g.phase, Phase::MainMenu);

        g.start_level(Level::One);
        g.handle(MenuAction::Back);
        assert_eq!(g.phase, Phase::MainMenu);
        assert!(g.session.is_none());
    }

    #[test]
    fn quit_from_main_menu() {
        let mut g = game();
        assert_eq!(g.handle(MenuAction::Select(2)), vec![GameEvent::Quit]);
        let mut g = game();
        assert_eq!(g.handle(MenuAction::Back), vec![GameEvent::Quit]);
    }

    #[test]
    fn click_outside_menu_is_ignored() {
        let mut g = game();
        assert!(g.handle(MenuAction::Select(7)).is_empty());
        assert_eq!(g.phase, Phase::MainMenu);
    }

    #[test]
    fn tutorial_reveals_text_then_returns() {
        let mut g = game();
        g.handle(MenuAction::Select(1));
        assert_eq!(g.phase, Phase::Tutorial);

        g.update(FrameInput::default(), 0.35);
        let t = g.tutorial.as_ref().unwrap();
        assert_eq!(t.visible_chars(g.timing().tutorial_char), 3);

        // pointer moves the orb over the open board
        g.update(FrameInput { movement: DirSet::default(), pointer: Some((2, 3)) }, 0.0);
        assert_eq!(g.tutorial.as_ref().unwrap().orb.pos(), (2, 3));
        assert_eq!(g.tutorial.as_ref().unwrap().light.source, (2, 3));

        // 39 chars at 0.1s + 1.5s hold
        g.update(FrameInput::default(), 5.2);
        assert_eq!(g.phase, Phase::MainMenu);
        assert!(g.tutorial.is_none());
    }

    #[test]
    fn timeout_goes_to_game_over_once() {
        let mut g = game();
        g.start_level(Level::One);
        {
            let s = g.session.as_mut().unwrap();
            s.place_orb(5, 0);
            s.coin = Coin { x: 19, y: 19 };
            s.score = 6;
        }
        let mut time_ups = 0;
        for _ in 0..40 {
            let events = g.update(FrameInput::default(), 1.0);
            time_ups += events.iter().filter(|e| matches!(e, GameEvent::TimeUp { .. })).count();
        }
        assert_eq!(time_ups, 1);
        assert_eq!(g.phase, Phase::GameOver { final_score: 6 });
        assert_eq!(g.top_score, 6);
    }

    #[test]
    fn caught_goes_to_game_over() {
        let mut g = game();
        g.start_level(Level::One);
        {
            let s = g.session.as_mut().unwrap();
            s.character = Character::new(10, 18, 0.0);
            s.coin = Coin { x: 0, y: 0 };
        }
        let orb_above = FrameInput { movement: DirSet::default(), pointer: Some((10, 2)) };
        g.update(orb_above, 4.0);
        assert_eq!(g.phase, Phase::GameOver { final_score: 0 });
        // top score only moves on timeout
        assert_eq!(g.top_score, 0);
    }

    #[test]
    fn name_entry_clamps_and_edits() {
        let mut g = game();
        g.phase = Phase::GameOver { final_score: 3 };
        typed(&mut g, "abcdefghijklmnopqrstuvwxyz");
        assert_eq!(g.name.chars().count(), NAME_MAX);
        assert_eq!(g.name, "abcdefghijklmnopqrst");
        g.handle(MenuAction::Backspace);
        g.handle(MenuAction::Backspace);
        assert_eq!(g.name, "abcdefghijklmnopqr");
        g.handle(MenuAction::Char('\u{7}'));
        assert_eq!(g.name.len(), 18);
    }

    #[test]
    fn submit_stores_score_and_shows_leaderboard() {
        let mut g = game();
        g.phase = Phase::GameOver { final_score: 12 };
        typed(&mut g, "ada");
        let events = g.handle(MenuAction::Confirm);
        assert_eq!(g.phase, Phase::Leaderboard);
        assert!(matches!(
            events.as_slice(),
            [GameEvent::ScoreSubmitted { score: 12, name, .. }] if name == "ada"
        ));
        assert_eq!(g.scores.best(), Some(12));
        assert!(g.name.is_empty());

        g.handle(MenuAction::Confirm);
        assert_eq!(g.phase, Phase::MainMenu);
    }

    #[test]
    fn empty_name_is_allowed() {
        let mut g = game();
        g.phase = Phase::GameOver { final_score: 0 };
        let events = g.handle(MenuAction::Confirm);
        assert_eq!(events.len(), 1);
        assert_eq!(g.scores.list_all()[0].player_name, "");
    }

    #[test]
    fn top_score_seeded_from_store() {
        let mut table = ScoreTable::new();
        table.insert(17, "x");
        table.insert(4, "y");
        let g = Game::new(TimingConfig::default(), RulesConfig::default(), table);
        assert_eq!(g.top_score, 17);
    }
}
