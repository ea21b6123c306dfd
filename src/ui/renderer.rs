/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Board layout: each grid cell is two terminal columns wide, so the board
/// looks square. `pointer_cell()` maps a mouse position back to a grid cell
/// using the same layout constants.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::cell::Light;
use crate::domain::grid::GRID_SIZE;
use crate::domain::visibility::LightMap;
use crate::sim::game::{Game, Phase, TUTORIAL_TEXT};
use crate::sim::scores::MAX_SCORES;
use crate::sim::session::SessionEnd;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every "empty" terminal cell, so gaps between
    /// rows match the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer. Never equal to a real cell.
    const INVALID: Cell = Cell { ch: '\0', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }
}

// ── Layout ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MAP_COL: usize = 2;

/// First menu item row; items are two rows apart.
const MENU_ROW: usize = 9;
const MENU_COL: usize = 10;
const MENU_SPACING: usize = 2;

// ── Palette ──

const LIT: Color = Color::White;
const UNLIT: Color = Color::Rgb { r: 72, g: 72, b: 72 };
const WALL: Color = Color::Black;
const CHARACTER_FG: Color = Color::Rgb { r: 30, g: 60, b: 200 };
const COIN_FG: Color = Color::Rgb { r: 200, g: 150, b: 0 };
const ORB_FG: Color = Color::Rgb { r: 255, g: 120, b: 0 };
const TITLE_FG: Color = Color::Rgb { r: 255, g: 220, b: 90 };
const HI: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };

/// Grid cell under terminal position (col, row). May be off the board.
pub fn pointer_cell(col: u16, row: u16) -> (i32, i32) {
    let x = (col as i32 - MAP_COL as i32).div_euclid(CELL_W as i32);
    let y = row as i32 - MAP_ROW as i32;
    (x, y)
}

/// Menu item index drawn on terminal `row`, if any. The caller checks the
/// index against the current menu length.
pub fn menu_item_at(row: u16) -> Option<usize> {
    let row = row as usize;
    if row < MENU_ROW || (row - MENU_ROW) % MENU_SPACING != 0 {
        return None;
    }
    Some((row - MENU_ROW) / MENU_SPACING)
}

/// A glyph drawn on top of the board.
struct Sprite {
    x: usize,
    y: usize,
    ch: char,
    fg: Color,
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, game: &Game) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(game.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(game.phase);
        }

        self.compose(game);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn compose(&mut self, game: &Game) {
        self.front.clear();
        match game.phase {
            Phase::MainMenu => self.compose_main_menu(game),
            Phase::LevelSelect => self.compose_level_select(game),
            Phase::Tutorial => self.compose_tutorial(game),
            Phase::Playing(_) => self.compose_game(game),
            Phase::GameOver { final_score } => self.compose_game_over(game, final_score),
            Phase::Leaderboard => self.compose_leaderboard(game),
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Board ──

    fn compose_board(&mut self, light: &LightMap, sprites: &[Sprite]) {
        for y in 0..light.size() {
            let row = MAP_ROW + y;
            for x in 0..light.size() {
                let col = MAP_COL + x * CELL_W;
                let bg = match light.at(x, y) {
                    Light::Lit => LIT,
                    Light::Unlit => UNLIT,
                    Light::Blocking => WALL,
                };
                self.front.set(col, row, Cell::new(' ', Color::Black, bg));
                self.front.set(col + 1, row, Cell::new(' ', Color::Black, bg));
            }
        }

        // Later sprites draw over earlier ones
        for s in sprites {
            let col = MAP_COL + s.x * CELL_W;
            let bg = self.front.get(col, MAP_ROW + s.y).bg;
            self.front.set(col, MAP_ROW + s.y, Cell::new(s.ch, s.fg, bg));
        }
    }

    fn compose_game(&mut self, game: &Game) {
        let session = match &game.session {
            Some(s) => s,
            None => return,
        };

        let blink = (game.anim_tick / 10) % 2 == 0;
        let shield = if session.invincible && blink { "SAFE" } else { "    " };
        let hud = format!(
            " LEVEL {}  SCORE {:<4} TIME {:>4.1}  BEST {:<4} {} ",
            session.level.number(),
            session.score,
            session.time_remaining.max(0.0),
            game.top_score,
            shield,
        );
        for x in 0..self.front.width {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, HUD_BG));
        }
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        let sprites = [
            Sprite { x: session.orb.x, y: session.orb.y, ch: '*', fg: ORB_FG },
            Sprite { x: session.coin.x, y: session.coin.y, ch: '$', fg: COIN_FG },
            Sprite { x: session.character.x, y: session.character.y, ch: '@', fg: CHARACTER_FG },
        ];
        self.compose_board(&session.light, &sprites);

        let help_row = MAP_ROW + GRID_SIZE + 1;
        self.front.put_str(
            MAP_COL, help_row,
            "WASD/Arrows: Move   Mouse: Orb   ESC: Menu",
            Color::DarkGrey, Color::Reset,
        );
    }

    fn compose_tutorial(&mut self, game: &Game) {
        let tutorial = match &game.tutorial {
            Some(t) => t,
            None => return,
        };
        self.front.put_str(MAP_COL, HUD_ROW, " TUTORIAL ", TITLE_FG, Color::Reset);

        let orb = [Sprite { x: tutorial.orb.x, y: tutorial.orb.y, ch: '*', fg: ORB_FG }];
        self.compose_board(&tutorial.light, &orb);

        let shown: String = TUTORIAL_TEXT
            .chars()
            .take(tutorial.visible_chars(game.timing().tutorial_char))
            .collect();
        self.front.put_str(MAP_COL, MAP_ROW + GRID_SIZE + 1, &shown, Color::White, Color::Reset);
    }

    // ── Menus ──

    fn compose_title(&mut self) {
        let title = [
            r" _    ___ ___ _  _ _____    ___   _   __  __ ___ ",
            r"| |  |_ _/ __| || |_   _|  / __| /_\ |  \/  | __|",
            r"| |__ | | (_ | __ | | |   | (_ |/ _ \| |\/| | _| ",
            r"|____|___\___|_||_| |_|    \___/_/ \_\_|  |_|___|",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, TITLE_FG, Color::Reset);
        }
    }

    fn compose_menu(&mut self, items: &[&str], cursor: usize) {
        for (i, item) in items.iter().enumerate() {
            let row = MENU_ROW + i * MENU_SPACING;
            if i == cursor {
                self.front.put_str(MENU_COL - 3, row, ">", HI, Color::Reset);
                self.front.put_str(MENU_COL, row, item, HI, Color::Reset);
            } else {
                self.front.put_str(MENU_COL, row, item, Color::White, Color::Reset);
            }
        }
        let hint_row = MENU_ROW + items.len() * MENU_SPACING + 1;
        self.front.put_str(
            MENU_COL - 3, hint_row,
            "Up/Down: Choose   ENTER/Click: Select   ESC: Back",
            Color::DarkGrey, Color::Reset,
        );
    }

    fn compose_main_menu(&mut self, game: &Game) {
        self.compose_title();
        self.compose_menu(game.menu_items(), game.cursor);
        if game.top_score > 0 {
            let best = format!("BEST {}", game.top_score);
            self.front.put_str(MENU_COL, MENU_ROW - 2, &best, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_level_select(&mut self, game: &Game) {
        self.compose_title();
        self.front.put_str(MENU_COL, MENU_ROW - 2, "SELECT A LEVEL", TITLE_FG, Color::Reset);
        self.compose_menu(game.menu_items(), game.cursor);
    }

    // ── End screens ──

    fn compose_game_over(&mut self, game: &Game, final_score: u32) {
        let red = Color::Rgb { r: 255, g: 60, b: 60 };
        let box_art = [
            "+------------------------------+",
            "|          GAME  OVER          |",
            "+------------------------------+",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(6, 3 + i, l, red, Color::Reset);
        }

        let reason = match game.session.as_ref().and_then(|s| s.end) {
            Some(SessionEnd::Caught) => "Caught in the dark!",
            Some(SessionEnd::TimeUp) => "Time's up!",
            None => "",
        };
        self.front.put_str(8, 7, reason, Color::White, Color::Reset);
        self.front.put_str(8, 9, &format!("Final Score: {final_score}"), Color::White, Color::Reset);

        self.front.put_str(8, 11, "Enter your name:", HI, Color::Reset);
        let blink = (game.anim_tick / 15) % 2 == 0;
        let caret = if blink { "_" } else { " " };
        let field = format!("[ {:<21}]", format!("{}{}", game.name, caret));
        self.front.put_str(8, 12, &field, Color::White, Color::Reset);

        self.front.put_str(8, 14, "ENTER: Submit   BACKSPACE: Delete", Color::DarkGrey, Color::Reset);
    }

    fn compose_leaderboard(&mut self, game: &Game) {
        self.front.put_str(8, 2, "LEADERBOARD", TITLE_FG, Color::Reset);

        if game.scores.is_empty() {
            self.front.put_str(8, 4, "No scores yet", Color::DarkGrey, Color::Reset);
        }
        for (i, e) in game.scores.list_all().iter().take(MAX_SCORES).enumerate() {
            let line = format!("{:>2}. {:<20} {:>5}", i + 1, e.player_name, e.score);
            let fg = if i == 0 { HI } else { Color::White };
            self.front.put_str(8, 4 + i, &line, fg, Color::Reset);
        }

        self.front.put_str(8, 5 + MAX_SCORES, "SPACE / ENTER: Continue", Color::DarkGrey, Color::Reset);
    }
}
