/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The maze itself is cached as a layer of `CellState`s and patched from
/// the session's changed-cell list, so a frame never rescans the grid.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::app::{App, Phase};
use crate::domain::entity::{Direction, Mode, Personality};
use crate::domain::grid::Cell as GridCell;
use crate::domain::grid::Grid;
use crate::domain::tile::CellState;
use crate::sim::snapshot::Snapshot;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// Using the same RGB for `Clear(ClearType::All)` and every cell keeps
    /// VTE terminals from showing seams between rows.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer; never produced by compose.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    /// Normalize bg: `Color::Reset` becomes BASE_BG so that every cell gets
    /// an explicit background color.
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: Self::norm_bg(bg) }
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
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
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
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    /// Paint a whole row with one background.
    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }
}

// ── Palette ──

const WALL_FG: Color = Color::Rgb { r: 40, g: 60, b: 230 };
const PICKUP_FG: Color = Color::Rgb { r: 255, g: 200, b: 160 };
const POWER_FG: Color = Color::Rgb { r: 255, g: 140, b: 200 };
const PLAYER_BG: Color = Color::Rgb { r: 255, g: 220, b: 0 };
const FRIGHT_BG: Color = Color::Rgb { r: 40, g: 40, b: 200 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const TITLE_FG: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const HI: Color = Color::Rgb { r: 80, g: 255, b: 80 };

/// Power time left below which frightened adversaries start flashing.
const FRIGHT_FLASH_MS: u64 = 1500;

fn personality_color(p: Personality) -> Color {
    match p {
        Personality::Pursuer => Color::Rgb { r: 255, g: 40, b: 40 },
        Personality::Ambusher => Color::Rgb { r: 255, g: 150, b: 220 },
        Personality::Flanker => Color::Rgb { r: 40, g: 230, b: 230 },
        Personality::Wanderer => Color::Rgb { r: 255, g: 170, b: 60 },
    }
}

fn player_glyph(heading: Option<Direction>) -> [char; 2] {
    match heading {
        Some(Direction::Right) => ['(', '<'],
        Some(Direction::Left) => ['>', ')'],
        Some(Direction::Up) => ['\\', '/'],
        Some(Direction::Down) => ['/', '\\'],
        None => ['(', ')'],
    }
}

// ── Renderer ──

/// Each grid cell is 2 terminal columns wide so the maze looks square.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    /// Cached maze layer, row-major, patched from changed cells.
    maze: Vec<CellState>,
    maze_cols: usize,
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
            maze: Vec::new(),
            maze_cols: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, app: &mut App, now_ms: u64) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change: clear for a clean transition
        if self.last_phase != Some(app.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(app.phase);
        }

        let changed = app.session.take_changed_cells();
        self.sync_maze(app.session.grid(), &changed);

        self.front.clear();
        let game_now = app.game_now(now_ms);
        let snap = app.session.snapshot(game_now);

        match app.phase {
            Phase::Title => self.compose_title(app),
            Phase::Playing => self.compose_game(app, &snap, now_ms),
            Phase::Won => {
                self.compose_game(app, &snap, now_ms);
                self.compose_won(app, &snap);
            }
            Phase::Caught => {
                self.compose_game(app, &snap, now_ms);
                self.compose_caught(app, &snap);
            }
        }

        if app.paused {
            self.compose_pause_overlay(app.session.grid(), now_ms);
        }

        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    /// Rebuild the maze layer when the grid shape differs, else patch it.
    fn sync_maze(&mut self, grid: &Grid, changed: &[GridCell]) {
        let cols = grid.cols();
        if self.maze_cols != cols || self.maze.len() != grid.rows() * cols {
            self.maze_cols = cols;
            self.maze = (0..grid.rows() * cols)
                .map(|i| grid.cell_at(GridCell::new((i / cols) as i32, (i % cols) as i32)))
                .collect();
            return;
        }
        for &cell in changed {
            let idx = cell.row as usize * cols + cell.col as usize;
            if let Some(slot) = self.maze.get_mut(idx) {
                *slot = grid.cell_at(cell);
            }
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors, not ResetColor: the terminal default may
        // differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
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
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn put_cell(&mut self, gc: GridCell, glyph: [char; 2], fg: Color, bg: Color) {
        if gc.row < 0 || gc.col < 0 {
            return;
        }
        let col = gc.col as usize * CELL_W;
        let row = MAP_ROW + gc.row as usize;
        self.front.set(col, row, Cell::from_char(glyph[0], fg, bg));
        self.front.set(col + 1, row, Cell::from_char(glyph[1], fg, bg));
    }

    fn compose_game(&mut self, app: &App, snap: &Snapshot, now_ms: u64) {
        let grid = app.session.grid();
        let rows = grid.rows();
        let blink = (now_ms / 250) % 2 == 0;

        // ── HUD row ──
        self.front.fill_row(HUD_ROW, HUD_BG);
        let hud = format!(
            " {}  Score:{:<6} Dots:{:<4} Best:{:<6}",
            app.session.maze_name(),
            snap.score,
            snap.remaining_pickups,
            app.best_score,
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
        let mut x = hud.chars().count() + 1;
        if snap.player.powered {
            let power = format!("POWER {:>4.1}s ", snap.player.power_left_ms as f64 / 1000.0);
            self.front.put_str(x, HUD_ROW, &power, POWER_FG, HUD_BG);
            x += power.chars().count();
        }
        // One mode chip per adversary: S(catter) or C(hase)
        for adv in &snap.adversaries {
            let ch = match adv.mode {
                Mode::Scatter => 'S',
                Mode::Chase => 'C',
            };
            self.front.set(x, HUD_ROW, Cell::from_char(ch, personality_color(adv.personality), HUD_BG));
            x += 2;
        }

        // ── Maze layer ──
        let cols = self.maze_cols;
        for i in 0..self.maze.len() {
            let gc = GridCell::new((i / cols) as i32, (i % cols) as i32);
            let state = self.maze[i];
            match state {
                CellState::Wall => self.put_cell(gc, ['█', '█'], WALL_FG, Color::Reset),
                CellState::Pickup => self.put_cell(gc, ['·', ' '], PICKUP_FG, Color::Reset),
                CellState::PowerPickup => {
                    let ch = if blink { '●' } else { ' ' };
                    self.put_cell(gc, [ch, ' '], POWER_FG, Color::Reset);
                }
                CellState::Consumed => self.put_cell(gc, [' ', ' '], Color::White, Color::Reset),
            }
        }

        // ── Adversaries, then the player on top ──
        let flashing = snap.player.powered && snap.player.power_left_ms < FRIGHT_FLASH_MS && blink;
        for adv in &snap.adversaries {
            let bg = if !snap.player.powered {
                personality_color(adv.personality)
            } else if flashing {
                Color::White
            } else {
                FRIGHT_BG
            };
            self.put_cell(adv.cell, ['"', '"'], Color::Black, bg);
        }
        self.put_cell(snap.player.cell, player_glyph(snap.player.heading), Color::Black, PLAYER_BG);

        // ── Message bar ──
        let msg_row = MAP_ROW + rows + 1;
        if let Some(msg) = app.message(now_ms) {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &format!(" * {msg} "), Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help = " Arrows/WASD:Steer  F1:Pause  R:Restart  ESC:Title  Q:Quit";
        self.front.put_str(0, MAP_ROW + rows + 3, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_title(&mut self, app: &App) {
        let title = [
            r"   ___  _               _     __  __",
            r"  / __|| |_   ___  ___ | |_  |  \/  | __ _  ___ ___",
            r" | (_ || ' \ / _ \(_-< |  _| | |\/| |/ _` ||_ // -_)",
            r"  \___||_||_|\___//__/  \__| |_|  |_|\__,_|/__|\___|",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, TITLE_FG, Color::Reset);
        }

        let maze = format!("Maze: {}", app.session.maze_name());
        self.front.put_str(8, 8, &maze, Color::Rgb { r: 180, g: 140, b: 50 }, Color::Reset);

        let menu_base = 11;
        self.front.put_str(8, menu_base, "ENTER   Start", HI, Color::Reset);
        self.front.put_str(8, menu_base + 1, "  Q     Quit", Color::White, Color::Reset);
        if app.best_score > 0 {
            let best = format!("Best score: {}", app.best_score);
            self.front.put_str(8, menu_base + 3, &best, Color::DarkGrey, Color::Reset);
        }

        let help = [
            "Controls",
            "  Arrows / WASD   Steer (one press turns)",
            "  F1 Pause   R Restart   ESC Title",
            "",
            "Eat every dot. A power pellet lets you eat the ghosts.",
        ];
        let help_base = menu_base + 5;
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { TITLE_FG } else { Color::White };
            self.front.put_str(8, help_base + i, line, color, Color::Reset);
        }

        // Legend: one sample of each adversary
        let legend_row = help_base + help.len() + 1;
        let mut x = 8;
        for p in [Personality::Pursuer, Personality::Ambusher, Personality::Flanker, Personality::Wanderer] {
            self.front.put_str(x, legend_row, "\"\"", Color::Black, personality_color(p));
            let name = format!(" {p:?}");
            self.front.put_str(x + 2, legend_row, &name, Color::DarkGrey, Color::Reset);
            x += name.len() + 4;
        }
    }

    /// Box centered over the maze area.
    fn compose_box(&mut self, grid: &Grid, lines: &[String], fg: Color) {
        let inner = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
        let view_cols = grid.cols() * CELL_W;
        let box_x = view_cols.saturating_sub(inner + 2) / 2;
        let box_y = MAP_ROW + grid.rows().saturating_sub(lines.len() + 2) / 2;
        let bg = Color::Rgb { r: 10, g: 10, b: 20 };

        let edge: String = "═".repeat(inner);
        self.front.put_str(box_x, box_y, &format!("╔{edge}╗"), fg, bg);
        for (i, line) in lines.iter().enumerate() {
            let pad = inner - line.chars().count();
            let body = format!("║{}{}{}║", " ".repeat(pad / 2), line, " ".repeat(pad - pad / 2));
            self.front.put_str(box_x, box_y + 1 + i, &body, fg, bg);
        }
        self.front.put_str(box_x, box_y + 1 + lines.len(), &format!("╚{edge}╝"), fg, bg);
    }

    fn compose_won(&mut self, app: &App, snap: &Snapshot) {
        let lines = [
            "★ MAZE CLEARED ★".to_string(),
            format!("Score: {}", snap.score),
            "ENTER: Title".to_string(),
        ];
        self.compose_box(app.session.grid(), &lines, Color::Rgb { r: 255, g: 220, b: 50 });
    }

    fn compose_caught(&mut self, app: &App, snap: &Snapshot) {
        let lines = [
            "✕ CAUGHT ✕".to_string(),
            format!("Score: {}", snap.score),
            "R: Retry  ESC: Title".to_string(),
        ];
        self.compose_box(app.session.grid(), &lines, Color::Rgb { r: 255, g: 60, b: 60 });
    }

    fn compose_pause_overlay(&mut self, grid: &Grid, now_ms: u64) {
        let blink = (now_ms / 500) % 2 == 0;
        let head = if blink { "▶  PAUSED  ◀" } else { "   PAUSED   " };
        let lines = [
            head.to_string(),
            String::new(),
            "F1   Resume".to_string(),
            "R    Restart".to_string(),
            "ESC  Back to Title".to_string(),
        ];
        self.compose_box(grid, &lines, Color::Rgb { r: 100, g: 200, b: 255 });
    }
}
