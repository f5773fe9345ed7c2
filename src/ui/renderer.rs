/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// The scene is drawn top-down: world X runs across the screen, world Z
/// down it, centered on the camera's ground focus, so the view eases after
/// the player instead of being pinned to it. Height is ignored
/// except that every wall is drawn regardless of how tall it is.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use maze3d::domain::collision::Aabb;
use maze3d::domain::math::Vec3;
use maze3d::sim::session::{RoundResult, SessionState};
use maze3d::sim::view::{FrameView, SceneLayout};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for all "empty" terminal cells, so cleared
    /// areas and drawn areas match exactly.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from any real cell, so every position gets diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

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

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Projection ──

/// World units per terminal column. Rows are one unit tall; terminal
/// cells are about twice as tall as wide, so this keeps squares square.
const UNITS_PER_COL: f32 = 0.5;
const UNITS_PER_ROW: f32 = 1.0;

/// Maps terminal cells of the map area to world XZ around a center.
#[derive(Clone, Copy, Debug)]
struct Viewport {
    center_x: f32,
    center_z: f32,
    cols: usize,
    rows: usize,
}

impl Viewport {
    /// Map area of a `term_w`×`term_h` terminal, centered on the camera focus.
    fn for_frame(frame: &FrameView<'_>, term_w: usize, term_h: usize) -> Self {
        Viewport {
            center_x: frame.camera.focus.x,
            center_z: frame.camera.focus.z,
            cols: term_w,
            rows: term_h.saturating_sub(RESERVED_ROWS).max(1),
        }
    }

    /// World XZ at the middle of terminal cell (col, row).
    fn world_at(&self, col: usize, row: usize) -> (f32, f32) {
        let x = self.center_x + (col as f32 + 0.5 - self.cols as f32 / 2.0) * UNITS_PER_COL;
        let z = self.center_z + (row as f32 + 0.5 - self.rows as f32 / 2.0) * UNITS_PER_ROW;
        (x, z)
    }

    /// Terminal cell containing world point (x, z), if on screen.
    fn cell_of(&self, x: f32, z: f32) -> Option<(usize, usize)> {
        let col = ((x - self.center_x) / UNITS_PER_COL + self.cols as f32 / 2.0).floor();
        let row = ((z - self.center_z) / UNITS_PER_ROW + self.rows as f32 / 2.0).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        (col < self.cols && row < self.rows).then_some((col, row))
    }
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD + gap above the map, banner + gap + help below it.
const RESERVED_ROWS: usize = MAP_ROW + 3;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const WALL_FG: Color = Color::Rgb { r: 150, g: 150, b: 170 };
const WALL_BG: Color = Color::Rgb { r: 60, g: 60, b: 80 };
const GOAL_FG: Color = Color::Rgb { r: 80, g: 220, b: 120 };
const PLAYER_FG: Color = Color::Rgb { r: 90, g: 160, b: 255 };
const PLAYER_BG: Color = Color::Rgb { r: 30, g: 50, b: 90 };
const SPARK_FG: Color = Color::Rgb { r: 255, g: 210, b: 80 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_state: Option<SessionState>,
    /// Wall boxes, cached once per layout.
    walls: Vec<Aabb>,
    /// Raw mode and alternate screen are on.
    active: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_state: None,
            walls: Vec::new(),
            active: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        self.active = true;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Cache the static scene. Call once after the session is built.
    pub fn load_layout(&mut self, layout: &SceneLayout<'_>) {
        self.walls = layout.walls.iter().map(|w| w.aabb()).collect();
    }

    pub fn render(
        &mut self,
        maze: &str,
        layout: &SceneLayout<'_>,
        frame: &FrameView<'_>,
        pad_connected: bool,
    ) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Clean repaint on state change
        if self.last_state != Some(frame.state) {
            self.back.cells.fill(Cell::INVALID);
            self.last_state = Some(frame.state);
        }

        self.front.clear();
        self.compose_hud(maze, frame, pad_connected);
        let view = self.compose_map(layout, frame);
        self.compose_footer(view.rows, frame);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

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

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, maze: &str, frame: &FrameView<'_>, pad_connected: bool) {
        let hud = hud_line(maze, frame, pad_connected);
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_map(&mut self, layout: &SceneLayout<'_>, frame: &FrameView<'_>) -> Viewport {
        let view = Viewport::for_frame(frame, self.term_w, self.term_h);

        let goal = layout.goal;
        for row in 0..view.rows {
            for col in 0..view.cols {
                let (x, z) = view.world_at(col, row);
                let cell = if self.walls.iter().any(|b| b.covers_xz(x, z)) {
                    Cell::new('#', WALL_FG, WALL_BG)
                } else if planar_distance(goal.position, x, z) < goal.radius {
                    Cell::new('o', GOAL_FG, Color::Reset)
                } else if planar_distance(layout.start, x, z) < 0.5 {
                    Cell::new('.', Color::DarkGrey, Color::Reset)
                } else {
                    continue;
                };
                self.front.set(col, MAP_ROW + row, cell);
            }
        }

        if let Some((col, row)) = view.cell_of(goal.position.x, goal.position.z) {
            self.front.set(col, MAP_ROW + row, Cell::new('O', GOAL_FG, Color::Reset));
        }

        // Player footprint, then its center glyph on top.
        let body = Aabb::from_center_extents(frame.player, layout.player_extent);
        let player_fg = match frame.result {
            Some(RoundResult::Lost) => Color::Red,
            Some(RoundResult::Won) => GOAL_FG,
            None => PLAYER_FG,
        };
        for row in 0..view.rows {
            for col in 0..view.cols {
                let (x, z) = view.world_at(col, row);
                if body.covers_xz(x, z) {
                    self.front.set(col, MAP_ROW + row, Cell::new(' ', player_fg, PLAYER_BG));
                }
            }
        }
        if let Some((col, row)) = view.cell_of(frame.player.x, frame.player.z) {
            self.front.set(col, MAP_ROW + row, Cell::new('@', player_fg, PLAYER_BG));
        }

        // Particles: brighter the higher they are.
        for p in frame.particles {
            if let Some((col, row)) = view.cell_of(p.x, p.z) {
                let glyph = if p.y > 1.5 { '*' } else if p.y > 0.75 { '+' } else { '.' };
                self.front.set(col, MAP_ROW + row, Cell::new(glyph, SPARK_FG, Color::Reset));
            }
        }

        view
    }

    fn compose_footer(&mut self, map_rows: usize, frame: &FrameView<'_>) {
        let banner_row = MAP_ROW + map_rows;
        if let Some(text) = frame.banner() {
            let (fg, bg) = match frame.result {
                Some(RoundResult::Won) => (Color::Black, Color::Rgb { r: 80, g: 200, b: 110 }),
                _ => (Color::White, Color::Rgb { r: 170, g: 40, b: 40 }),
            };
            self.front.fill_row(banner_row, bg);
            let msg = format!("  {}  ", text.to_uppercase());
            let x = self.term_w.saturating_sub(msg.len()) / 2;
            self.front.put_str(x, banner_row, &msg, fg, bg);
        }

        let help_row = banner_row + 2;
        let help = match frame.state {
            SessionState::Idle => " Enter/Space:Start  Esc/Q:Quit  |  Pad: Start/A",
            SessionState::Playing => " Arrows/WASD:Move  Esc/Q:Quit  |  Pad: D-pad/Stick",
            SessionState::Won | SessionState::Lost => " R:Reset now  Esc/Q:Quit  |  Pad: Start/Y",
        };
        self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
    }
}

// Restores the terminal when the loop unwinds before `cleanup` runs.
impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn hud_line(maze: &str, frame: &FrameView<'_>, pad_connected: bool) -> String {
    let p = frame.player;
    format!(
        " Maze: {:<12} Round {:<4} {:<8} pos ({:6.2}, {:6.2})  Pad: {} ",
        maze,
        frame.round + 1,
        frame.state.to_string(),
        p.x,
        p.z,
        if pad_connected { "on" } else { "--" },
    )
}

fn planar_distance(p: Vec3, x: f32, z: f32) -> f32 {
    ((p.x - x).powi(2) + (p.z - z).powi(2)).sqrt()
}
