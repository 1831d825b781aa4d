/// Terminal renderer: double-buffered, diff-based.
///
/// Each frame is composed into `front`, compared cell by cell with `back`
/// (the previous frame), and only changed cells are written. Commands are
/// batched with `queue!` and flushed once, then the buffers swap.
///
/// Screen layout (terminal rows):
///   0        HUD: room name, persisted catch totals
///   2..22    the room, one grid cell = two terminal columns
///   23       message bar
///   25       help bar
/// The active quest list sits to the right of the room. An open dialogue
/// box is drawn over the bottom of the room.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::dialogue::DialogueState;
use crate::domain::grid::{Direction, GridCell, GRID_HEIGHT, GRID_WIDTH, TILE_SIZE};
use crate::domain::room::{DoorKind, RoomId};
use crate::domain::species::Species;
use crate::sim::world::GameSession;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 8],
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool, // occupies 2 terminal columns
    cont: bool, // right half of a wide char (skip render)
}

impl Cell {
    /// Explicit background for every cell, and for Clear. Matching them
    /// avoids visible gaps between rows on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 8],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Differs from every real cell, so the next flush repaints everything.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::from_char(c, fg, bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
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

    /// Write a string at (x, y), one column per char, clipped at the edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, x0: usize, x1: usize, y: usize, bg: Color) {
        for x in x0..x1.min(self.width) {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }

    /// One grid cell: either a wide glyph or two narrow ones.
    fn put_tile(&mut self, col: usize, row: usize, tile: Tile) {
        match tile {
            Tile::Wide(c, bg) => {
                if col + 1 >= self.width {
                    return;
                }
                self.set(col, row, Cell::from_char_wide(c, Color::White, bg));
                let mut cont = Cell::WIDE_CONT;
                cont.bg = Cell::norm_bg(bg);
                self.set(col + 1, row, cont);
            }
            Tile::Pair(a, b, fg, bg) => {
                self.set(col, row, Cell::from_char(a, fg, bg));
                self.set(col + 1, row, Cell::from_char(b, fg, bg));
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Tile {
    Wide(char, Color),
    Pair(char, char, Color, Color),
}

// ── Palette ──

const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MSG_ROW: usize = MAP_ROW + GRID_HEIGHT + 1;
const HELP_ROW: usize = MSG_ROW + 2;
const PANEL_COL: usize = GRID_WIDTH * CELL_W + 2;

const DIALOGUE_ROWS: usize = 7;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const WALL_BG: Color = Color::Rgb { r: 70, g: 70, b: 90 };
const BOX_BG: Color = Color::Rgb { r: 245, g: 240, b: 225 };

fn room_floor(room: RoomId) -> Color {
    match room {
        RoomId::Basement => Color::Rgb { r: 45, g: 40, b: 38 },
        RoomId::MainHall => Color::Rgb { r: 62, g: 52, b: 40 },
        RoomId::Classroom => Color::Rgb { r: 40, g: 55, b: 48 },
    }
}

/// Glyph and color for each door kind.
const DOOR_STYLE: [(DoorKind, char, char, Color); 3] = [
    (DoorKind::StairsUp, '▲', '▲', Color::Rgb { r: 120, g: 200, b: 255 }),
    (DoorKind::StairsDown, '▼', '▼', Color::Rgb { r: 255, g: 160, b: 90 }),
    (DoorKind::Plain, '▐', '▌', Color::Rgb { r: 170, g: 120, b: 60 }),
];

fn door_tile(kind: DoorKind, floor: Color) -> Tile {
    let (_, a, b, fg) = DOOR_STYLE
        .iter()
        .copied()
        .find(|(k, ..)| *k == kind)
        .unwrap_or(DOOR_STYLE[2]);
    Tile::Pair(a, b, fg, floor)
}

const NPC_GLYPH: char = '🧑';

fn species_glyph(species: Species) -> char {
    match species {
        Species::Bear => '🐻',
        Species::Raccoon => '🦝',
        Species::Deer => '🦌',
        Species::BigDeer => '🫎',
    }
}

fn player_tile(facing: Direction) -> Tile {
    let fg = Color::Rgb { r: 255, g: 230, b: 80 };
    let bg = Color::Rgb { r: 40, g: 90, b: 160 };
    match facing {
        Direction::Up => Tile::Pair('◓', '▴', fg, bg),
        Direction::Down => Tile::Pair('◒', '▾', fg, bg),
        Direction::Left => Tile::Pair('◂', '◑', fg, bg),
        Direction::Right => Tile::Pair('◐', '▸', fg, bg),
    }
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            lines.push(word.drain(..width).collect());
        }
        let line_len = line.chars().count();
        if !line.is_empty() && line_len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_room: Option<RoomId>,
    keyboard_enhanced: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_room: None,
            keyboard_enhanced: false,
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

        // Release events let held keys end exactly instead of by timeout.
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.keyboard_enhanced = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    /// True once the terminal reports key Release events.
    pub fn keyboard_enhanced(&self) -> bool {
        self.keyboard_enhanced
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.keyboard_enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
            self.keyboard_enhanced = false;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, s: &GameSession) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.invalidate()?;
        }

        // Full repaint on room change
        let room = s.world.current_room_id();
        if self.last_room != Some(room) {
            self.invalidate()?;
            self.last_room = Some(room);
        }

        self.compose(s);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn invalidate(&mut self) -> io::Result<()> {
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev {
                        need_move = true;
                    }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
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
                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, s: &GameSession) {
        self.front.clear();
        self.compose_hud(s);
        self.compose_room(s);
        self.compose_quests(s);
        if s.dialogue.is_active() {
            self.compose_dialogue(s);
        }

        if !s.message.is_empty() {
            self.front.fill_row(0, GRID_WIDTH * CELL_W, MSG_ROW, MSG_BG);
            self.front.put_str(0, MSG_ROW, &format!(" ◈ {} ", s.message), Color::Black, MSG_BG);
        }

        let help = " Arrows/WASD:Walk  Space:Catch  T/Enter:Talk  R:Reset totals  Esc:Quit";
        self.front.put_str(0, HELP_ROW, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_hud(&mut self, s: &GameSession) {
        let counts = &s.save.state.counts;
        let mut hud = format!(" {:<11}", s.world.current_room().name);
        for (species, n) in counts.iter() {
            hud.push_str(&format!(" {} {:<3}", species_glyph(species), n));
        }
        hud.push_str(&format!(" Total {}", counts.total()));

        self.front.fill_row(0, self.front.width, HUD_ROW, HUD_BG);
        // Emoji take two columns; write char by char so they line up.
        let mut col = 0;
        for ch in hud.chars() {
            if Species::ALL.iter().any(|&sp| species_glyph(sp) == ch) {
                self.front.put_tile(col, HUD_ROW, Tile::Wide(ch, HUD_BG));
                col += 2;
            } else {
                self.front.set(col, HUD_ROW, Cell::from_char(ch, Color::White, HUD_BG));
                col += 1;
            }
        }
    }

    fn compose_room(&mut self, s: &GameSession) {
        let room = s.world.current_room();
        let floor = room_floor(room.id);

        for gy in 0..GRID_HEIGHT as i32 {
            for gx in 0..GRID_WIDTH as i32 {
                let cell = GridCell::new(gx, gy);
                let tile = if room.obstacle_at(cell) {
                    Tile::Pair('▓', '▓', WALL_BG, floor)
                } else if let Some(door) = room.door_at(cell) {
                    door_tile(door.kind, floor)
                } else {
                    Tile::Pair(' ', ' ', Color::White, floor)
                };
                self.put_grid(cell, tile);
            }
        }

        for c in s.creatures.creatures_in(room.id) {
            self.put_grid(c.cell, Tile::Wide(species_glyph(c.species), floor));
        }
        for npc in room.npcs.iter().filter(|n| !n.caught) {
            self.put_grid(npc.cell, Tile::Wide(NPC_GLYPH, floor));
        }

        // The player glides between cells; snap the pixel position to the nearest one.
        let px = (s.player.render_x / TILE_SIZE).round() as i32;
        let py = (s.player.render_y / TILE_SIZE).round() as i32;
        self.put_grid(GridCell::new(px, py), player_tile(s.player.facing));
    }

    fn put_grid(&mut self, cell: GridCell, tile: Tile) {
        if cell.in_bounds() {
            self.front.put_tile(cell.x as usize * CELL_W, MAP_ROW + cell.y as usize, tile);
        }
    }

    fn compose_quests(&mut self, s: &GameSession) {
        let fg = Color::Rgb { r: 200, g: 200, b: 220 };
        self.front.put_str(PANEL_COL, MAP_ROW, "Quests", Color::White, Color::Reset);

        let mut row = MAP_ROW + 2;
        let mut any = false;
        for q in s.quests.active() {
            any = true;
            self.front.put_str(PANEL_COL, row, &q.npc_name, fg, Color::Reset);
            let (line, color) = if q.is_completed {
                (format!("  {} ✔ return", q.progress_line()), Color::Green)
            } else {
                (format!("  {}", q.progress_line()), fg)
            };
            self.front.put_str(PANEL_COL, row + 1, &line, color, Color::Reset);
            row += 3;
        }
        if !any {
            self.front.put_str(PANEL_COL, row, "(talk to someone)", Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_dialogue(&mut self, s: &GameSession) {
        let width = GRID_WIDTH * CELL_W;
        let top = MAP_ROW + GRID_HEIGHT - DIALOGUE_ROWS;
        for r in top..top + DIALOGUE_ROWS {
            self.front.fill_row(0, width, r, BOX_BG);
        }

        let d = &s.dialogue;
        let portrait = std::path::Path::new(d.portrait())
            .file_stem()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let header = format!(" {}  [{}]", d.speaker(), portrait);
        self.front.put_str(1, top, &header, Color::Rgb { r: 90, g: 40, b: 20 }, BOX_BG);

        let text_rows = DIALOGUE_ROWS - 2;
        for (i, line) in wrap(&d.revealed_text(), width - 4).iter().take(text_rows).enumerate() {
            self.front.put_str(2, top + 1 + i, line, Color::Black, BOX_BG);
        }

        if d.state() == DialogueState::WaitingClose {
            let blink = (s.frame / 10) % 2 == 0;
            let prompt = if blink { "▼ Enter" } else { "  Enter" };
            self.front.put_str(width - 9, top + DIALOGUE_ROWS - 1, prompt, Color::DarkGrey, BOX_BG);
        }
    }
}
