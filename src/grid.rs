// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The per-pane cell grid (spec §3 "Grid").
//!
//! A [`Grid`] owns two [`Buffer`]s — primary and alternate — mirroring real terminals'
//! `DECSET 1049` alt-screen behavior. Only one is visible at a time; switching between
//! them (entered on `CSI ? 1047/1049 h`, left on `l`) swaps which buffer subsequent
//! writes land in without losing the other's content, so returning to the primary
//! buffer (e.g. quitting a pager) restores exactly what was there before.

use crate::cell::{Attrs, Cell};
use crate::geometry::{Pos, Size};

/// Designated character set slot (`G0`/`G1`), selected by `SO`/`SI` (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Ascii,
    DecSpecialGraphics,
}

impl Charset {
    /// Translate a byte through this charset's mapping. DEC Special Graphics remaps
    /// the printable ASCII range to line-drawing glyphs (`j`-`~`); everything else,
    /// and `Ascii`, passes through unchanged.
    #[must_use]
    pub fn translate(self, byte: u8) -> char {
        match self {
            Charset::Ascii => byte as char,
            Charset::DecSpecialGraphics => match byte {
                b'j' => '\u{2518}', // ┘
                b'k' => '\u{2510}', // ┐
                b'l' => '\u{250C}', // ┌
                b'm' => '\u{2514}', // └
                b'n' => '\u{253C}', // ┼
                b'q' => '\u{2500}', // ─
                b't' => '\u{251C}', // ├
                b'u' => '\u{2524}', // ┤
                b'v' => '\u{2534}', // ┴
                b'w' => '\u{252C}', // ┬
                b'x' => '\u{2502}', // │
                b'a' => '\u{2592}', // ▒
                _ => byte as char,
            },
        }
    }
}

/// One screen buffer: cells, cursor, and the per-buffer state that must survive an
/// alt-screen swap independently (scroll region, tab stops, saved cursor).
#[derive(Debug, Clone)]
struct Buffer {
    size: Size,
    cells: Vec<Cell>,
    cursor: Pos,
    saved_cursor: Option<(Pos, Attrs)>,
    cur_attrs: Attrs,
    tab_stops: Vec<bool>,
    scroll_top: u16,
    scroll_bottom: u16,
    dirty: bool,
}

impl Buffer {
    fn new(size: Size) -> Self {
        let mut buf = Self {
            size,
            cells: vec![Cell::blank(); cell_count(size)],
            cursor: Pos::default(),
            saved_cursor: None,
            cur_attrs: Attrs::default(),
            tab_stops: Vec::new(),
            scroll_top: 0,
            scroll_bottom: size.rows.saturating_sub(1),
            dirty: true,
        };
        buf.reset_tab_stops();
        buf
    }

    fn reset_tab_stops(&mut self) {
        self.tab_stops = (0..self.size.cols).map(|c| c % 8 == 0).collect();
    }

    fn index_of(&self, pos: Pos) -> usize {
        pos.y as usize * self.size.cols as usize + pos.x as usize
    }

    fn resize(&mut self, new_size: Size) {
        let mut cells = vec![Cell::blank(); cell_count(new_size)];
        let copy_rows = self.size.rows.min(new_size.rows);
        let copy_cols = self.size.cols.min(new_size.cols);
        for row in 0..copy_rows {
            for col in 0..copy_cols {
                let src = row as usize * self.size.cols as usize + col as usize;
                let dst = row as usize * new_size.cols as usize + col as usize;
                cells[dst] = self.cells[src];
            }
        }
        self.cells = cells;
        self.size = new_size;
        self.cursor.x = self.cursor.x.min(new_size.cols.saturating_sub(1));
        self.cursor.y = self.cursor.y.min(new_size.rows.saturating_sub(1));
        self.scroll_top = 0;
        self.scroll_bottom = new_size.rows.saturating_sub(1);
        self.reset_tab_stops();
        self.dirty = true;
    }
}

fn cell_count(size: Size) -> usize { size.cols as usize * size.rows as usize }

/// A pane's virtual terminal screen: cursor, attributes, scroll region, charset
/// selection, tab stops, and primary/alternate cell buffers (spec §3).
#[derive(Debug, Clone)]
pub struct Grid {
    primary: Buffer,
    alternate: Buffer,
    using_alt: bool,
    charsets: [Charset; 2],
    active_charset: usize,
    pub insert_mode: bool,
    pub origin_mode: bool,
    pub autowrap_mode: bool,
    pub cursor_visible: bool,
}

impl Grid {
    /// Create a grid at `size`; both buffers start blank.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            primary: Buffer::new(size),
            alternate: Buffer::new(size),
            using_alt: false,
            charsets: [Charset::Ascii, Charset::Ascii],
            active_charset: 0,
            insert_mode: false,
            origin_mode: false,
            autowrap_mode: true,
            cursor_visible: true,
        }
    }

    #[must_use]
    pub fn size(&self) -> Size { self.active().size }

    /// Resize in place, preserving as much top-left content as fits (called on layout
    /// change; spec §3 Grid lifecycle).
    pub fn resize(&mut self, new_size: Size) {
        self.primary.resize(new_size);
        self.alternate.resize(new_size);
    }

    fn active(&self) -> &Buffer { if self.using_alt { &self.alternate } else { &self.primary } }
    fn active_mut(&mut self) -> &mut Buffer {
        if self.using_alt { &mut self.alternate } else { &mut self.primary }
    }

    #[must_use]
    pub fn cursor(&self) -> Pos { self.active().cursor }

    pub fn set_cursor(&mut self, pos: Pos) {
        let size = self.size();
        let buf = self.active_mut();
        buf.cursor.x = pos.x.min(size.cols.saturating_sub(1));
        buf.cursor.y = pos.y.min(size.rows.saturating_sub(1));
        buf.dirty = true;
    }

    #[must_use]
    pub fn current_attrs(&self) -> Attrs { self.active().cur_attrs }
    pub fn set_current_attrs(&mut self, attrs: Attrs) { self.active_mut().cur_attrs = attrs; }

    #[must_use]
    pub fn scroll_region(&self) -> (u16, u16) {
        let buf = self.active();
        (buf.scroll_top, buf.scroll_bottom)
    }

    /// `DECSTBM`: set the scroll region, clamped to the grid and requiring `top <
    /// bottom`; resets cursor to the origin.
    pub fn set_scroll_region(&mut self, top: u16, bottom: u16) {
        let rows = self.size().rows;
        let top = top.min(rows.saturating_sub(1));
        let bottom = bottom.min(rows.saturating_sub(1));
        let buf = self.active_mut();
        if top < bottom {
            buf.scroll_top = top;
            buf.scroll_bottom = bottom;
        } else {
            buf.scroll_top = 0;
            buf.scroll_bottom = rows.saturating_sub(1);
        }
        buf.cursor = Pos::default();
        buf.dirty = true;
    }

    #[must_use]
    pub fn cell(&self, pos: Pos) -> Cell {
        let buf = self.active();
        buf.cells.get(buf.index_of(pos)).copied().unwrap_or_default()
    }

    pub fn set_cell(&mut self, pos: Pos, cell: Cell) {
        let buf = self.active_mut();
        let idx = buf.index_of(pos);
        if let Some(slot) = buf.cells.get_mut(idx) {
            *slot = cell;
            buf.dirty = true;
        }
    }

    /// Write `ch` at the cursor using the current attributes and active charset,
    /// advancing the cursor and wrapping/inserting per the current modes (spec §4.1
    /// GROUND state).
    pub fn put_char(&mut self, ch: char) {
        let size = self.size();
        let wide = is_wide(ch);
        let insert = self.insert_mode;
        let autowrap = self.autowrap_mode;
        let attrs = self.current_attrs();
        let buf = self.active_mut();

        if buf.cursor.x >= size.cols {
            if autowrap {
                buf.cursor.x = 0;
                scroll_cursor_down(buf, size);
            } else {
                buf.cursor.x = size.cols - 1;
            }
        }

        if insert {
            shift_row_right(buf, size, 1);
        }

        let idx = buf.index_of(buf.cursor);
        if idx < buf.cells.len() {
            buf.cells[idx] = Cell::new(ch, attrs);
        }
        buf.cursor.x += 1;

        if wide && buf.cursor.x < size.cols {
            let idx2 = buf.index_of(buf.cursor);
            if idx2 < buf.cells.len() {
                buf.cells[idx2] = Cell::wide_continuation(attrs);
            }
            buf.cursor.x += 1;
        }
        buf.dirty = true;
    }

    /// Line feed / index (`LF`, `VT`, `FF`, `IND`): move down one row, scrolling the
    /// region if the cursor is already at `scroll_bottom`.
    pub fn index_down(&mut self) {
        let size = self.size();
        let buf = self.active_mut();
        scroll_cursor_down(buf, size);
        buf.dirty = true;
    }

    /// Reverse index (`RI`): move up one row, scrolling the region down if the cursor
    /// is already at `scroll_top`.
    pub fn reverse_index(&mut self) {
        let buf = self.active_mut();
        if buf.cursor.y == buf.scroll_top {
            scroll_region_down(buf, 1);
        } else if buf.cursor.y > 0 {
            buf.cursor.y -= 1;
        }
        buf.dirty = true;
    }

    /// `NEL`: carriage return plus line feed.
    pub fn next_line(&mut self) {
        self.carriage_return();
        self.index_down();
    }

    pub fn carriage_return(&mut self) {
        let buf = self.active_mut();
        buf.cursor.x = 0;
        buf.dirty = true;
    }

    pub fn backspace(&mut self) {
        let buf = self.active_mut();
        if buf.cursor.x > 0 {
            buf.cursor.x -= 1;
        }
    }

    /// Horizontal tab: advance to the next tab stop, or the last column.
    pub fn tab(&mut self) {
        let buf = self.active_mut();
        let cols = buf.size.cols;
        let mut x = buf.cursor.x + 1;
        while x < cols && !buf.tab_stops.get(x as usize).copied().unwrap_or(false) {
            x += 1;
        }
        buf.cursor.x = x.min(cols.saturating_sub(1));
    }

    pub fn set_tab_stop(&mut self) {
        let buf = self.active_mut();
        let x = buf.cursor.x as usize;
        if let Some(slot) = buf.tab_stops.get_mut(x) {
            *slot = true;
        }
    }

    pub fn clear_tab_stop_at_cursor(&mut self) {
        let buf = self.active_mut();
        let x = buf.cursor.x as usize;
        if let Some(slot) = buf.tab_stops.get_mut(x) {
            *slot = false;
        }
    }

    pub fn clear_all_tab_stops(&mut self) {
        let buf = self.active_mut();
        for slot in &mut buf.tab_stops {
            *slot = false;
        }
    }

    /// `CSI Ps ; Ps r` et al. delegate region scrolling here (`SU`/`SD`).
    pub fn scroll_up(&mut self, n: u16) {
        let buf = self.active_mut();
        scroll_region_up(buf, n);
        buf.dirty = true;
    }

    pub fn scroll_down(&mut self, n: u16) {
        let buf = self.active_mut();
        scroll_region_down(buf, n);
        buf.dirty = true;
    }

    /// `IL`: insert `n` blank lines at the cursor row, within the scroll region.
    pub fn insert_lines(&mut self, n: u16) {
        let buf = self.active_mut();
        let saved_top = buf.scroll_top;
        buf.scroll_top = buf.cursor.y;
        scroll_region_down(buf, n);
        buf.scroll_top = saved_top;
        buf.dirty = true;
    }

    /// `DL`: delete `n` lines at the cursor row, within the scroll region.
    pub fn delete_lines(&mut self, n: u16) {
        let buf = self.active_mut();
        let saved_top = buf.scroll_top;
        buf.scroll_top = buf.cursor.y;
        scroll_region_up(buf, n);
        buf.scroll_top = saved_top;
        buf.dirty = true;
    }

    /// `ICH`: insert `n` blank cells at the cursor, shifting the rest of the row right.
    pub fn insert_chars(&mut self, n: u16) {
        let size = self.size();
        let buf = self.active_mut();
        shift_row_right(buf, size, n);
        buf.dirty = true;
    }

    /// `DCH`: delete `n` cells at the cursor, shifting the rest of the row left.
    pub fn delete_chars(&mut self, n: u16) {
        let size = self.size();
        let buf = self.active_mut();
        let row = buf.cursor.y;
        let start = buf.cursor.x as usize;
        let row_start = row as usize * size.cols as usize;
        let row_end = row_start + size.cols as usize;
        let row_cells = &mut buf.cells[row_start..row_end];
        let n = n as usize;
        row_cells.copy_within(start.saturating_add(n).min(row_cells.len())..,
            start.min(row_cells.len()));
        let blank_from = row_cells.len().saturating_sub(n.min(row_cells.len()));
        for cell in &mut row_cells[blank_from.max(start)..] {
            *cell = Cell::blank();
        }
        buf.dirty = true;
    }

    /// `EL`: erase in line. `mode`: 0 = cursor..end, 1 = start..=cursor, 2 = whole line.
    pub fn erase_line(&mut self, mode: u16) {
        let size = self.size();
        let buf = self.active_mut();
        let row = buf.cursor.y as usize;
        let row_start = row * size.cols as usize;
        let (from, to) = match mode {
            1 => (row_start, row_start + buf.cursor.x as usize + 1),
            2 => (row_start, row_start + size.cols as usize),
            _ => (row_start + buf.cursor.x as usize, row_start + size.cols as usize),
        };
        for cell in &mut buf.cells[from.min(buf.cells.len())..to.min(buf.cells.len())] {
            *cell = Cell::blank();
        }
        buf.dirty = true;
    }

    /// `ED`: erase in display. `mode`: 0 = cursor..end, 1 = start..=cursor, 2 = whole
    /// screen.
    pub fn erase_display(&mut self, mode: u16) {
        let size = self.size();
        let buf = self.active_mut();
        let cursor_idx = buf.index_of(buf.cursor);
        let (from, to) = match mode {
            1 => (0, cursor_idx + 1),
            2 => (0, buf.cells.len()),
            _ => (cursor_idx, buf.cells.len()),
        };
        for cell in &mut buf.cells[from.min(buf.cells.len())..to.min(buf.cells.len())] {
            *cell = Cell::blank();
        }
        let _ = size;
        buf.dirty = true;
    }

    pub fn save_cursor(&mut self) {
        let attrs = self.current_attrs();
        let buf = self.active_mut();
        buf.saved_cursor = Some((buf.cursor, attrs));
    }

    pub fn restore_cursor(&mut self) {
        let buf = self.active_mut();
        if let Some((pos, attrs)) = buf.saved_cursor {
            buf.cursor = pos;
            buf.cur_attrs = attrs;
            buf.dirty = true;
        }
    }

    pub fn select_charset(&mut self, slot: usize, charset: Charset) {
        if let Some(s) = self.charsets.get_mut(slot) {
            *s = charset;
        }
    }

    pub fn shift_out(&mut self) { self.active_charset = 1; }
    pub fn shift_in(&mut self) { self.active_charset = 0; }

    #[must_use]
    pub fn translate(&self, byte: u8) -> char {
        self.charsets[self.active_charset].translate(byte)
    }

    /// `RIS`: full reset (ECMA-48 "reset to initial state").
    pub fn full_reset(&mut self) {
        let size = self.size();
        self.primary = Buffer::new(size);
        self.alternate = Buffer::new(size);
        self.using_alt = false;
        self.charsets = [Charset::Ascii, Charset::Ascii];
        self.active_charset = 0;
        self.insert_mode = false;
        self.origin_mode = false;
        self.autowrap_mode = true;
        self.cursor_visible = true;
    }

    /// `DECSET`/`DECRST 1047`/`1049`: switch to the alternate screen buffer. `1049`
    /// additionally clears the alternate buffer and saves the cursor (xterm
    /// semantics); `1047` preserves prior alt-buffer content.
    pub fn enter_alt_screen(&mut self, clear: bool) {
        if !self.using_alt {
            self.save_cursor();
            self.using_alt = true;
            if clear {
                let size = self.alternate.size;
                self.alternate = Buffer::new(size);
            }
        }
    }

    /// Leave the alternate screen, returning to primary content and cursor.
    pub fn exit_alt_screen(&mut self) {
        if self.using_alt {
            self.using_alt = false;
            self.restore_cursor();
        }
    }

    #[must_use]
    pub fn is_alt_screen(&self) -> bool { self.using_alt }

    /// Dirty-tracking for the redraw scheduler (spec §4.1/§4.7): true if the active
    /// buffer changed since the last [`Self::take_dirty`].
    #[must_use]
    pub fn is_dirty(&self) -> bool { self.active().dirty }

    pub fn take_dirty(&mut self) -> bool { std::mem::replace(&mut self.active_mut().dirty, false) }
}

fn is_wide(ch: char) -> bool {
    // A coarse East-Asian-Wide approximation; exhaustive width tables are out of
    // scope (spec §1 non-goals list configuration-file parsing but not a full Unicode
    // width database either — this mirrors common terminal emulator shortcuts).
    let c = ch as u32;
    (0x1100..=0x115F).contains(&c)
        || (0x2E80..=0xA4CF).contains(&c)
        || (0xAC00..=0xD7A3).contains(&c)
        || (0xF900..=0xFAFF).contains(&c)
        || (0xFF00..=0xFF60).contains(&c)
        || (0x20000..=0x3FFFD).contains(&c)
}

fn scroll_cursor_down(buf: &mut Buffer, size: Size) {
    if buf.cursor.y == buf.scroll_bottom {
        scroll_region_up(buf, 1);
    } else if buf.cursor.y + 1 < size.rows {
        buf.cursor.y += 1;
    }
}

fn scroll_region_up(buf: &mut Buffer, n: u16) {
    let cols = buf.size.cols as usize;
    let top = buf.scroll_top as usize;
    let bottom = buf.scroll_bottom as usize;
    let region_rows = bottom - top + 1;
    let n = (n as usize).min(region_rows);
    if n == 0 {
        return;
    }
    let region_start = top * cols;
    let region_end = (bottom + 1) * cols;
    buf.cells.copy_within(region_start + n * cols..region_end, region_start);
    for cell in &mut buf.cells[region_end - n * cols..region_end] {
        *cell = Cell::blank();
    }
}

fn scroll_region_down(buf: &mut Buffer, n: u16) {
    let cols = buf.size.cols as usize;
    let top = buf.scroll_top as usize;
    let bottom = buf.scroll_bottom as usize;
    let region_rows = bottom - top + 1;
    let n = (n as usize).min(region_rows);
    if n == 0 {
        return;
    }
    let region_start = top * cols;
    let region_end = (bottom + 1) * cols;
    buf.cells.copy_within(region_start..region_end - n * cols, region_start + n * cols);
    for cell in &mut buf.cells[region_start..region_start + n * cols] {
        *cell = Cell::blank();
    }
}

fn shift_row_right(buf: &mut Buffer, size: Size, n: u16) {
    let row = buf.cursor.y as usize;
    let row_start = row * size.cols as usize;
    let row_end = row_start + size.cols as usize;
    let start = row_start + buf.cursor.x as usize;
    let row_cells = &mut buf.cells[row_start..row_end];
    let local_start = (start - row_start).min(row_cells.len());
    // Clamp so a param larger than the remaining row width just blanks the rest of
    // the row instead of under/overflowing the copy_within range.
    let n = (n as usize).min(row_cells.len() - local_start);
    row_cells.copy_within(local_start..row_cells.len() - n, local_start + n);
    for cell in &mut row_cells[local_start..local_start + n] {
        *cell = Cell::blank();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_char_advances_cursor() {
        let mut grid = Grid::new(Size::new(10, 5));
        grid.put_char('a');
        assert_eq!(grid.cursor(), Pos::new(1, 0));
        assert_eq!(grid.cell(Pos::new(0, 0)).ch(), 'a');
    }

    #[test]
    fn autowrap_moves_to_next_line() {
        let mut grid = Grid::new(Size::new(3, 3));
        grid.put_char('a');
        grid.put_char('b');
        grid.put_char('c');
        grid.put_char('d');
        assert_eq!(grid.cursor(), Pos::new(1, 1));
        assert_eq!(grid.cell(Pos::new(0, 1)).ch(), 'd');
    }

    #[test]
    fn line_feed_at_bottom_scrolls_region() {
        let mut grid = Grid::new(Size::new(3, 3));
        grid.set_cursor(Pos::new(0, 0));
        grid.put_char('a');
        grid.set_cursor(Pos::new(0, 2));
        grid.index_down();
        grid.index_down();
        assert_eq!(grid.cell(Pos::new(0, 0)).ch(), ' ');
    }

    #[test]
    fn scroll_region_confines_scrolling() {
        let mut grid = Grid::new(Size::new(3, 5));
        grid.set_scroll_region(1, 3);
        grid.set_cursor(Pos::new(0, 0));
        grid.put_char('x');
        grid.set_cursor(Pos::new(0, 3));
        grid.index_down();
        // Row 0 (outside the region) must be untouched by the scroll.
        assert_eq!(grid.cell(Pos::new(0, 0)).ch(), 'x');
    }

    #[test]
    fn alt_screen_preserves_primary_content() {
        let mut grid = Grid::new(Size::new(5, 5));
        grid.put_char('p');
        grid.enter_alt_screen(true);
        grid.put_char('a');
        grid.exit_alt_screen();
        assert_eq!(grid.cell(Pos::new(0, 0)).ch(), 'p');
    }

    #[test]
    fn resize_preserves_top_left_content() {
        let mut grid = Grid::new(Size::new(5, 5));
        grid.put_char('z');
        grid.resize(Size::new(10, 10));
        assert_eq!(grid.cell(Pos::new(0, 0)).ch(), 'z');
        assert_eq!(grid.size(), Size::new(10, 10));
    }

    #[test]
    fn tab_stops_every_8_columns_by_default() {
        let mut grid = Grid::new(Size::new(20, 3));
        grid.tab();
        assert_eq!(grid.cursor().x, 8);
        grid.tab();
        assert_eq!(grid.cursor().x, 16);
    }

    #[test]
    fn dirty_flag_clears_on_take() {
        let mut grid = Grid::new(Size::new(5, 5));
        assert!(grid.is_dirty());
        grid.take_dirty();
        assert!(!grid.is_dirty());
        grid.put_char('x');
        assert!(grid.is_dirty());
    }

    #[test]
    fn dec_special_graphics_translates_line_drawing() {
        assert_eq!(Charset::DecSpecialGraphics.translate(b'q'), '\u{2500}');
        assert_eq!(Charset::Ascii.translate(b'q'), 'q');
    }
}
