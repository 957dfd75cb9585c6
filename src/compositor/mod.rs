// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The frame compositor (spec §4.6): merges every pane's grid into one framebuffer,
//! draws junction-aware borders between them, overlays clock-mode/identify glyphs,
//! reserves the status bar row, and diffs against the previous frame before emitting
//! to the host.
//!
//! Grounded on `pty_mux::output_renderer::OutputRenderer`: that type also separates
//! "build the next frame" from "paint it", and only ever repaints what changed
//! (`render()`'s `ProcessOutput::Active` vs `ProcessOutput::ProcessSwitch` split). This
//! mux always shows every pane at once, so there is no "process switch" case — every
//! frame is a from-scratch composite, diffed cell-by-cell against the last one emitted.

pub mod glyphs;

use crate::cell::{Attrs, Cell, Rgb4};
use crate::config::MuxConfig;
use crate::geometry::{Pos, Rect, Size};
use crate::host::HostTerminal;
use crate::layout::tree::Orientation;
use crate::vt::sgr;
use crate::window::Window;
use std::io;

/// One composed frame: every cell the host should be showing, plus where the cursor
/// belongs (the active pane's cursor, translated into frame coordinates).
#[derive(Debug, Clone)]
pub struct Framebuffer {
    size: Size,
    cells: Vec<Cell>,
    pub cursor: Option<Pos>,
    pub cursor_visible: bool,
}

impl Framebuffer {
    fn blank(size: Size) -> Self {
        Self { size, cells: vec![Cell::blank(); size.cols as usize * size.rows as usize], cursor: None, cursor_visible: true }
    }

    #[must_use]
    pub fn size(&self) -> Size { self.size }

    #[must_use]
    pub fn cell(&self, pos: Pos) -> Cell {
        self.cells.get(self.index_of(pos)).copied().unwrap_or_default()
    }

    fn set_cell(&mut self, pos: Pos, cell: Cell) {
        let idx = self.index_of(pos);
        if let Some(slot) = self.cells.get_mut(idx) {
            *slot = cell;
        }
    }

    fn index_of(&self, pos: Pos) -> usize { pos.y as usize * self.size.cols as usize + pos.x as usize }

    fn fill(&mut self, rect: Rect, cell: Cell) {
        for y in rect.top..rect.top + rect.height {
            for x in rect.left..rect.left + rect.width {
                self.set_cell(Pos::new(x, y), cell);
            }
        }
    }
}

const STATUS_BG: Rgb4 = Rgb4 { r: 0x0, g: 0x0, b: 0x8 };
const STATUS_FG: Rgb4 = Rgb4 { r: 0xF, g: 0xF, b: 0xF };

/// Compose a window's panes, borders, and status bar into one [`Framebuffer`]
/// (spec §4.6). `identify` overlays each pane's id, for the duration of
/// `display-panes` (§4.5).
#[must_use]
pub fn compose(window: &Window, config: &MuxConfig, identify: bool) -> Framebuffer {
    let root = window.layout.root();
    let content_size = window.layout.size(root);
    let total = Size::new(content_size.cols, content_size.rows + config.status_bar_height);
    let mut fb = Framebuffer::blank(total);

    for leaf in window.layout.leaves() {
        let Some(pane_id) = window.layout.pane_id(leaf) else { continue };
        let Some(pane) = window.pane(pane_id) else { continue };
        let offset = window.layout.offset(leaf);
        let size = window.layout.size(leaf);
        let rect = Rect::new(offset.x, offset.y, size.cols, size.rows);

        if pane.clock_mode {
            render_clock(&mut fb, rect);
        } else {
            copy_pane(&mut fb, pane, rect);
        }

        if identify && size.cols >= 5 && size.rows >= 5 {
            overlay_identify(&mut fb, rect, pane_id);
        }

        if pane_id == window.active_pane_id() && !pane.clock_mode {
            let cursor = pane.grid.cursor();
            fb.cursor = Some(Pos::new(offset.x + cursor.x, offset.y + cursor.y));
            fb.cursor_visible = pane.grid.cursor_visible;
        }
    }

    draw_borders(&mut fb, window, root);
    draw_status_bar(&mut fb, content_size.rows, total.cols);
    fb
}

fn copy_pane(fb: &mut Framebuffer, pane: &crate::pane::Pane, rect: Rect) {
    for row in 0..rect.height {
        for col in 0..rect.width {
            let cell = pane.grid.cell(Pos::new(col, row));
            fb.set_cell(Pos::new(rect.left + col, rect.top + row), cell);
        }
    }
}

fn render_clock(fb: &mut Framebuffer, rect: Rect) {
    fb.fill(rect, Cell::blank());
    if rect.width < 11 || rect.height < 7 {
        return;
    }
    let text = current_time_hhmm();
    let rows = glyphs::render_big_text(&text);
    let start_y = rect.top + (rect.height.saturating_sub(5)) / 2;
    for (i, row) in rows.iter().enumerate() {
        let start_x = rect.left + (rect.width.saturating_sub(row.chars().count() as u16)) / 2;
        for (col, ch) in row.chars().enumerate() {
            let pos = Pos::new(start_x + col as u16, start_y + i as u16);
            if pos.x < rect.left + rect.width && pos.y < rect.top + rect.height {
                fb.set_cell(pos, Cell::new(ch, Attrs::default()));
            }
        }
    }
}

fn current_time_hhmm() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let day_secs = secs % 86_400;
    format!("{:02}:{:02}", day_secs / 3600, (day_secs % 3600) / 60)
}

fn overlay_identify(fb: &mut Framebuffer, rect: Rect, pane_id: u32) {
    let text = pane_id.to_string();
    let rows = glyphs::render_big_text(&text);
    let height = 5.min(rect.height);
    let start_y = rect.top + (rect.height.saturating_sub(height)) / 2;
    let attrs = Attrs { inverse: true, ..Attrs::default() };
    for (i, row) in rows.iter().take(height as usize).enumerate() {
        let start_x = rect.left + (rect.width.saturating_sub(row.chars().count() as u16)) / 2;
        for (col, ch) in row.chars().enumerate() {
            let pos = Pos::new(start_x + col as u16, start_y + i as u16);
            if pos.x < rect.left + rect.width && pos.y < rect.top + rect.height {
                fb.set_cell(pos, Cell::new(ch, attrs));
            }
        }
    }
}

const UP: u8 = 1;
const DOWN: u8 = 2;
const LEFT: u8 = 4;
const RIGHT: u8 = 8;

fn junction_glyph(mask: u8) -> char {
    match mask {
        0 => ' ',
        UP | DOWN => '\u{2502}',          // │
        m if m == UP || m == DOWN => '\u{2502}',
        LEFT | RIGHT => '\u{2500}',       // ─
        m if m == LEFT || m == RIGHT => '\u{2500}',
        m if m == (UP | LEFT) => '\u{2518}',           // ┘
        m if m == (UP | RIGHT) => '\u{2514}',          // └
        m if m == (DOWN | LEFT) => '\u{2510}',         // ┐
        m if m == (DOWN | RIGHT) => '\u{250C}',        // ┌
        m if m == (UP | DOWN | LEFT) => '\u{2524}',    // ┤
        m if m == (UP | DOWN | RIGHT) => '\u{251C}',   // ├
        m if m == (UP | LEFT | RIGHT) => '\u{2534}',   // ┴
        m if m == (DOWN | LEFT | RIGHT) => '\u{252C}', // ┬
        _ => '\u{253C}',                  // ┼ (all four)
    }
}

/// Walk the layout tree's split nodes, drawing one-cell separators between adjacent
/// children; overlapping separators accumulate into a direction bitmask per cell so
/// the final glyph chosen is the correct box-drawing junction (spec §4.6).
fn draw_borders(fb: &mut Framebuffer, window: &Window, root: crate::layout::tree::NodeId) {
    let mut masks = vec![0u8; fb.size.cols as usize * fb.size.rows as usize];
    collect_borders(window, root, &mut masks, fb.size);
    for y in 0..fb.size.rows {
        for x in 0..fb.size.cols {
            let idx = y as usize * fb.size.cols as usize + x as usize;
            let mask = masks[idx];
            if mask != 0 {
                fb.set_cell(Pos::new(x, y), Cell::new(junction_glyph(mask), Attrs::default()));
            }
        }
    }
}

fn collect_borders(
    window: &Window,
    id: crate::layout::tree::NodeId,
    masks: &mut [u8],
    fb_size: Size,
) {
    if window.layout.is_leaf(id) {
        return;
    }
    let orientation = window.layout.orientation(id).unwrap();
    let children = window.layout.children(id).to_vec();
    for pair in children.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        match orientation {
            Orientation::LeftRight => {
                let a_off = window.layout.offset(a);
                let a_size = window.layout.size(a);
                let x = a_off.x + a_size.cols;
                let b_off = window.layout.offset(b);
                let b_size = window.layout.size(b);
                for row in b_off.y..b_off.y + b_size.rows {
                    mark(masks, fb_size, x, row, UP | DOWN);
                }
            }
            Orientation::TopBottom => {
                let a_off = window.layout.offset(a);
                let a_size = window.layout.size(a);
                let y = a_off.y + a_size.rows;
                let b_off = window.layout.offset(b);
                let b_size = window.layout.size(b);
                for col in b_off.x..b_off.x + b_size.cols {
                    mark(masks, fb_size, col, y, LEFT | RIGHT);
                }
            }
        }
    }
    for &child in &children {
        collect_borders(window, child, masks, fb_size);
    }
}

fn mark(masks: &mut [u8], fb_size: Size, x: u16, y: u16, bits: u8) {
    if x < fb_size.cols && y < fb_size.rows {
        masks[y as usize * fb_size.cols as usize + x as usize] |= bits;
    }
}

fn draw_status_bar(fb: &mut Framebuffer, top: u16, cols: u16) {
    let attrs = Attrs { fg: Some(STATUS_FG), bg: Some(STATUS_BG), ..Attrs::default() };
    let rect = Rect::new(0, top, cols, fb.size.rows - top);
    fb.fill(rect, Cell::new(' ', attrs));
}

/// Quantize a stored [`Rgb4`] to the nearest xterm 256-color palette index, for hosts
/// that emit indexed rather than truecolor sequences.
#[must_use]
pub fn nearest_256_color(target: Rgb4) -> u8 {
    (0u16..256)
        .map(|i| i as u8)
        .min_by_key(|&i| {
            let c = sgr::xterm_256(i);
            let dr = i32::from(c.r) - i32::from(target.r);
            let dg = i32::from(c.g) - i32::from(target.g);
            let db = i32::from(c.b) - i32::from(target.b);
            dr * dr + dg * dg + db * db
        })
        .unwrap_or(7)
}

/// Emit the minimal set of escape sequences that turn `prev` into `next` on the host
/// (spec §4.6 "diff-based frame emission"). `prev` is `None` on the first frame, when
/// everything is considered dirty.
pub fn diff(host: &mut dyn HostTerminal, prev: Option<&Framebuffer>, next: &Framebuffer) -> io::Result<()> {
    let mut last_attrs: Option<Attrs> = None;
    for y in 0..next.size.rows {
        let mut col = 0u16;
        while col < next.size.cols {
            let pos = Pos::new(col, y);
            let cell = next.cell(pos);
            let unchanged = prev.is_some_and(|p| p.size() == next.size && p.cell(pos) == cell);
            if unchanged {
                col += 1;
                continue;
            }
            host.write_bytes(format!("\x1b[{};{}H", y + 1, col + 1).as_bytes())?;
            let mut run = String::new();
            while col < next.size.cols {
                let pos = Pos::new(col, y);
                let cell = next.cell(pos);
                let unchanged = prev.is_some_and(|p| p.size() == next.size && p.cell(pos) == cell);
                if unchanged {
                    break;
                }
                if Some(cell.attrs()) != last_attrs {
                    if !run.is_empty() {
                        host.write_bytes(run.as_bytes())?;
                        run.clear();
                    }
                    host.write_bytes(sgr_bytes(cell.attrs()).as_bytes())?;
                    last_attrs = Some(cell.attrs());
                }
                if !cell.is_wide_continuation() {
                    run.push(cell.ch());
                }
                col += 1;
            }
            if !run.is_empty() {
                host.write_bytes(run.as_bytes())?;
            }
        }
    }
    if let Some(cursor) = next.cursor {
        host.write_bytes(format!("\x1b[{};{}H", cursor.y + 1, cursor.x + 1).as_bytes())?;
    }
    host.write_bytes(if next.cursor_visible { b"\x1b[?25h" } else { b"\x1b[?25l" })?;
    host.flush()
}

fn sgr_bytes(attrs: Attrs) -> String {
    let mut parts = vec!["0".to_string()];
    if attrs.bold { parts.push("1".into()); }
    if attrs.underline { parts.push("4".into()); }
    if attrs.inverse { parts.push("7".into()); }
    if attrs.conceal { parts.push("8".into()); }
    if let Some(fg) = attrs.fg {
        parts.push(format!("38;5;{}", nearest_256_color(fg)));
    }
    if let Some(bg) = attrs.bg {
        parts.push(format!("48;5;{}", nearest_256_color(bg)));
    }
    format!("\x1b[{}m", parts.join(";"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pane::Runner;

    #[derive(Debug, Default)]
    struct NullRunner;
    impl Runner for NullRunner {
        fn write_bytes(&mut self, _bytes: &[u8]) -> io::Result<()> { Ok(()) }
        fn read_bytes(&mut self) -> io::Result<Vec<u8>> { Ok(Vec::new()) }
        fn resize(&mut self, _size: Size) -> io::Result<()> { Ok(()) }
        fn raise(&mut self, _signal: crate::linedisc::Signal) -> io::Result<()> { Ok(()) }
    }

    #[test]
    fn compose_reserves_status_bar_row() {
        let window = Window::new("main", Size::new(20, 10), Box::new(NullRunner));
        let config = MuxConfig::default();
        let fb = compose(&window, &config, false);
        assert_eq!(fb.size(), Size::new(20, 11));
    }

    #[test]
    fn compose_copies_active_pane_content() {
        let mut window = Window::new("main", Size::new(20, 10), Box::new(NullRunner));
        window.active_pane_mut().unwrap().absorb_output(b"hi").unwrap();
        let config = MuxConfig::default();
        let fb = compose(&window, &config, false);
        assert_eq!(fb.cell(Pos::new(0, 0)).ch(), 'h');
    }

    #[test]
    fn border_drawn_between_split_panes() {
        use crate::layout::tree::Orientation;
        let mut window = Window::new("main", Size::new(20, 10), Box::new(NullRunner));
        window.split(Orientation::LeftRight, Some(8), false, false, Box::new(NullRunner)).unwrap();
        let config = MuxConfig::default();
        let fb = compose(&window, &config, false);
        assert_eq!(fb.cell(Pos::new(8, 0)).ch(), '\u{2502}');
    }

    #[test]
    fn junction_glyph_table_covers_all_four_directions() {
        assert_eq!(junction_glyph(UP | DOWN | LEFT | RIGHT), '\u{253C}');
        assert_eq!(junction_glyph(DOWN | RIGHT), '\u{250C}');
    }

    #[test]
    fn nearest_256_color_matches_pure_red() {
        let idx = nearest_256_color(Rgb4::from_rgb8(0xCD, 0x00, 0x00));
        let resolved = sgr::xterm_256(idx);
        assert_eq!(resolved, Rgb4::from_rgb8(0xCD, 0, 0));
    }
}
