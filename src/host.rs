// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The host terminal contract (spec §6 "Host terminal contract (consumed)").
//!
//! Grounded on the teacher's `terminal_io::{OutputDevice, InputDevice}` split: a
//! write side the redraw loop owns exclusively, and an async event stream the input
//! loop polls. Unlike the teacher (which only ever targets its own `OffscreenBuffer`
//! paint pipeline), this mux also needs raw byte sequences out of each key event, to
//! feed the keymap trie (spec §4.4) — `key_event_to_bytes` is the translation layer
//! that doesn't exist in the teacher because it never has a byte-oriented keymap.

use crate::geometry::Size;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use crossterm::{cursor, execute, queue, terminal};
use futures_util::StreamExt;
use std::io::{self, Write};

/// One decoded host event, already split into the shapes the scheduler needs (spec
/// §4.7 "Input loop").
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// Raw bytes a key event translates to, fed byte-by-byte into the keymap trie.
    Bytes(Vec<u8>),
    /// A mouse report, already decoded (spec §6 "read a mouse-report event").
    Mouse(MouseEvent),
    /// `WINCH`: the host's content area changed size.
    Resize(Size),
}

/// The capability strings the compositor and scheduler need at startup and shutdown
/// (spec §6 "capability strings").
pub struct Capabilities {
    pub enter_alt_screen: &'static str,
    pub exit_alt_screen: &'static str,
    pub keypad_on: &'static str,
    pub keypad_off: &'static str,
    pub clear_screen: &'static str,
    pub cursor_visible: &'static str,
    pub cursor_invisible: &'static str,
}

pub const CAPABILITIES: Capabilities = Capabilities {
    enter_alt_screen: "\x1b[?1049h",
    exit_alt_screen: "\x1b[?1049l",
    keypad_on: "\x1b=",
    keypad_off: "\x1b>",
    clear_screen: "\x1b[2J\x1b[H",
    cursor_visible: "\x1b[?25h",
    cursor_invisible: "\x1b[?25l",
};

/// Probe `$TERM`/`$COLORTERM` the way the teacher's color-support detection does, to
/// pick the terminfo name emitted to panes (spec §6 "Terminfo emitted to panes").
#[must_use]
pub fn detect_terminfo_name() -> &'static str {
    let colorterm = std::env::var("COLORTERM").unwrap_or_default();
    let term = std::env::var("TERM").unwrap_or_default();
    let has_256 = colorterm.contains("truecolor")
        || colorterm.contains("24bit")
        || term.contains("256color")
        || term.contains("kitty")
        || term.contains("alacritty");
    if has_256 { "screen-256color" } else { "screen" }
}

/// The write/control half of the host terminal (spec §5 "mutated only by the redraw
/// loop"). Signal handlers and the input loop never touch this directly.
pub trait HostTerminal: Send {
    fn size(&self) -> io::Result<Size>;
    fn enter_raw_mode(&mut self) -> io::Result<()>;
    fn leave_raw_mode(&mut self) -> io::Result<()>;
    fn enter_alt_screen(&mut self) -> io::Result<()>;
    fn exit_alt_screen(&mut self) -> io::Result<()>;
    fn enable_mouse_capture(&mut self) -> io::Result<()>;
    fn disable_mouse_capture(&mut self) -> io::Result<()>;
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// A `crossterm`-backed [`HostTerminal`] writing to stdout, mirroring the teacher's
/// `OutputDevice::new_stdout()`.
pub struct CrosstermHost {
    out: io::Stdout,
}

impl Default for CrosstermHost {
    fn default() -> Self { Self::new() }
}

impl CrosstermHost {
    #[must_use]
    pub fn new() -> Self { Self { out: io::stdout() } }
}

impl HostTerminal for CrosstermHost {
    fn size(&self) -> io::Result<Size> {
        let (cols, rows) = terminal::size()?;
        Ok(Size::new(cols, rows))
    }

    fn enter_raw_mode(&mut self) -> io::Result<()> { terminal::enable_raw_mode() }
    fn leave_raw_mode(&mut self) -> io::Result<()> { terminal::disable_raw_mode() }

    fn enter_alt_screen(&mut self) -> io::Result<()> {
        execute!(self.out, terminal::EnterAlternateScreen, cursor::Hide)
    }

    fn exit_alt_screen(&mut self) -> io::Result<()> {
        execute!(self.out, cursor::Show, terminal::LeaveAlternateScreen)
    }

    fn enable_mouse_capture(&mut self) -> io::Result<()> {
        execute!(self.out, crossterm::event::EnableMouseCapture)
    }

    fn disable_mouse_capture(&mut self) -> io::Result<()> {
        execute!(self.out, crossterm::event::DisableMouseCapture)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        queue!(self.out, crossterm::style::Print(String::from_utf8_lossy(bytes)))
    }

    fn flush(&mut self) -> io::Result<()> { self.out.flush() }
}

/// The async read side: a thin wrapper over `crossterm::event::EventStream`,
/// mirroring the teacher's `InputDevice::new_event_stream`.
pub struct CrosstermInput {
    stream: EventStream,
}

impl Default for CrosstermInput {
    fn default() -> Self { Self::new() }
}

impl CrosstermInput {
    #[must_use]
    pub fn new() -> Self { Self { stream: EventStream::new() } }

    /// Await the next host event, already translated into [`HostEvent`].
    pub async fn next(&mut self) -> io::Result<Option<HostEvent>> {
        match self.stream.next().await {
            Some(Ok(Event::Key(key))) => Ok(Some(HostEvent::Bytes(key_event_to_bytes(key)))),
            Some(Ok(Event::Mouse(mouse))) => Ok(Some(HostEvent::Mouse(mouse))),
            Some(Ok(Event::Resize(cols, rows))) => Ok(Some(HostEvent::Resize(Size::new(cols, rows)))),
            Some(Ok(_)) => Ok(None),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

/// Translate a crossterm key event into the raw byte sequence a real terminal would
/// have sent, since the keymap trie (spec §3 "KeyMap") operates on bytes, not
/// structured key events.
#[must_use]
pub fn key_event_to_bytes(key: KeyEvent) -> Vec<u8> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    let mut bytes = match key.code {
        KeyCode::Char(c) if ctrl && c.is_ascii_alphabetic() => {
            vec![(c.to_ascii_uppercase() as u8) & 0x1F]
        }
        KeyCode::Char(c) => {
            let mut buf = [0u8; 4];
            c.encode_utf8(&mut buf).as_bytes().to_vec()
        }
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Tab => vec![0x09],
        KeyCode::BackTab => vec![0x1B, b'[', b'Z'],
        KeyCode::Backspace => vec![0x7F],
        KeyCode::Esc => vec![0x1B],
        KeyCode::Delete => vec![0x1B, b'[', b'3', b'~'],
        KeyCode::Insert => vec![0x1B, b'[', b'2', b'~'],
        KeyCode::Home => vec![0x1B, b'[', b'H'],
        KeyCode::End => vec![0x1B, b'[', b'F'],
        KeyCode::PageUp => vec![0x1B, b'[', b'5', b'~'],
        KeyCode::PageDown => vec![0x1B, b'[', b'6', b'~'],
        KeyCode::Up => arrow_bytes(b'A', ctrl),
        KeyCode::Down => arrow_bytes(b'B', ctrl),
        KeyCode::Right => arrow_bytes(b'C', ctrl),
        KeyCode::Left => arrow_bytes(b'D', ctrl),
        _ => Vec::new(),
    };

    if alt && !bytes.is_empty() {
        bytes.insert(0, 0x1B);
    }
    bytes
}

fn arrow_bytes(letter: u8, ctrl: bool) -> Vec<u8> {
    if ctrl {
        vec![0x1B, b'[', b'1', b';', b'5', letter]
    } else {
        vec![0x1B, b'[', letter]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_char_encodes_as_utf8() {
        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(key_event_to_bytes(key), b"a");
    }

    #[test]
    fn ctrl_c_encodes_as_control_byte() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_event_to_bytes(key), vec![0x03]);
    }

    #[test]
    fn plain_arrow_uses_short_form() {
        let key = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(key_event_to_bytes(key), vec![0x1B, b'[', b'A']);
    }

    #[test]
    fn ctrl_arrow_uses_modifier_form() {
        let key = KeyEvent::new(KeyCode::Up, KeyModifiers::CONTROL);
        assert_eq!(key_event_to_bytes(key), vec![0x1B, b'[', b'1', b';', b'5', b'A']);
    }

    #[test]
    fn enter_maps_to_carriage_return() {
        let key = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(key_event_to_bytes(key), vec![b'\r']);
    }

    #[test]
    fn detect_terminfo_falls_back_to_screen_without_color_hints() {
        // SAFETY: test-only env mutation, not run concurrently with other env readers
        // in this process.
        unsafe {
            std::env::remove_var("COLORTERM");
            std::env::set_var("TERM", "xterm");
        }
        assert_eq!(detect_terminfo_name(), "screen");
    }
}
