// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The per-pane line discipline (spec §4.2): cooked/raw input processing sitting
//! between the keymap's `SelfInsert` bytes and a pane's master-input.
//!
//! There is no direct teacher analogue — `r3bl_tui`'s `PTYMux` delegates this entirely
//! to the OS pty's own termios layer. Here the Mux owns it explicitly, since the
//! "Pane runner contract" (spec §6) only promises raw byte streams, not a POSIX pty.

/// A signal raised by `ISIG` processing, to be delivered to the pane's runner via its
/// `subscribe(signal)-raise` contract (spec §6) rather than forwarded as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Suspend,
}

/// The control characters `ISIG`/`ICANON` processing matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlChars {
    pub intr: u8,
    pub susp: u8,
    pub erase: u8,
    pub kill: u8,
    pub eof: u8,
}

impl Default for ControlChars {
    fn default() -> Self {
        Self { intr: 0x03, susp: 0x1A, erase: 0x7F, kill: 0x15, eof: 0x04 }
    }
}

/// The termios-style mode flags (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDiscFlags {
    pub echo: bool,
    pub echoe: bool,
    pub echok: bool,
    pub icanon: bool,
    pub isig: bool,
    pub icrnl: bool,
    pub inlcr: bool,
    pub ocrnl: bool,
    pub onlcr: bool,
    pub ixon: bool,
}

impl LineDiscFlags {
    /// The usual interactive-shell default: canonical, echoing, signal-generating.
    #[must_use]
    pub fn cooked() -> Self {
        Self {
            echo: true,
            echoe: true,
            echok: true,
            icanon: true,
            isig: true,
            icrnl: true,
            inlcr: false,
            ocrnl: false,
            onlcr: true,
            ixon: true,
        }
    }

    /// Every flag off: a curses/readline application's usual mode, where bytes pass
    /// through unmodified (spec §8 invariant 5's "identity" case).
    #[must_use]
    pub fn raw() -> Self {
        Self {
            echo: false,
            echoe: false,
            echok: false,
            icanon: false,
            isig: false,
            icrnl: false,
            inlcr: false,
            ocrnl: false,
            onlcr: false,
            ixon: false,
        }
    }
}

/// The outcome of feeding a chunk of input through the discipline: bytes released to
/// the child, bytes to echo back to the pane's own grid, and any signals raised.
#[derive(Debug, Default, Clone)]
pub struct LineDiscResult {
    pub to_child: Vec<u8>,
    pub echo: Vec<u8>,
    pub signals: Vec<Signal>,
}

/// Per-pane cooked/raw input processing (spec §4.2).
#[derive(Debug, Clone)]
pub struct LineDiscipline {
    pub flags: LineDiscFlags,
    pub control: ControlChars,
    buffer: Vec<u8>,
    ixoff_paused: bool,
}

impl Default for LineDiscipline {
    fn default() -> Self { Self::cooked() }
}

impl LineDiscipline {
    #[must_use]
    pub fn cooked() -> Self {
        Self {
            flags: LineDiscFlags::cooked(),
            control: ControlChars::default(),
            buffer: Vec::new(),
            ixoff_paused: false,
        }
    }

    #[must_use]
    pub fn raw() -> Self {
        Self {
            flags: LineDiscFlags::raw(),
            control: ControlChars::default(),
            buffer: Vec::new(),
            ixoff_paused: false,
        }
    }

    /// Process bytes from the keymap's `SelfInsert` path.
    pub fn process_input(&mut self, bytes: &[u8]) -> LineDiscResult {
        let mut result = LineDiscResult::default();
        for &byte in bytes {
            if self.flags.ixon {
                match byte {
                    0x13 => { self.ixoff_paused = true; continue; } // XOFF (^S)
                    0x11 => { self.ixoff_paused = false; continue; } // XON (^Q)
                    _ if self.ixoff_paused => continue,
                    _ => {}
                }
            }
            if self.flags.isig {
                if byte == self.control.intr {
                    result.signals.push(Signal::Interrupt);
                    continue;
                }
                if byte == self.control.susp {
                    result.signals.push(Signal::Suspend);
                    continue;
                }
            }
            if self.flags.icanon {
                self.process_canonical_byte(byte, &mut result);
            } else {
                let translated = self.translate_input_newline(byte);
                if self.flags.echo {
                    result.echo.extend(self.echo_bytes(translated));
                }
                result.to_child.push(translated);
            }
        }
        result
    }

    fn process_canonical_byte(&mut self, byte: u8, result: &mut LineDiscResult) {
        if byte == self.control.erase {
            if self.buffer.pop().is_some() && self.flags.echo && self.flags.echoe {
                result.echo.extend_from_slice(b"\x08 \x08");
            }
            return;
        }
        if byte == self.control.kill {
            let n = self.buffer.len();
            self.buffer.clear();
            if self.flags.echo && self.flags.echok {
                for _ in 0..n {
                    result.echo.extend_from_slice(b"\x08 \x08");
                }
            }
            return;
        }
        if byte == b'\r' || byte == b'\n' {
            let translated = self.translate_input_newline(byte);
            if self.flags.echo {
                result.echo.extend(self.echo_bytes(translated));
            }
            self.buffer.push(translated);
            result.to_child.append(&mut self.buffer);
            return;
        }
        self.buffer.push(byte);
        if self.flags.echo {
            result.echo.push(byte);
        }
    }

    fn translate_input_newline(&self, byte: u8) -> u8 {
        match byte {
            b'\r' if self.flags.icrnl => b'\n',
            b'\n' if self.flags.inlcr => b'\r',
            other => other,
        }
    }

    fn echo_bytes(&self, byte: u8) -> Vec<u8> {
        match byte {
            b'\n' if self.flags.onlcr => vec![b'\r', b'\n'],
            b'\r' if self.flags.ocrnl => vec![b'\n'],
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_mode_is_identity_passthrough() {
        let mut ld = LineDiscipline::raw();
        let result = ld.process_input(b"hello\r\x03");
        assert_eq!(result.to_child, b"hello\r\x03");
        assert!(result.echo.is_empty());
        assert!(result.signals.is_empty());
    }

    #[test]
    fn cooked_mode_buffers_until_carriage_return() {
        let mut ld = LineDiscipline::cooked();
        let r1 = ld.process_input(b"ab");
        assert!(r1.to_child.is_empty());
        let r2 = ld.process_input(b"\r");
        assert_eq!(r2.to_child, b"ab\n");
    }

    #[test]
    fn erase_removes_last_buffered_byte() {
        let mut ld = LineDiscipline::cooked();
        ld.process_input(b"abc");
        let result = ld.process_input(&[0x7F]);
        assert_eq!(result.echo, b"\x08 \x08");
        let r2 = ld.process_input(b"\r");
        assert_eq!(r2.to_child, b"ab\n");
    }

    #[test]
    fn isig_consumes_intr_and_raises_signal() {
        let mut ld = LineDiscipline::cooked();
        let result = ld.process_input(&[0x03]);
        assert_eq!(result.signals, vec![Signal::Interrupt]);
        assert!(result.to_child.is_empty());
    }

    #[test]
    fn onlcr_doubles_newline_on_echo() {
        let mut ld = LineDiscipline::cooked();
        let result = ld.process_input(b"\r");
        assert_eq!(result.echo, b"\r\n");
    }
}
