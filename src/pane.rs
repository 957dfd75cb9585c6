// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A single pane: its own virtual terminal, line discipline, and runner handle
//! (spec §3 "Pane").
//!
//! Grounded on `Process` (`pty_mux/process_manager.rs`): that struct pairs a PTY
//! session with its own `OffscreenBuffer` and ANSI parser so process switching never
//! loses state. A pane plays the same role here, except every pane is always "live" —
//! there is no switching, only compositing all of them at once.

use crate::geometry::{Rect, Size};
use crate::grid::Grid;
use crate::linedisc::{LineDiscipline, Signal};
use crate::vt::VtEmulator;

/// The `{ read-bytes, write-bytes, size, subscribe(signal)-raise }` contract a pane
/// hands its configured runner (spec §6 "Pane runner contract").
pub trait Runner: std::fmt::Debug + Send {
    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()>;
    fn read_bytes(&mut self) -> std::io::Result<Vec<u8>>;
    fn resize(&mut self, size: Size) -> std::io::Result<()>;
    fn raise(&mut self, signal: Signal) -> std::io::Result<()>;
    /// Whether the runner's child process has exited (spec §5 "pane lifecycle").
    fn is_closed(&mut self) -> bool { false }
}

/// A pane's globally unique identity, stable across splits/resizes (spec §3).
pub type PaneId = u32;

/// One pane: a leaf in the layout tree paired with its virtual terminal.
#[derive(Debug)]
pub struct Pane {
    pub id: PaneId,
    pub rect: Rect,
    pub grid: Grid,
    pub vt: VtEmulator,
    pub line_disc: LineDiscipline,
    pub clock_mode: bool,
    /// Bumped on every activation; used for MRU tiebreaks in `select-pane` (spec §4.5).
    pub generation: u64,
    runner: Option<Box<dyn Runner>>,
}

impl Pane {
    #[must_use]
    pub fn new(id: PaneId, rect: Rect, runner: Box<dyn Runner>) -> Self {
        Self {
            id,
            rect,
            grid: Grid::new(Size::new(rect.width, rect.height)),
            vt: VtEmulator::new(),
            line_disc: LineDiscipline::cooked(),
            clock_mode: false,
            generation: 0,
            runner: Some(runner),
        }
    }

    /// Feed bytes produced by the child through the VT emulator, writing any reply
    /// bytes (DA/DSR/etc, spec §4.1) straight back to the runner's input.
    pub fn absorb_output(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let reply = self.vt.feed(&mut self.grid, bytes);
        if !reply.is_empty() {
            self.send_raw(&reply)?;
        }
        Ok(())
    }

    /// Run keyboard bytes (already resolved to `SelfInsert` by the keymap) through the
    /// line discipline and forward whatever survives, echoing locally and raising
    /// signals on the runner (spec §4.2).
    pub fn handle_input(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let result = self.line_disc.process_input(bytes);
        if !result.echo.is_empty() {
            self.vt.feed(&mut self.grid, &result.echo);
        }
        if !result.to_child.is_empty() {
            self.send_raw(&result.to_child)?;
        }
        for signal in result.signals {
            if let Some(runner) = &mut self.runner {
                runner.raise(signal)?;
            }
        }
        Ok(())
    }

    /// Bytes injected directly by `send-keys`, bypassing the line discipline (spec
    /// §4.5).
    pub fn send_raw(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(runner) = &mut self.runner {
            runner.write_bytes(bytes)?;
        }
        Ok(())
    }

    pub fn resize(&mut self, rect: Rect) -> std::io::Result<()> {
        self.rect = rect;
        self.grid.resize(Size::new(rect.width, rect.height));
        if let Some(runner) = &mut self.runner {
            runner.resize(Size::new(rect.width, rect.height))?;
        }
        Ok(())
    }

    pub fn activate(&mut self) { self.generation += 1; }

    pub fn poll_output(&mut self) -> std::io::Result<Vec<u8>> {
        match &mut self.runner {
            Some(runner) => runner.read_bytes(),
            None => Ok(Vec::new()),
        }
    }

    /// Whether the runner's side has closed; the pane should be torn down (spec §5
    /// "Cancellation").
    #[must_use]
    pub fn is_closed(&self) -> bool { self.runner.is_none() }

    /// Whether the runner's child process has exited without `close` having been
    /// called yet (spec §5 "pane lifecycle").
    pub fn runner_exited(&mut self) -> bool {
        self.runner.as_mut().is_some_and(|r| r.is_closed())
    }

    pub fn close(&mut self) { self.runner = None; }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct FakeRunner {
        written: Arc<Mutex<Vec<u8>>>,
        raised: Vec<Signal>,
    }

    impl Runner for FakeRunner {
        fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
            self.written.lock().unwrap().extend_from_slice(bytes);
            Ok(())
        }
        fn read_bytes(&mut self) -> std::io::Result<Vec<u8>> { Ok(Vec::new()) }
        fn resize(&mut self, _size: Size) -> std::io::Result<()> { Ok(()) }
        fn raise(&mut self, signal: Signal) -> std::io::Result<()> {
            self.raised.push(signal);
            Ok(())
        }
    }

    #[test]
    fn absorb_output_writes_into_grid() {
        let mut pane = Pane::new(1, Rect::new(0, 0, 10, 3), Box::new(FakeRunner::default()));
        pane.absorb_output(b"hi").unwrap();
        assert_eq!(pane.grid.cell(crate::geometry::Pos::new(0, 0)).ch(), 'h');
    }

    #[test]
    fn handle_input_forwards_cooked_line_to_runner() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let runner = FakeRunner { written: written.clone(), raised: Vec::new() };
        let mut pane = Pane::new(1, Rect::new(0, 0, 10, 3), Box::new(runner));
        pane.handle_input(b"ab\r").unwrap();
        assert_eq!(&*written.lock().unwrap(), b"ab\n");
    }

    #[test]
    fn activate_bumps_generation() {
        let mut pane = Pane::new(1, Rect::new(0, 0, 10, 3), Box::new(FakeRunner::default()));
        assert_eq!(pane.generation, 0);
        pane.activate();
        assert_eq!(pane.generation, 1);
    }

    #[test]
    fn close_marks_pane_closed() {
        let mut pane = Pane::new(1, Rect::new(0, 0, 10, 3), Box::new(FakeRunner::default()));
        assert!(!pane.is_closed());
        pane.close();
        assert!(pane.is_closed());
    }
}
