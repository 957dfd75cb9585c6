// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The top-level session: windows, the keymap, server options, and the pane-runner
//! factory (spec §3 "Server Options", §5, §6).
//!
//! Grounded on `pty_mux::mux::PTYMux` and its `PTYMuxBuilder`: a builder assembling the
//! process-wide tunables and the initial window/pane before `run()` ever touches the
//! host terminal, and a `run()` that owns terminal setup/teardown so a caller never has
//! to remember the ordering itself.

use crate::config::{MuxConfig, ServerOptions};
use crate::error::{MuxError, MuxResult};
use crate::geometry::Size;
use crate::host::{CrosstermHost, CrosstermInput, HostTerminal};
use crate::keymap::KeyMap;
use crate::pane::Runner;
use crate::window::Window;

/// Spawns a runner for a pane of `size` — `split-window`/`new-window` call this
/// through [`Mux::spawn_runner`] just as the initial window does at build time.
pub type RunnerFactory = Box<dyn Fn(Size) -> std::io::Result<Box<dyn Runner>> + Send>;

/// One running session: every window, the process-wide keymap/options, and the
/// factory new panes spawn their runners from.
pub struct Mux {
    pub config: MuxConfig,
    pub options: ServerOptions,
    pub keymap: KeyMap,
    pub windows: Vec<Window>,
    pub active_window: usize,
    /// The content area every window's layout root fills — the host size minus
    /// `config.status_bar_height` (spec §4.6).
    pub content_size: Size,
    /// Set by `display-panes`; cleared by the scheduler once `identify_duration`
    /// elapses (spec §4.5, §4.7).
    pub identify_until: Option<std::time::Instant>,
    runner_factory: RunnerFactory,
}

impl Mux {
    #[must_use]
    pub fn builder() -> MuxBuilder { MuxBuilder::default() }

    #[must_use]
    pub fn active_window(&self) -> &Window { &self.windows[self.active_window] }

    pub fn active_window_mut(&mut self) -> &mut Window { &mut self.windows[self.active_window] }

    /// Spawn a runner of `size` through the configured factory (spec §6 "Pane runner
    /// contract"), used by `split-window`/`new-window`.
    pub fn spawn_runner(&self, size: Size) -> MuxResult<Box<dyn Runner>> {
        (self.runner_factory)(size).map_err(MuxError::PaneSpawn)
    }

    /// Host resize (spec §4.3 `resize(new_sx, new_sy)`): subtract the status bar row
    /// and push the new content size into every window's layout tree.
    pub fn resize_root(&mut self, host_size: Size) {
        self.content_size =
            Size::new(host_size.cols, host_size.rows.saturating_sub(self.config.status_bar_height));
        for window in &mut self.windows {
            window.resize_root(self.content_size);
        }
    }

    /// Whether the clock-tick timer should be running (spec §4.7 "installed the first
    /// time any pane enters clock-mode").
    #[must_use]
    pub fn any_pane_in_clock_mode(&self) -> bool {
        self.windows.iter().any(|w| w.panes.iter().any(|p| p.clock_mode))
    }

    /// Run the session to completion: enters raw mode/alt-screen, drives the scheduler,
    /// and restores the host terminal on the way out regardless of how the loop ended
    /// (spec §5 "ordered cleanup").
    pub async fn run(self) -> miette::Result<()> {
        let host = CrosstermHost::new();
        let input = CrosstermInput::new();
        crate::scheduler::run(self, Box::new(host), input).await
    }
}

/// Assembles a [`Mux`] from explicit tunables (spec §9 "no ambient globals") — nothing
/// here is read from a config file or environment variable except by the caller.
pub struct MuxBuilder {
    config: MuxConfig,
    prefix: Vec<u8>,
    size: Size,
}

impl Default for MuxBuilder {
    fn default() -> Self {
        Self { config: MuxConfig::default(), prefix: b"`".to_vec(), size: Size::new(80, 24) }
    }
}

impl MuxBuilder {
    #[must_use]
    pub fn config(mut self, config: MuxConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn prefix(mut self, prefix: &[u8]) -> Self {
        self.prefix = prefix.to_vec();
        self
    }

    /// The host terminal's full size, status bar row included.
    #[must_use]
    pub fn size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    /// Spawn the first window's first pane through `runner_factory` and assemble the
    /// session.
    pub fn build(self, runner_factory: RunnerFactory) -> MuxResult<Mux> {
        let content_size =
            Size::new(self.size.cols, self.size.rows.saturating_sub(self.config.status_bar_height));
        let runner = runner_factory(content_size).map_err(MuxError::PaneSpawn)?;
        let window = Window::new("0", content_size, runner);
        Ok(Mux {
            config: self.config,
            options: ServerOptions::new(),
            keymap: KeyMap::new(&self.prefix),
            windows: vec![window],
            active_window: 0,
            content_size,
            identify_until: None,
            runner_factory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linedisc::Signal;

    #[derive(Debug, Default)]
    struct NullRunner;
    impl Runner for NullRunner {
        fn write_bytes(&mut self, _bytes: &[u8]) -> std::io::Result<()> { Ok(()) }
        fn read_bytes(&mut self) -> std::io::Result<Vec<u8>> { Ok(Vec::new()) }
        fn resize(&mut self, _size: Size) -> std::io::Result<()> { Ok(()) }
        fn raise(&mut self, _signal: Signal) -> std::io::Result<()> { Ok(()) }
    }

    fn factory() -> RunnerFactory { Box::new(|_size| Ok(Box::new(NullRunner) as Box<dyn Runner>)) }

    #[test]
    fn builder_reserves_status_bar_row() {
        let mux = Mux::builder().size(Size::new(80, 24)).build(factory()).unwrap();
        assert_eq!(mux.content_size, Size::new(80, 23));
        assert_eq!(mux.windows.len(), 1);
    }

    #[test]
    fn resize_root_propagates_to_every_window() {
        let mut mux = Mux::builder().size(Size::new(80, 24)).build(factory()).unwrap();
        mux.resize_root(Size::new(100, 40));
        assert_eq!(mux.content_size, Size::new(100, 39));
        assert_eq!(mux.active_window().layout.size(mux.active_window().layout.root()), mux.content_size);
    }

    #[test]
    fn no_pane_in_clock_mode_initially() {
        let mux = Mux::builder().size(Size::new(80, 24)).build(factory()).unwrap();
        assert!(!mux.any_pane_in_clock_mode());
    }
}
