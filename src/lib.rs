// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! `panemux`: a full-screen, in-process terminal multiplexer. Tiling pane layout,
//! VT100 emulation, a prefix-keyed command protocol, and a diff-based frame
//! compositor — a `tmux`-shaped library, not a wrapper around one.
//!
//! [`Mux`] is the entry point: build one with [`Mux::builder`], supplying a
//! [`mux::RunnerFactory`] that spawns each pane's child process, then call
//! [`Mux::run`].

pub mod cell;
pub mod command;
pub mod compositor;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod host;
pub mod keymap;
pub mod layout;
pub mod linedisc;
pub mod mux;
pub mod pane;
pub mod pty;
pub mod scheduler;
pub mod vt;
pub mod window;

pub use error::{MuxError, MuxResult};
pub use mux::{Mux, MuxBuilder, RunnerFactory};
