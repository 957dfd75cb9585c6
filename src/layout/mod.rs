// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The pane layout tree: split/resize/remove algebra, textual dump/parse, and the
//! `select-pane` direction rule (spec §3 "Layout Node", §4.3, §4.5).

pub mod format;
pub mod selection;
pub mod tree;

pub use selection::Direction;
pub use tree::{LayoutTree, NodeId, Orientation, PANE_MINIMUM};
