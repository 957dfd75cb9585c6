// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A window: one layout tree, its panes, and which one is active (spec §3 "Window").

use crate::error::{MuxError, MuxResult};
use crate::geometry::{Rect, Size};
use crate::layout::selection::{self, Direction};
use crate::layout::tree::{LayoutTree, NodeId, Orientation};
use crate::pane::{Pane, PaneId, Runner};

/// One window: a tiled layout of panes plus which pane currently has activity.
#[derive(Debug)]
pub struct Window {
    pub name: String,
    pub layout: LayoutTree,
    pub panes: Vec<Pane>,
    active_pane: PaneId,
    next_pane_id: PaneId,
}

impl Window {
    /// Create a window with a single pane filling `size` (the caller has already
    /// reserved the status bar row).
    pub fn new(name: impl Into<String>, size: Size, runner: Box<dyn Runner>) -> Self {
        let pane_id = 1;
        let layout = LayoutTree::new_single_leaf(pane_id, size);
        let mut pane = Pane::new(pane_id, Rect::new(0, 0, size.cols, size.rows), runner);
        pane.activate();
        Self { name: name.into(), layout, panes: vec![pane], active_pane: pane_id, next_pane_id: pane_id + 1 }
    }

    #[must_use]
    pub fn active_pane_id(&self) -> PaneId { self.active_pane }

    pub fn active_pane(&self) -> Option<&Pane> { self.pane(self.active_pane) }
    pub fn active_pane_mut(&mut self) -> Option<&mut Pane> { self.pane_mut(self.active_pane) }

    #[must_use]
    pub fn pane(&self, id: PaneId) -> Option<&Pane> { self.panes.iter().find(|p| p.id == id) }
    pub fn pane_mut(&mut self, id: PaneId) -> Option<&mut Pane> {
        self.panes.iter_mut().find(|p| p.id == id)
    }

    fn leaf_for(&self, pane_id: PaneId) -> Option<NodeId> { self.layout.find_leaf(pane_id) }

    /// `split-window [-h|-v] [-b] [-d] [-l SIZE]` (spec §4.5).
    pub fn split(
        &mut self,
        orientation: Orientation,
        size: Option<u16>,
        before: bool,
        make_active: bool,
        runner: Box<dyn Runner>,
    ) -> MuxResult<PaneId> {
        let leaf = self.leaf_for(self.active_pane).ok_or(MuxError::NoSuchPane(self.active_pane))?;
        let new_pane_id = self.next_pane_id;
        let new_leaf = self.layout.split(leaf, orientation, size, before, new_pane_id)?;
        self.next_pane_id += 1;

        let rect = self.leaf_rect(new_leaf);
        let mut pane = Pane::new(new_pane_id, rect, runner);
        if make_active {
            pane.activate();
            self.active_pane = new_pane_id;
        }
        self.panes.push(pane);
        self.sync_pane_rects();
        Ok(new_pane_id)
    }

    /// `select-pane -U/-D/-L/-R` (spec §4.5): move activity using the documented
    /// wrap-around selection rule.
    pub fn select(&mut self, direction: Direction) {
        let Some(active_leaf) = self.leaf_for(self.active_pane) else { return };
        let tree = &self.layout;
        let panes = &self.panes;
        let generation_of = |leaf: NodeId| {
            tree.pane_id(leaf).and_then(|id| panes.iter().find(|p| p.id == id)).map_or(0, |p| p.generation)
        };
        if let Some(target_leaf) = selection::select(tree, active_leaf, direction, generation_of) {
            if let Some(pane_id) = self.layout.pane_id(target_leaf) {
                self.active_pane = pane_id;
                if let Some(pane) = self.pane_mut(pane_id) {
                    pane.activate();
                }
            }
        }
    }

    /// `resize-pane [-U/-D/-L/-R] [ADJUST]` (spec §4.5). `-U`/`-L` shrink the active
    /// pane by `adjust`; `-D`/`-R` grow it; `opposite` mirrors tmux's `-Z`-less default
    /// of only pulling from the far side.
    pub fn resize(&mut self, direction: Direction, adjust: i32) {
        let Some(leaf) = self.leaf_for(self.active_pane) else { return };
        let (orientation, delta) = match direction {
            Direction::Up => (Orientation::TopBottom, -adjust),
            Direction::Down => (Orientation::TopBottom, adjust),
            Direction::Left => (Orientation::LeftRight, -adjust),
            Direction::Right => (Orientation::LeftRight, adjust),
        };
        self.layout.resize(leaf, orientation, delta, false);
        self.sync_pane_rects();
    }

    /// `resize-pane -x W` / `-y H`: set an exact dimension.
    pub fn resize_to(&mut self, orientation: Orientation, new_size: u16) {
        let Some(leaf) = self.leaf_for(self.active_pane) else { return };
        self.layout.resize_to(leaf, orientation, new_size);
        self.sync_pane_rects();
    }

    /// Remove a closed pane from the layout and pane list; collapses the layout as
    /// needed (spec §5 "Cancellation").
    pub fn remove_pane(&mut self, pane_id: PaneId) {
        if let Some(leaf) = self.leaf_for(pane_id) {
            self.layout.remove(leaf);
        }
        self.panes.retain(|p| p.id != pane_id);
        if self.active_pane == pane_id {
            if let Some(next) = self.panes.iter().max_by_key(|p| p.generation) {
                self.active_pane = next.id;
            }
        }
        self.sync_pane_rects();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.panes.is_empty() }

    /// Resize the whole window (host size change, status bar row already subtracted).
    pub fn resize_root(&mut self, size: Size) {
        self.layout.resize_root(size);
        self.sync_pane_rects();
    }

    fn leaf_rect(&self, leaf: NodeId) -> Rect {
        let size = self.layout.size(leaf);
        let offset = self.layout.offset(leaf);
        Rect::new(offset.x, offset.y, size.cols, size.rows)
    }

    fn sync_pane_rects(&mut self) {
        for leaf in self.layout.leaves() {
            if let Some(pane_id) = self.layout.pane_id(leaf) {
                let rect = self.leaf_rect(leaf);
                if let Some(pane) = self.pane_mut(pane_id) {
                    let _ = pane.resize(rect);
                }
            }
        }
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

    #[test]
    fn new_window_has_one_active_pane() {
        let win = Window::new("main", Size::new(80, 24), Box::new(NullRunner));
        assert_eq!(win.panes.len(), 1);
        assert_eq!(win.active_pane_id(), 1);
    }

    #[test]
    fn split_adds_second_pane_and_activates_it() {
        let mut win = Window::new("main", Size::new(80, 24), Box::new(NullRunner));
        let id = win.split(Orientation::LeftRight, None, false, true, Box::new(NullRunner)).unwrap();
        assert_eq!(win.panes.len(), 2);
        assert_eq!(win.active_pane_id(), id);
    }

    #[test]
    fn split_too_small_errors() {
        let mut win = Window::new("main", Size::new(4, 24), Box::new(NullRunner));
        let err = win.split(Orientation::LeftRight, None, false, true, Box::new(NullRunner));
        assert!(matches!(err, Err(MuxError::LayoutTooSmall)));
    }

    #[test]
    fn remove_pane_falls_back_to_remaining_pane() {
        let mut win = Window::new("main", Size::new(80, 24), Box::new(NullRunner));
        let second = win.split(Orientation::LeftRight, None, false, true, Box::new(NullRunner)).unwrap();
        win.remove_pane(second);
        assert_eq!(win.panes.len(), 1);
        assert_eq!(win.active_pane_id(), 1);
    }
}
