// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! `select-pane -L/-R/-U/-D` target selection (spec §4.5, §9 Open Question).
//!
//! Among panes whose spans overlap the active pane on the perpendicular axis and
//! differ on the primary axis, pick the one minimizing wrap-around distance on the
//! primary axis, breaking ties by most-recently-active generation.

use crate::geometry::Rect;
use crate::layout::tree::{LayoutTree, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

fn leaf_rect(tree: &LayoutTree, id: NodeId) -> Rect {
    let size = tree.size(id);
    let offset = tree.offset(id);
    Rect::new(offset.x, offset.y, size.cols, size.rows)
}

/// Pick the next active leaf in `direction` from `active`, given each candidate's
/// most-recently-active `generation` (higher = more recent, used as the tiebreaker).
/// `root_size` bounds the wrap-around arithmetic along the primary axis.
#[must_use]
pub fn select(
    tree: &LayoutTree,
    active: NodeId,
    direction: Direction,
    generation_of: impl Fn(NodeId) -> u64,
) -> Option<NodeId> {
    let active_rect = leaf_rect(tree, active);
    let root_size = tree.size(tree.root());
    let span = match direction {
        Direction::Left | Direction::Right => root_size.cols,
        Direction::Up | Direction::Down => root_size.rows,
    };

    let mut best: Option<(u16, u64, NodeId)> = None;
    for candidate in tree.leaves() {
        if candidate == active {
            continue;
        }
        let rect = leaf_rect(tree, candidate);
        let perpendicular_overlaps = match direction {
            Direction::Left | Direction::Right => active_rect.row_overlaps(&rect),
            Direction::Up | Direction::Down => active_rect.col_overlaps(&rect),
        };
        if !perpendicular_overlaps {
            continue;
        }

        let (active_primary, candidate_primary) = match direction {
            Direction::Left => (active_rect.left, rect.left),
            Direction::Right => (active_rect.left, rect.left),
            Direction::Up => (active_rect.top, rect.top),
            Direction::Down => (active_rect.top, rect.top),
        };
        if active_primary == candidate_primary {
            continue;
        }

        // Wrap-around distance: moving Right/Down measures forward distance (wrapping
        // past the far edge back to 0); Left/Up measures the reverse.
        let distance = match direction {
            Direction::Right | Direction::Down => {
                if candidate_primary > active_primary {
                    candidate_primary - active_primary
                } else {
                    candidate_primary + span - active_primary
                }
            }
            Direction::Left | Direction::Up => {
                if candidate_primary < active_primary {
                    active_primary - candidate_primary
                } else {
                    active_primary + span - candidate_primary
                }
            }
        };

        let generation = generation_of(candidate);
        let better = match best {
            None => true,
            Some((best_dist, best_gen, _)) => {
                distance < best_dist || (distance == best_dist && generation > best_gen)
            }
        };
        if better {
            best = Some((distance, generation, candidate));
        }
    }
    best.map(|(_, _, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::layout::tree::Orientation;

    #[test]
    fn selects_pane_to_the_right() {
        let mut tree = LayoutTree::new_single_leaf(1, Size::new(80, 23));
        let p2 = tree.split(tree.root(), Orientation::LeftRight, Some(40), false, 2).unwrap();
        let p1 = tree.children(tree.root())[0];
        let chosen = select(&tree, p1, Direction::Right, |_| 0).unwrap();
        assert_eq!(chosen, p2);
    }

    #[test]
    fn left_then_right_returns_to_origin() {
        let mut tree = LayoutTree::new_single_leaf(1, Size::new(80, 23));
        let p2 = tree.split(tree.root(), Orientation::LeftRight, Some(40), false, 2).unwrap();
        let p1 = tree.children(tree.root())[0];
        let right = select(&tree, p1, Direction::Right, |_| 0).unwrap();
        let back = select(&tree, right, Direction::Left, |_| 0).unwrap();
        assert_eq!(back, p1);
    }

    #[test]
    fn no_candidate_returns_none() {
        let tree = LayoutTree::new_single_leaf(1, Size::new(80, 23));
        assert!(select(&tree, tree.root(), Direction::Left, |_| 0).is_none());
    }
}
