// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Textual layout dump/parse with checksum (spec §4.3, §6).
//!
//! Grammar: `CCCC,<node>` where `CCCC` is a 4-hex-digit checksum of `<node>`, and
//! `<node>` is `{sx}x{sy},{xoff},{yoff}` followed by `,0` for a leaf, `[c1,c2,…]` for
//! a `TopBottom` split, or `{c1,c2,…}` for a `LeftRight` split.

use crate::error::LayoutParseError;
use crate::geometry::{Pos, Size};
use crate::layout::tree::{LayoutTree, NodeId, Orientation};

/// The checksum used by the layout format: a 16-bit accumulator, rotated right one
/// bit before each byte is added (spec §4.3).
#[must_use]
pub fn checksum(payload: &str) -> u16 {
    let mut acc: u16 = 0;
    for byte in payload.bytes() {
        acc = acc.rotate_right(1);
        acc = acc.wrapping_add(u16::from(byte));
    }
    acc
}

/// Render `tree` in the textual format, with its leading checksum.
#[must_use]
pub fn dump(tree: &LayoutTree) -> String {
    let payload = dump_node(tree, tree.root());
    format!("{:04x},{}", checksum(&payload), payload)
}

fn dump_node(tree: &LayoutTree, id: NodeId) -> String {
    let size = tree.size(id);
    let offset = tree.offset(id);
    let head = format!("{}x{},{},{}", size.cols, size.rows, offset.x, offset.y);
    if tree.is_leaf(id) {
        format!("{head},0")
    } else {
        let (open, close) = match tree.orientation(id).unwrap() {
            Orientation::TopBottom => ('[', ']'),
            Orientation::LeftRight => ('{', '}'),
        };
        let children: Vec<String> =
            tree.children(id).iter().map(|&c| dump_node(tree, c)).collect();
        format!("{head}{open}{}{close}", children.join(","))
    }
}

/// Parse a dumped layout string back into a tree, assigning sequential leaf ids
/// starting at `first_pane_id` (ids aren't part of the format — spec §6).
pub fn parse(input: &str, first_pane_id: u32) -> Result<LayoutTree, LayoutParseError> {
    let (checksum_str, payload) = input.split_once(',').ok_or(LayoutParseError::BadSyntax)?;
    if checksum_str.len() != 4 {
        return Err(LayoutParseError::BadSyntax);
    }
    let want = u16::from_str_radix(checksum_str, 16).map_err(|_| LayoutParseError::BadSyntax)?;
    validate_brackets(payload)?;
    if checksum(payload) != want {
        return Err(LayoutParseError::BadChecksum);
    }

    let mut chars = payload.chars().peekable();
    let mut next_id = first_pane_id;
    let mut nodes = Vec::new();
    let root = parse_node(&mut chars, None, &mut nodes, &mut next_id)?;
    if chars.next().is_some() {
        return Err(LayoutParseError::BadSyntax);
    }
    Ok(LayoutTree::from_raw_nodes(nodes, root))
}

fn validate_brackets(payload: &str) -> Result<(), LayoutParseError> {
    let mut depth = 0i32;
    for ch in payload.chars() {
        match ch {
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(LayoutParseError::UnmatchedBracket);
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(LayoutParseError::UnmatchedBracket);
    }
    Ok(())
}

/// A node as reconstructed during parsing, before being folded into a [`LayoutTree`].
pub(crate) enum RawNode {
    Leaf { size: Size, offset: Pos, pane_id: u32 },
    Split { size: Size, offset: Pos, orientation: Orientation, children: Vec<usize> },
}

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

fn take_number(chars: &mut Chars) -> Result<u16, LayoutParseError> {
    let mut s = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            s.push(c);
            chars.next();
        } else {
            break;
        }
    }
    s.parse().map_err(|_| LayoutParseError::BadSyntax)
}

fn expect(chars: &mut Chars, expected: char) -> Result<(), LayoutParseError> {
    if chars.next() == Some(expected) { Ok(()) } else { Err(LayoutParseError::BadSyntax) }
}

fn parse_node(
    chars: &mut Chars,
    _parent: Option<usize>,
    nodes: &mut Vec<RawNode>,
    next_id: &mut u32,
) -> Result<usize, LayoutParseError> {
    let sx = take_number(chars)?;
    expect(chars, 'x')?;
    let sy = take_number(chars)?;
    expect(chars, ',')?;
    let xoff = take_number(chars)?;
    expect(chars, ',')?;
    let yoff = take_number(chars)?;
    expect(chars, ',')?;
    let size = Size::new(sx, sy);
    let offset = Pos::new(xoff, yoff);

    match chars.peek().copied() {
        Some('0') => {
            chars.next();
            let pane_id = *next_id;
            *next_id += 1;
            let idx = nodes.len();
            nodes.push(RawNode::Leaf { size, offset, pane_id });
            Ok(idx)
        }
        Some(open @ ('[' | '{')) => {
            chars.next();
            let (orientation, close) = if open == '[' {
                (Orientation::TopBottom, ']')
            } else {
                (Orientation::LeftRight, '}')
            };
            let idx = nodes.len();
            nodes.push(RawNode::Split { size, offset, orientation, children: Vec::new() });
            let mut children = Vec::new();
            loop {
                let child = parse_node(chars, Some(idx), nodes, next_id)?;
                children.push(child);
                match chars.peek().copied() {
                    Some(',') => {
                        chars.next();
                    }
                    Some(c) if c == close => {
                        chars.next();
                        break;
                    }
                    _ => return Err(LayoutParseError::BadSyntax),
                }
            }
            if let RawNode::Split { children: slot, .. } = &mut nodes[idx] {
                *slot = children;
            }
            Ok(idx)
        }
        _ => Err(LayoutParseError::BadSyntax),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tree::LayoutTree;

    #[test]
    fn round_trips_through_dump_and_parse() {
        let mut tree = LayoutTree::new_single_leaf(1, Size::new(80, 11));
        tree.split(tree.root(), Orientation::LeftRight, Some(20), false, 2).unwrap();
        let dumped = dump(&tree);
        let parsed = parse(&dumped, 10).unwrap();
        assert_eq!(dump(&parsed).split_once(',').unwrap().1, dumped.split_once(',').unwrap().1);
    }

    #[test]
    fn checksum_mismatch_is_rejected() {
        let mut tree = LayoutTree::new_single_leaf(1, Size::new(80, 11));
        let dumped = dump(&tree);
        let tampered = format!("ffff,{}", dumped.split_once(',').unwrap().1);
        assert_eq!(parse(&tampered, 1).unwrap_err(), LayoutParseError::BadChecksum);
    }

    #[test]
    fn unmatched_bracket_is_rejected() {
        let err = parse("0000,80x23,0,0[80x11,0,0,0", 1).unwrap_err();
        assert_eq!(err, LayoutParseError::UnmatchedBracket);
    }

    #[test]
    fn matches_scenario_s3_shape() {
        let mut tree = LayoutTree::new_single_leaf(1, Size::new(80, 23));
        tree.split(tree.root(), Orientation::TopBottom, None, false, 2).unwrap();
        let p2 = tree.children(tree.root())[1];
        tree.split(p2, Orientation::LeftRight, Some(20), false, 3).unwrap();
        let payload = dump(&tree).split_once(',').unwrap().1.to_string();
        assert_eq!(payload, "80x23,0,0[80x11,0,0,0,80x11,0,12{59x11,0,12,0,20x11,60,12,0}]");
    }
}
