// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A trie over input byte sequences, plus the longest-match-with-timeout reader that
//! sits on top of it (spec §3 "KeyMap", §4.4).

use crate::keymap::binding::Binding;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
struct TrieNode {
    children: BTreeMap<u8, TrieNode>,
    binding: Option<Binding>,
}

/// A byte-sequence trie mapping key chords to [`Binding`]s.
#[derive(Debug, Default, Clone)]
pub struct Trie {
    root: TrieNode,
}

impl Trie {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, key: &[u8], binding: Binding) {
        let mut node = &mut self.root;
        for &byte in key {
            node = node.children.entry(byte).or_default();
        }
        node.binding = Some(binding);
    }

    /// Replace `key`'s binding with [`Binding::Discard`] (spec §4.5 `unbind-key`).
    pub fn unbind(&mut self, key: &[u8]) { self.insert(key, Binding::Discard); }

    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&Binding> {
        self.find_node(key).and_then(|n| n.binding.as_ref())
    }

    /// Whether any bound key is a strict extension of `key` (i.e. reading more bytes
    /// could still change the outcome).
    #[must_use]
    pub fn has_longer(&self, key: &[u8]) -> bool {
        self.find_node(key).is_some_and(|n| !n.children.is_empty())
    }

    fn find_node(&self, key: &[u8]) -> Option<&TrieNode> {
        let mut node = &self.root;
        for &byte in key {
            node = node.children.get(&byte)?;
        }
        Some(node)
    }

    /// Every bound `(key, binding)` pair, for `list-keys` and prefix rebinding.
    #[must_use]
    pub fn entries(&self) -> Vec<(Vec<u8>, Binding)> {
        let mut out = Vec::new();
        Self::collect(&self.root, &mut Vec::new(), &mut out);
        out
    }

    fn collect(node: &TrieNode, prefix: &mut Vec<u8>, out: &mut Vec<(Vec<u8>, Binding)>) {
        if let Some(binding) = &node.binding {
            out.push((prefix.clone(), binding.clone()));
        }
        for (&byte, child) in &node.children {
            prefix.push(byte);
            Self::collect(child, prefix, out);
            prefix.pop();
        }
    }

    /// Rewrite every binding whose key begins with `old_prefix` to begin with
    /// `new_prefix` instead, preserving the remaining suffix and semantics (spec
    /// §4.4 `set-option prefix`).
    pub fn rebind_prefix(&mut self, old_prefix: &[u8], new_prefix: &[u8]) {
        let entries = self.entries();
        let mut rebuilt = Trie::new();
        for (key, binding) in entries {
            if key.starts_with(old_prefix) {
                let mut new_key = new_prefix.to_vec();
                new_key.extend_from_slice(&key[old_prefix.len()..]);
                rebuilt.insert(&new_key, binding);
            } else {
                rebuilt.insert(&key, binding);
            }
        }
        *self = rebuilt;
    }
}

/// What the reader decided about a pending byte sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `bytes` resolved to `binding`.
    Matched { bytes: Vec<u8>, binding: Binding },
}

/// The stateful longest-match-with-timeout reader described in spec §4.4: feed it
/// host bytes one at a time; an unambiguous match resolves immediately, an ambiguous
/// one waits for [`Self::resolve_timeout`] to be called by the scheduler's escape
/// timer.
#[derive(Debug, Default)]
pub struct BindingReader {
    pending: Vec<u8>,
}

impl BindingReader {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn is_pending(&self) -> bool { !self.pending.is_empty() }

    /// Feed one byte from the host. Returns `Some` when the chord resolves
    /// immediately (unambiguous match, or a byte that can't start/extend any bound
    /// sequence).
    pub fn feed(&mut self, trie: &Trie, byte: u8) -> Option<ReadOutcome> {
        self.pending.push(byte);
        let exact = trie.get(&self.pending).cloned();
        let has_longer = trie.has_longer(&self.pending);

        if has_longer {
            // Ambiguous: could still extend. Wait for more bytes or a timeout.
            return None;
        }

        if let Some(binding) = exact {
            let bytes = std::mem::take(&mut self.pending);
            return Some(ReadOutcome::Matched { bytes, binding });
        }

        if self.pending.len() == 1 {
            let bytes = std::mem::take(&mut self.pending);
            return Some(ReadOutcome::Matched { bytes, binding: Binding::SelfInsert });
        }

        // A multi-byte prefix that matched partway then dead-ended: the configured
        // default for an unrecognized prefix chord is Discard (spec §4.4).
        let bytes = std::mem::take(&mut self.pending);
        Some(ReadOutcome::Matched { bytes, binding: Binding::Discard })
    }

    /// Called by the scheduler when the escape timeout elapses while ambiguous: fire
    /// the longest match found so far, or treat the pending bytes as self-insert data
    /// if no prefix matched at all.
    pub fn resolve_timeout(&mut self, trie: &Trie) -> Option<ReadOutcome> {
        if self.pending.is_empty() {
            return None;
        }
        // Walk backward from the full pending sequence to find the longest bound
        // prefix; any unmatched trailing bytes are treated as a fresh SelfInsert (the
        // rare case where a partial chord times out mid-arrow-sequence, etc).
        for len in (1..=self.pending.len()).rev() {
            if let Some(binding) = trie.get(&self.pending[..len]) {
                let matched = self.pending[..len].to_vec();
                self.pending.drain(..len);
                return Some(ReadOutcome::Matched { bytes: matched, binding: binding.clone() });
            }
        }
        let bytes = std::mem::take(&mut self.pending);
        Some(ReadOutcome::Matched { bytes, binding: Binding::SelfInsert })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_byte_resolves_to_self_insert_immediately() {
        let trie = Trie::new();
        let mut reader = BindingReader::new();
        let outcome = reader.feed(&trie, b'x').unwrap();
        assert_eq!(
            outcome,
            ReadOutcome::Matched { bytes: vec![b'x'], binding: Binding::SelfInsert }
        );
    }

    #[test]
    fn unambiguous_two_byte_chord_resolves_on_second_byte() {
        let mut trie = Trie::new();
        trie.insert(b"`\"", Binding::Command("split-window -v".into()));
        let mut reader = BindingReader::new();
        assert!(reader.feed(&trie, b'`').is_none());
        let outcome = reader.feed(&trie, b'"').unwrap();
        assert_eq!(
            outcome,
            ReadOutcome::Matched {
                bytes: b"`\"".to_vec(),
                binding: Binding::Command("split-window -v".into())
            }
        );
    }

    #[test]
    fn ambiguous_prefix_resolves_via_timeout_to_shorter_match() {
        let mut trie = Trie::new();
        trie.insert(b"`", Binding::Discard);
        trie.insert(b"`q", Binding::Command("display-panes".into()));
        let mut reader = BindingReader::new();
        assert!(reader.feed(&trie, b'`').is_none());
        let outcome = reader.resolve_timeout(&trie).unwrap();
        assert_eq!(outcome, ReadOutcome::Matched { bytes: b"`".to_vec(), binding: Binding::Discard });
    }

    #[test]
    fn rebind_prefix_preserves_suffixes() {
        let mut trie = Trie::new();
        trie.insert(b"`\"", Binding::Command("split-window -v".into()));
        trie.insert(b"`%", Binding::Command("split-window -h".into()));
        trie.rebind_prefix(b"`", b"\x02"); // ^B
        assert_eq!(trie.get(b"\x02\""), Some(&Binding::Command("split-window -v".into())));
        assert_eq!(trie.get(b"`\""), None);
    }
}
