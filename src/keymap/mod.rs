// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The prefix-keyed trie keymap (spec §3 "KeyMap", §4.4).

pub mod binding;
pub mod defaults;
pub mod trie;

pub use binding::Binding;
pub use trie::{BindingReader, ReadOutcome, Trie};

/// A window- (really process-) wide keymap: the trie plus the prefix bytes it was
/// built from, so `set-option prefix` can rewrite it in place (spec §4.4).
#[derive(Debug, Clone)]
pub struct KeyMap {
    trie: Trie,
    prefix: Vec<u8>,
}

impl KeyMap {
    #[must_use]
    pub fn new(prefix: &[u8]) -> Self {
        Self { trie: defaults::build(prefix), prefix: prefix.to_vec() }
    }

    #[must_use]
    pub fn trie(&self) -> &Trie { &self.trie }

    #[must_use]
    pub fn prefix(&self) -> &[u8] { &self.prefix }

    /// Rebind the prefix: every existing binding keeps its semantics under the new
    /// prefix bytes (spec §4.4).
    pub fn set_prefix(&mut self, new_prefix: &[u8]) {
        self.trie.rebind_prefix(&self.prefix, new_prefix);
        self.prefix = new_prefix.to_vec();
    }

    /// `bind-key KEY CMD…` (spec §4.5): binds `prefix + key` to a command string.
    pub fn bind(&mut self, key: &[u8], command: String) {
        let mut full = self.prefix.clone();
        full.extend_from_slice(key);
        self.trie.insert(&full, Binding::Command(command));
    }

    /// `unbind-key KEY` (spec §4.5): replaces `prefix + key`'s binding with `Discard`.
    pub fn unbind(&mut self, key: &[u8]) {
        let mut full = self.prefix.clone();
        full.extend_from_slice(key);
        self.trie.unbind(&full);
    }

    /// `list-keys` (spec §4.5): bindings bound under the configured prefix, sorted.
    #[must_use]
    pub fn list_keys(&self) -> Vec<(Vec<u8>, Binding)> {
        let mut entries: Vec<_> = self
            .trie
            .entries()
            .into_iter()
            .filter(|(key, binding)| key.starts_with(&self.prefix) && *binding != Binding::Discard)
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_prefix_moves_bindings() {
        let mut km = KeyMap::new(b"`");
        km.set_prefix(b"\x02");
        assert_eq!(km.trie().get(b"\x02\""), Some(&Binding::Command("split-window -v".into())));
        assert_eq!(km.trie().get(b"`\""), None);
    }

    #[test]
    fn bind_and_unbind_key() {
        let mut km = KeyMap::new(b"`");
        km.bind(b"x", "display-panes".into());
        assert_eq!(km.trie().get(b"`x"), Some(&Binding::Command("display-panes".into())));
        km.unbind(b"x");
        assert_eq!(km.trie().get(b"`x"), Some(&Binding::Discard));
    }

    #[test]
    fn list_keys_excludes_discarded_chords() {
        let km = KeyMap::new(b"`");
        let keys = km.list_keys();
        assert!(keys.iter().any(|(k, _)| k == b"`\""));
        assert!(!keys.iter().any(|(_, b)| *b == Binding::Discard));
    }
}
