// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Default binding table generation from a configured prefix (spec §4.4).

use crate::keymap::binding::Binding;
use crate::keymap::trie::Trie;

const ESC: u8 = 0x1B;

fn arrow_seq(letter: u8) -> Vec<u8> { vec![ESC, b'[', letter] }
fn ctrl_arrow_seq(letter: u8) -> Vec<u8> { vec![ESC, b'[', b'1', b';', b'5', letter] }
fn esc_arrow_seq(letter: u8) -> Vec<u8> { vec![ESC, ESC, b'[', letter] }

/// Build the default root trie for `prefix` (spec §4.4's exhaustive table).
#[must_use]
pub fn build(prefix: &[u8]) -> Trie {
    let mut trie = Trie::new();

    // Every unrecognized prefix chord silently swallows the extension byte.
    for b in 0u16..=255 {
        let mut key = prefix.to_vec();
        key.push(b as u8);
        trie.insert(&key, Binding::Discard);
    }

    let mut key = prefix.to_vec();
    key.extend_from_slice(prefix);
    trie.insert(&key, Binding::Command("send-prefix".into()));

    bind(&mut trie, prefix, &[b'"'], "split-window -v");
    bind(&mut trie, prefix, &[b'%'], "split-window -h");
    bind(&mut trie, prefix, &[b'q'], "display-panes");
    bind(&mut trie, prefix, &[b't'], "clock-mode");
    bind(&mut trie, prefix, &[b'c'], "new-window");
    bind(&mut trie, prefix, &[b'n'], "next-window");
    bind(&mut trie, prefix, &[b'p'], "previous-window");

    for (letter, direction) in [(b'A', "U"), (b'B', "D"), (b'C', "R"), (b'D', "L")] {
        bind(&mut trie, prefix, &arrow_seq(letter), &format!("select-pane -{direction}"));
        bind(&mut trie, prefix, &ctrl_arrow_seq(letter), &format!("resize-pane -{direction}"));
        bind(&mut trie, prefix, &esc_arrow_seq(letter), &format!("resize-pane -{direction}"));
    }

    trie
}

fn bind(trie: &mut Trie, prefix: &[u8], suffix: &[u8], command: &str) {
    let mut key = prefix.to_vec();
    key.extend_from_slice(suffix);
    trie.insert(&key, Binding::Command(command.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::trie::BindingReader;

    #[test]
    fn double_prefix_sends_prefix() {
        let trie = build(b"`");
        assert_eq!(trie.get(b"``"), Some(&Binding::Command("send-prefix".into())));
    }

    #[test]
    fn split_bindings_present() {
        let trie = build(b"`");
        assert_eq!(trie.get(b"`\""), Some(&Binding::Command("split-window -v".into())));
        assert_eq!(trie.get(b"`%"), Some(&Binding::Command("split-window -h".into())));
    }

    #[test]
    fn unbound_chord_byte_discards() {
        let trie = build(b"`");
        assert_eq!(trie.get(b"`z"), Some(&Binding::Discard));
    }

    #[test]
    fn plain_arrow_selects_pane() {
        let trie = build(b"`");
        let mut reader = BindingReader::new();
        for &b in b"`" {
            assert!(reader.feed(&trie, b).is_none());
        }
        for &b in &[0x1B, b'[', b'A'] {
            reader.feed(&trie, b);
        }
        assert_eq!(trie.get(b"`\x1b[A"), Some(&Binding::Command("select-pane -U".into())));
    }

    #[test]
    fn ctrl_arrow_resizes() {
        let trie = build(b"`");
        assert_eq!(
            trie.get(b"`\x1b[1;5A"),
            Some(&Binding::Command("resize-pane -U".into()))
        );
    }
}
