// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The value a key-map trie entry resolves to (spec §3 "KeyMap", §4.4).

/// What a matched byte sequence means for the input loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Not a chord: pass the byte(s) to the active pane as typed data.
    SelfInsert,
    /// A recognized-but-unbound prefix chord: swallow it silently.
    Discard,
    /// The terminal's mouse-report lead sequence: the compositor reads the full
    /// report off the host next.
    Mouse,
    /// A command string to hand to the interpreter (spec §4.5).
    Command(String),
}
