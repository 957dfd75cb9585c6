// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Tunables and server options (spec §3 "Server Options", §9 "no ambient globals").
//!
//! Nothing here is read from a config file — `MuxConfig` is built once, explicitly,
//! and passed into [`crate::mux::Mux::builder`]; `ServerOptions` is seeded from
//! [`DEFAULT_OPTIONS`] and mutated only through `set-option`.

use std::collections::BTreeMap;
use std::time::Duration;

/// Process-wide tunables, set once at startup.
#[derive(Debug, Clone)]
pub struct MuxConfig {
    /// Minimum pane dimension along either axis (spec §3 `PANE_MINIMUM`).
    pub pane_minimum: u16,
    /// How long the keymap waits for an ambiguous prefix to resolve (spec §4.4).
    pub escape_timeout: Duration,
    /// How long the identify overlay stays up (spec §4.5 `display-panes`).
    pub identify_duration: Duration,
    /// Clock-mode tick interval (spec §4.7).
    pub clock_tick: Duration,
    /// Rows reserved for the status bar at the bottom of each window.
    pub status_bar_height: u16,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            pane_minimum: 3,
            escape_timeout: Duration::from_millis(100),
            identify_duration: Duration::from_secs(1),
            clock_tick: Duration::from_secs(1),
            status_bar_height: 1,
        }
    }
}

/// The seed values for a fresh `ServerOptions` dictionary (spec §3).
pub const DEFAULT_OPTIONS: &[(&str, &str)] = &[("prefix", "`")];

/// A process-wide string-keyed option dictionary (spec §3 "Server Options").
///
/// `prefix` is the canonical entry: the translated key sequence that introduces a
/// command chord (spec §4.4). Rewriting it via `set-option` does not, by itself,
/// rewrite the keymap — the command interpreter does that as a coupled step.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    values: BTreeMap<String, String>,
}

impl Default for ServerOptions {
    fn default() -> Self { Self::new() }
}

impl ServerOptions {
    #[must_use]
    pub fn new() -> Self {
        let values = DEFAULT_OPTIONS
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { values }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> { self.values.get(name).map(String::as_str) }

    pub fn set(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    #[must_use]
    pub fn prefix(&self) -> &str { self.get("prefix").unwrap_or("`") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_seed_prefix() {
        let opts = ServerOptions::new();
        assert_eq!(opts.prefix(), "`");
    }

    #[test]
    fn set_overrides_default() {
        let mut opts = ServerOptions::new();
        opts.set("prefix", "\u{2}");
        assert_eq!(opts.prefix(), "\u{2}");
    }
}
