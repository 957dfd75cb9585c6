// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The command interpreter (spec §4.5): parses a command line and executes it against
//! a [`Mux`], mutating windows/panes/keymap/options directly.
//!
//! Grounded on `pty_mux::mux::PTYMux`'s dispatch from a keybinding to a mutating method
//! call on its `Vec<Process>` — this module is the generalized form of that dispatch,
//! driven by a parsed command string rather than a fixed `match` over key codes,
//! since the keymap here can bind arbitrary command strings (`bind-key`).
//!
//! A failed command never propagates as a [`crate::error::MuxError`] — per spec §7, the
//! interpreter captures the failure as a `String` instead, matching how
//! `ProcessManager` logs and continues past a single process's problems rather than
//! tearing down the whole session.

pub mod parser;

use crate::geometry::Size;
use crate::keymap::Binding;
use crate::layout::{Direction, Orientation};
use crate::mux::Mux;
use crate::window::Window;
use parser::{parse_command, OptionValue, ParsedCommand};

const VALUE_OPTIONS: &[&str] = &["l", "p", "x", "y", "N"];

/// Run one command line against `mux`. Returns `Ok(Some(text))` for commands that
/// produce output (`list-keys`, `list-windows`), `Ok(None)` otherwise, `Err(message)`
/// on any user or capacity error (spec §7).
pub fn execute(mux: &mut Mux, line: &str) -> Result<Option<String>, String> {
    let cmd = parse_command(line, VALUE_OPTIONS).map_err(|e| e.to_string())?;
    if cmd.name.is_empty() {
        return Ok(None);
    }
    match canonical(&cmd.name) {
        "send-prefix" => send_prefix(mux).map(|()| None),
        "split-window" => split_window(mux, &cmd).map(|()| None),
        "select-pane" => select_pane(mux, &cmd).map(|()| None),
        "resize-pane" => resize_pane(mux, &cmd).map(|()| None),
        "display-panes" => {
            display_panes(mux);
            Ok(None)
        }
        "clock-mode" => clock_mode(mux).map(|()| None),
        "set-option" => set_option(mux, &cmd).map(|()| None),
        "bind-key" => bind_key(mux, &cmd).map(|()| None),
        "unbind-key" => unbind_key(mux, &cmd).map(|()| None),
        "list-keys" => Ok(Some(list_keys(mux))),
        "send-keys" => send_keys(mux, &cmd).map(|()| None),
        "new-window" => new_window(mux).map(|()| None),
        "next-window" => {
            switch_window(mux, 1);
            Ok(None)
        }
        "previous-window" => {
            switch_window(mux, -1);
            Ok(None)
        }
        "list-windows" => Ok(Some(list_windows(mux))),
        other => Err(format!("unknown command: {other}")),
    }
}

/// Abbreviated aliases, tmux-style (`splitw` for `split-window`, etc).
fn canonical(name: &str) -> &str {
    match name {
        "splitw" => "split-window",
        "selectp" => "select-pane",
        "resizep" => "resize-pane",
        "displayp" => "display-panes",
        "neww" => "new-window",
        "next" => "next-window",
        "prev" => "previous-window",
        "lsw" => "list-windows",
        "lsk" => "list-keys",
        "set" => "set-option",
        "bind" => "bind-key",
        "unbind" => "unbind-key",
        "send" => "send-keys",
        other => other,
    }
}

fn has_flag(cmd: &ParsedCommand, name: &str) -> bool {
    cmd.options.iter().any(|(k, _)| k == name)
}

fn option_value<'a>(cmd: &'a ParsedCommand, name: &str) -> Option<&'a str> {
    cmd.options.iter().find_map(|(k, v)| {
        (k == name).then_some(match v {
            OptionValue::Value(s) => s.as_str(),
            OptionValue::Flag => "",
        })
    })
}

fn direction_from_flags(cmd: &ParsedCommand) -> Result<Direction, String> {
    if has_flag(cmd, "U") {
        Ok(Direction::Up)
    } else if has_flag(cmd, "D") {
        Ok(Direction::Down)
    } else if has_flag(cmd, "L") {
        Ok(Direction::Left)
    } else if has_flag(cmd, "R") {
        Ok(Direction::Right)
    } else {
        Err("expected one of -U/-D/-L/-R".to_string())
    }
}

fn send_prefix(mux: &mut Mux) -> Result<(), String> {
    let prefix = mux.keymap.prefix().to_vec();
    let pane = mux.active_window_mut().active_pane_mut().ok_or("no active pane")?;
    pane.send_raw(&prefix).map_err(|e| e.to_string())
}

/// `split-window [-h|-v] [-b] [-d] [-l SIZE | -p PERCENT]` (spec §4.5). `-f` ("split
/// the whole window") is accepted but not given distinct geometry: the layout tree
/// only models splitting one leaf at a time (spec §4.3), so `-f` behaves the same as
/// splitting the active pane — see DESIGN.md.
fn split_window(mux: &mut Mux, cmd: &ParsedCommand) -> Result<(), String> {
    let orientation = if has_flag(cmd, "h") { Orientation::LeftRight } else { Orientation::TopBottom };
    let before = has_flag(cmd, "b");
    let make_active = !has_flag(cmd, "d");

    let active_rect = mux
        .active_window()
        .active_pane()
        .map(|p| p.rect)
        .ok_or("no active pane")?;
    let total = match orientation {
        Orientation::LeftRight => active_rect.width,
        Orientation::TopBottom => active_rect.height,
    };

    let size = if let Some(l) = option_value(cmd, "l") {
        Some(l.parse::<u16>().map_err(|_| "invalid -l size".to_string())?)
    } else if let Some(p) = option_value(cmd, "p") {
        let pct: u32 = p.parse().map_err(|_| "invalid -p percent".to_string())?;
        Some(((u32::from(total) * pct) / 100) as u16)
    } else {
        None
    };

    // The runner doesn't know its final rect yet; `Window::split` resyncs every
    // pane's size (and its runner's) right after placing the new leaf.
    let placeholder = Size::new(active_rect.width, active_rect.height);
    let runner = mux.spawn_runner(placeholder).map_err(|e| e.to_string())?;
    mux.active_window_mut()
        .split(orientation, size, before, make_active, runner)
        .map_err(|e| e.to_string())
}

fn select_pane(mux: &mut Mux, cmd: &ParsedCommand) -> Result<(), String> {
    let direction = direction_from_flags(cmd)?;
    mux.active_window_mut().select(direction);
    Ok(())
}

/// `resize-pane [-U|-D|-L|-R] [-x W] [-y H] [ADJUST]` (spec §4.5).
fn resize_pane(mux: &mut Mux, cmd: &ParsedCommand) -> Result<(), String> {
    if let Some(x) = option_value(cmd, "x") {
        let width: u16 = x.parse().map_err(|_| "invalid -x width".to_string())?;
        mux.active_window_mut().resize_to(Orientation::LeftRight, width);
        return Ok(());
    }
    if let Some(y) = option_value(cmd, "y") {
        let height: u16 = y.parse().map_err(|_| "invalid -y height".to_string())?;
        mux.active_window_mut().resize_to(Orientation::TopBottom, height);
        return Ok(());
    }
    let direction = direction_from_flags(cmd)?;
    let adjust: i32 = cmd.positionals.first().and_then(|s| s.parse().ok()).unwrap_or(1);
    mux.active_window_mut().resize(direction, adjust);
    Ok(())
}

fn display_panes(mux: &mut Mux) {
    mux.identify_until = Some(std::time::Instant::now() + mux.config.identify_duration);
}

/// `clock-mode` (spec §4.5): toggles the active pane, matching the real tmux binding
/// it's modeled on (press again to leave clock mode).
fn clock_mode(mux: &mut Mux) -> Result<(), String> {
    let pane = mux.active_window_mut().active_pane_mut().ok_or("no active pane")?;
    pane.clock_mode = !pane.clock_mode;
    Ok(())
}

fn set_option(mux: &mut Mux, cmd: &ParsedCommand) -> Result<(), String> {
    let name = cmd.positionals.first().ok_or("set-option requires NAME")?.clone();
    let value = cmd.positionals.get(1).cloned().unwrap_or_default();
    mux.options.set(&name, &value);
    if name == "prefix" {
        mux.keymap.set_prefix(value.as_bytes());
    }
    Ok(())
}

fn bind_key(mux: &mut Mux, cmd: &ParsedCommand) -> Result<(), String> {
    let key = cmd.positionals.first().ok_or("bind-key requires KEY")?.clone();
    let rest = cmd.positionals[1..].join(" ");
    if rest.is_empty() {
        return Err("bind-key requires a command string".to_string());
    }
    mux.keymap.bind(key.as_bytes(), rest);
    Ok(())
}

fn unbind_key(mux: &mut Mux, cmd: &ParsedCommand) -> Result<(), String> {
    let key = cmd.positionals.first().ok_or("unbind-key requires KEY")?;
    mux.keymap.unbind(key.as_bytes());
    Ok(())
}

/// `list-keys` (spec §4.5): `bind-key -T prefix KEY CMD` lines, sorted.
fn list_keys(mux: &Mux) -> String {
    let prefix_len = mux.keymap.prefix().len();
    mux.keymap
        .list_keys()
        .into_iter()
        .map(|(key, binding)| {
            let suffix = &key[prefix_len.min(key.len())..];
            format!("bind-key -T prefix {} {}", format_key(suffix), format_binding(&binding))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_key(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii_graphic() { (b as char).to_string() } else { format!("\\x{b:02x}") })
        .collect()
}

fn format_binding(binding: &Binding) -> String {
    match binding {
        Binding::Command(cmd) => cmd.clone(),
        Binding::Discard => "discard".to_string(),
        Binding::SelfInsert => "self-insert".to_string(),
        Binding::Mouse => "mouse".to_string(),
    }
}

/// `send-keys [-l] [-N N] KEY…` (spec §4.5): inject into the active pane's
/// master-input, bypassing the line discipline (mirroring `Pane::send_raw`).
fn send_keys(mux: &mut Mux, cmd: &ParsedCommand) -> Result<(), String> {
    let literal = has_flag(cmd, "l");
    let repeat: usize = option_value(cmd, "N").and_then(|n| n.parse().ok()).unwrap_or(1).max(1);
    let pane = mux.active_window_mut().active_pane_mut().ok_or("no active pane")?;
    for _ in 0..repeat {
        for token in &cmd.positionals {
            let bytes = if literal { token.as_bytes().to_vec() } else { translate_key_name(token) };
            pane.send_raw(&bytes).map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

/// Translate a `send-keys` key name (`Enter`, `C-c`, `Up`, or a literal character)
/// into the raw bytes a real keyboard would have sent.
fn translate_key_name(token: &str) -> Vec<u8> {
    match token {
        "Enter" => return vec![b'\r'],
        "Tab" => return vec![0x09],
        "Escape" | "Esc" => return vec![0x1B],
        "Space" => return vec![b' '],
        "BSpace" => return vec![0x7F],
        "Up" => return vec![0x1B, b'[', b'A'],
        "Down" => return vec![0x1B, b'[', b'B'],
        "Right" => return vec![0x1B, b'[', b'C'],
        "Left" => return vec![0x1B, b'[', b'D'],
        _ => {}
    }
    if let Some(rest) = token.strip_prefix("C-") {
        if let Some(c) = rest.chars().next() {
            return vec![(c.to_ascii_uppercase() as u8) & 0x1F];
        }
    }
    if let Some(rest) = token.strip_prefix("M-") {
        if let Some(c) = rest.chars().next() {
            let mut buf = [0u8; 4];
            let mut bytes = vec![0x1B];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            return bytes;
        }
    }
    token.as_bytes().to_vec()
}

fn new_window(mux: &mut Mux) -> Result<(), String> {
    let size = mux.content_size;
    let runner = mux.spawn_runner(size).map_err(|e| e.to_string())?;
    let name = format!("window-{}", mux.windows.len());
    mux.windows.push(Window::new(name, size, runner));
    mux.active_window = mux.windows.len() - 1;
    Ok(())
}

fn switch_window(mux: &mut Mux, delta: i32) {
    let len = mux.windows.len() as i32;
    if len == 0 {
        return;
    }
    let next = (mux.active_window as i32 + delta).rem_euclid(len);
    mux.active_window = next as usize;
}

fn list_windows(mux: &Mux) -> String {
    mux.windows
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let marker = if i == mux.active_window { " (active)" } else { "" };
            format!("{}: {} [{} panes]{}", i, w.name, w.panes.len(), marker)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MuxConfig;
    use crate::linedisc::Signal;
    use crate::pane::Runner;

    #[derive(Debug, Default)]
    struct NullRunner;
    impl Runner for NullRunner {
        fn write_bytes(&mut self, _bytes: &[u8]) -> std::io::Result<()> { Ok(()) }
        fn read_bytes(&mut self) -> std::io::Result<Vec<u8>> { Ok(Vec::new()) }
        fn resize(&mut self, _size: Size) -> std::io::Result<()> { Ok(()) }
        fn raise(&mut self, _signal: Signal) -> std::io::Result<()> { Ok(()) }
    }

    fn test_mux() -> Mux {
        Mux::builder()
            .config(MuxConfig::default())
            .size(Size::new(80, 24))
            .build(Box::new(|_size| Ok(Box::new(NullRunner) as Box<dyn Runner>)))
            .unwrap()
    }

    #[test]
    fn split_window_adds_pane() {
        let mut mux = test_mux();
        execute(&mut mux, "split-window -h").unwrap();
        assert_eq!(mux.active_window().panes.len(), 2);
    }

    #[test]
    fn split_window_dash_d_keeps_original_active() {
        let mut mux = test_mux();
        let original = mux.active_window().active_pane_id();
        execute(&mut mux, "split-window -v -d").unwrap();
        assert_eq!(mux.active_window().active_pane_id(), original);
    }

    #[test]
    fn select_pane_requires_a_direction_flag() {
        let mut mux = test_mux();
        let err = execute(&mut mux, "select-pane").unwrap_err();
        assert!(err.contains("-U/-D/-L/-R"));
    }

    #[test]
    fn set_option_prefix_rewrites_keymap() {
        let mut mux = test_mux();
        execute(&mut mux, "set-option prefix \u{2}").unwrap();
        assert_eq!(mux.keymap.prefix(), b"\x02");
    }

    #[test]
    fn bind_key_then_list_keys_round_trips() {
        let mut mux = test_mux();
        execute(&mut mux, "bind-key x display-panes").unwrap();
        let out = execute(&mut mux, "list-keys").unwrap().unwrap();
        assert!(out.contains("bind-key -T prefix x display-panes"));
    }

    #[test]
    fn new_window_and_next_window_cycle() {
        let mut mux = test_mux();
        execute(&mut mux, "new-window").unwrap();
        assert_eq!(mux.windows.len(), 2);
        assert_eq!(mux.active_window, 1);
        execute(&mut mux, "next-window").unwrap();
        assert_eq!(mux.active_window, 0);
    }

    #[test]
    fn unknown_command_is_a_plain_error_string() {
        let mut mux = test_mux();
        let err = execute(&mut mux, "frobnicate").unwrap_err();
        assert!(err.contains("frobnicate"));
    }

    #[test]
    fn send_keys_literal_writes_raw_bytes() {
        use std::sync::{Arc, Mutex};
        #[derive(Debug, Default)]
        struct CapturingRunner(Arc<Mutex<Vec<u8>>>);
        impl Runner for CapturingRunner {
            fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
                self.0.lock().unwrap().extend_from_slice(bytes);
                Ok(())
            }
            fn read_bytes(&mut self) -> std::io::Result<Vec<u8>> { Ok(Vec::new()) }
            fn resize(&mut self, _size: Size) -> std::io::Result<()> { Ok(()) }
            fn raise(&mut self, _signal: Signal) -> std::io::Result<()> { Ok(()) }
        }
        let captured = Arc::new(Mutex::new(Vec::new()));
        let captured2 = captured.clone();
        let mux = Mux::builder()
            .config(MuxConfig::default())
            .size(Size::new(80, 24))
            .build(Box::new(move |_size| Ok(Box::new(CapturingRunner(captured2.clone())) as Box<dyn Runner>)));
        let mut mux = mux.unwrap();
        execute(&mut mux, "send-keys -l hi").unwrap();
        assert_eq!(&*captured.lock().unwrap(), b"hi");
    }
}
