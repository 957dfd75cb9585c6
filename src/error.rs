// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Error types for `panemux`.
//!
//! Library operations return [`MuxError`] via [`MuxResult`]; the binary entry point and
//! other top-level callers wrap it in [`miette::Result`] for fancy diagnostic
//! rendering. Per-command failures (§7 "User error" / "Capacity error" in the spec)
//! never reach this layer — the command interpreter captures them as plain `String`
//! messages on the issuing command's error stream instead of propagating a `Result`.

/// Convenience alias for fallible library operations.
pub type MuxResult<T> = Result<T, MuxError>;

/// Errors raised by `panemux`'s library operations.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum MuxError {
    /// A split or resize would have shrunk a pane below [`crate::layout::PANE_MINIMUM`].
    #[error("pane too small to split")]
    #[diagnostic(code(panemux::layout::too_small))]
    LayoutTooSmall,

    /// Parsing a dumped layout string (§4.3, §6) failed.
    #[error("bad layout: {0}")]
    #[diagnostic(code(panemux::layout::parse))]
    LayoutParse(#[from] LayoutParseError),

    /// A command referenced a pane id that no longer exists.
    #[error("no such pane: {0}")]
    #[diagnostic(code(panemux::pane::not_found))]
    NoSuchPane(u32),

    /// A command referenced a window index that doesn't exist.
    #[error("no such window: {0}")]
    #[diagnostic(code(panemux::window::not_found))]
    NoSuchWindow(usize),

    /// Spawning a pane's runner process failed.
    #[error("failed to spawn runner: {0}")]
    #[diagnostic(code(panemux::pane::spawn))]
    PaneSpawn(#[source] std::io::Error),

    /// Fatal host-terminal I/O (§7 "Fatal host I/O"): read/write to the host failed.
    #[error("host terminal I/O error: {0}")]
    #[diagnostic(code(panemux::host::io))]
    Io(#[from] std::io::Error),
}

/// Typed reasons a dumped layout string can fail to parse (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum LayoutParseError {
    /// The payload didn't match the `sxxxsy,xoff,yoff,...` grammar.
    #[error("bad syntax")]
    #[diagnostic(code(panemux::layout::bad_syntax))]
    BadSyntax,

    /// The leading 4 hex digit checksum didn't match the payload.
    #[error("bad checksum")]
    #[diagnostic(code(panemux::layout::bad_checksum))]
    BadChecksum,

    /// A `[` or `{` was never closed, or a `]`/`}` had no opener.
    #[error("unmatched bracket")]
    #[diagnostic(code(panemux::layout::unmatched_bracket))]
    UnmatchedBracket,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_parse_error_converts_into_mux_error() {
        let err: MuxError = LayoutParseError::BadChecksum.into();
        assert!(matches!(err, MuxError::LayoutParse(LayoutParseError::BadChecksum)));
    }

    #[test]
    fn mux_error_display_is_human_readable() {
        let err = MuxError::NoSuchPane(7);
        assert_eq!(err.to_string(), "no such pane: 7");
    }
}
