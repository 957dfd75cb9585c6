// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! SGR (Select Graphic Rendition) parameter application (spec §4.1).

use crate::cell::{Attrs, Rgb4};

const STANDARD_COLORS: [(u8, u8, u8); 8] = [
    (0x00, 0x00, 0x00), // black
    (0xCD, 0x00, 0x00), // red
    (0x00, 0xCD, 0x00), // green
    (0xCD, 0xCD, 0x00), // yellow
    (0x00, 0x00, 0xEE), // blue
    (0xCD, 0x00, 0xCD), // magenta
    (0x00, 0xCD, 0xCD), // cyan
    (0xE5, 0xE5, 0xE5), // white
];

const BRIGHT_COLORS: [(u8, u8, u8); 8] = [
    (0x7F, 0x7F, 0x7F),
    (0xFF, 0x00, 0x00),
    (0x00, 0xFF, 0x00),
    (0xFF, 0xFF, 0x00),
    (0x5C, 0x5C, 0xFF),
    (0xFF, 0x00, 0xFF),
    (0x00, 0xFF, 0xFF),
    (0xFF, 0xFF, 0xFF),
];

/// The 256-color xterm palette, quantized to 4 bits/channel as it's stored.
///
/// `pub(crate)` so the compositor can reuse it for the reverse lookup (nearest
/// 256-color index for a stored [`Rgb4`]) when emitting diffs to hosts that only
/// understand indexed color.
pub(crate) fn xterm_256(index: u8) -> Rgb4 {
    match index {
        0..=7 => {
            let (r, g, b) = STANDARD_COLORS[index as usize];
            Rgb4::from_rgb8(r, g, b)
        }
        8..=15 => {
            let (r, g, b) = BRIGHT_COLORS[index as usize - 8];
            Rgb4::from_rgb8(r, g, b)
        }
        16..=231 => {
            let i = index - 16;
            let r = i / 36;
            let g = (i % 36) / 6;
            let b = i % 6;
            let scale = |c: u8| if c == 0 { 0 } else { 55 + c * 40 };
            Rgb4::from_rgb8(scale(r), scale(g), scale(b))
        }
        232..=255 => {
            let level = 8 + (index - 232) * 10;
            Rgb4::from_rgb8(level, level, level)
        }
    }
}

/// Apply one SGR sub-sequence's parameters (already split on `;`/`:` into positional
/// groups) to `attrs`, advancing through multi-parameter forms (`38;5;n`, `38;2;r;g;b`)
/// as it goes.
pub fn apply(params: &[u16], attrs: &mut Attrs) {
    let mut i = 0;
    if params.is_empty() {
        *attrs = Attrs::default();
        return;
    }
    while i < params.len() {
        match params[i] {
            0 => *attrs = Attrs::default(),
            1 => attrs.bold = true,
            4 => attrs.underline = true,
            7 => attrs.inverse = true,
            22 => attrs.bold = false,
            24 => attrs.underline = false,
            27 => attrs.inverse = false,
            28 => attrs.conceal = false,
            8 => attrs.conceal = true,
            30..=37 => {
                let (r, g, b) = STANDARD_COLORS[(params[i] - 30) as usize];
                attrs.fg = Some(Rgb4::from_rgb8(r, g, b));
            }
            39 => attrs.fg = None,
            40..=47 => {
                let (r, g, b) = STANDARD_COLORS[(params[i] - 40) as usize];
                attrs.bg = Some(Rgb4::from_rgb8(r, g, b));
            }
            49 => attrs.bg = None,
            90..=97 => {
                let (r, g, b) = BRIGHT_COLORS[(params[i] - 90) as usize];
                attrs.fg = Some(Rgb4::from_rgb8(r, g, b));
            }
            100..=107 => {
                let (r, g, b) = BRIGHT_COLORS[(params[i] - 100) as usize];
                attrs.bg = Some(Rgb4::from_rgb8(r, g, b));
            }
            38 | 48 => {
                let is_fg = params[i] == 38;
                match params.get(i + 1) {
                    Some(5) => {
                        if let Some(&idx) = params.get(i + 2) {
                            let color = Some(xterm_256(idx as u8));
                            if is_fg { attrs.fg = color; } else { attrs.bg = color; }
                        }
                        i += 2;
                    }
                    Some(2) => {
                        if let (Some(&r), Some(&g), Some(&b)) =
                            (params.get(i + 2), params.get(i + 3), params.get(i + 4))
                        {
                            let color = Some(Rgb4::from_rgb8(r as u8, g as u8, b as u8));
                            if is_fg { attrs.fg = color; } else { attrs.bg = color; }
                        }
                        i += 4;
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_and_reset() {
        let mut attrs = Attrs::default();
        apply(&[1], &mut attrs);
        assert!(attrs.bold);
        apply(&[0], &mut attrs);
        assert!(!attrs.bold);
    }

    #[test]
    fn sets_standard_foreground() {
        let mut attrs = Attrs::default();
        apply(&[31], &mut attrs);
        assert_eq!(attrs.fg, Some(Rgb4::from_rgb8(0xCD, 0x00, 0x00)));
    }

    #[test]
    fn extended_256_color_background() {
        let mut attrs = Attrs::default();
        apply(&[48, 5, 196], &mut attrs);
        assert!(attrs.bg.is_some());
    }

    #[test]
    fn extended_rgb_foreground() {
        let mut attrs = Attrs::default();
        apply(&[38, 2, 10, 20, 30], &mut attrs);
        assert_eq!(attrs.fg, Some(Rgb4::from_rgb8(10, 20, 30)));
    }

    #[test]
    fn default_param_resets_all_attrs() {
        let mut attrs = Attrs { bold: true, underline: true, ..Default::default() };
        apply(&[], &mut attrs);
        assert_eq!(attrs, Attrs::default());
    }
}
