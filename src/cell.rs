// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The packed 64-bit [`Cell`] representation (spec §3).
//!
//! A cell packs a 32-bit Unicode code point in its low word and a 32-bit attribute
//! word in its high word:
//!
//! ```text
//! bits  0..11  background RGB, 4 bits/channel (12 bits total)
//! bits 12..23  foreground RGB, 4 bits/channel (12 bits total)
//! bit      24  underline
//! bit      25  inverse
//! bit      26  conceal
//! bit      27  bold
//! bit      28  fg-set (distinguishes explicit color from "default")
//! bit      29  bg-set
//! ```
//!
//! A zero code point denotes the right half of a wide character: it is skipped during
//! layout and inherits its rendered style from the cell to its left.

/// A 4-bit-per-channel RGB color, as quantized for cell storage (SGR `38;2;r;g;b` etc.
/// are rounded down to this precision on ingest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb4 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb4 {
    /// Quantize a full 8-bit-per-channel color down to 4 bits/channel.
    #[must_use]
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self { r: r >> 4, g: g >> 4, b: b >> 4 }
    }

    fn pack(self) -> u32 {
        (u32::from(self.r) << 8) | (u32::from(self.g) << 4) | u32::from(self.b)
    }

    fn unpack(bits: u32) -> Self {
        Self {
            r: ((bits >> 8) & 0xF) as u8,
            g: ((bits >> 4) & 0xF) as u8,
            b: (bits & 0xF) as u8,
        }
    }
}

const BG_SHIFT: u32 = 0;
const FG_SHIFT: u32 = 12;
const UNDERLINE_BIT: u32 = 1 << 24;
const INVERSE_BIT: u32 = 1 << 25;
const CONCEAL_BIT: u32 = 1 << 26;
const BOLD_BIT: u32 = 1 << 27;
const FG_SET_BIT: u32 = 1 << 28;
const BG_SET_BIT: u32 = 1 << 29;
const RGB_MASK: u32 = 0xFFF;

/// One grid cell: a code point plus its packed attribute word, stored as a single
/// 64-bit value (low word = code point, high word = attributes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell(u64);

impl Default for Cell {
    fn default() -> Self { Self::blank() }
}

impl Cell {
    /// A blank cell: U+0020, default colors, no attributes set.
    #[must_use]
    pub fn blank() -> Self { Self::new(' ', Attrs::default()) }

    /// Build a cell from a code point and attribute set.
    #[must_use]
    pub fn new(ch: char, attrs: Attrs) -> Self {
        let low = u64::from(ch as u32);
        let high = u64::from(attrs.pack());
        Self(low | (high << 32))
    }

    /// The right half of a wide character: zero code point, inheriting `attrs` from
    /// the cell to its left (spec §3).
    #[must_use]
    pub fn wide_continuation(attrs: Attrs) -> Self {
        Self(u64::from(attrs.pack()) << 32)
    }

    /// Whether this cell is the right half of a wide character (zero code point).
    #[must_use]
    pub fn is_wide_continuation(&self) -> bool { self.code_point() == 0 }

    #[must_use]
    pub fn code_point(&self) -> u32 { (self.0 & 0xFFFF_FFFF) as u32 }

    #[must_use]
    pub fn ch(&self) -> char { char::from_u32(self.code_point()).unwrap_or(' ') }

    #[must_use]
    pub fn attrs(&self) -> Attrs { Attrs::unpack((self.0 >> 32) as u32) }

    pub fn set_ch(&mut self, ch: char) {
        self.0 = (self.0 & !0xFFFF_FFFF) | u64::from(ch as u32);
    }

    pub fn set_attrs(&mut self, attrs: Attrs) {
        self.0 = (self.0 & 0xFFFF_FFFF) | (u64::from(attrs.pack()) << 32);
    }
}

/// The decoded form of a cell's attribute word: colors and style bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attrs {
    pub fg: Option<Rgb4>,
    pub bg: Option<Rgb4>,
    pub underline: bool,
    pub inverse: bool,
    pub conceal: bool,
    pub bold: bool,
}

impl Attrs {
    fn pack(self) -> u32 {
        let mut bits = 0u32;
        if let Some(fg) = self.fg {
            bits |= fg.pack() << FG_SHIFT;
            bits |= FG_SET_BIT;
        }
        if let Some(bg) = self.bg {
            bits |= bg.pack() << BG_SHIFT;
            bits |= BG_SET_BIT;
        }
        if self.underline {
            bits |= UNDERLINE_BIT;
        }
        if self.inverse {
            bits |= INVERSE_BIT;
        }
        if self.conceal {
            bits |= CONCEAL_BIT;
        }
        if self.bold {
            bits |= BOLD_BIT;
        }
        bits
    }

    fn unpack(bits: u32) -> Self {
        Self {
            fg: (bits & FG_SET_BIT != 0)
                .then(|| Rgb4::unpack((bits >> FG_SHIFT) & RGB_MASK)),
            bg: (bits & BG_SET_BIT != 0)
                .then(|| Rgb4::unpack((bits >> BG_SHIFT) & RGB_MASK)),
            underline: bits & UNDERLINE_BIT != 0,
            inverse: bits & INVERSE_BIT != 0,
            conceal: bits & CONCEAL_BIT != 0,
            bold: bits & BOLD_BIT != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_code_point_and_attrs() {
        let attrs = Attrs {
            fg: Some(Rgb4 { r: 0xF, g: 0x0, b: 0xA }),
            bg: Some(Rgb4 { r: 0x1, g: 0x2, b: 0x3 }),
            underline: true,
            inverse: false,
            conceal: false,
            bold: true,
        };
        let cell = Cell::new('x', attrs);
        assert_eq!(cell.ch(), 'x');
        assert_eq!(cell.attrs(), attrs);
    }

    #[test]
    fn default_cell_is_blank_with_no_colors_set() {
        let cell = Cell::blank();
        assert_eq!(cell.ch(), ' ');
        let attrs = cell.attrs();
        assert!(attrs.fg.is_none());
        assert!(attrs.bg.is_none());
        assert!(!attrs.bold);
    }

    #[test]
    fn wide_continuation_has_zero_code_point_but_keeps_style() {
        let attrs = Attrs { bold: true, ..Default::default() };
        let cell = Cell::wide_continuation(attrs);
        assert!(cell.is_wide_continuation());
        assert_eq!(cell.attrs(), attrs);
    }

    #[test]
    fn rgb4_quantizes_from_8_bit_channels() {
        let c = Rgb4::from_rgb8(0xFF, 0x00, 0x88);
        assert_eq!(c, Rgb4 { r: 0xF, g: 0x0, b: 0x8 });
    }

    #[test]
    fn set_ch_and_set_attrs_mutate_independently() {
        let mut cell = Cell::new('a', Attrs::default());
        cell.set_ch('b');
        assert_eq!(cell.ch(), 'b');
        let attrs = Attrs { bold: true, ..Default::default() };
        cell.set_attrs(attrs);
        assert_eq!(cell.ch(), 'b');
        assert_eq!(cell.attrs(), attrs);
    }
}
