// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Block-glyph rendering for clock-mode and the identify overlay (spec §4.6).
//!
//! A minimal 5-row bitmap font, just the characters those two features ever need:
//! digits, a colon (clock), and nothing else.

const ON: char = '\u{2588}'; // █
const OFF: char = ' ';

/// Each glyph is 5 rows tall; widths vary (3 for digits, 1 for the colon).
fn glyph_rows(ch: char) -> &'static [&'static str] {
    match ch {
        '0' => &["###", "# #", "# #", "# #", "###"],
        '1' => &["  #", "  #", "  #", "  #", "  #"],
        '2' => &["###", "  #", "###", "#  ", "###"],
        '3' => &["###", "  #", "###", "  #", "###"],
        '4' => &["# #", "# #", "###", "  #", "  #"],
        '5' => &["###", "#  ", "###", "  #", "###"],
        '6' => &["###", "#  ", "###", "# #", "###"],
        '7' => &["###", "  #", "  #", "  #", "  #"],
        '8' => &["###", "# #", "###", "# #", "###"],
        '9' => &["###", "# #", "###", "  #", "###"],
        ':' => &[" ", "#", " ", "#", " "],
        _ => &["", "", "", "", ""],
    }
}

/// Render `text` (digits and `:` only — anything else renders blank) as 5 lines of
/// block glyphs, one space between characters.
#[must_use]
pub fn render_big_text(text: &str) -> [String; 5] {
    let mut rows: [String; 5] = Default::default();
    for (i, ch) in text.chars().enumerate() {
        if i > 0 {
            for row in &mut rows {
                row.push(' ');
            }
        }
        for (row, pattern) in rows.iter_mut().zip(glyph_rows(ch)) {
            for bit in pattern.chars() {
                row.push(if bit == '#' { ON } else { OFF });
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_five_rows_for_any_input() {
        let rows = render_big_text("12");
        assert_eq!(rows.len(), 5);
        assert!(rows[0].contains(ON));
    }

    #[test]
    fn unknown_char_renders_blank_columns() {
        let rows = render_big_text("1?1");
        assert!(rows[0].chars().all(|c| c == ON || c == OFF));
    }
}
