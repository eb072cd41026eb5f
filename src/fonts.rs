use pdf_writer::{Name, Pdf, Ref};

/// The three standard PDF fonts the report uses. Base-14 fonts need no
/// embedded font program; viewers supply the glyphs, we only need the AFM
/// advance widths for layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
    TimesRoman,
}

pub(crate) const ALL_FONTS: [BuiltinFont; 3] = [
    BuiltinFont::Helvetica,
    BuiltinFont::HelveticaBold,
    BuiltinFont::TimesRoman,
];

// AFM advance widths (1000 units/em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, // A..P
    778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // Q..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, // a..p
    556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // q..z
    334, 260, 334, 584, // {..~
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667,
    778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611,
    611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, 556,
    722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, 500,
    500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];

impl BuiltinFont {
    pub(crate) fn base_name(self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
            BuiltinFont::TimesRoman => "Times-Roman",
        }
    }

    /// Name in the shared per-page font resource dictionary.
    pub(crate) fn resource_name(self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "F1",
            BuiltinFont::HelveticaBold => "F2",
            BuiltinFont::TimesRoman => "F3",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            BuiltinFont::Helvetica => &HELVETICA_WIDTHS,
            BuiltinFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
            BuiltinFont::TimesRoman => &TIMES_ROMAN_WIDTHS,
        }
    }

    /// AFM Ascender / 1000, used to place the first baseline below the
    /// top of a layout slot.
    pub(crate) fn ascender_ratio(self) -> f32 {
        match self {
            BuiltinFont::Helvetica | BuiltinFont::HelveticaBold => 0.718,
            BuiltinFont::TimesRoman => 0.683,
        }
    }

    pub(crate) fn char_width_1000(self, ch: char) -> f32 {
        let widths = self.widths();
        match ch as u32 {
            0x20..=0x7E => widths[(ch as usize) - 0x20] as f32,
            // Outside ASCII, fall back to an average glyph width. Good
            // enough for the WinAnsi punctuation the report can contain.
            _ => match self {
                BuiltinFont::TimesRoman => 500.0,
                _ => 556.0,
            },
        }
    }

    pub(crate) fn text_width(self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub(crate) fn space_width(self, font_size: f32) -> f32 {
        self.char_width_1000(' ') * font_size / 1000.0
    }
}

/// Write the Type1 font dictionaries and return (font, object id) pairs
/// for the page resource dictionaries.
pub(crate) fn register_fonts(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
) -> Vec<(BuiltinFont, Ref)> {
    ALL_FONTS
        .iter()
        .map(|&font| {
            let font_ref = alloc();
            pdf.type1_font(font_ref)
                .base_font(Name(font.base_name().as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            (font, font_ref)
        })
        .collect()
}

/// Map a single Unicode char to its WinAnsi (Windows-1252) byte.
fn char_to_winansi(c: char) -> Option<u8> {
    match c as u32 {
        0x0020..=0x007F => Some(c as u8),
        0x00A0..=0x00FF => Some(c as u8), // Latin-1 supplement maps directly
        0x20AC => Some(0x80),
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85),
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95), // bullet
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x02DC => Some(0x98),
        0x2122 => Some(0x99),
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}

/// Convert a UTF-8 string to WinAnsi bytes for PDF Str encoding.
/// Unmappable characters are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars().filter_map(char_to_winansi).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_maps_to_itself() {
        assert_eq!(to_winansi_bytes("Page 1"), b"Page 1".to_vec());
    }

    #[test]
    fn extended_chars_use_winansi_codes() {
        assert_eq!(to_winansi_bytes("é"), vec![0xE9]);
        assert_eq!(to_winansi_bytes("•"), vec![0x95]);
        assert_eq!(to_winansi_bytes("—"), vec![0x97]);
    }

    #[test]
    fn unmappable_chars_are_dropped() {
        assert_eq!(to_winansi_bytes("a→b"), b"ab".to_vec());
    }

    #[test]
    fn digit_widths_match_afm() {
        assert_eq!(BuiltinFont::Helvetica.char_width_1000('0'), 556.0);
        assert_eq!(BuiltinFont::TimesRoman.char_width_1000('0'), 500.0);
        assert_eq!(BuiltinFont::HelveticaBold.char_width_1000('M'), 833.0);
    }

    #[test]
    fn text_width_scales_with_font_size() {
        let w10 = BuiltinFont::TimesRoman.text_width("Results", 10.0);
        let w20 = BuiltinFont::TimesRoman.text_width("Results", 20.0);
        assert!((w20 - 2.0 * w10).abs() < 1e-4);
    }
}
