//! Metrics for the PDF core-14 fonts used by the portfolio.
//!
//! The portfolio never embeds font files: every page references the standard Type1
//! fonts that all PDF readers ship with. Layout still needs advance widths to wrap
//! text and size the table-of-contents dot leaders, so the widths of the printable
//! ASCII range are tabulated here (units of 1/1000 em, from the Adobe AFM files).
//! Characters outside that range use the width of a lowercase `n`.

/// Millimetres per PDF point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

/// Helvetica advance widths for code points 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold advance widths for code points 32..=126.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

const COURIER_WIDTH: u16 = 600;

/// One of the standard fonts the portfolio draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    Courier,
}

impl FontFace {
    pub const ALL: [FontFace; 4] = [
        FontFace::Helvetica,
        FontFace::HelveticaBold,
        FontFace::HelveticaOblique,
        FontFace::Courier,
    ];

    /// PostScript name used as the `/BaseFont` of the font dictionary.
    pub fn base_font(self) -> &'static str {
        match self {
            FontFace::Helvetica => "Helvetica",
            FontFace::HelveticaBold => "Helvetica-Bold",
            FontFace::HelveticaOblique => "Helvetica-Oblique",
            FontFace::Courier => "Courier",
        }
    }

    /// Name of the font in the page resource dictionary.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontFace::Helvetica => "F1",
            FontFace::HelveticaBold => "F2",
            FontFace::HelveticaOblique => "F3",
            FontFace::Courier => "F4",
        }
    }

    /// Advance width of `c` in 1/1000 em.
    pub fn char_width(self, c: char) -> u16 {
        let table = match self {
            FontFace::Courier => return COURIER_WIDTH,
            // Oblique shares the upright metrics.
            FontFace::Helvetica | FontFace::HelveticaOblique => &HELVETICA_WIDTHS,
            FontFace::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        };
        let code = c as u32;
        if (32..=126).contains(&code) {
            table[(code - 32) as usize]
        } else {
            table[(b'n' - 32) as usize]
        }
    }

    /// Width of `text` set at `size` points, in millimetres.
    pub fn string_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        units as f32 * size / 1000.0 * MM_PER_PT
    }
}

/// Current font selection: a face and a size in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub face: FontFace,
    pub size: f32,
}

impl FontSpec {
    pub fn new(face: FontFace, size: f32) -> Self {
        FontSpec { face, size }
    }

    pub fn string_width(&self, text: &str) -> f32 {
        self.face.string_width(text, self.size)
    }
}

/// Encodes text for a simple font using WinAnsiEncoding.
///
/// Characters the encoding cannot represent become `?` so that the layout width
/// computed for the string stays close to what is drawn.
pub fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c as u32 {
            0x0020..=0x007E => c as u8,
            0x00A0..=0x00FF => c as u8,
            0x20AC => 0x80,
            0x201A => 0x82,
            0x0192 => 0x83,
            0x201E => 0x84,
            0x2026 => 0x85,
            0x2020 => 0x86,
            0x2021 => 0x87,
            0x02C6 => 0x88,
            0x2030 => 0x89,
            0x0160 => 0x8A,
            0x2039 => 0x8B,
            0x0152 => 0x8C,
            0x017D => 0x8E,
            0x2018 => 0x91,
            0x2019 => 0x92,
            0x201C => 0x93,
            0x201D => 0x94,
            0x2022 => 0x95,
            0x2013 => 0x96,
            0x2014 => 0x97,
            0x02DC => 0x98,
            0x2122 => 0x99,
            0x0161 => 0x9A,
            0x203A => 0x9B,
            0x0153 => 0x9C,
            0x017E => 0x9E,
            0x0178 => 0x9F,
            _ => b'?',
        })
        .collect()
}
