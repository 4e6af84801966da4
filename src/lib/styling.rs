//! Page geometry and visual style for the paginated portfolio.
//!
//! All lengths are millimetres and all font sizes are points, the same units the
//! [`PageWriter`](crate::writer::PageWriter) lays out in. The defaults describe an A4
//! page with a 10 mm margin on three sides and a 20 mm page-break zone at the bottom,
//! which leaves room for the `Page N` footer.

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Margins {
            top: 10.0,
            right: 10.0,
            bottom: 20.0,
            left: 10.0,
        }
    }
}

/// Page dimensions in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width: 210.0,
        height: 297.0,
    };
    pub const LETTER: PageSize = PageSize {
        width: 215.9,
        height: 279.4,
    };

    /// Looks up a named page size (`"a4"` or `"letter"`, case-insensitive).
    pub fn from_name(name: &str) -> Option<PageSize> {
        match name.to_ascii_lowercase().as_str() {
            "a4" => Some(PageSize::A4),
            "letter" => Some(PageSize::LETTER),
            _ => None,
        }
    }
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const BLUE: Rgb = Rgb(0, 0, 255);

    /// Parses a `#RRGGBB` color string. Returns `None` for anything else.
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Color components scaled to `0.0..=1.0` for PDF color operators.
    pub fn to_unit(self) -> (f32, f32, f32) {
        (
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        )
    }
}

/// Geometry of the table-of-contents rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TocStyle {
    /// Width shared by the title cell and the dot leader.
    pub leader_width: f32,
    /// Width of the right-aligned page number cell.
    pub number_width: f32,
    pub row_height: f32,
    pub font_size: f32,
    /// Safety cap for the reconciliation loop.
    pub max_iterations: usize,
}

impl Default for TocStyle {
    fn default() -> Self {
        TocStyle {
            leader_width: 170.0,
            number_width: 10.0,
            row_height: 5.0,
            font_size: 12.0,
            max_iterations: 100,
        }
    }
}

/// Complete style used by every layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutStyle {
    pub page: PageSize,
    pub margins: Margins,
    /// Font size of README paragraphs and list items.
    pub body_size: f32,
    /// Font size of README code lines and inline code.
    pub code_size: f32,
    /// Height of one physical code line.
    pub code_line_height: f32,
    /// Minimum height of a paragraph or list line.
    pub min_line_height: f32,
    /// Horizontal offset per README indent level.
    pub indent_step: f32,
    pub text_color: Rgb,
    pub link_color: Rgb,
    pub toc: TocStyle,
    /// Draw the `Page N` footer on every page.
    pub footer: bool,
}

impl Default for LayoutStyle {
    fn default() -> Self {
        LayoutStyle {
            page: PageSize::A4,
            margins: Margins::default(),
            body_size: 10.0,
            code_size: 9.0,
            code_line_height: 4.0,
            min_line_height: 5.0,
            indent_step: 4.0,
            text_color: Rgb::BLACK,
            link_color: Rgb::BLUE,
            toc: TocStyle::default(),
            footer: true,
        }
    }
}

impl LayoutStyle {
    /// Width between the left and right margins.
    pub fn content_width(&self) -> f32 {
        self.page.width - self.margins.left - self.margins.right
    }

    /// Cursor position past which content must move to a new page.
    pub fn page_break_trigger(&self) -> f32 {
        self.page.height - self.margins.bottom
    }

    /// Line height for body text of the given size, never below `min_line_height`.
    pub fn line_height_for(&self, font_size: f32) -> f32 {
        (font_size / 2.0).max(self.min_line_height)
    }
}
