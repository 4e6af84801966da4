//! The page writer: a growing paginated document with a drawing cursor.
//!
//! A [`PageWriter`] is the layout state of one pass. It owns the pages drawn so far,
//! the cursor (`x`, `y` in millimetres from the top-left corner of the page), the
//! current font and color, the page each section started on and the table of
//! internal link targets. Drawing primitives follow the classic cell model: a cell
//! is a box of a given width and height starting at the cursor, text is placed inside
//! it, and the cursor moves to the right edge of the box. [`PageWriter::ln`] moves
//! to the start of the next line.
//!
//! Whenever a cell would cross [`LayoutStyle::page_break_trigger`] a new page is
//! started first, so page numbers are only ever known after content has been laid
//! out. This is why the portfolio runs a measuring pass before the real one.

use crate::fonts::{FontFace, FontSpec, MM_PER_PT};
use crate::markdown::{heading_font_size, ContentBlock, StyledRun};
use crate::styling::{LayoutStyle, Rgb};
use crate::PortfolioError;
use log::debug;

/// Horizontal padding between a cell border and its text.
pub const CELL_MARGIN: f32 = 1.0;

/// Width of the cell holding a list marker.
const MARKER_WIDTH: f32 = 10.0;

const FOOTER_OFFSET: f32 = 15.0;
const FOOTER_HEIGHT: f32 = 10.0;
const FOOTER_SIZE: f32 = 8.0;

const EPSILON: f32 = 1e-3;

/// Opaque handle to an internal link target whose page is bound later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkHandle(usize);

impl LinkHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where a clickable area leads.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    Internal(LinkHandle),
    Uri(String),
}

/// A clickable rectangle on a page, in page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkArea {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub target: LinkTarget,
}

/// Horizontal placement of text inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// A single drawing instruction. `y` of text is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        font: FontSpec,
        color: Rgb,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Rgb,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Rgb,
    },
}

/// The content of one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
    pub links: Vec<LinkArea>,
}

impl Page {
    /// Every text fragment drawn on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Layout state of one pass: pages, cursor, section starts and links.
#[derive(Debug, Clone)]
pub struct PageWriter {
    style: LayoutStyle,
    pages: Vec<Page>,
    x: f32,
    y: f32,
    font: FontSpec,
    text_color: Rgb,
    underline: bool,
    auto_page_break: bool,
    section_starts: Vec<(usize, u32)>,
    links: Vec<Option<u32>>,
}

impl PageWriter {
    pub fn new(style: LayoutStyle) -> Self {
        let x = style.margins.left;
        let y = style.margins.top;
        let text_color = style.text_color;
        PageWriter {
            style,
            pages: Vec::new(),
            x,
            y,
            font: FontSpec::new(FontFace::Helvetica, 12.0),
            text_color,
            underline: false,
            auto_page_break: true,
            section_starts: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn style(&self) -> &LayoutStyle {
        &self.style
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 1-based number of the page the cursor is on, `0` before the first page.
    pub fn current_page(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn set_x(&mut self, x: f32) {
        self.x = x;
    }

    /// Moves the cursor to `y` and back to the left margin.
    pub fn set_y(&mut self, y: f32) {
        self.x = self.style.margins.left;
        self.y = y;
    }

    pub fn font(&self) -> FontSpec {
        self.font
    }

    pub fn set_font(&mut self, face: FontFace, size: f32) {
        self.font = FontSpec::new(face, size);
    }

    pub fn set_text_color(&mut self, color: Rgb) {
        self.text_color = color;
    }

    pub fn set_underline(&mut self, underline: bool) {
        self.underline = underline;
    }

    pub fn set_auto_page_break(&mut self, enabled: bool) {
        self.auto_page_break = enabled;
    }

    /// Width of `text` in the current font, in millimetres.
    pub fn string_width(&self, text: &str) -> f32 {
        self.font.string_width(text)
    }

    /// Starts a new page and moves the cursor to its top-left margin corner.
    pub fn add_page(&mut self) {
        self.pages.push(Page::default());
        self.x = self.style.margins.left;
        self.y = self.style.margins.top;
        if self.style.footer {
            self.draw_footer();
        }
    }

    fn draw_footer(&mut self) {
        let label = format!("Page {}", self.current_page());
        let font = FontSpec::new(FontFace::HelveticaOblique, FOOTER_SIZE);
        let width = font.string_width(&label);
        let cell_top = self.style.page.height - FOOTER_OFFSET;
        let x = self.style.margins.left + (self.style.content_width() - width) / 2.0;
        let y = baseline(cell_top, FOOTER_HEIGHT, FOOTER_SIZE);
        let color = self.style.text_color;
        self.push_op(DrawOp::Text {
            x,
            y,
            font,
            color,
            text: label,
        });
    }

    fn ensure_page(&mut self) {
        if self.pages.is_empty() {
            self.add_page();
        }
    }

    fn at_page_top(&self) -> bool {
        (self.y - self.style.margins.top).abs() < EPSILON
    }

    /// Starts a new page if `height` does not fit below the cursor.
    ///
    /// The horizontal position is kept. Content taller than a whole page is drawn
    /// on the fresh page without breaking again.
    pub fn ensure_space(&mut self, height: f32) {
        self.ensure_page();
        if self.auto_page_break
            && self.y + height > self.style.page_break_trigger() + EPSILON
            && !self.at_page_top()
        {
            let x = self.x;
            self.add_page();
            self.x = x;
        }
    }

    fn push_op(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn push_link(&mut self, area: LinkArea) {
        if let Some(page) = self.pages.last_mut() {
            page.links.push(area);
        }
    }

    fn right_edge(&self) -> f32 {
        self.style.page.width - self.style.margins.right
    }

    /// Draws one cell at the cursor and moves the cursor to its right edge.
    ///
    /// A width of `0` extends the cell to the right margin.
    pub fn cell(&mut self, width: f32, height: f32, text: &str, align: Align, link: Option<LinkTarget>) {
        self.ensure_space(height);
        let width = if width <= 0.0 {
            self.right_edge() - self.x
        } else {
            width
        };
        if !text.is_empty() {
            let text_width = self.string_width(text);
            let dx = match align {
                Align::Left => CELL_MARGIN,
                Align::Center => (width - text_width) / 2.0,
                Align::Right => width - CELL_MARGIN - text_width,
            };
            self.draw_text(self.x + dx, baseline(self.y, height, self.font.size), text);
        }
        if let Some(target) = link {
            self.push_link(LinkArea {
                x: self.x,
                y: self.y,
                width,
                height,
                target,
            });
        }
        self.x += width;
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str) {
        let font = self.font;
        let color = self.text_color;
        self.push_op(DrawOp::Text {
            x,
            y,
            font,
            color,
            text: text.to_string(),
        });
        if self.underline {
            let size_mm = font.size * MM_PER_PT;
            let line_y = y + 0.1 * size_mm;
            let width = font.string_width(text);
            self.push_op(DrawOp::Line {
                x1: x,
                y1: line_y,
                x2: x + width,
                y2: line_y,
                width: 0.05 * size_mm,
                color,
            });
        }
    }

    /// Draws text wrapped to `width`, one cell of `height` per line, and returns
    /// the number of lines. The cursor ends at the left margin below the last line.
    pub fn multi_cell(&mut self, width: f32, height: f32, text: &str, align: Align) -> usize {
        self.ensure_page();
        let start_x = self.x;
        let width = if width <= 0.0 {
            self.right_edge() - start_x
        } else {
            width
        };
        let lines = self.wrap_text(text, width - 2.0 * CELL_MARGIN);
        for line in &lines {
            self.x = start_x;
            self.cell(width, height, line, align, None);
            self.y += height;
        }
        self.x = self.style.margins.left;
        lines.len()
    }

    /// Splits `text` into lines no wider than `max_width` in the current font.
    ///
    /// Explicit newlines always break. Words longer than a line are split between
    /// characters. An empty text is a single empty line.
    pub fn wrap_text(&self, text: &str, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let mut line = String::new();
            for word in paragraph.split(' ') {
                let candidate = if line.is_empty() {
                    word.to_string()
                } else {
                    format!("{} {}", line, word)
                };
                if self.string_width(&candidate) <= max_width {
                    line = candidate;
                    continue;
                }
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                for c in word.chars() {
                    line.push(c);
                    if self.string_width(&line) > max_width && line.chars().count() > 1 {
                        line.pop();
                        lines.push(std::mem::take(&mut line));
                        line.push(c);
                    }
                }
            }
            lines.push(line);
        }
        lines
    }

    /// Flows styled runs from the cursor to the right margin, wrapping back to the
    /// starting x. The cursor ends right after the last fragment.
    pub fn write_runs(&mut self, runs: &[StyledRun], line_height: f32, base_size: f32) {
        self.ensure_space(line_height);
        let wrap_x = self.x;
        let right = self.right_edge();
        for run in runs {
            let font = self.run_font(run, base_size);
            self.font = font;
            let mut pending = String::new();
            let mut pending_x = self.x;
            for piece in split_words(run.text()) {
                let is_space = piece.chars().all(char::is_whitespace);
                // Tabs and other blanks have no WinAnsi glyph; each one draws as a space.
                let blanks;
                let piece = if is_space {
                    blanks = " ".repeat(piece.chars().count());
                    blanks.as_str()
                } else {
                    piece
                };
                let width = font.string_width(piece);
                if self.x + width > right + EPSILON && self.x > wrap_x + EPSILON {
                    self.flush_fragment(&mut pending, pending_x, line_height);
                    self.x = wrap_x;
                    self.y += line_height;
                    self.ensure_space(line_height);
                    self.x = wrap_x;
                    pending_x = self.x;
                    if is_space {
                        continue;
                    }
                }
                if !is_space && width > right - wrap_x {
                    self.flush_fragment(&mut pending, pending_x, line_height);
                    self.write_long_word(piece, wrap_x, line_height);
                    pending_x = self.x;
                    continue;
                }
                pending.push_str(piece);
                self.x += width;
            }
            self.flush_fragment(&mut pending, pending_x, line_height);
        }
    }

    fn write_long_word(&mut self, word: &str, wrap_x: f32, line_height: f32) {
        let right = self.right_edge();
        let mut chunk = String::new();
        let mut chunk_x = self.x;
        for c in word.chars() {
            let width = self.font.face.char_width(c) as f32 * self.font.size / 1000.0 * MM_PER_PT;
            if self.x + width > right + EPSILON && !chunk.is_empty() {
                self.flush_fragment(&mut chunk, chunk_x, line_height);
                self.y += line_height;
                self.ensure_space(line_height);
                self.x = wrap_x;
                chunk_x = self.x;
            }
            chunk.push(c);
            self.x += width;
        }
        self.flush_fragment(&mut chunk, chunk_x, line_height);
    }

    fn flush_fragment(&mut self, pending: &mut String, x: f32, line_height: f32) {
        if pending.trim().is_empty() {
            pending.clear();
            return;
        }
        let y = baseline(self.y, line_height, self.font.size);
        let text = std::mem::take(pending);
        self.draw_text(x, y, &text);
    }

    fn run_font(&self, run: &StyledRun, base_size: f32) -> FontSpec {
        match run {
            StyledRun::Plain(_) => FontSpec::new(FontFace::Helvetica, base_size),
            StyledRun::Bold(_) => FontSpec::new(FontFace::HelveticaBold, base_size),
            StyledRun::Code(_) => FontSpec::new(FontFace::Courier, self.style.code_size),
            StyledRun::Math(_) => FontSpec::new(FontFace::HelveticaOblique, base_size),
        }
    }

    /// Moves the cursor to the left margin, `height` further down.
    pub fn ln(&mut self, height: f32) {
        self.x = self.style.margins.left;
        self.y += height;
    }

    /// Draws text with its baseline at `(x, y)` without moving the cursor.
    pub fn text_at(&mut self, x: f32, y: f32, text: &str) {
        self.ensure_page();
        self.draw_text(x, y, text);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: Rgb) {
        self.ensure_page();
        self.push_op(DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
        });
    }

    /// Lays out one README block at the cursor.
    pub fn append(&mut self, block: &ContentBlock) {
        let left = self.style.margins.left;
        let indent_step = self.style.indent_step;
        let body_size = self.style.body_size;
        match block {
            ContentBlock::Heading {
                level,
                indent,
                runs,
            } => {
                let size = heading_font_size(*level);
                let text: String = runs.iter().map(StyledRun::text).collect();
                self.set_font(FontFace::HelveticaBold, size);
                self.ensure_page();
                self.x = left + *indent as f32 * indent_step;
                self.multi_cell(0.0, size / 2.0 + 4.0, &text, Align::Left);
            }
            ContentBlock::ListItem {
                marker,
                indent,
                runs,
            } => {
                let height = self.style.line_height_for(body_size);
                self.set_font(FontFace::Helvetica, body_size);
                self.ensure_page();
                self.x = left + *indent as f32 * indent_step;
                self.cell(MARKER_WIDTH, height, marker.label(), Align::Left, None);
                self.write_runs(runs, height, body_size);
                self.ln(height);
            }
            ContentBlock::CodeLine(line) => {
                self.set_font(FontFace::Courier, self.style.code_size);
                self.ensure_page();
                self.x = left;
                let height = self.style.code_line_height;
                self.multi_cell(0.0, height, line, Align::Left);
            }
            ContentBlock::Paragraph { indent, runs } => {
                let height = self.style.line_height_for(body_size);
                self.set_font(FontFace::Helvetica, body_size);
                self.ensure_page();
                self.x = left + *indent as f32 * indent_step;
                self.write_runs(runs, height, body_size);
                self.ln(height);
            }
            ContentBlock::RawSpacer => {
                self.ensure_page();
                self.ln(self.style.min_line_height);
            }
        }
    }

    /// Records that section `index` starts at the cursor and returns its page.
    ///
    /// Room for `heading_height` is made first, so the recorded page is the page
    /// the heading is drawn on.
    pub fn record_section_start(&mut self, index: usize, heading_height: f32) -> u32 {
        self.ensure_space(heading_height);
        let page = self.current_page();
        debug!("section {} starts on page {}", index, page);
        self.section_starts.push((index, page));
        page
    }

    pub fn section_starts(&self) -> &[(usize, u32)] {
        &self.section_starts
    }

    pub fn section_start(&self, index: usize) -> Option<u32> {
        self.section_starts
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, page)| *page)
    }

    /// Allocates a link whose target page is not known yet.
    pub fn register_link(&mut self) -> LinkHandle {
        self.links.push(None);
        LinkHandle(self.links.len() - 1)
    }

    /// Binds a registered link to a page. Each link is bound exactly once.
    pub fn bind_link(&mut self, handle: LinkHandle, page: u32) -> Result<(), PortfolioError> {
        let Some(slot) = self.links.get_mut(handle.0) else {
            return Err(PortfolioError::LayoutError {
                message: format!("link {} was never registered", handle.0),
            });
        };
        if let Some(bound) = *slot {
            return Err(PortfolioError::LayoutError {
                message: format!("link {} is already bound to page {}", handle.0, bound),
            });
        }
        *slot = Some(page);
        Ok(())
    }

    /// Target page of a link, if it has been bound.
    pub fn link_page(&self, handle: LinkHandle) -> Option<u32> {
        self.links.get(handle.0).copied().flatten()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

/// Baseline of text of `size` points vertically centered in a cell.
fn baseline(top: f32, height: f32, size: f32) -> f32 {
    top + height / 2.0 + 0.3 * size * MM_PER_PT
}

/// Splits text into alternating runs of non-space and space characters.
fn split_words(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (i, c) in text.char_indices() {
        let space = c.is_whitespace();
        match in_space {
            Some(previous) if previous != space => {
                pieces.push(&text[start..i]);
                start = i;
            }
            _ => {}
        }
        in_space = Some(space);
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::ListMarker;

    fn writer() -> PageWriter {
        let mut writer = PageWriter::new(LayoutStyle::default());
        writer.add_page();
        writer
    }

    fn paragraph(text: &str) -> ContentBlock {
        ContentBlock::Paragraph {
            indent: 0,
            runs: vec![StyledRun::Plain(text.to_string())],
        }
    }

    #[test]
    fn test_new_writer_has_no_pages() {
        let writer = PageWriter::new(LayoutStyle::default());
        assert_eq!(writer.current_page(), 0);
        assert_eq!(writer.page_count(), 0);
    }

    #[test]
    fn test_footer_on_every_page() {
        let mut writer = writer();
        writer.add_page();
        assert_eq!(writer.pages()[0].texts().collect::<Vec<_>>(), vec!["Page 1"]);
        assert_eq!(writer.pages()[1].texts().collect::<Vec<_>>(), vec!["Page 2"]);
    }

    #[test]
    fn test_cell_breaks_page_when_full() {
        let mut writer = writer();
        writer.set_font(FontFace::Helvetica, 12.0);
        // 10 mm top margin, trigger at 277 mm: 53 rows of 5 mm fit exactly.
        for _ in 0..53 {
            writer.cell(0.0, 5.0, "row", Align::Left, None);
            writer.ln(5.0);
        }
        assert_eq!(writer.current_page(), 1);
        writer.cell(0.0, 5.0, "row", Align::Left, None);
        assert_eq!(writer.current_page(), 2);
    }

    #[test]
    fn test_current_page_never_decreases() {
        let mut writer = writer();
        let mut last = writer.current_page();
        for i in 0..200 {
            writer.append(&paragraph(&format!("paragraph {}", i)));
            assert!(writer.current_page() >= last);
            last = writer.current_page();
        }
        assert!(last > 1);
    }

    #[test]
    fn test_block_heights() {
        let mut writer = writer();
        let start = writer.y();
        writer.append(&ContentBlock::CodeLine("let x = 1;".to_string()));
        assert!((writer.y() - start - 4.0).abs() < 1e-4);

        let start = writer.y();
        writer.append(&paragraph("text"));
        assert!((writer.y() - start - 5.0).abs() < 1e-4);

        let start = writer.y();
        writer.append(&ContentBlock::Heading {
            level: 1,
            indent: 0,
            runs: vec![StyledRun::Plain("Title".to_string())],
        });
        assert!((writer.y() - start - 11.0).abs() < 1e-4);

        let start = writer.y();
        writer.append(&ContentBlock::RawSpacer);
        assert!((writer.y() - start - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_long_code_line_wraps() {
        let mut writer = writer();
        let start = writer.y();
        writer.append(&ContentBlock::CodeLine("x".repeat(200)));
        // Courier 9pt is 1.905 mm per character, so 200 characters need 3 lines.
        assert!((writer.y() - start - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_list_item_draws_marker() {
        let mut writer = writer();
        writer.append(&ContentBlock::ListItem {
            marker: ListMarker::Ordinal("3.".to_string()),
            indent: 1,
            runs: vec![StyledRun::Plain("item".to_string())],
        });
        let texts: Vec<_> = writer.pages()[0].texts().collect();
        assert!(texts.contains(&"3."));
        assert!(texts.contains(&"item"));
    }

    #[test]
    fn test_write_runs_wraps_to_start_x() {
        let mut writer = writer();
        writer.set_x(30.0);
        let long = "word ".repeat(80);
        writer.write_runs(&[StyledRun::Plain(long)], 5.0, 10.0);
        let xs: Vec<f32> = writer.pages()[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, text, .. } if text.starts_with("word") => Some(*x),
                _ => None,
            })
            .collect();
        assert!(xs.len() > 1);
        assert!(xs.iter().all(|x| (*x - 30.0).abs() < 1e-4));
    }

    #[test]
    fn test_wrap_text_splits_long_words() {
        let writer = writer();
        let lines = writer.wrap_text(&"m".repeat(100), 50.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| writer.string_width(l) <= 50.0));
        assert_eq!(writer.wrap_text("", 50.0), vec![String::new()]);
        assert_eq!(writer.wrap_text("a\nb", 50.0), vec!["a", "b"]);
    }

    #[test]
    fn test_section_start_follows_heading() {
        let mut writer = writer();
        writer.set_y(270.0);
        let page = writer.record_section_start(0, 10.0);
        assert_eq!(page, 2);
        assert_eq!(writer.section_start(0), Some(2));
        assert_eq!(writer.section_start(1), None);
    }

    #[test]
    fn test_link_binding() {
        let mut writer = writer();
        let a = writer.register_link();
        let b = writer.register_link();
        assert_ne!(a, b);
        assert_eq!(writer.link_page(a), None);
        writer.bind_link(a, 4).unwrap();
        assert_eq!(writer.link_page(a), Some(4));
        assert!(writer.bind_link(a, 5).is_err());
        assert!(writer.bind_link(LinkHandle(99), 1).is_err());
    }

    #[test]
    fn test_write_runs_draws_tabs_as_spaces() {
        let mut writer = writer();
        writer.write_runs(&[StyledRun::Plain("a\tb\t\tc".to_string())], 5.0, 10.0);
        let texts: Vec<_> = writer.pages()[0].texts().collect();
        assert!(texts.contains(&"a b  c"));
        assert!(texts.iter().all(|t| !t.contains('\t')));
    }

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("a bc  d"), vec!["a", " ", "bc", "  ", "d"]);
        assert_eq!(split_words(" x"), vec![" ", "x"]);
        assert!(split_words("").is_empty());
    }
}
