//! Table of contents sizing and rendering.
//!
//! The TOC lists absolute page numbers, but the content only starts after the title
//! page and the TOC itself, whose length is what is being computed. The loop in
//! [`reconcile`] resolves this: assume one TOC page, render a standalone TOC with the
//! page numbers that assumption implies, count its pages and repeat with that count
//! until the assumption holds.
//!
//! Each row has a fixed height, so the measured page count depends only on the
//! number of rows and the loop settles after at most two measurements. The
//! iteration cap only guards against a broken measurement.

use crate::fonts::FontFace;
use crate::styling::LayoutStyle;
use crate::writer::{Align, LinkHandle, LinkTarget, PageWriter};
use crate::PortfolioError;
use log::{debug, info};

pub const TOC_TITLE: &str = "Table of Contents";

/// Height of the "Table of Contents" heading row.
const HEADING_HEIGHT: f32 = 10.0;

/// Padding added to the measured title width of each row.
const TITLE_PADDING: f32 = 6.0;

/// One row of the table of contents.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub title: String,
    /// Absolute page number in the final document.
    pub page: u32,
    pub link: Option<LinkHandle>,
}

/// Outcome of the fixed-point iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convergence {
    /// Number of TOC pages both assumed and measured.
    pub toc_pages: u32,
    /// Number of measurements taken.
    pub iterations: usize,
    /// Every assumed page count, in order.
    pub assumed: Vec<u32>,
}

/// Iterates `measure(assumed) -> actual` from `assumed = 1` until both agree.
///
/// Fails with a layout error after `max_iterations` measurements without agreement.
pub fn converge<F>(max_iterations: usize, mut measure: F) -> Result<Convergence, PortfolioError>
where
    F: FnMut(u32) -> u32,
{
    let mut assumed = 1;
    let mut history = Vec::new();
    for iteration in 1..=max_iterations {
        history.push(assumed);
        let actual = measure(assumed);
        debug!(
            "toc iteration {}: assumed {} page(s), measured {}",
            iteration, assumed, actual
        );
        if actual == assumed {
            info!(
                "table of contents converged on {} page(s) after {} iteration(s)",
                assumed, iteration
            );
            return Ok(Convergence {
                toc_pages: assumed,
                iterations: iteration,
                assumed: history,
            });
        }
        assumed = actual;
    }
    Err(PortfolioError::LayoutError {
        message: format!(
            "table of contents page count did not settle after {} iterations (last assumed {:?})",
            max_iterations, history
        ),
    })
}

/// Absolute page of each section when the content follows the title page and
/// `toc_pages` pages of TOC.
pub fn absolute_pages(relative: &[u32], toc_pages: u32) -> Vec<u32> {
    relative.iter().map(|page| page + 1 + toc_pages).collect()
}

/// Dots filling a leader of `width`, one fewer than fit, never negative.
pub fn leader_dots(width: f32, dot_width: f32) -> String {
    if dot_width <= 0.0 {
        return String::new();
    }
    let count = (width / dot_width).floor() as i64 - 1;
    ".".repeat(count.max(0) as usize)
}

/// Draws the TOC heading and one dot-leader row per entry at the cursor.
pub fn render_toc(writer: &mut PageWriter, entries: &[TocEntry]) {
    let toc = writer.style().toc;
    writer.set_font(FontFace::HelveticaBold, toc.font_size);
    writer.cell(0.0, HEADING_HEIGHT, TOC_TITLE, Align::Center, None);
    writer.ln(HEADING_HEIGHT);
    writer.set_font(FontFace::Helvetica, toc.font_size);
    for entry in entries {
        let title_width = writer.string_width(&entry.title) + TITLE_PADDING;
        let link = entry.link.map(LinkTarget::Internal);
        writer.cell(title_width, toc.row_height, &entry.title, Align::Left, link);
        let leader_width = (toc.leader_width - title_width).max(0.0);
        let dots = leader_dots(leader_width, writer.string_width("."));
        writer.cell(leader_width, toc.row_height, &dots, Align::Left, None);
        writer.cell(
            toc.number_width,
            toc.row_height,
            &entry.page.to_string(),
            Align::Right,
            None,
        );
        writer.ln(toc.row_height);
    }
}

/// Page count of a standalone TOC holding `entries`.
pub fn measure_toc_pages(style: &LayoutStyle, entries: &[TocEntry]) -> u32 {
    let mut writer = PageWriter::new(style.clone());
    writer.add_page();
    render_toc(&mut writer, entries);
    writer.current_page()
}

fn entries_for(titles: &[String], relative: &[u32], toc_pages: u32) -> Vec<TocEntry> {
    titles
        .iter()
        .zip(absolute_pages(relative, toc_pages))
        .map(|(title, page)| TocEntry {
            title: title.clone(),
            page,
            link: None,
        })
        .collect()
}

/// Finds the TOC page count and the absolute page of every section.
///
/// `relative` holds the start page of each section when the content is laid out
/// on its own, starting at page 1.
pub fn reconcile(
    style: &LayoutStyle,
    titles: &[String],
    relative: &[u32],
) -> Result<(Vec<TocEntry>, Convergence), PortfolioError> {
    if titles.len() != relative.len() {
        return Err(PortfolioError::LayoutError {
            message: format!(
                "{} section titles but {} measured start pages",
                titles.len(),
                relative.len()
            ),
        });
    }
    let convergence = converge(style.toc.max_iterations, |assumed| {
        measure_toc_pages(style, &entries_for(titles, relative, assumed))
    })?;
    let entries = entries_for(titles, relative, convergence.toc_pages);
    Ok((entries, convergence))
}
