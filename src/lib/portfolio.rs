//! Portfolio sections and the two-pass document assembly.
//!
//! A portfolio is a title page, a table of contents and one section per entry: the
//! contribution calendar first when present, then one section per repository.
//! Sections are built once from the fetched data and laid out twice. The measuring
//! pass lays out the content alone to find the page each section starts on; after
//! the TOC page count has been reconciled ([`crate::toc::reconcile`]) the final pass
//! lays out the whole document and binds each TOC link to the page its section
//! actually starts on.

use crate::fonts::FontFace;
use crate::github::{ContributionCalendar, ReadmeSource, Repository};
use crate::markdown::{classify_document, ContentBlock};
use crate::styling::{LayoutStyle, Rgb};
use crate::toc::{self, Convergence, TocEntry};
use crate::writer::{Align, LinkHandle, LinkTarget, PageWriter};
use crate::PortfolioError;
use log::{debug, info};

pub const CALENDAR_TITLE: &str = "Contribution Calendar";
pub const NO_DESCRIPTION: &str = "No description";

const SQUARE_SIZE: f32 = 3.0;
const SQUARE_SPACING: f32 = 0.5;
const CALENDAR_X: f32 = 20.0;
const DAY_LABEL_X: f32 = 5.0;
const DAY_LABELS: [&str; 7] = ["", "Mon", "", "Wed", "", "Fri", ""];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const LABEL_SIZE: f32 = 8.0;

const ROW_HEIGHT: f32 = 10.0;
const SECTION_GAP: f32 = 10.0;
const CALENDAR_TITLE_GAP: f32 = 15.0;

/// One day square of the calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCell {
    pub date: String,
    pub count: u64,
    pub color: Rgb,
}

/// One column of the calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarWeek {
    pub days: Vec<CalendarCell>,
    /// Month (1-12) of the first day, if the week has any day.
    pub month: Option<u32>,
}

/// Validated contribution calendar, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarGrid {
    pub total_contributions: u64,
    pub weeks: Vec<CalendarWeek>,
}

impl CalendarGrid {
    /// Builds the grid, discarding the first (partial) week.
    ///
    /// Colors must be `#RRGGBB` and dates `YYYY-MM-DD`; anything else is a data error.
    pub fn from_calendar(calendar: &ContributionCalendar) -> Result<Self, PortfolioError> {
        let mut weeks = Vec::new();
        for week in calendar.weeks.iter().skip(1) {
            let mut days = Vec::with_capacity(week.contribution_days.len());
            for day in &week.contribution_days {
                let color = Rgb::from_hex(&day.color).ok_or_else(|| PortfolioError::DataError {
                    message: format!(
                        "Invalid contribution color {:?} on {}",
                        day.color, day.date
                    ),
                    suggestion: Some("Colors must be in #RRGGBB form".to_string()),
                })?;
                days.push(CalendarCell {
                    date: day.date.clone(),
                    count: day.contribution_count,
                    color,
                });
            }
            let month = match days.first() {
                Some(first) => Some(parse_month(&first.date)?),
                None => None,
            };
            weeks.push(CalendarWeek { days, month });
        }
        Ok(CalendarGrid {
            total_contributions: calendar.total_contributions,
            weeks,
        })
    }

    pub fn columns(&self) -> usize {
        self.weeks.len()
    }
}

fn parse_month(date: &str) -> Result<u32, PortfolioError> {
    let invalid = || PortfolioError::DataError {
        message: format!("Invalid contribution date {:?}", date),
        suggestion: Some("Dates must be in YYYY-MM-DD form".to_string()),
    };
    let mut parts = date.split('-');
    let (Some(year), Some(month), Some(day), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    if year.len() != 4 || year.parse::<u32>().is_err() || day.parse::<u32>().is_err() {
        return Err(invalid());
    }
    match month.parse::<u32>() {
        Ok(m @ 1..=12) => Ok(m),
        _ => Err(invalid()),
    }
}

/// Three-letter English name of a month (1-12).
pub fn month_abbreviation(month: u32) -> &'static str {
    MONTHS
        .get((month as usize).wrapping_sub(1))
        .copied()
        .unwrap_or("")
}

/// A repository README: the raw text and its classified blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Readme {
    pub text: String,
    pub blocks: Vec<ContentBlock>,
}

impl Readme {
    pub fn new(text: String) -> Self {
        let blocks = classify_document(&text);
        Readme { text, blocks }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Calendar(CalendarGrid),
    Repository {
        description: Option<String>,
        readme: Option<Readme>,
    },
}

/// One top-level unit of the portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub body: SectionBody,
    /// External hyperlink drawn under the title.
    pub external_link: Option<String>,
}

impl Section {
    pub fn calendar(grid: CalendarGrid) -> Self {
        Section {
            title: CALENDAR_TITLE.to_string(),
            body: SectionBody::Calendar(grid),
            external_link: None,
        }
    }

    pub fn repository(repository: &Repository, readme: Option<String>) -> Self {
        Section {
            title: repository.name.clone(),
            body: SectionBody::Repository {
                description: repository.description.clone(),
                readme: readme.filter(|text| !text.is_empty()).map(Readme::new),
            },
            external_link: Some(repository.html_url.clone()),
        }
    }

    /// Height that must fit on a page before the section may start there.
    fn heading_height(&self) -> f32 {
        match self.body {
            SectionBody::Calendar(_) => {
                ROW_HEIGHT + CALENDAR_TITLE_GAP + 7.0 * (SQUARE_SIZE + SQUARE_SPACING)
            }
            SectionBody::Repository { .. } => ROW_HEIGHT,
        }
    }
}

/// A user's portfolio: the sections in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub username: String,
    pub sections: Vec<Section>,
}

impl Portfolio {
    pub fn new(username: &str, sections: Vec<Section>) -> Self {
        Portfolio {
            username: username.to_string(),
            sections,
        }
    }

    pub fn title(&self) -> String {
        format!("{}'s GitHub Portfolio", self.username)
    }

    pub fn calendar(&self) -> Option<&CalendarGrid> {
        self.sections.iter().find_map(|section| match &section.body {
            SectionBody::Calendar(grid) => Some(grid),
            _ => None,
        })
    }
}

/// Orders repositories: prioritized names first in list order, the rest by
/// descending stars (ties keep their listing order). Excluded names are dropped,
/// even when they are also prioritized.
pub fn order_repositories(
    repositories: &[Repository],
    prioritize: &[String],
    exclude: &[String],
) -> Vec<Repository> {
    let excluded = |name: &str| exclude.iter().any(|e| e == name);
    let prioritized = |name: &str| prioritize.iter().any(|p| p == name);

    let mut ordered: Vec<Repository> = Vec::new();
    for name in prioritize {
        if excluded(name) || ordered.iter().any(|r| &r.name == name) {
            continue;
        }
        if let Some(repository) = repositories.iter().find(|r| &r.name == name) {
            ordered.push(repository.clone());
        }
    }

    let mut others: Vec<Repository> = repositories
        .iter()
        .filter(|r| !prioritized(&r.name) && !excluded(&r.name))
        .cloned()
        .collect();
    others.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));
    ordered.extend(others);
    ordered
}

/// Builds the sections for already ordered repositories, fetching each README once.
pub fn build_sections(
    repositories: &[Repository],
    calendar: Option<&ContributionCalendar>,
    readmes: &dyn ReadmeSource,
) -> Result<Vec<Section>, PortfolioError> {
    let mut sections = Vec::with_capacity(repositories.len() + 1);
    if let Some(calendar) = calendar {
        sections.push(Section::calendar(CalendarGrid::from_calendar(calendar)?));
    }
    for repository in repositories {
        let readme = readmes.readme(&repository.name);
        debug!(
            "{}: {}",
            repository.name,
            if readme.is_some() { "README found" } else { "no README" }
        );
        sections.push(Section::repository(repository, readme));
    }
    Ok(sections)
}

fn layout_section(
    writer: &mut PageWriter,
    index: usize,
    section: &Section,
    link: Option<LinkHandle>,
) -> Result<u32, PortfolioError> {
    let page = writer.record_section_start(index, section.heading_height());
    if let Some(handle) = link {
        writer.bind_link(handle, page)?;
    }
    match &section.body {
        SectionBody::Calendar(grid) => draw_calendar(writer, &section.title, grid),
        SectionBody::Repository {
            description,
            readme,
        } => draw_repository(
            writer,
            section,
            description.as_deref(),
            readme.as_ref(),
        ),
    }
    Ok(page)
}

fn draw_calendar(writer: &mut PageWriter, title: &str, grid: &CalendarGrid) {
    writer.set_font(FontFace::HelveticaBold, 12.0);
    writer.cell(0.0, ROW_HEIGHT, title, Align::Center, None);
    writer.ln(CALENDAR_TITLE_GAP);

    let step = SQUARE_SIZE + SQUARE_SPACING;
    let top = writer.y();
    writer.set_font(FontFace::Helvetica, LABEL_SIZE);

    let mut current_month = None;
    for (column, week) in grid.weeks.iter().enumerate() {
        if week.month.is_some() && week.month != current_month {
            let label = month_abbreviation(week.month.unwrap_or_default());
            writer.text_at(CALENDAR_X + column as f32 * step, top - 2.0, label);
            current_month = week.month;
        }
    }

    for (row, label) in DAY_LABELS.iter().enumerate() {
        if !label.is_empty() {
            let y = top + row as f32 * step + SQUARE_SIZE / 2.0;
            writer.text_at(DAY_LABEL_X, y, label);
        }
    }

    for (column, week) in grid.weeks.iter().enumerate() {
        for (row, day) in week.days.iter().enumerate() {
            writer.fill_rect(
                CALENDAR_X + column as f32 * step,
                top + row as f32 * step,
                SQUARE_SIZE,
                SQUARE_SIZE,
                day.color,
            );
        }
    }

    writer.set_y(top + 7.0 * step + SECTION_GAP);
    writer.ln(SECTION_GAP);
}

fn draw_repository(
    writer: &mut PageWriter,
    section: &Section,
    description: Option<&str>,
    readme: Option<&Readme>,
) {
    let style = writer.style().clone();

    writer.set_font(FontFace::HelveticaBold, 14.0);
    writer.cell(0.0, ROW_HEIGHT, &section.title, Align::Left, None);
    writer.ln(ROW_HEIGHT);

    writer.set_font(FontFace::Helvetica, 12.0);
    writer.multi_cell(0.0, ROW_HEIGHT, description.unwrap_or(NO_DESCRIPTION), Align::Left);

    if let Some(url) = &section.external_link {
        writer.set_underline(true);
        writer.set_text_color(style.link_color);
        writer.cell(
            0.0,
            ROW_HEIGHT,
            &section.title,
            Align::Left,
            Some(LinkTarget::Uri(url.clone())),
        );
        writer.ln(ROW_HEIGHT);
        writer.set_underline(false);
        writer.set_text_color(style.text_color);
    }

    if let Some(readme) = readme {
        writer.set_font(FontFace::HelveticaBold, 12.0);
        writer.cell(0.0, ROW_HEIGHT, "README:", Align::Left, None);
        writer.ln(ROW_HEIGHT);
        for block in &readme.blocks {
            writer.append(block);
        }
    }
    writer.ln(SECTION_GAP);
}

/// Lays out the content alone and returns the 1-based page each section starts on.
pub fn measure_sections(style: &LayoutStyle, sections: &[Section]) -> Result<Vec<u32>, PortfolioError> {
    let mut writer = PageWriter::new(style.clone());
    writer.add_page();
    let mut starts = Vec::with_capacity(sections.len());
    for (index, section) in sections.iter().enumerate() {
        starts.push(layout_section(&mut writer, index, section, None)?);
    }
    debug!(
        "measuring pass: {} section(s) over {} page(s), starts {:?}",
        sections.len(),
        writer.page_count(),
        starts
    );
    Ok(starts)
}

/// The laid out portfolio, ready to be written as PDF.
#[derive(Debug, Clone)]
pub struct RenderedPortfolio {
    pub title: String,
    pub writer: PageWriter,
    pub toc: Vec<TocEntry>,
    pub convergence: Convergence,
}

impl RenderedPortfolio {
    pub fn total_pages(&self) -> usize {
        self.writer.page_count()
    }
}

/// Runs the measuring pass, reconciles the TOC and performs the final pass.
///
/// The final pass checks that every section starts on the page its TOC row
/// claims and fails with a layout error otherwise.
pub fn layout_portfolio(
    style: &LayoutStyle,
    portfolio: &Portfolio,
) -> Result<RenderedPortfolio, PortfolioError> {
    let sections = &portfolio.sections;
    let relative = measure_sections(style, sections)?;
    let titles: Vec<String> = sections.iter().map(|s| s.title.clone()).collect();
    let (mut entries, convergence) = toc::reconcile(style, &titles, &relative)?;

    let mut writer = PageWriter::new(style.clone());
    writer.add_page();
    writer.set_font(FontFace::HelveticaBold, 16.0);
    writer.cell(0.0, ROW_HEIGHT, &portfolio.title(), Align::Center, None);

    writer.add_page();
    for entry in entries.iter_mut() {
        entry.link = Some(writer.register_link());
    }
    toc::render_toc(&mut writer, &entries);
    let toc_pages = writer.current_page() - 1;
    if toc_pages != convergence.toc_pages {
        return Err(PortfolioError::LayoutError {
            message: format!(
                "table of contents took {} page(s) but {} were reserved",
                toc_pages, convergence.toc_pages
            ),
        });
    }

    writer.add_page();
    for (index, (section, entry)) in sections.iter().zip(&entries).enumerate() {
        let page = layout_section(&mut writer, index, section, entry.link)?;
        if page != entry.page {
            return Err(PortfolioError::LayoutError {
                message: format!(
                    "section {:?} starts on page {} but the table of contents lists page {}",
                    section.title, page, entry.page
                ),
            });
        }
    }

    info!(
        "laid out {} section(s) on {} page(s) ({} TOC page(s))",
        sections.len(),
        writer.page_count(),
        convergence.toc_pages
    );

    Ok(RenderedPortfolio {
        title: portfolio.title(),
        writer,
        toc: entries,
        convergence,
    })
}
