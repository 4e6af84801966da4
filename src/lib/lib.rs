//! The github_portfolio library turns a GitHub user's public repositories and
//! contribution calendar into a single portfolio document: a paginated PDF with a
//! linked table of contents, an HTML page or a Markdown file.
//!
//! The PDF is produced by a small layout engine. README files are classified line
//! by line into headings, list items, code lines and paragraphs, inline markup is
//! split into styled runs (bold, code, and `$...$` math rendered to plain text),
//! and a [`PageWriter`](writer::PageWriter) places everything on A4 pages. Because
//! the table of contents lists page numbers but also takes pages itself, its size
//! is found by iterating to a fixed point before the final layout pass.
//!
//! Basic usage with data fetched elsewhere:
//! ```rust
//! use github_portfolio::github::{NoReadmes, Repository};
//! use github_portfolio::portfolio::{build_sections, order_repositories, Portfolio};
//! use github_portfolio::styling::LayoutStyle;
//! use github_portfolio::OutputFormat;
//! use std::error::Error;
//!
//! fn example() -> Result<(), Box<dyn Error>> {
//!     let repos = vec![Repository {
//!         name: "hello".to_string(),
//!         description: Some("A greeting".to_string()),
//!         html_url: "https://github.com/octocat/hello".to_string(),
//!         stargazers_count: 3,
//!     }];
//!     let ordered = order_repositories(&repos, &[], &[]);
//!     let sections = build_sections(&ordered, None, &NoReadmes)?;
//!     let portfolio = Portfolio::new("octocat", sections);
//!     let pdf = github_portfolio::render_into_bytes(&portfolio, OutputFormat::Pdf, &LayoutStyle::default())?;
//!     assert!(pdf.starts_with(b"%PDF"));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```
//!
//! ## Pipeline
//! ```text
//! +-------------+     +----------------+     +------------------+
//! | GitHub data | --> | Sections       | --> | Measuring pass   |
//! | repos       |     | calendar grid  |     | relative pages   |
//! | calendar    |     | README blocks  |     +------------------+
//! | READMEs     |     +----------------+              |
//! +-------------+                                     v
//! +-------------+     +----------------+     +------------------+
//! | PDF bytes   | <-- | Final pass     | <-- | TOC fixed point  |
//! | (lopdf)     |     | links bound    |     | T pages of TOC   |
//! +-------------+     +----------------+     +------------------+
//! ```

pub mod config;
pub mod debug;
pub mod export;
pub mod fonts;
pub mod github;
pub mod latex;
pub mod markdown;
pub mod pdf;
pub mod portfolio;
pub mod styling;
pub mod toc;
pub mod validation;
pub mod writer;

use debug::LayoutReport;
use log::info;
use portfolio::{layout_portfolio, Portfolio, RenderedPortfolio};
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use styling::LayoutStyle;

/// Errors that can occur while fetching data, laying out or writing a portfolio.
#[derive(Debug)]
pub enum PortfolioError {
    /// A mandatory GitHub request failed
    FetchError {
        message: String,
        url: Option<String>,
        suggestion: Option<String>,
    },
    /// The fetched data is malformed
    DataError {
        message: String,
        suggestion: Option<String>,
    },
    /// An internal layout invariant was violated
    LayoutError { message: String },
    /// PDF serialization failed
    PdfError {
        message: String,
        path: Option<String>,
        suggestion: Option<String>,
    },
    /// Indicates an invalid configuration
    ConfigError { message: String, suggestion: String },
    /// Indicates an I/O error
    IoError {
        message: String,
        path: String,
        suggestion: String,
    },
}

impl Error for PortfolioError {}
impl fmt::Display for PortfolioError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PortfolioError::FetchError {
                message,
                url,
                suggestion,
            } => {
                write!(f, "❌ GitHub Fetch Error: {}", message)?;
                if let Some(u) = url {
                    write!(f, "\n🌐 URL: {}", u)?;
                }
                if let Some(hint) = suggestion {
                    write!(f, "\n💡 Suggestion: {}", hint)?;
                }
                Ok(())
            }
            PortfolioError::DataError {
                message,
                suggestion,
            } => {
                write!(f, "❌ Data Error: {}", message)?;
                if let Some(hint) = suggestion {
                    write!(f, "\n💡 Suggestion: {}", hint)?;
                }
                Ok(())
            }
            PortfolioError::LayoutError { message } => {
                write!(f, "❌ Layout Error: {}", message)
            }
            PortfolioError::PdfError {
                message,
                path,
                suggestion,
            } => {
                write!(f, "❌ PDF Generation Error: {}", message)?;
                if let Some(p) = path {
                    write!(f, "\n📁 Path: {}", p)?;
                }
                if let Some(hint) = suggestion {
                    write!(f, "\n💡 Suggestion: {}", hint)?;
                }
                Ok(())
            }
            PortfolioError::ConfigError {
                message,
                suggestion,
            } => {
                write!(f, "❌ Configuration Error: {}", message)?;
                write!(f, "\n💡 Suggestion: {}", suggestion)?;
                Ok(())
            }
            PortfolioError::IoError {
                message,
                path,
                suggestion,
            } => {
                write!(f, "❌ File Error: {}", message)?;
                write!(f, "\n📁 Path: {}", path)?;
                write!(f, "\n💡 Suggestion: {}", suggestion)?;
                Ok(())
            }
        }
    }
}

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Pdf,
    Html,
    Markdown,
}

impl OutputFormat {
    /// Parses `pdf`, `html` or `md` (case-insensitive; `markdown` is accepted too).
    pub fn from_name(name: &str) -> Option<OutputFormat> {
        match name.to_ascii_lowercase().as_str() {
            "pdf" => Some(OutputFormat::Pdf),
            "html" => Some(OutputFormat::Html),
            "md" | "markdown" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
        }
    }

    /// File extension including the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => ".pdf",
            OutputFormat::Html => ".html",
            OutputFormat::Markdown => ".md",
        }
    }
}

/// Appends the format's extension to `path` unless it already ends with it.
pub fn normalize_output_path(path: &str, format: OutputFormat) -> PathBuf {
    if path.ends_with(format.extension()) {
        PathBuf::from(path)
    } else {
        PathBuf::from(format!("{}{}", path, format.extension()))
    }
}

/// Lays out the portfolio and serializes it as PDF.
pub fn render_pdf(
    portfolio: &Portfolio,
    style: &LayoutStyle,
) -> Result<(RenderedPortfolio, Vec<u8>), PortfolioError> {
    let rendered = layout_portfolio(style, portfolio)?;
    let bytes = pdf::write_pdf(&rendered.writer, &document_info(portfolio, &rendered))?;
    Ok((rendered, bytes))
}

fn document_info(portfolio: &Portfolio, rendered: &RenderedPortfolio) -> pdf::DocumentInfo {
    pdf::DocumentInfo {
        title: rendered.title.clone(),
        author: Some(portfolio.username.clone()),
    }
}

/// Renders the portfolio in the given format and returns the file content.
pub fn render_into_bytes(
    portfolio: &Portfolio,
    format: OutputFormat,
    style: &LayoutStyle,
) -> Result<Vec<u8>, PortfolioError> {
    match format {
        OutputFormat::Pdf => render_pdf(portfolio, style).map(|(_, bytes)| bytes),
        OutputFormat::Html => Ok(export::render_html(portfolio).into_bytes()),
        OutputFormat::Markdown => Ok(export::render_markdown(portfolio).into_bytes()),
    }
}

/// Renders the portfolio and writes it to `path`.
///
/// For PDF output the layout report of the run is returned.
pub fn render_into_file(
    portfolio: &Portfolio,
    format: OutputFormat,
    style: &LayoutStyle,
    path: &Path,
) -> Result<Option<LayoutReport>, PortfolioError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(PortfolioError::IoError {
                message: "Output directory does not exist".to_string(),
                path: parent.display().to_string(),
                suggestion: format!("Create the directory first: mkdir -p {}", parent.display()),
            });
        }
    }

    if format == OutputFormat::Pdf {
        let rendered = layout_portfolio(style, portfolio)?;
        pdf::save_pdf(&rendered.writer, &document_info(portfolio, &rendered), path)?;
        info!(
            "wrote {} page(s) to {}",
            rendered.total_pages(),
            path.display()
        );
        return Ok(Some(LayoutReport::from_rendered(&rendered)));
    }

    let bytes = render_into_bytes(portfolio, format, style)?;
    std::fs::write(path, &bytes).map_err(|e| PortfolioError::IoError {
        message: format!("Failed to write output: {}", e),
        path: path.display().to_string(),
        suggestion: if e.kind() == std::io::ErrorKind::PermissionDenied {
            "Check that you have write permissions for this location".to_string()
        } else {
            "Try a different output path or check available disk space".to_string()
        },
    })?;
    info!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(None)
}
