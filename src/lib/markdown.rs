//! Line-oriented markdown handling for README content.
//!
//! READMEs are not parsed as full CommonMark. Each line is classified on its own
//! by [`BlockClassifier`], which only remembers whether it is inside a fenced code
//! block, and the text of each line is split into styled runs by [`tokenize`].
//!
//! ```text
//! "- see **docs** and `cargo doc`"
//!        |
//!        v  BlockClassifier::classify
//! ListItem { marker: Bullet, indent: 0, runs }
//!        |
//!        v  tokenize
//! [Plain("see "), Bold("docs"), Plain(" and "), Code("cargo doc")]
//! ```

use crate::latex;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Math and code spans, claimed left to right.
    static ref MATH_OR_CODE: Regex = Regex::new(r"\$([^$]+)\$|`([^`]+)`").unwrap();
    static ref BOLD: Regex = Regex::new(r"\*\*(.*?)\*\*").unwrap();
    static ref UNORDERED_ITEM: Regex = Regex::new(r"^([-*+])\s+(.*)$").unwrap();
    static ref ORDERED_ITEM: Regex = Regex::new(r"^(\d+)\.\s+(.*)$").unwrap();
    static ref ATX_HEADING: Regex = Regex::new(r"^(#{1,6})\s+(.*)$").unwrap();
}

/// Width of a tab stop when expanding tabs in code lines.
const TAB_WIDTH: usize = 4;

/// A piece of inline text with a single style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyledRun {
    Plain(String),
    Bold(String),
    Code(String),
    /// Math already rendered to plain text.
    Math(String),
}

impl StyledRun {
    pub fn text(&self) -> &str {
        match self {
            StyledRun::Plain(text)
            | StyledRun::Bold(text)
            | StyledRun::Code(text)
            | StyledRun::Math(text) => text,
        }
    }
}

/// Label drawn in front of a list item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListMarker {
    Bullet,
    /// The item number including its dot, e.g. `"3."`.
    Ordinal(String),
}

impl ListMarker {
    pub fn label(&self) -> &str {
        match self {
            ListMarker::Bullet => "*",
            ListMarker::Ordinal(label) => label,
        }
    }
}

/// One classified README line.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Heading {
        level: u8,
        indent: usize,
        runs: Vec<StyledRun>,
    },
    ListItem {
        marker: ListMarker,
        indent: usize,
        runs: Vec<StyledRun>,
    },
    /// A line inside a fenced code block, kept verbatim.
    CodeLine(String),
    Paragraph {
        indent: usize,
        runs: Vec<StyledRun>,
    },
    /// A blank line.
    RawSpacer,
}

/// Font size of a heading of the given level: `max(16 - 2 * level, 10)`.
pub fn heading_font_size(level: u8) -> f32 {
    (16.0 - 2.0 * level as f32).max(10.0)
}

/// Splits a line of inline markup into styled runs.
///
/// Math (`$...$`) and code (`` `...` ``) spans are found left to right, so a code
/// span protects a `$` inside it and vice versa. Bold (`**...**`) is only recognized
/// in the text between those spans. Empty segments produce no run.
pub fn tokenize(line: &str) -> Vec<StyledRun> {
    let mut runs = Vec::new();
    let mut last = 0;
    for caps in MATH_OR_CODE.captures_iter(line) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_bold_split(&mut runs, &line[last..whole.start()]);
        if let Some(math) = caps.get(1) {
            runs.push(StyledRun::Math(latex::render(math.as_str())));
        } else if let Some(code) = caps.get(2) {
            runs.push(StyledRun::Code(code.as_str().to_string()));
        }
        last = whole.end();
    }
    push_bold_split(&mut runs, &line[last..]);
    runs
}

fn push_bold_split(runs: &mut Vec<StyledRun>, segment: &str) {
    let mut last = 0;
    for caps in BOLD.captures_iter(segment) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let before = &segment[last..whole.start()];
        if !before.is_empty() {
            runs.push(StyledRun::Plain(before.to_string()));
        }
        if !inner.as_str().is_empty() {
            runs.push(StyledRun::Bold(inner.as_str().to_string()));
        }
        last = whole.end();
    }
    let rest = &segment[last..];
    if !rest.is_empty() {
        runs.push(StyledRun::Plain(rest.to_string()));
    }
}

/// Classifies README lines one at a time, tracking fenced code blocks.
#[derive(Debug, Default, Clone)]
pub struct BlockClassifier {
    in_code_block: bool,
}

impl BlockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the previous line left the classifier inside a code fence.
    pub fn in_code_block(&self) -> bool {
        self.in_code_block
    }

    /// Classifies one line. Fence lines toggle the code state and produce no block.
    pub fn classify(&mut self, line: &str) -> Option<ContentBlock> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.trim().starts_with("```") {
            self.in_code_block = !self.in_code_block;
            return None;
        }

        if self.in_code_block {
            return Some(ContentBlock::CodeLine(expand_tabs(line)));
        }

        let stripped = line.trim_start();
        let indent = (line.chars().count() - stripped.chars().count()) / 2;

        if let Some(caps) = UNORDERED_ITEM.captures(stripped) {
            return Some(ContentBlock::ListItem {
                marker: ListMarker::Bullet,
                indent,
                runs: tokenize(&caps[2]),
            });
        }

        if let Some(caps) = ORDERED_ITEM.captures(stripped) {
            return Some(ContentBlock::ListItem {
                marker: ListMarker::Ordinal(format!("{}.", &caps[1])),
                indent,
                runs: tokenize(&caps[2]),
            });
        }

        if let Some(caps) = ATX_HEADING.captures(stripped) {
            return Some(ContentBlock::Heading {
                level: caps[1].len() as u8,
                indent,
                runs: tokenize(&caps[2]),
            });
        }

        if stripped.is_empty() {
            return Some(ContentBlock::RawSpacer);
        }

        Some(ContentBlock::Paragraph {
            indent,
            runs: tokenize(stripped),
        })
    }
}

/// Classifies every line of a README.
pub fn classify_document(text: &str) -> Vec<ContentBlock> {
    let mut classifier = BlockClassifier::new();
    text.split('\n')
        .filter_map(|line| classifier.classify(line))
        .collect()
}

fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}
