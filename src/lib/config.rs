//! Configuration for page layout and repository selection.
//!
//! Configuration is read from a TOML file. Every key is optional: missing or
//! mistyped values keep their defaults, and a file that is not valid TOML falls
//! back to the default configuration with a warning.
//!
//! # Configuration Example
//!
//! ```toml
//! [page]
//! size = "a4"            # or "letter"; `width` / `height` in mm override it
//! footer = true
//!
//! [margin]
//! top = 10.0
//! right = 10.0
//! bottom = 20.0
//! left = 10.0
//!
//! [text]
//! size = 10
//! codesize = 9
//! textcolor = { r = 0, g = 0, b = 0 }
//!
//! [link]
//! textcolor = { r = 0, g = 0, b = 255 }
//!
//! [toc]
//! size = 12
//! rowheight = 5.0
//! leaderwidth = 170.0
//! maxiterations = 100
//!
//! [selection]
//! format = "pdf"
//! calendar = true
//! prioritize = ["my-best-project"]
//! exclude = ["dotfiles"]
//! ```
//!
//! When no `--config` is given the binary looks for `portfoliorc.toml` in the
//! working directory, then in `<config dir>/github-portfolio/`.

use crate::styling::{LayoutStyle, Margins, PageSize, Rgb};
use crate::OutputFormat;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use toml::Value;

/// Name of the configuration file looked up by default.
pub const CONFIG_FILE_NAME: &str = "portfoliorc.toml";

/// Configuration source for the portfolio configuration.
#[derive(Debug, Clone)]
pub enum ConfigSource<'a> {
    /// Use the built-in defaults
    Default,
    /// Load configuration from a file path
    File(&'a str),
    /// Use a TOML string directly
    Embedded(&'a str),
}

/// Which repositories go into the portfolio and in which format.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionConfig {
    pub prioritize: Vec<String>,
    pub exclude: Vec<String>,
    pub calendar: bool,
    pub format: OutputFormat,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        SelectionConfig {
            prioritize: Vec::new(),
            exclude: Vec::new(),
            calendar: true,
            format: OutputFormat::Pdf,
        }
    }
}

/// Complete configuration: layout style plus selection defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioConfig {
    pub style: LayoutStyle,
    pub selection: SelectionConfig,
}

/// Reads a number that may be written as an integer or a float.
fn get_f32(value: &Value, key: &str) -> Option<f32> {
    match value.get(key)? {
        Value::Float(f) => Some(*f as f32),
        Value::Integer(i) => Some(*i as f32),
        _ => None,
    }
}

/// Parses an RGB color stored as `{ r, g, b }` under `field`.
fn parse_color(value: Option<&Value>, field: &str) -> Option<Rgb> {
    value.and_then(|c| {
        let color = c.get(field)?;
        let channel = |name: &str| {
            color
                .get(name)?
                .as_integer()
                .and_then(|v| u8::try_from(v).ok())
        };
        Some(Rgb(channel("r")?, channel("g")?, channel("b")?))
    })
}

fn parse_string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let items = value?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    )
}

fn parse_margins(value: Option<&Value>, default: Margins) -> Margins {
    let Some(margins) = value else {
        return default;
    };
    Margins {
        top: get_f32(margins, "top").unwrap_or(default.top),
        right: get_f32(margins, "right").unwrap_or(default.right),
        bottom: get_f32(margins, "bottom").unwrap_or(default.bottom),
        left: get_f32(margins, "left").unwrap_or(default.left),
    }
}

fn parse_page(value: Option<&Value>, style: &mut LayoutStyle) {
    let Some(page) = value else {
        return;
    };
    if let Some(name) = page.get("size").and_then(|v| v.as_str()) {
        match PageSize::from_name(name) {
            Some(size) => style.page = size,
            None => warn!("Unknown page size {:?}, keeping {:?}", name, style.page),
        }
    }
    if let Some(width) = get_f32(page, "width").filter(|w| *w > 0.0) {
        style.page.width = width;
    }
    if let Some(height) = get_f32(page, "height").filter(|h| *h > 0.0) {
        style.page.height = height;
    }
    if let Some(footer) = page.get("footer").and_then(|v| v.as_bool()) {
        style.footer = footer;
    }
}

fn parse_text(value: Option<&Value>, style: &mut LayoutStyle) {
    let Some(text) = value else {
        return;
    };
    if let Some(size) = get_f32(text, "size").filter(|s| *s > 0.0) {
        style.body_size = size;
    }
    if let Some(size) = get_f32(text, "codesize").filter(|s| *s > 0.0) {
        style.code_size = size;
    }
    if let Some(height) = get_f32(text, "codelineheight").filter(|h| *h > 0.0) {
        style.code_line_height = height;
    }
    if let Some(height) = get_f32(text, "minlineheight").filter(|h| *h > 0.0) {
        style.min_line_height = height;
    }
    if let Some(step) = get_f32(text, "indentstep").filter(|s| *s >= 0.0) {
        style.indent_step = step;
    }
    if let Some(color) = parse_color(Some(text), "textcolor") {
        style.text_color = color;
    }
}

fn parse_toc(value: Option<&Value>, style: &mut LayoutStyle) {
    let Some(toc) = value else {
        return;
    };
    if let Some(size) = get_f32(toc, "size").filter(|s| *s > 0.0) {
        style.toc.font_size = size;
    }
    if let Some(height) = get_f32(toc, "rowheight").filter(|h| *h > 0.0) {
        style.toc.row_height = height;
    }
    if let Some(width) = get_f32(toc, "leaderwidth").filter(|w| *w > 0.0) {
        style.toc.leader_width = width;
    }
    if let Some(width) = get_f32(toc, "numberwidth").filter(|w| *w > 0.0) {
        style.toc.number_width = width;
    }
    if let Some(cap) = toc.get("maxiterations").and_then(|v| v.as_integer()) {
        if cap > 0 {
            style.toc.max_iterations = cap as usize;
        }
    }
}

fn parse_selection(value: Option<&Value>, default: SelectionConfig) -> SelectionConfig {
    let mut selection = default;
    let Some(section) = value else {
        return selection;
    };
    if let Some(list) = parse_string_list(section.get("prioritize")) {
        selection.prioritize = list;
    }
    if let Some(list) = parse_string_list(section.get("exclude")) {
        selection.exclude = list;
    }
    if let Some(calendar) = section.get("calendar").and_then(|v| v.as_bool()) {
        selection.calendar = calendar;
    }
    if let Some(name) = section.get("format").and_then(|v| v.as_str()) {
        match OutputFormat::from_name(name) {
            Some(format) => selection.format = format,
            None => warn!("Unknown output format {:?} in configuration", name),
        }
    }
    selection
}

/// Parses a TOML configuration string.
///
/// Invalid TOML yields the default configuration.
///
/// # Examples
/// ```rust
/// use github_portfolio::config::parse_config_string;
///
/// let config = parse_config_string("[toc]\nrowheight = 6.0\n[selection]\nexclude = [\"dotfiles\"]");
/// assert_eq!(config.style.toc.row_height, 6.0);
/// assert_eq!(config.selection.exclude, vec!["dotfiles".to_string()]);
/// ```
pub fn parse_config_string(config_str: &str) -> PortfolioConfig {
    let config: Value = match toml::from_str(config_str) {
        Ok(v) => v,
        Err(e) => {
            warn!("Invalid configuration, using defaults: {}", e);
            return PortfolioConfig::default();
        }
    };

    let defaults = PortfolioConfig::default();
    let mut style = defaults.style;
    parse_page(config.get("page"), &mut style);
    style.margins = parse_margins(config.get("margin"), style.margins);
    parse_text(config.get("text"), &mut style);
    if let Some(color) = parse_color(config.get("link"), "textcolor") {
        style.link_color = color;
    }
    parse_toc(config.get("toc"), &mut style);

    PortfolioConfig {
        style,
        selection: parse_selection(config.get("selection"), defaults.selection),
    }
}

/// Loads the configuration from the given source.
///
/// An unreadable file falls back to the defaults with a warning.
pub fn load_config_from_source(source: ConfigSource) -> PortfolioConfig {
    match source {
        ConfigSource::Default => PortfolioConfig::default(),
        ConfigSource::File(path) => match fs::read_to_string(Path::new(path)) {
            Ok(config_str) => {
                debug!("loading configuration from {}", path);
                parse_config_string(&config_str)
            }
            Err(e) => {
                warn!("Cannot read configuration {}: {}; using defaults", path, e);
                PortfolioConfig::default()
            }
        },
        ConfigSource::Embedded(content) => parse_config_string(content),
    }
}

/// Finds the configuration file to use when none is given explicitly.
///
/// Looks in `dir` first, then in the user configuration directory.
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    let local = dir.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    let user = dirs::config_dir()?
        .join("github-portfolio")
        .join(CONFIG_FILE_NAME);
    user.is_file().then_some(user)
}

/// A complete configuration file holding the default values.
pub fn default_config_toml() -> String {
    let config = PortfolioConfig::default();
    let style = &config.style;
    let color = |c: Rgb| format!("{{ r = {}, g = {}, b = {} }}", c.0, c.1, c.2);
    format!(
        r#"# github-portfolio configuration

[page]
width = {width:.1}
height = {height:.1}
footer = {footer}

[margin]
top = {top:.1}
right = {right:.1}
bottom = {bottom:.1}
left = {left:.1}

[text]
size = {body_size:.1}
codesize = {code_size:.1}
codelineheight = {code_line_height:.1}
minlineheight = {min_line_height:.1}
indentstep = {indent_step:.1}
textcolor = {text_color}

[link]
textcolor = {link_color}

[toc]
size = {toc_size:.1}
rowheight = {row_height:.1}
leaderwidth = {leader_width:.1}
numberwidth = {number_width:.1}
maxiterations = {max_iterations}

[selection]
format = "{format}"
calendar = {calendar}
prioritize = []
exclude = []
"#,
        width = style.page.width,
        height = style.page.height,
        footer = style.footer,
        top = style.margins.top,
        right = style.margins.right,
        bottom = style.margins.bottom,
        left = style.margins.left,
        body_size = style.body_size,
        code_size = style.code_size,
        code_line_height = style.code_line_height,
        min_line_height = style.min_line_height,
        indent_step = style.indent_step,
        text_color = color(style.text_color),
        link_color = color(style.link_color),
        toc_size = style.toc.font_size,
        row_height = style.toc.row_height,
        leader_width = style.toc.leader_width,
        number_width = style.toc.number_width,
        max_iterations = style.toc.max_iterations,
        format = config.selection.format.name(),
        calendar = config.selection.calendar,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        let value: Value = toml::from_str(
            r#"
            [link]
            textcolor = { r = 12, g = 34, b = 56 }
            bad = { r = 300, g = 0, b = 0 }
            partial = { r = 1 }
            "#,
        )
        .unwrap();
        let link = value.get("link");
        assert_eq!(parse_color(link, "textcolor"), Some(Rgb(12, 34, 56)));
        assert_eq!(parse_color(link, "bad"), None);
        assert_eq!(parse_color(link, "partial"), None);
        assert_eq!(parse_color(link, "missing"), None);
        assert_eq!(parse_color(None, "textcolor"), None);
    }

    #[test]
    fn test_parse_config_string() {
        let config = parse_config_string(
            r#"
            [page]
            size = "letter"
            footer = false

            [margin]
            top = 15
            left = 12.5

            [text]
            size = 11
            textcolor = { r = 50, g = 50, b = 50 }

            [toc]
            rowheight = 6.0
            maxiterations = 20

            [selection]
            format = "md"
            calendar = false
            prioritize = ["a", "b"]
            "#,
        );
        let style = &config.style;
        assert_eq!(style.page, PageSize::LETTER);
        assert!(!style.footer);
        assert_eq!(style.margins.top, 15.0);
        assert_eq!(style.margins.left, 12.5);
        assert_eq!(style.margins.bottom, Margins::default().bottom);
        assert_eq!(style.body_size, 11.0);
        assert_eq!(style.text_color, Rgb(50, 50, 50));
        assert_eq!(style.toc.row_height, 6.0);
        assert_eq!(style.toc.max_iterations, 20);
        assert_eq!(config.selection.format, OutputFormat::Markdown);
        assert!(!config.selection.calendar);
        assert_eq!(config.selection.prioritize, vec!["a", "b"]);
        assert!(config.selection.exclude.is_empty());
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = parse_config_string(
            r#"
            [text]
            size = "large"
            [toc]
            rowheight = -1.0
            maxiterations = 0
            [selection]
            format = "docx"
            calendar = "yes"
            "#,
        );
        assert_eq!(config, PortfolioConfig::default());
    }

    #[test]
    fn test_parse_config_string_invalid_toml() {
        let config = parse_config_string("this is not valid toml {{{");
        assert_eq!(config, PortfolioConfig::default());
    }

    #[test]
    fn test_config_sources() {
        assert_eq!(
            load_config_from_source(ConfigSource::Default),
            PortfolioConfig::default()
        );
        assert_eq!(
            load_config_from_source(ConfigSource::File("nonexistent.toml")),
            PortfolioConfig::default()
        );
        let config = load_config_from_source(ConfigSource::Embedded("[link]\ntextcolor = { r = 1, g = 2, b = 3 }"));
        assert_eq!(config.style.link_color, Rgb(1, 2, 3));
    }

    #[test]
    fn test_config_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[toc]\nleaderwidth = 150.0\n").unwrap();
        assert_eq!(find_config_file(dir.path()), Some(path.clone()));
        let config = load_config_from_source(ConfigSource::File(path.to_str().unwrap()));
        assert_eq!(config.style.toc.leader_width, 150.0);
    }

    #[test]
    fn test_default_config_round_trips() {
        let text = default_config_toml();
        assert_eq!(parse_config_string(&text), PortfolioConfig::default());
    }
}
