//! Configuration files feed the layout: numbers may be integers or floats, and
//! a changed TOC row height changes how many TOC pages a portfolio needs.

use github_portfolio::config::{self, ConfigSource};
use github_portfolio::github::{NoReadmes, Repository};
use github_portfolio::portfolio::{build_sections, layout_portfolio, Portfolio};
use github_portfolio::styling::LayoutStyle;
use github_portfolio::OutputFormat;
use std::fs;
use tempfile::tempdir;

fn portfolio(n: usize) -> Portfolio {
    let repos: Vec<Repository> = (0..n)
        .map(|i| Repository {
            name: format!("repo-{}", i),
            description: None,
            html_url: format!("https://github.com/octocat/repo-{}", i),
            stargazers_count: 0,
        })
        .collect();
    Portfolio::new("octocat", build_sections(&repos, None, &NoReadmes).unwrap())
}

#[test]
fn test_integer_and_float_values_are_equivalent() {
    let integers = config::parse_config_string("[toc]\nrowheight = 6\n[text]\nsize = 11\n");
    let floats = config::parse_config_string("[toc]\nrowheight = 6.0\n[text]\nsize = 11.0\n");
    assert_eq!(integers, floats);
    assert_eq!(integers.style.toc.row_height, 6.0);
    assert_eq!(integers.style.body_size, 11.0);
}

#[test]
fn test_config_file_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(config::CONFIG_FILE_NAME);
    fs::write(
        &path,
        r#"
[page]
size = "letter"

[selection]
format = "html"
calendar = false
prioritize = ["repo-2"]
exclude = ["repo-0"]
"#,
    )
    .unwrap();

    assert_eq!(config::find_config_file(dir.path()), Some(path.clone()));
    let loaded = config::load_config_from_source(ConfigSource::File(path.to_str().unwrap()));
    assert_eq!(loaded.selection.format, OutputFormat::Html);
    assert!(!loaded.selection.calendar);
    assert_eq!(loaded.selection.prioritize, vec!["repo-2".to_string()]);
    assert_eq!(loaded.selection.exclude, vec!["repo-0".to_string()]);
    assert_ne!(loaded.style.page, LayoutStyle::default().page);
}

#[test]
fn test_missing_or_broken_file_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let loaded = config::load_config_from_source(ConfigSource::File(missing.to_str().unwrap()));
    assert_eq!(loaded.style, LayoutStyle::default());

    let broken = config::load_config_from_source(ConfigSource::Embedded("[toc\nrowheight ="));
    assert_eq!(broken.style, LayoutStyle::default());
}

#[test]
fn test_row_height_changes_toc_page_count() {
    // 40 rows fit one default TOC page but not one with 8 mm rows.
    let portfolio = portfolio(40);
    let default = layout_portfolio(&LayoutStyle::default(), &portfolio).unwrap();
    assert_eq!(default.convergence.toc_pages, 1);

    let tall = config::parse_config_string("[toc]\nrowheight = 8\n");
    let rendered = layout_portfolio(&tall.style, &portfolio).unwrap();
    assert_eq!(rendered.convergence.toc_pages, 2);
    assert!(rendered.toc.iter().all(|e| e.page >= 4));
}
