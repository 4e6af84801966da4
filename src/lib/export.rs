//! HTML and Markdown renditions of a portfolio.
//!
//! Both formats are single files without pagination, so they skip the layout engine
//! and write the sections directly. READMEs are included as their raw text.

use crate::portfolio::{CalendarGrid, Portfolio, SectionBody, NO_DESCRIPTION};
use crate::styling::Rgb;
use std::fmt::Write;

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn hex(color: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
}

fn write_calendar_html(out: &mut String, title: &str, grid: &CalendarGrid) {
    let _ = writeln!(out, "<h2>{}</h2>", escape_html(title));
    let _ = writeln!(
        out,
        "<div style=\"display: grid; grid-template-columns: repeat({}, 10px); grid-template-rows: repeat(7, 10px); grid-auto-flow: column; gap: 2px;\">",
        grid.columns()
    );
    for week in &grid.weeks {
        for day in &week.days {
            let _ = writeln!(
                out,
                "<div style=\"background-color: {};\" title=\"{}: {} contributions\"></div>",
                hex(day.color),
                escape_html(&day.date),
                day.count
            );
        }
    }
    out.push_str("</div>\n");
}

/// Renders the portfolio as a standalone HTML page.
pub fn render_html(portfolio: &Portfolio) -> String {
    let title = escape_html(&portfolio.title());
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>",
        title
    );
    let _ = writeln!(out, "<h1>{}</h1>", title);
    for section in &portfolio.sections {
        match &section.body {
            SectionBody::Calendar(grid) => write_calendar_html(&mut out, &section.title, grid),
            SectionBody::Repository {
                description,
                readme,
            } => {
                let _ = writeln!(out, "<h2>{}</h2>", escape_html(&section.title));
                let _ = writeln!(
                    out,
                    "<p>{}</p>",
                    escape_html(description.as_deref().unwrap_or(NO_DESCRIPTION))
                );
                if let Some(url) = &section.external_link {
                    let _ = writeln!(out, "<a href=\"{}\">Link</a>", escape_html(url));
                }
                if let Some(readme) = readme {
                    out.push_str("<h3>README</h3>\n");
                    let _ = writeln!(out, "<pre>{}</pre>", escape_html(&readme.text));
                }
            }
        }
    }
    out.push_str("</body></html>\n");
    out
}

/// Renders the portfolio as a Markdown document.
pub fn render_markdown(portfolio: &Portfolio) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", portfolio.title());
    for section in &portfolio.sections {
        let _ = writeln!(out, "## {}\n", section.title);
        match &section.body {
            SectionBody::Calendar(grid) => {
                let _ = writeln!(
                    out,
                    "Total contributions in the last year: {}\n",
                    grid.total_contributions
                );
            }
            SectionBody::Repository {
                description,
                readme,
            } => {
                let _ = writeln!(out, "{}\n", description.as_deref().unwrap_or(NO_DESCRIPTION));
                if let Some(url) = &section.external_link {
                    let _ = writeln!(out, "[Link]({})\n", url);
                }
                if let Some(readme) = readme {
                    out.push_str("### README\n\n");
                    let _ = writeln!(out, "{}\n", readme.text.trim_end());
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{ContributionCalendar, ContributionDay, ContributionWeek, Repository};
    use crate::portfolio::{build_sections, Section};
    use std::collections::HashMap;

    fn portfolio() -> Portfolio {
        let repos = vec![
            Repository {
                name: "tool".to_string(),
                description: Some("Parses <xml> & more".to_string()),
                html_url: "https://github.com/octocat/tool".to_string(),
                stargazers_count: 3,
            },
            Repository {
                name: "bare".to_string(),
                description: None,
                html_url: "https://github.com/octocat/bare".to_string(),
                stargazers_count: 0,
            },
        ];
        let calendar = ContributionCalendar {
            total_contributions: 42,
            weeks: (0..3)
                .map(|w| ContributionWeek {
                    contribution_days: vec![ContributionDay {
                        date: format!("2024-03-{:02}", w + 1),
                        contribution_count: w as u64,
                        color: "#9be9a8".to_string(),
                    }],
                })
                .collect(),
        };
        let mut readmes = HashMap::new();
        readmes.insert("tool".to_string(), "# Tool\n`a < b`\n".to_string());
        let sections = build_sections(&repos, Some(&calendar), &readmes).unwrap();
        Portfolio::new("octocat", sections)
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_html_output() {
        let html = render_html(&portfolio());
        assert!(html.contains("<h1>octocat&#39;s GitHub Portfolio</h1>"));
        assert!(html.contains("<p>Parses &lt;xml&gt; &amp; more</p>"));
        assert!(html.contains("<p>No description</p>"));
        assert!(html.contains("<a href=\"https://github.com/octocat/tool\">Link</a>"));
        assert!(html.contains("<pre># Tool\n`a &lt; b`\n</pre>"));
        // Three weeks fetched, the first one is dropped.
        assert!(html.contains("grid-template-columns: repeat(2, 10px)"));
        // Column flow needs explicit rows to stack the seven weekdays.
        assert!(html.contains("grid-template-rows: repeat(7, 10px)"));
        assert_eq!(html.matches("background-color: #9be9a8").count(), 2);
        assert!(!html.contains("2024-03-01"));
    }

    #[test]
    fn test_markdown_output() {
        let md = render_markdown(&portfolio());
        assert!(md.starts_with("# octocat's GitHub Portfolio\n\n"));
        assert!(md.contains("## Contribution Calendar\n\nTotal contributions in the last year: 42\n"));
        assert!(md.contains("## tool\n\nParses <xml> & more\n\n[Link](https://github.com/octocat/tool)\n"));
        assert!(md.contains("### README\n\n# Tool\n`a < b`\n"));
        assert!(md.contains("## bare\n\nNo description\n"));
    }

    #[test]
    fn test_empty_portfolio() {
        let portfolio = Portfolio::new("nobody", Vec::<Section>::new());
        assert!(render_html(&portfolio).ends_with("</body></html>\n"));
        assert_eq!(render_markdown(&portfolio), "# nobody's GitHub Portfolio\n\n");
    }
}
