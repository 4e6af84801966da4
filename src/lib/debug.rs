//! Layout report: a JSON dump of how the table of contents was reconciled.

use crate::portfolio::RenderedPortfolio;
use serde::Serialize;

/// One TOC row as it ended up in the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub title: String,
    pub toc_page: u32,
    /// Page the section heading was actually drawn on.
    pub start_page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutReport {
    pub title: String,
    pub total_pages: usize,
    pub toc_pages: u32,
    pub iterations: usize,
    pub assumed_toc_pages: Vec<u32>,
    pub entries: Vec<ReportEntry>,
}

impl LayoutReport {
    pub fn from_rendered(rendered: &RenderedPortfolio) -> Self {
        let entries = rendered
            .toc
            .iter()
            .enumerate()
            .map(|(index, entry)| ReportEntry {
                title: entry.title.clone(),
                toc_page: entry.page,
                start_page: rendered.writer.section_start(index),
            })
            .collect();
        LayoutReport {
            title: rendered.title.clone(),
            total_pages: rendered.total_pages(),
            toc_pages: rendered.convergence.toc_pages,
            iterations: rendered.convergence.iterations,
            assumed_toc_pages: rendered.convergence.assumed.clone(),
            entries,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Saves the report to a JSON file for inspection.
    ///
    /// # Example
    /// ```no_run
    /// use github_portfolio::debug::LayoutReport;
    /// use github_portfolio::portfolio::{layout_portfolio, Portfolio};
    /// use github_portfolio::styling::LayoutStyle;
    ///
    /// let portfolio = Portfolio::new("octocat", Vec::new());
    /// let rendered = layout_portfolio(&LayoutStyle::default(), &portfolio).unwrap();
    /// LayoutReport::from_rendered(&rendered)
    ///     .save_to_json_file("layout.json")
    ///     .unwrap();
    /// ```
    pub fn save_to_json_file(&self, file_path: &str) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(file_path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{NoReadmes, Repository};
    use crate::portfolio::{build_sections, layout_portfolio, Portfolio};
    use crate::styling::LayoutStyle;

    #[test]
    fn test_report_matches_layout() {
        let repos = vec![Repository {
            name: "tool".to_string(),
            description: None,
            html_url: "https://github.com/octocat/tool".to_string(),
            stargazers_count: 1,
        }];
        let sections = build_sections(&repos, None, &NoReadmes).unwrap();
        let rendered =
            layout_portfolio(&LayoutStyle::default(), &Portfolio::new("octocat", sections)).unwrap();
        let report = LayoutReport::from_rendered(&rendered);
        assert_eq!(report.toc_pages, 1);
        assert_eq!(report.entries[0].toc_page, 3);
        assert_eq!(report.entries[0].start_page, Some(3));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["entries"][0]["title"], "tool");
        assert_eq!(json["total_pages"], 3);
    }

    #[test]
    fn test_save_to_json_file() {
        let report = LayoutReport {
            title: "t".to_string(),
            total_pages: 2,
            toc_pages: 1,
            iterations: 1,
            assumed_toc_pages: vec![1],
            entries: Vec::new(),
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        report.save_to_json_file(path.to_str().unwrap()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"toc_pages\": 1"));
    }
}
