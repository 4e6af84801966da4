use github_portfolio::debug::LayoutReport;
use github_portfolio::github::{NoReadmes, Repository};
use github_portfolio::portfolio::{build_sections, layout_portfolio, measure_sections, Portfolio};
use github_portfolio::styling::LayoutStyle;
use github_portfolio::toc::{absolute_pages, converge, reconcile};
use github_portfolio::PortfolioError;

fn repos(n: usize) -> Vec<Repository> {
    (0..n)
        .map(|i| Repository {
            name: format!("project-{:03}", i),
            description: None,
            html_url: format!("https://github.com/octocat/project-{:03}", i),
            stargazers_count: (n - i) as u64,
        })
        .collect()
}

fn portfolio(n: usize) -> Portfolio {
    let sections = build_sections(&repos(n), None, &NoReadmes).unwrap();
    Portfolio::new("octocat", sections)
}

#[test]
fn test_small_portfolio_needs_one_toc_page() {
    let rendered = layout_portfolio(&LayoutStyle::default(), &portfolio(3)).unwrap();
    assert_eq!(rendered.convergence.toc_pages, 1);
    assert_eq!(rendered.convergence.iterations, 1);
    // Title page and TOC come first.
    assert_eq!(rendered.toc[0].page, 3);
}

#[test]
fn test_long_toc_shifts_every_section() {
    let style = LayoutStyle::default();
    let portfolio = portfolio(60);
    let relative = measure_sections(&style, &portfolio.sections).unwrap();
    let rendered = layout_portfolio(&style, &portfolio).unwrap();

    assert_eq!(rendered.convergence.toc_pages, 2);
    assert_eq!(rendered.convergence.assumed, vec![1, 2]);
    let pages: Vec<u32> = rendered.toc.iter().map(|e| e.page).collect();
    assert_eq!(pages, absolute_pages(&relative, 2));
    assert_eq!(pages[0], 4);

    let report = LayoutReport::from_rendered(&rendered);
    for entry in &report.entries {
        assert_eq!(entry.start_page, Some(entry.toc_page), "{}", entry.title);
    }
    assert_eq!(report.total_pages, rendered.writer.page_count());
}

#[test]
fn test_assumptions_never_decrease() {
    let style = LayoutStyle::default();
    for n in [0, 1, 51, 52, 120] {
        let titles: Vec<String> = (0..n).map(|i| format!("t{}", i)).collect();
        let relative: Vec<u32> = (1..=n as u32).collect();
        let (entries, convergence) = reconcile(&style, &titles, &relative).unwrap();
        assert_eq!(entries.len(), n);
        assert!(convergence.assumed.windows(2).all(|w| w[0] <= w[1]));
        assert!(convergence.iterations <= n.max(1));
    }
}

#[test]
fn test_empty_portfolio_still_has_a_toc_page() {
    let rendered = layout_portfolio(&LayoutStyle::default(), &portfolio(0)).unwrap();
    assert!(rendered.toc.is_empty());
    assert_eq!(rendered.convergence.toc_pages, 1);
    assert_eq!(rendered.total_pages(), 3);
}

#[test]
fn test_iteration_cap_is_a_layout_error() {
    let err = converge(3, |assumed| assumed * 2).unwrap_err();
    assert!(matches!(err, PortfolioError::LayoutError { .. }));
    assert!(err.to_string().contains("Layout Error"));
}

#[test]
fn test_mismatched_inputs_are_rejected() {
    let titles = vec!["a".to_string()];
    let err = reconcile(&LayoutStyle::default(), &titles, &[]).unwrap_err();
    assert!(matches!(err, PortfolioError::LayoutError { .. }));
}
