//! Pre-flight checks on the repository selection.
//!
//! These never stop a run. They return human readable warnings that the binary
//! logs before rendering, so typos in `--prioritize` or `--exclude` do not go
//! unnoticed.

use crate::github::Repository;
use std::path::Path;

/// Checks the prioritize and exclude lists against the fetched repositories.
pub fn validate_selection(
    repositories: &[Repository],
    prioritize: &[String],
    exclude: &[String],
) -> Vec<String> {
    let mut warnings = Vec::new();
    let known = |name: &str| repositories.iter().any(|r| r.name == name);

    for name in prioritize {
        if !known(name) {
            warnings.push(format!(
                "Prioritized repository '{}' was not found among the public repositories",
                name
            ));
        }
        if exclude.contains(name) {
            warnings.push(format!(
                "Repository '{}' is both prioritized and excluded; it will be excluded",
                name
            ));
        }
    }
    for name in exclude {
        if !known(name) {
            warnings.push(format!(
                "Excluded repository '{}' was not found among the public repositories",
                name
            ));
        }
    }

    let remaining = repositories
        .iter()
        .filter(|r| !exclude.contains(&r.name))
        .count();
    if remaining == 0 {
        warnings.push("No repositories left to include in the portfolio".to_string());
    }
    warnings
}

/// Checks that the output file can be created.
pub fn validate_output_path(path: &Path) -> Vec<String> {
    let mut warnings = Vec::new();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            warnings.push(format!(
                "Output directory '{}' does not exist",
                parent.display()
            ));
        }
    }
    if path.is_dir() {
        warnings.push(format!("Output path '{}' is a directory", path.display()));
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str) -> Repository {
        Repository {
            name: name.to_string(),
            description: None,
            html_url: format!("https://github.com/octocat/{}", name),
            stargazers_count: 0,
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clean_selection_has_no_warnings() {
        let repos = vec![repo("a"), repo("b")];
        assert!(validate_selection(&repos, &names(&["a"]), &names(&["b"])).is_empty());
    }

    #[test]
    fn test_unknown_names() {
        let repos = vec![repo("a")];
        let warnings = validate_selection(&repos, &names(&["typo"]), &names(&["other"]));
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("typo"));
        assert!(warnings[1].contains("other"));
    }

    #[test]
    fn test_conflicting_and_empty_selection() {
        let repos = vec![repo("a")];
        let warnings = validate_selection(&repos, &names(&["a"]), &names(&["a"]));
        assert!(warnings.iter().any(|w| w.contains("both prioritized and excluded")));
        assert!(warnings.iter().any(|w| w.contains("No repositories left")));
    }

    #[test]
    fn test_output_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_output_path(&dir.path().join("portfolio.pdf")).is_empty());
        assert_eq!(validate_output_path(dir.path()).len(), 1);
        assert_eq!(
            validate_output_path(&dir.path().join("missing").join("portfolio.pdf")).len(),
            1
        );
    }
}
