use github_portfolio::config::parse_config_string;
use github_portfolio::styling::LayoutStyle;
use predicates::prelude::*;

#[test]
fn test_binary_help_lists_options() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("github-portfolio");
    cmd.arg("--help");
    cmd.assert().success().stdout(
        predicate::str::contains("USERNAME")
            .and(predicate::str::contains("--prioritize"))
            .and(predicate::str::contains("--layout-report")),
    );
}

#[test]
fn test_binary_returns_failure_when_no_username() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("github-portfolio");
    cmd.assert().failure();
}

#[test]
fn test_binary_rejects_unknown_format() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("github-portfolio");
    cmd.arg("octocat").arg("--format").arg("docx");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("docx"));
}

#[test]
fn test_binary_verbose_and_quiet_conflict() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("github-portfolio");
    cmd.arg("octocat").arg("--verbose").arg("--quiet");
    cmd.assert().failure();
}

#[test]
fn test_binary_prints_default_configuration() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("github-portfolio");
    cmd.arg("--get-default-configuration");
    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("[toc]"));
    assert!(text.contains("[selection]"));

    let parsed = parse_config_string(&text);
    assert_eq!(parsed.style, LayoutStyle::default());
}
