use clap::{Arg, ArgAction, Command};
use github_portfolio::config::{self, ConfigSource, PortfolioConfig};
use github_portfolio::debug::LayoutReport;
use github_portfolio::github::{GithubClient, ReadmeSource};
use github_portfolio::portfolio::{build_sections, order_repositories, Portfolio};
use github_portfolio::{validation, OutputFormat, PortfolioError};
use log::{error, info, warn};
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Debug)]
enum AppError {
    ArgumentError(String),
    PathError(String),
    PortfolioError(PortfolioError),
    ReportError(std::io::Error),
}

impl From<PortfolioError> for AppError {
    fn from(e: PortfolioError) -> Self {
        AppError::PortfolioError(e)
    }
}

/// Verbosity level for output
#[derive(Debug, Clone, Copy, PartialEq)]
enum Verbosity {
    Quiet,   // No output except errors
    Normal,  // Standard output
    Verbose, // Detailed output
}

impl Verbosity {
    fn from_matches(matches: &clap::ArgMatches) -> Self {
        if matches.get_flag("quiet") {
            Verbosity::Quiet
        } else if matches.get_flag("verbose") {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Log filter used when RUST_LOG is not set.
    fn default_filter(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
        }
    }
}

/// Get the configuration file path based on CLI arguments or default lookup.
///
/// Priority order:
/// 1. If `--config` is explicitly provided, use that file
/// 2. If `portfoliorc.toml` exists in the current directory, use it
/// 3. If it exists in the user configuration directory, use that one
/// 4. Otherwise the built-in defaults apply
fn get_config_path(matches: &clap::ArgMatches) -> Option<PathBuf> {
    if let Some(config_file) = matches.get_one::<String>("config") {
        return Some(PathBuf::from(config_file));
    }
    let current_dir = std::env::current_dir().ok()?;
    config::find_config_file(&current_dir)
}

fn load_config(matches: &clap::ArgMatches) -> PortfolioConfig {
    match get_config_path(matches) {
        Some(path) => {
            let path = path.to_string_lossy().into_owned();
            info!("Using configuration {}", path);
            config::load_config_from_source(ConfigSource::File(&path))
        }
        None => config::load_config_from_source(ConfigSource::Default),
    }
}

fn get_format(matches: &clap::ArgMatches, config: &PortfolioConfig) -> Result<OutputFormat, AppError> {
    match matches.get_one::<String>("format") {
        Some(name) => OutputFormat::from_name(name)
            .ok_or_else(|| AppError::ArgumentError(format!("Unknown output format '{}'", name))),
        None => Ok(config.selection.format),
    }
}

fn get_output_path(
    matches: &clap::ArgMatches,
    username: &str,
    format: OutputFormat,
) -> Result<PathBuf, AppError> {
    let current_dir = std::env::current_dir().map_err(|e| AppError::PathError(e.to_string()))?;
    let requested = matches
        .get_one::<String>("output")
        .cloned()
        .unwrap_or_else(|| format!("{}_portfolio", username));
    Ok(current_dir.join(github_portfolio::normalize_output_path(&requested, format)))
}

fn get_token(matches: &clap::ArgMatches) -> Option<String> {
    matches
        .get_one::<String>("token")
        .cloned()
        .or_else(|| std::env::var("GITHUB_TOKEN").ok())
        .filter(|t| !t.is_empty())
}

/// Names given on the command line replace the configured list.
fn get_names(matches: &clap::ArgMatches, id: &str, configured: &[String]) -> Vec<String> {
    match matches.get_many::<String>(id) {
        Some(values) => values.cloned().collect(),
        None => configured.to_vec(),
    }
}

fn run(matches: clap::ArgMatches) -> Result<(), AppError> {
    let verbosity = Verbosity::from_matches(&matches);
    let username = matches
        .get_one::<String>("username")
        .ok_or_else(|| AppError::ArgumentError("No username provided".to_string()))?;

    let config = load_config(&matches);
    let format = get_format(&matches, &config)?;
    let output_path = get_output_path(&matches, username, format)?;
    let prioritize = get_names(&matches, "prioritize", &config.selection.prioritize);
    let exclude = get_names(&matches, "exclude", &config.selection.exclude);
    let with_calendar = config.selection.calendar && !matches.get_flag("no-calendar");

    let client = GithubClient::new(username, get_token(&matches))?;
    let repositories = client.repositories()?;

    if verbosity != Verbosity::Quiet {
        let mut warnings = validation::validate_selection(&repositories, &prioritize, &exclude);
        warnings.extend(validation::validate_output_path(&output_path));
        if !warnings.is_empty() {
            if verbosity == Verbosity::Verbose {
                info!("🔍 Pre-flight validation:");
            }
            for warning in &warnings {
                warn!("{}", warning);
            }
        } else if verbosity == Verbosity::Verbose {
            info!("✓ Pre-flight validation passed");
        }
    }

    let ordered = order_repositories(&repositories, &prioritize, &exclude);
    let calendar = if with_calendar {
        Some(client.contribution_calendar()?)
    } else {
        None
    };
    let readmes: &dyn ReadmeSource = &client;
    let sections = build_sections(&ordered, calendar.as_ref(), readmes)?;
    let portfolio = Portfolio::new(client.username(), sections);

    if verbosity == Verbosity::Verbose {
        info!(
            "📄 Generating {} with {} section(s)...",
            format.name(),
            portfolio.sections.len()
        );
    }

    let report = github_portfolio::render_into_file(&portfolio, format, &config.style, &output_path)?;

    if let Some(report_path) = matches.get_one::<String>("layout-report") {
        match &report {
            Some(report) => save_report(report, report_path, verbosity)?,
            None => warn!("--layout-report only applies to PDF output; no report written"),
        }
    }

    if verbosity != Verbosity::Quiet {
        println!("✅ Successfully saved portfolio to {}", output_path.display());

        if verbosity == Verbosity::Verbose {
            if let Some(report) = &report {
                println!(
                    "   Pages: {} ({} table of contents page(s), {} pass(es))",
                    report.total_pages, report.toc_pages, report.iterations
                );
            }
            if let Ok(metadata) = fs::metadata(&output_path) {
                let size_kb = metadata.len() as f64 / 1024.0;
                if size_kb < 1024.0 {
                    println!("   Size: {:.1} KB", size_kb);
                } else {
                    println!("   Size: {:.2} MB", size_kb / 1024.0);
                }
            }
        }
    }

    Ok(())
}

fn save_report(report: &LayoutReport, path: &str, verbosity: Verbosity) -> Result<(), AppError> {
    report.save_to_json_file(path).map_err(AppError::ReportError)?;
    if verbosity != Verbosity::Quiet {
        println!("📝 Layout report written to {}", path);
    }
    Ok(())
}

fn build_command() -> Command {
    Command::new("github-portfolio")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate a PDF, HTML or Markdown portfolio from a GitHub profile")
        .after_help(
            "EXAMPLES:\n  \
            github-portfolio octocat\n  \
            github-portfolio octocat --token $GITHUB_TOKEN -o me.pdf --prioritize hello-world\n  \
            github-portfolio octocat --format html --no-calendar --exclude dotfiles\n  \
            github-portfolio octocat --layout-report layout.json --verbose\n",
        )
        .arg(
            Arg::new("username")
                .value_name("USERNAME")
                .help("GitHub user whose public repositories are collected")
                .required_unless_present("get-default-configuration"),
        )
        .arg(
            Arg::new("token")
                .short('t')
                .long("token")
                .value_name("TOKEN")
                .help("GitHub access token (defaults to $GITHUB_TOKEN); needed for the contribution calendar"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT_PATH")
                .help("Output file; the format's extension is appended when missing (defaults to ./<USERNAME>_portfolio)"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .value_parser(["pdf", "html", "md"])
                .help("Output format (default: pdf)"),
        )
        .arg(
            Arg::new("no-calendar")
                .long("no-calendar")
                .help("Leave out the contribution calendar")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("prioritize")
                .short('p')
                .long("prioritize")
                .value_name("REPO")
                .num_args(1..)
                .help("Repositories to list first, in the given order")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("exclude")
                .short('x')
                .long("exclude")
                .value_name("REPO")
                .num_args(1..)
                .help("Repositories to leave out")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("CONFIG_FILE")
                .help("Path to configuration file (TOML format). Auto-detects portfoliorc.toml if not specified"),
        )
        .arg(
            Arg::new("layout-report")
                .long("layout-report")
                .value_name("JSON_FILE")
                .help("Write a JSON report of the page layout (PDF only)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Show detailed output including validation warnings and file size")
                .action(ArgAction::SetTrue)
                .conflicts_with("quiet"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress all output except errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
        .arg(
            Arg::new("get-default-configuration")
                .long("get-default-configuration")
                .help("Print a default portfoliorc.toml to stdout and exit")
                .action(ArgAction::SetTrue),
        )
}

fn main() {
    let matches = build_command().get_matches();

    // RUST_LOG still takes precedence over the verbosity flags.
    let verbosity = Verbosity::from_matches(&matches);
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(verbosity.default_filter()),
    )
    .format_timestamp_millis()
    .init();

    if matches.get_flag("get-default-configuration") {
        println!("{}", config::default_config_toml());
        process::exit(0);
    }

    if let Err(e) = run(matches) {
        match e {
            AppError::ArgumentError(e) => error!("[X] Argument error: {}", e),
            AppError::PathError(e) => error!("[X] Path error: {}", e),
            AppError::PortfolioError(e) => error!("[X] {}", e),
            AppError::ReportError(e) => error!("[X] Cannot write layout report: {}", e),
        }
        process::exit(1);
    }
}
