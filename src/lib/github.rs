//! GitHub data shapes and the blocking API client.
//!
//! The data types mirror the JSON the REST and GraphQL APIs return and are usable
//! without network access (tests build them by hand or from JSON strings). The
//! [`GithubClient`] itself needs the `fetch` feature.

use crate::PortfolioError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const API_ROOT: &str = "https://api.github.com";

/// A public repository as listed by `GET /users/{user}/repos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub stargazers_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionCalendar {
    pub total_contributions: u64,
    pub weeks: Vec<ContributionWeek>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionWeek {
    pub contribution_days: Vec<ContributionDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionDay {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub contribution_count: u64,
    /// `#RRGGBB`.
    pub color: String,
}

/// Anything that can provide the raw README of a repository.
///
/// `None` means the repository has no README or it could not be retrieved.
pub trait ReadmeSource {
    fn readme(&self, repository: &str) -> Option<String>;
}

impl ReadmeSource for HashMap<String, String> {
    fn readme(&self, repository: &str) -> Option<String> {
        self.get(repository).cloned()
    }
}

/// A source without any README.
pub struct NoReadmes;

impl ReadmeSource for NoReadmes {
    fn readme(&self, _repository: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    user: Option<GraphQlUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlUser {
    contributions_collection: ContributionsCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    contribution_calendar: ContributionCalendar,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

const CONTRIBUTIONS_QUERY: &str = "query($login: String!) { user(login: $login) { \
    contributionsCollection { contributionCalendar { totalContributions \
    weeks { contributionDays { contributionCount date color } } } } } }";

/// Extracts the calendar from a GraphQL response body.
pub fn parse_calendar_response(body: &str) -> Result<ContributionCalendar, PortfolioError> {
    let response: GraphQlResponse =
        serde_json::from_str(body).map_err(|e| PortfolioError::FetchError {
            message: format!("Unexpected contribution calendar response: {}", e),
            url: Some(format!("{}/graphql", API_ROOT)),
            suggestion: None,
        })?;
    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(PortfolioError::FetchError {
            message: format!("GitHub GraphQL API returned errors: {}", messages.join("; ")),
            url: Some(format!("{}/graphql", API_ROOT)),
            suggestion: Some(
                "Check the username and token, or use --no-calendar to skip the calendar"
                    .to_string(),
            ),
        });
    }
    response
        .data
        .and_then(|data| data.user)
        .map(|user| user.contributions_collection.contribution_calendar)
        .ok_or_else(|| PortfolioError::FetchError {
            message: "GitHub returned no user for the contribution calendar".to_string(),
            url: Some(format!("{}/graphql", API_ROOT)),
            suggestion: Some("Check that the username exists".to_string()),
        })
}

/// Returns the `rel="next"` target of a `Link` response header.
pub fn next_page_url(link_header: &str) -> Option<String> {
    link_header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

#[cfg(feature = "fetch")]
pub use client::GithubClient;

#[cfg(feature = "fetch")]
mod client {
    use super::*;
    use log::{debug, info};
    use reqwest::blocking::Client;
    use reqwest::header::{ACCEPT, AUTHORIZATION, LINK};

    const USER_AGENT: &str = concat!("github-portfolio/", env!("CARGO_PKG_VERSION"));

    /// Blocking GitHub API client for one user.
    pub struct GithubClient {
        client: Client,
        username: String,
        token: Option<String>,
    }

    impl GithubClient {
        pub fn new(username: &str, token: Option<String>) -> Result<Self, PortfolioError> {
            let client = Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .map_err(|e| PortfolioError::FetchError {
                    message: format!("Failed to create HTTP client: {}", e),
                    url: None,
                    suggestion: None,
                })?;
            Ok(GithubClient {
                client,
                username: username.to_string(),
                token,
            })
        }

        pub fn username(&self) -> &str {
            &self.username
        }

        fn fetch_error(url: &str, error: impl std::fmt::Display) -> PortfolioError {
            PortfolioError::FetchError {
                message: error.to_string(),
                url: Some(url.to_string()),
                suggestion: Some(
                    "Check the username and your network connection; pass --token if you hit the rate limit"
                        .to_string(),
                ),
            }
        }

        /// Lists every public repository of the user, following pagination.
        pub fn repositories(&self) -> Result<Vec<Repository>, PortfolioError> {
            let mut repositories = Vec::new();
            let mut next = Some(format!(
                "{}/users/{}/repos?type=public&per_page=100",
                API_ROOT, self.username
            ));
            while let Some(url) = next {
                debug!("GET {}", url);
                let mut request = self.client.get(&url);
                if let Some(token) = &self.token {
                    request = request.header(AUTHORIZATION, format!("token {}", token));
                }
                let response = request
                    .send()
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| Self::fetch_error(&url, e))?;
                next = response
                    .headers()
                    .get(LINK)
                    .and_then(|value| value.to_str().ok())
                    .and_then(next_page_url);
                let page: Vec<Repository> =
                    response.json().map_err(|e| Self::fetch_error(&url, e))?;
                repositories.extend(page);
            }
            info!(
                "fetched {} repositories for {}",
                repositories.len(),
                self.username
            );
            Ok(repositories)
        }

        /// Fetches the contribution calendar through the GraphQL API.
        pub fn contribution_calendar(&self) -> Result<ContributionCalendar, PortfolioError> {
            let url = format!("{}/graphql", API_ROOT);
            let Some(token) = &self.token else {
                return Err(PortfolioError::FetchError {
                    message: "The contribution calendar needs an access token".to_string(),
                    url: Some(url),
                    suggestion: Some(
                        "Pass --token or set GITHUB_TOKEN, or use --no-calendar".to_string(),
                    ),
                });
            };
            let body = serde_json::json!({
                "query": CONTRIBUTIONS_QUERY,
                "variables": { "login": self.username },
            });
            debug!("POST {}", url);
            let text = self
                .client
                .post(&url)
                .header(AUTHORIZATION, format!("bearer {}", token))
                .json(&body)
                .send()
                .and_then(|r| r.error_for_status())
                .and_then(|r| r.text())
                .map_err(|e| Self::fetch_error(&url, e))?;
            parse_calendar_response(&text)
        }
    }

    impl ReadmeSource for GithubClient {
        fn readme(&self, repository: &str) -> Option<String> {
            let url = format!("{}/repos/{}/{}/readme", API_ROOT, self.username, repository);
            let mut request = self
                .client
                .get(&url)
                .header(ACCEPT, "application/vnd.github.v3.raw");
            if let Some(token) = &self.token {
                request = request.header(AUTHORIZATION, format!("token {}", token));
            }
            match request.send() {
                Ok(response) if response.status().is_success() => match response.text() {
                    Ok(text) => Some(text),
                    Err(e) => {
                        debug!("failed to read README of {}: {}", repository, e);
                        None
                    }
                },
                Ok(response) => {
                    debug!("no README for {} (HTTP {})", repository, response.status());
                    None
                }
                Err(e) => {
                    debug!("failed to fetch README of {}: {}", repository, e);
                    None
                }
            }
        }
    }
}
