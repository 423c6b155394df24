//! GitHub organization repository listing
//!
//! Lists every repository of an organization through the REST API,
//! following `Link: <...>; rel="next"` headers until the last page.

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LINK};
use reqwest::{StatusCode, Url};
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::config::{Config, Provider};
use crate::credentials::CredentialSource;
use crate::error::{MirrorError, Result};
use crate::report::Reporter;
use crate::repository::Repository;

/// Additional attempts after a 401 before giving up on a page
pub const MAX_AUTH_RETRIES: u32 = 3;

const OAUTH_SCOPES: &str = "repo, user";
const ACCEPTED_OAUTH_SCOPES: &str = "user";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Source of an organization's repository collection
#[async_trait]
pub trait RepositoryLister: Send + Sync {
    /// Fetch the complete collection, in the order the source returns it
    async fn list(&self) -> Result<Vec<Repository>>;

    /// Provider name for display/logging
    fn provider_name(&self) -> &'static str;
}

/// One page of API results
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub repositories: Vec<Repository>,

    /// URL of the following page, if the API announced one
    pub next: Option<String>,
}

/// Credentials attached to a single request
#[derive(Debug, Clone)]
pub struct RequestAuth {
    pub username: String,
    pub password: String,
    pub otp: Option<String>,
}

/// Paginated GitHub REST client for organization repositories
pub struct GitHubLister {
    http: reqwest::Client,
    headers: HeaderMap,
    api_url: String,
    org: String,
    username: String,
    password: Option<String>,
    two_factor_auth: bool,
    credentials: Box<dyn CredentialSource>,
    reporter: Reporter,
}

impl fmt::Debug for GitHubLister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubLister")
            .field("api_url", &self.api_url)
            .field("org", &self.org)
            .field("username", &self.username)
            .field("two_factor_auth", &self.two_factor_auth)
            .finish_non_exhaustive()
    }
}

impl GitHubLister {
    /// Create a lister from the `[auth]`, `[defaults]` and `[github]` sections
    pub fn new(
        config: &Config,
        credentials: Box<dyn CredentialSource>,
        reporter: Reporter,
    ) -> Result<Self> {
        let Some(Provider::GitHub(github)) = &config.provider else {
            return Err(MirrorError::Configuration(
                "no [github] section configured".to_string(),
            ));
        };

        let username = config.auth.username.clone().ok_or_else(|| {
            MirrorError::Configuration("[auth] is missing `username`".to_string())
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-oauth-basic"),
            HeaderValue::from_str(&github.github_token).map_err(|_| {
                MirrorError::Configuration(
                    "[github] github_token contains characters not allowed in a header"
                        .to_string(),
                )
            })?,
        );
        headers.insert(
            HeaderName::from_static("x-oauth-scopes"),
            HeaderValue::from_static(OAUTH_SCOPES),
        );
        headers.insert(
            HeaderName::from_static("x-accepted-oauth-scopes"),
            HeaderValue::from_static(ACCEPTED_OAUTH_SCOPES),
        );

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| MirrorError::Transport {
                url: config.defaults.git_api_url.clone(),
                source,
            })?;

        Ok(Self {
            http,
            headers,
            api_url: config.defaults.git_api_url.clone(),
            org: github.org.clone(),
            username,
            password: config.auth.password.clone(),
            two_factor_auth: config.auth.two_factor_auth,
            credentials,
            reporter,
        })
    }

    /// First page URL for this lister's organization
    pub fn start_url(&self) -> Result<String> {
        org_repos_url(&self.api_url, &self.org)
    }

    /// Fetch every page starting at `start_url`
    ///
    /// A 401 is retried on the same URL up to [`MAX_AUTH_RETRIES`] times
    /// with the same two-factor code; the count resets for every new page.
    /// A prompted password is asked for again after a 401.
    pub async fn list_from(&self, start_url: &str) -> Result<Vec<Repository>> {
        let otp = if self.two_factor_auth {
            Some(self.credentials.two_factor_code()?)
        } else {
            None
        };

        let mut prompted_password: Option<String> = None;
        let mut repositories = Vec::new();
        let mut cursor = Some(start_url.to_string());

        while let Some(url) = cursor.take() {
            let mut retry_count = 0;

            let page = loop {
                self.reporter.request(&url);
                if retry_count > 0 {
                    self.reporter.retry(retry_count);
                }

                let password = match (&self.password, &prompted_password) {
                    (Some(configured), _) => configured.clone(),
                    (None, Some(prompted)) => prompted.clone(),
                    (None, None) => {
                        let prompted = self.credentials.password(&self.username)?;
                        prompted_password = Some(prompted.clone());
                        prompted
                    }
                };

                let auth = RequestAuth {
                    username: self.username.clone(),
                    password,
                    otp: otp.clone(),
                };

                match self.fetch_page(&url, &auth).await {
                    Ok(page) => break page,
                    Err(MirrorError::Authentication { status, .. })
                        if retry_count < MAX_AUTH_RETRIES =>
                    {
                        retry_count += 1;
                        warn!(
                            "Status {} for {}, retrying ({}/{})",
                            status, url, retry_count, MAX_AUTH_RETRIES
                        );
                        prompted_password = None;
                    }
                    Err(e) => return Err(e),
                }
            };

            debug!(
                "Fetched {} repositories from {}",
                page.repositories.len(),
                url
            );
            repositories.extend(page.repositories);
            cursor = page.next;
        }

        info!(
            "Found {} repositories for organization: {}",
            repositories.len(),
            self.org
        );
        Ok(repositories)
    }

    /// Issue one authenticated request and decode the page it returns
    pub async fn fetch_page(&self, url: &str, auth: &RequestAuth) -> Result<Page> {
        let mut request = self
            .http
            .get(url)
            .headers(self.headers.clone())
            .basic_auth(&auth.username, Some(&auth.password));

        if let Some(otp) = &auth.otp {
            request = request.header("X-GitHub-OTP", otp);
        }

        let transport = |source: reqwest::Error| MirrorError::Transport {
            url: url.to_string(),
            source,
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let next = next_link_from_headers(response.headers());
        let body = response.text().await.map_err(transport)?;

        if !status.is_success() {
            self.reporter
                .alert(&format!("Status Code: {}", status.as_u16()));

            return Err(if status == StatusCode::UNAUTHORIZED {
                MirrorError::Authentication {
                    status: status.as_u16(),
                    body,
                }
            } else {
                MirrorError::Connection {
                    status: status.as_u16(),
                    body,
                }
            });
        }

        let repositories: Vec<Repository> =
            serde_json::from_str(&body).map_err(|source| MirrorError::MalformedResponse {
                url: url.to_string(),
                source,
            })?;

        Ok(Page { repositories, next })
    }
}

#[async_trait]
impl RepositoryLister for GitHubLister {
    async fn list(&self) -> Result<Vec<Repository>> {
        let start_url = self.start_url()?;
        self.list_from(&start_url).await
    }

    fn provider_name(&self) -> &'static str {
        "GitHub"
    }
}

/// Organization repository listing URL, resolved against the API base
///
/// The base is joined like a relative link, so a base without a trailing
/// slash loses its last path segment.
pub fn org_repos_url(api_url: &str, org: &str) -> Result<String> {
    let path = ["orgs", org, "repos"]
        .iter()
        .map(|segment| segment.trim_matches('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    let mut url = Url::parse(api_url)
        .and_then(|base| base.join(&path))
        .map_err(|e| {
            MirrorError::Configuration(format!("invalid git_api_url {}: {}", api_url, e))
        })?;
    url.query_pairs_mut()
        .append_pair("type", "all")
        .append_pair("per_page", "250");

    Ok(url.to_string())
}

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<([^>]*)>([^<]*)").expect("link pattern is valid"))
}

/// Find the `rel="next"` target across every `Link` header of a response
pub fn next_link_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(next_link)
}

/// Extract the `rel="next"` target from a `Link` header value
pub fn next_link(header: &str) -> Option<String> {
    link_pattern().captures_iter(header).find_map(|caps| {
        let params = caps.get(2)?.as_str();
        let is_next = params
            .split(';')
            .filter_map(|param| param.split_once('='))
            .filter(|(key, _)| key.trim().eq_ignore_ascii_case("rel"))
            .any(|(_, value)| {
                value
                    .trim_matches(|c: char| c == '"' || c == ',' || c.is_whitespace())
                    .split_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
            });

        is_next.then(|| caps[1].to_string())
    })
}
