use ini::{Ini, ParseOption, Properties};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{MirrorError, Result};

/// Commented template written when the configuration file does not exist yet
pub const CONFIG_TEMPLATE: &str = include_str!("../config.example.ini");

pub const DEFAULT_GIT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GERRIT_PORT: u16 = 29418;

/// Main configuration for one repomirror run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// File the configuration was read from; the repository list is saved
    /// next to it
    pub path: PathBuf,

    /// Credentials for the hosting API
    pub auth: AuthConfig,

    /// Connection defaults
    pub defaults: DefaultsConfig,

    /// Where repositories are listed from, if any source is configured
    pub provider: Option<Provider>,
}

/// `[auth]` section
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthConfig {
    pub username: Option<String>,

    /// Prompted for when absent
    pub password: Option<String>,

    pub two_factor_auth: bool,
}

/// `[defaults]` section
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultsConfig {
    pub git_api_url: String,
}

/// Repository source selected by which section is present
#[derive(Debug, Clone, PartialEq)]
pub enum Provider {
    GitHub(GitHubConfig),
    Gerrit(GerritConfig),
}

/// `[github]` section
#[derive(Debug, Clone, PartialEq)]
pub struct GitHubConfig {
    pub github_token: String,
    pub org: String,
}

/// `[gerrit]` section
#[derive(Debug, Clone, PartialEq)]
pub struct GerritConfig {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub identity_file: String,
}

fn default_git_api_url() -> String {
    DEFAULT_GIT_API_URL.to_string()
}
fn default_gerrit_server() -> String {
    "gerrit-server".to_string()
}
fn default_gerrit_user() -> String {
    "bob_builder".to_string()
}
fn default_gerrit_identity_file() -> String {
    "~/.ssh/bob_builder".to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            git_api_url: default_git_api_url(),
        }
    }
}

impl Default for GerritConfig {
    fn default() -> Self {
        Self {
            server: default_gerrit_server(),
            port: DEFAULT_GERRIT_PORT,
            user: default_gerrit_user(),
            identity_file: default_gerrit_identity_file(),
        }
    }
}

impl Config {
    /// Load the configuration, writing a template first if the file is missing
    ///
    /// A freshly written template still has placeholder values, so the run
    /// stops with a configuration error pointing at the new file.
    pub fn load_or_bootstrap(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| MirrorError::io(parent, e))?;
        }
        std::fs::write(path, CONFIG_TEMPLATE).map_err(|e| MirrorError::io(path, e))?;

        info!("Created configuration template at: {:?}", path);
        Err(MirrorError::Configuration(format!(
            "no configuration found, a template was written to {:?}; fill it in and run again",
            path
        )))
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| MirrorError::io(path, e))?;
        Self::parse(&content, path)
    }

    /// Parse INI content; `path` is recorded for deriving the list file
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        // Passwords and tokens are taken verbatim: no quote or escape handling
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..Default::default()
        };
        let ini = Ini::load_from_str_opt(content, options).map_err(|e| {
            MirrorError::Configuration(format!("failed to parse {:?}: {}", path, e))
        })?;

        let auth = match ini.section(Some("auth")) {
            Some(section) => AuthConfig {
                username: non_empty(section, "username"),
                password: section.get("password").map(str::to_string),
                two_factor_auth: match section.get("two_factor_auth") {
                    Some(raw) => parse_bool("auth", "two_factor_auth", raw)?,
                    None => false,
                },
            },
            None => AuthConfig::default(),
        };

        let defaults = DefaultsConfig {
            git_api_url: ini
                .section(Some("defaults"))
                .and_then(|s| non_empty(s, "git_api_url"))
                .unwrap_or_else(default_git_api_url),
        };

        let provider = if let Some(section) = ini.section(Some("github")) {
            Some(Provider::GitHub(GitHubConfig {
                github_token: required(section, "github", "github_token")?,
                org: required(section, "github", "org")?,
            }))
        } else if let Some(section) = ini.section(Some("gerrit")) {
            Some(Provider::Gerrit(GerritConfig::from_section(section)?))
        } else {
            None
        };

        debug!(
            "Loaded configuration from {:?} (provider: {:?})",
            path,
            provider.as_ref().map(Provider::name)
        );

        Ok(Self {
            path: path.to_path_buf(),
            auth,
            defaults,
            provider,
        })
    }

    /// Where the fetched repository list is saved: the config path with a
    /// `.json` extension
    pub fn repos_file_path(&self) -> PathBuf {
        self.path.with_extension("json")
    }
}

impl GerritConfig {
    fn from_section(section: &Properties) -> Result<Self> {
        let defaults = Self::default();
        let port = match section.get("port") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                MirrorError::Configuration(format!("[gerrit] port is not a valid port: {}", raw))
            })?,
            None => defaults.port,
        };

        Ok(Self {
            server: non_empty(section, "server").unwrap_or(defaults.server),
            port,
            user: non_empty(section, "user").unwrap_or(defaults.user),
            identity_file: non_empty(section, "identity_file").unwrap_or(defaults.identity_file),
        })
    }
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::GitHub(_) => "GitHub",
            Provider::Gerrit(_) => "Gerrit",
        }
    }
}

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| MirrorError::Configuration(format!("failed to expand {}: {}", raw, e)))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn non_empty(section: &Properties, key: &str) -> Option<String> {
    section
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required(section: &Properties, section_name: &str, key: &str) -> Result<String> {
    non_empty(section, key).ok_or_else(|| {
        MirrorError::Configuration(format!("[{}] is missing `{}`", section_name, key))
    })
}

/// Boolean spellings accepted by INI configuration files
fn parse_bool(section: &str, key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Ok(true),
        "0" | "no" | "false" | "off" => Ok(false),
        _ => Err(MirrorError::Configuration(format!(
            "[{}] {} is not a boolean: {}",
            section, key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<Config> {
        Config::parse(content, Path::new("mirror/config.ini"))
    }

    #[test]
    fn test_full_github_config() {
        let config = parse(
            r#"
[auth]
username = octocat
password = s3cr\et
two_factor_auth = Yes

[defaults]
git_api_url = https://github.example.com/api/v3/

[github]
github_token = ghp_abc
org = acme
"#,
        )
        .unwrap();

        assert_eq!(config.auth.username.as_deref(), Some("octocat"));
        assert_eq!(config.auth.password.as_deref(), Some(r"s3cr\et"));
        assert!(config.auth.two_factor_auth);
        assert_eq!(
            config.defaults.git_api_url,
            "https://github.example.com/api/v3/"
        );
        assert_eq!(
            config.provider,
            Some(Provider::GitHub(GitHubConfig {
                github_token: "ghp_abc".to_string(),
                org: "acme".to_string(),
            }))
        );
    }

    #[test]
    fn test_defaults_injected() {
        let config = parse("[auth]\nusername = octocat\n").unwrap();

        assert!(!config.auth.two_factor_auth);
        assert!(config.auth.password.is_none());
        assert_eq!(config.defaults.git_api_url, DEFAULT_GIT_API_URL);
        assert!(config.provider.is_none());
    }

    #[test]
    fn test_invalid_boolean_is_rejected() {
        let result = parse("[auth]\ntwo_factor_auth = maybe\n");
        assert_matches!(result, Err(MirrorError::Configuration(_)));
    }

    #[test]
    fn test_github_section_requires_org() {
        let result = parse("[github]\ngithub_token = ghp_abc\n");
        assert_matches!(result, Err(MirrorError::Configuration(msg)) if msg.contains("org"));
    }

    #[test]
    fn test_github_wins_over_gerrit() {
        let config = parse("[github]\ngithub_token = t\norg = acme\n[gerrit]\n").unwrap();
        assert_eq!(config.provider.unwrap().name(), "GitHub");
    }

    #[test]
    fn test_gerrit_section_defaults() {
        let config = parse("[gerrit]\nport = 2222\n").unwrap();
        assert_eq!(
            config.provider,
            Some(Provider::Gerrit(GerritConfig {
                port: 2222,
                ..GerritConfig::default()
            }))
        );
    }

    #[test]
    fn test_gerrit_invalid_port() {
        let result = parse("[gerrit]\nport = ssh\n");
        assert_matches!(result, Err(MirrorError::Configuration(_)));
    }

    #[test]
    fn test_repos_file_path_replaces_extension() {
        let config = parse("").unwrap();
        assert_eq!(config.repos_file_path(), PathBuf::from("mirror/config.json"));

        let config = Config::parse("", Path::new("settings")).unwrap();
        assert_eq!(config.repos_file_path(), PathBuf::from("settings.json"));
    }

    #[test]
    fn test_template_is_valid_config() {
        let config = parse(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.provider.unwrap().name(), "GitHub");
        assert!(config.auth.password.is_none());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load(Path::new("/nonexistent/path/config.ini"));
        assert_matches!(result, Err(MirrorError::Io { .. }));
    }

    #[test]
    fn test_bootstrap_writes_template() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.ini");

        let result = Config::load_or_bootstrap(&config_path);
        assert_matches!(result, Err(MirrorError::Configuration(_)));

        let written = std::fs::read_to_string(&config_path).unwrap();
        assert_eq!(written, CONFIG_TEMPLATE);

        // Second run reads the template instead of overwriting it
        let config = Config::load_or_bootstrap(&config_path).unwrap();
        assert_eq!(config.path, config_path);
    }

    #[test]
    fn test_expand_path() {
        std::env::set_var("TEST_REPOMIRROR_HOME", "/test/home");
        let expanded = expand_path("${TEST_REPOMIRROR_HOME}/config.ini").unwrap();
        assert_eq!(expanded, PathBuf::from("/test/home/config.ini"));
        std::env::remove_var("TEST_REPOMIRROR_HOME");
    }
}
