use crate::adapters::http::DEFAULT_TIMEOUT;
use crate::core::auth::{Credentials, RetryPolicy};
use crate::core::lister::{CrawlLimits, DEFAULT_MAX_PAGES, DEFAULT_MAX_STALLED_PAGES};
use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::{self, Validate};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const USERNAME_ENV: &str = "REGFISH_USERNAME";
pub const PASSWORD_ENV: &str = "REGFISH_PASSWORD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub portal: PortalSettings,
    pub credentials: CredentialsConfig,
    pub session: SessionConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub max_pages: u32,
    /// Consecutive list pages without new names before the crawl gives up.
    pub max_stalled_pages: u32,
    pub user_agent: String,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.regfish.de".to_string(),
            timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
            max_pages: DEFAULT_MAX_PAGES,
            max_stalled_pages: DEFAULT_MAX_STALLED_PAGES,
            user_agent: concat!("regfish-scraper/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory for cookie files; defaults to the platform data directory.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            retry_attempts: policy.max_retries,
            retry_delay_ms: policy.base_delay.as_millis() as u64,
        }
    }
}

impl ScraperConfig {
    /// Reads `path` if given, otherwise starts from defaults. Credentials from
    /// the environment override the file either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ScrapeError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ScrapeError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScrapeError::ConfigError {
            message: format!("placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(username) = std::env::var(USERNAME_ENV) {
            self.credentials.username = Some(username);
        }
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            self.credentials.password = Some(password);
        }
        self
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.credentials.username.clone().unwrap_or_default(),
            self.credentials.password.clone().unwrap_or_default(),
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.auth.retry_attempts,
            base_delay: Duration::from_millis(self.auth.retry_delay_ms),
        }
    }

    pub fn crawl_limits(&self) -> CrawlLimits {
        CrawlLimits {
            max_pages: self.portal.max_pages,
            max_stalled_pages: self.portal.max_stalled_pages,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.portal.timeout_seconds)
    }

    pub fn session_dir(&self) -> PathBuf {
        self.session
            .dir
            .clone()
            .or_else(|| {
                ProjectDirs::from("de", "regfish", "regfish-scraper")
                    .map(|dirs| dirs.data_dir().to_path_buf())
            })
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn resolved_secret(field: &str, value: &Option<String>) -> Result<()> {
    let value = value.as_deref().unwrap_or_default();
    validation::validate_non_empty_string(field, value)?;
    if value.starts_with("${") && value.ends_with('}') {
        return Err(ScrapeError::MissingConfigError {
            field: format!("{} (unset variable {})", field, value),
        });
    }
    Ok(())
}

impl Validate for ScraperConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("portal.base_url", &self.portal.base_url)?;
        validation::validate_range("portal.timeout_seconds", self.portal.timeout_seconds, 1, 600)?;
        validation::validate_positive_number("portal.max_pages", u64::from(self.portal.max_pages), 1)?;
        validation::validate_positive_number(
            "portal.max_stalled_pages",
            u64::from(self.portal.max_stalled_pages),
            1,
        )?;
        validation::validate_range("auth.retry_attempts", self.auth.retry_attempts, 0, 10)?;
        resolved_secret("credentials.username", &self.credentials.username)?;
        resolved_secret("credentials.password", &self.credentials.password)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[portal]
base_url = "https://portal.example"
timeout_seconds = 10
max_pages = 5
max_stalled_pages = 2

[credentials]
username = "alice"
password = "pw"

[session]
dir = "/tmp/regfish-sessions"

[auth]
retry_attempts = 1
retry_delay_ms = 250
"#;

        let config = ScraperConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.portal.base_url, "https://portal.example");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(
            config.crawl_limits(),
            CrawlLimits {
                max_pages: 5,
                max_stalled_pages: 2
            }
        );
        assert_eq!(config.session_dir(), PathBuf::from("/tmp/regfish-sessions"));
        assert_eq!(config.retry_policy().max_retries, 1);
        assert_eq!(config.retry_policy().base_delay, Duration::from_millis(250));
        assert_eq!(config.credentials().username, "alice");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_for_missing_sections() {
        let config = ScraperConfig::from_toml_str("[credentials]\nusername = \"bob\"\n").unwrap();
        assert_eq!(config.portal.base_url, "https://www.regfish.de");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.portal.max_pages, DEFAULT_MAX_PAGES);
        assert_eq!(config.crawl_limits(), CrawlLimits::default());
        assert_eq!(config.auth.retry_attempts, 2);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("REGFISH_TEST_SUBST_PASSWORD", "from-env");

        let toml_content = r#"
[credentials]
username = "alice"
password = "${REGFISH_TEST_SUBST_PASSWORD}"
"#;

        let config = ScraperConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.credentials.password.as_deref(), Some("from-env"));

        std::env::remove_var("REGFISH_TEST_SUBST_PASSWORD");
    }

    #[test]
    fn test_unresolved_placeholder_fails_validation() {
        let toml_content = r#"
[credentials]
username = "alice"
password = "${REGFISH_TEST_NEVER_SET}"
"#;

        let config = ScraperConfig::from_toml_str(toml_content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ScrapeError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_config_validation() {
        let mut config = ScraperConfig::from_toml_str(
            "[portal]\nbase_url = \"invalid-url\"\n[credentials]\nusername = \"a\"\npassword = \"b\"\n",
        )
        .unwrap();
        assert!(config.validate().is_err());

        config.portal.base_url = "https://www.regfish.de".to_string();
        config.portal.max_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unreadable_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ScraperConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ScrapeError::ConfigError { .. }));
        assert_eq!(err.severity(), crate::utils::error::ErrorSeverity::Critical);
    }

    #[test]
    fn test_missing_credentials_fail_validation() {
        let config = ScraperConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ScrapeError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = ScraperConfig::from_toml_str(
            "[credentials]\nusername = \"alice\"\npassword = \"hunter2\"\n",
        )
        .unwrap();
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[portal]\nmax_pages = 7\n")
            .unwrap();

        let config = ScraperConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.portal.max_pages, 7);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ScraperConfig::from_toml_str("[portal\nbase_url = 1").unwrap_err();
        assert!(matches!(err, ScrapeError::ConfigError { .. }));
    }
}
