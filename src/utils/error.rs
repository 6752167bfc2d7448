use crate::domain::model::DomainName;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Portal request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Portal returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Login failed for user '{username}': {reason}")]
    Authentication { username: String, reason: String },

    #[error("Not logged in while fetching {url}")]
    NotAuthenticated { url: String },

    #[error("Domain '{domain}' not found: {requested} redirected to {landed}")]
    NotFound {
        domain: DomainName,
        requested: String,
        landed: String,
    },

    #[error("Unexpected markup in {context}: {message}")]
    Parse { context: String, message: String },

    #[error("Domain list crawl aborted at page {page}: {reason}")]
    Pagination { page: u32, reason: String },

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Session data error: {message}")]
    SessionError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{} of {attempted} domain fetches failed", .failures.len())]
    Batch {
        attempted: usize,
        failures: Vec<DomainFailure>,
    },
}

/// A per-domain error collected during a batch fetch.
#[derive(Debug)]
pub struct DomainFailure {
    pub domain: DomainName,
    pub error: ScrapeError,
}

impl fmt::Display for DomainFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.domain, self.error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    NotFound,
    Markup,
    Configuration,
    Storage,
    Batch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScrapeError {
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) | Self::HttpStatus { .. } => ErrorCategory::Network,
            Self::Authentication { .. } | Self::NotAuthenticated { .. } => {
                ErrorCategory::Authentication
            }
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Parse { .. } | Self::Pagination { .. } => ErrorCategory::Markup,
            Self::UrlError(_)
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) | Self::SessionError { .. } => {
                ErrorCategory::Storage
            }
            Self::Batch { .. } => ErrorCategory::Batch,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::NotFound | ErrorCategory::Batch => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Markup | ErrorCategory::Storage => ErrorSeverity::High,
            ErrorCategory::Authentication | ErrorCategory::Configuration => {
                ErrorSeverity::Critical
            }
        }
    }

    /// Whether a batch over several domains must stop on this error.
    ///
    /// A lost session fails every later fetch, so there is no point continuing.
    pub fn aborts_batch(&self) -> bool {
        self.category() == ErrorCategory::Authentication
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check your network connection and try again later",
            ErrorCategory::Authentication => {
                "Verify username and password; avoid repeated attempts, the portal rate-limits logins"
            }
            ErrorCategory::NotFound => "Check the domain name and that it belongs to this account",
            ErrorCategory::Markup => {
                "The portal markup may have changed; update the extraction rules"
            }
            ErrorCategory::Configuration => "Review the configuration file and environment variables",
            ErrorCategory::Storage => "Check permissions on the session directory",
            ErrorCategory::Batch => "Re-run with -v to see the individual failures",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Authentication { username, .. } => {
                format!("Could not log in as '{}'", username)
            }
            Self::NotAuthenticated { .. } => "The portal session expired during the run".to_string(),
            Self::NotFound { domain, .. } => {
                format!("Domain '{}' does not exist or is not accessible", domain)
            }
            Self::Batch { failures, .. } => {
                let names: Vec<String> = failures.iter().map(|f| f.domain.to_string()).collect();
                format!("Some domains could not be fetched: {}", names.join(", "))
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
