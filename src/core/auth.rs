use crate::core::context::PortalContext;
use crate::core::markup::PortalDocument;
use crate::domain::ports::{Page, Portal};
use crate::utils::error::{ErrorCategory, Result, ScrapeError};
use std::fmt;
use std::future::Future;
use std::time::Duration;

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bounded retry with exponential backoff, applied to transport failures only.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry.saturating_sub(1).min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Stored cookies were still valid; no credentials were sent.
    SessionReused,
    LoggedIn,
}

pub struct Authenticator {
    policy: RetryPolicy,
    retries: u32,
}

impl Authenticator {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, retries: 0 }
    }

    /// Failed attempts since the last successful authentication.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Makes sure the session is logged in.
    ///
    /// The login page is checked first and credentials are only posted when it
    /// does not show the logout marker. A negative check after the post is
    /// never retried: the portal rate-limits login attempts.
    pub async fn establish<P: Portal>(
        &mut self,
        ctx: &PortalContext<P>,
        credentials: &Credentials,
    ) -> Result<AuthOutcome> {
        let login_url = ctx.endpoints.login()?;

        let page = self.with_retry(|| ctx.portal.get(&login_url)).await?;
        if self.shows_logout(ctx, &page)? {
            tracing::info!("Still logged in from previous session");
            self.retries = 0;
            return Ok(AuthOutcome::SessionReused);
        }

        if !credentials.is_complete() {
            return Err(ScrapeError::Authentication {
                username: credentials.username.clone(),
                reason: "username and password are required".to_string(),
            });
        }

        tracing::info!("Submitting credentials for '{}'", credentials.username);
        let form = [
            ("u", credentials.username.as_str()),
            ("p", credentials.password.as_str()),
        ];
        let page = self.with_retry(|| ctx.portal.post_form(&login_url, &form)).await?;

        if self.shows_logout(ctx, &page)? {
            tracing::info!("Logged in as '{}'", credentials.username);
            self.retries = 0;
            Ok(AuthOutcome::LoggedIn)
        } else {
            self.retries += 1;
            Err(ScrapeError::Authentication {
                username: credentials.username.clone(),
                reason: "portal still shows the login page".to_string(),
            })
        }
    }

    fn shows_logout<P: Portal>(&mut self, ctx: &PortalContext<P>, page: &Page) -> Result<bool> {
        let document = PortalDocument::parse(&page.body);
        document.is_logged_in(&ctx.rules).inspect_err(|_| self.retries += 1)
    }

    async fn with_retry<F, Fut>(&mut self, mut request: F) -> Result<Page>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Page>>,
    {
        let mut attempt = 0;
        loop {
            match request().await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    self.retries += 1;
                    if e.category() != ErrorCategory::Network || attempt >= self.policy.max_retries {
                        return Err(e);
                    }
                    attempt += 1;
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        "Login request failed ({}), retry {}/{} in {:?}",
                        e,
                        attempt,
                        self.policy.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
