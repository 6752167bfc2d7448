use crate::adapters::session::SessionJar;
use crate::domain::ports::{Page, Portal};
use crate::utils::error::{Result, ScrapeError};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-backed [`Portal`] carrying the session cookies in a [`SessionJar`].
pub struct HttpPortal {
    client: Client,
}

impl HttpPortal {
    pub fn new(jar: Arc<SessionJar>, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .cookie_provider(jar)
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    async fn into_page(requested: &Url, response: Response) -> Result<Page> {
        let status = response.status();
        let final_url = response.url().clone();
        tracing::debug!("{} -> {} ({})", requested, final_url, status);

        if status.is_server_error() {
            return Err(ScrapeError::HttpStatus {
                url: final_url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(Page {
            requested: requested.clone(),
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Portal for HttpPortal {
    async fn get(&self, url: &Url) -> Result<Page> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        Self::into_page(url, response).await
    }

    async fn post_form(&self, url: &Url, form: &[(&str, &str)]) -> Result<Page> {
        tracing::debug!("POST {} ({} fields)", url, form.len());
        let response = self.client.post(url.clone()).form(form).send().await?;
        Self::into_page(url, response).await
    }
}
