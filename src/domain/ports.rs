use crate::utils::error::Result;
use async_trait::async_trait;
use url::Url;

/// A fetched portal page.
#[derive(Debug, Clone)]
pub struct Page {
    pub requested: Url,
    /// Location after following redirects.
    pub final_url: Url,
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn was_redirected(&self) -> bool {
        self.final_url != self.requested
    }
}

/// Session-carrying access to the portal's rendered HTML.
#[async_trait]
pub trait Portal: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Page>;
    async fn post_form(&self, url: &Url, form: &[(&str, &str)]) -> Result<Page>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
