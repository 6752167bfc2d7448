use crate::core::markup::{MarkupRules, PortalDocument};
use crate::domain::model::Locator;
use crate::domain::ports::{Page, Portal};
use crate::utils::error::{Result, ScrapeError};
use url::Url;

/// URL templates for every portal page the scraper touches.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Result<Self> {
        // Reject garbage early; every endpoint is built from this string.
        Url::parse(base_url)?;
        Ok(Self {
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn login(&self) -> Result<Url> {
        Ok(Url::parse(&format!("{}/my/login", self.base))?)
    }

    pub fn domain_list(&self, page: u32) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}/my/domains/list?sb=ST_TS_EXPIRES&sd=asc&site={}",
            self.base, page
        ))?)
    }

    pub fn records(&self, locator: &Locator) -> Result<Url> {
        Ok(Url::parse(&format!("{}/my/domains/{}rr/allinone", self.base, locator))?)
    }

    pub fn contract(&self, locator: &Locator) -> Result<Url> {
        Ok(Url::parse(&format!("{}/my/domains/{}contract/", self.base, locator))?)
    }
}

/// Everything an operation needs to talk to the portal: the session-carrying
/// transport, the URL templates and the markup contract.
pub struct PortalContext<P: Portal> {
    pub portal: P,
    pub endpoints: Endpoints,
    pub rules: MarkupRules,
}

impl<P: Portal> PortalContext<P> {
    pub fn new(portal: P, endpoints: Endpoints) -> Self {
        Self {
            portal,
            endpoints,
            rules: MarkupRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: MarkupRules) -> Self {
        self.rules = rules;
        self
    }

    /// Fails with `NotAuthenticated` unless the page shows the logout marker.
    pub fn ensure_logged_in(&self, page: &Page, document: &PortalDocument) -> Result<()> {
        if document.is_logged_in(&self.rules)? {
            Ok(())
        } else {
            tracing::warn!("Not logged in at {}", page.final_url);
            Err(ScrapeError::NotAuthenticated {
                url: page.requested.to_string(),
            })
        }
    }
}
