use crate::core::context::PortalContext;
use crate::core::markup::{ListedDomain, PortalDocument};
use crate::domain::model::DomainName;
use crate::domain::ports::{Page, Portal};
use crate::utils::error::{Result, ScrapeError};
use std::collections::BTreeMap;

pub const DEFAULT_MAX_PAGES: u32 = 100;
pub const DEFAULT_MAX_STALLED_PAGES: u32 = 3;

/// Bounds for one crawl of the domain list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlLimits {
    pub max_pages: u32,
    /// Consecutive pages advertising a successor without adding a new name.
    pub max_stalled_pages: u32,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            max_stalled_pages: DEFAULT_MAX_STALLED_PAGES,
        }
    }
}

struct ListPage {
    domains: Vec<ListedDomain>,
    has_next: bool,
}

/// Crawls the domain list from page 1 until no page advertises a successor.
///
/// Returns name → list href; a name seen on several pages keeps the href of
/// the last one. Nothing is merged here; a failure anywhere in the crawl
/// discards all pages fetched so far.
pub async fn list_domains<P: Portal>(
    ctx: &PortalContext<P>,
    limits: CrawlLimits,
) -> Result<BTreeMap<DomainName, String>> {
    let mut listing = BTreeMap::new();
    let mut page_number = 1;
    let mut stalled = 0;

    loop {
        if page_number > limits.max_pages {
            return Err(ScrapeError::Pagination {
                page: page_number,
                reason: format!("more than {} pages", limits.max_pages),
            });
        }

        let url = ctx.endpoints.domain_list(page_number)?;
        let page = ctx.portal.get(&url).await?;
        let list_page = read_list_page(ctx, &page)?;

        let before = listing.len();
        let found = list_page.domains.len();
        for listed in list_page.domains {
            listing.insert(listed.name, listed.href);
        }
        tracing::debug!("Domain list page {}: {} rows", page_number, found);

        if !list_page.has_next {
            break;
        }
        if listing.len() == before {
            stalled += 1;
            tracing::debug!("Domain list page {} added no new names ({} in a row)", page_number, stalled);
            if stalled >= limits.max_stalled_pages {
                return Err(ScrapeError::Pagination {
                    page: page_number,
                    reason: format!("{} pages in a row without new domains", stalled),
                });
            }
        } else {
            stalled = 0;
        }
        page_number += 1;
    }

    tracing::info!("Listed {} domains over {} pages", listing.len(), page_number);
    Ok(listing)
}

fn read_list_page<P: Portal>(ctx: &PortalContext<P>, page: &Page) -> Result<ListPage> {
    let document = PortalDocument::parse(&page.body);
    ctx.ensure_logged_in(page, &document)?;
    Ok(ListPage {
        domains: document.listed_domains(&ctx.rules)?,
        has_next: document.has_next_page(&ctx.rules)?,
    })
}
