//! Per-domain page fetches: the DNS zone and the contract data.
//!
//! The portal has no 404 for foreign or unknown domains; it redirects to another
//! page instead. Both fetches treat any redirect as `NotFound`.

use crate::core::context::PortalContext;
use crate::core::markup::PortalDocument;
use crate::domain::model::{ContractInfo, Domain, DomainName};
use crate::domain::ports::{Page, Portal};
use crate::utils::error::{Result, ScrapeError};

/// Fetches the zone page of `name` and returns a domain carrying its records.
pub async fn fetch_records<P: Portal>(ctx: &PortalContext<P>, name: &DomainName) -> Result<Domain> {
    let locator = name.locator();
    let url = ctx.endpoints.records(&locator)?;
    let page = ctx.portal.get(&url).await?;

    let document = checked_document(ctx, name, &page)?;
    let mut domain = Domain::new(name.clone());
    domain.records = document.records(&ctx.rules)?;

    tracing::debug!("{}: {} resource records", name, domain.records.len());
    Ok(domain)
}

pub async fn fetch_contract<P: Portal>(
    ctx: &PortalContext<P>,
    name: &DomainName,
) -> Result<ContractInfo> {
    let locator = name.locator();
    let url = ctx.endpoints.contract(&locator)?;
    let page = ctx.portal.get(&url).await?;

    let document = checked_document(ctx, name, &page)?;
    let contract = document.contract(&ctx.rules)?;

    tracing::debug!("{}: {} contract fields", name, contract.len());
    Ok(contract)
}

/// Login state first: a redirect to the login page means the session died,
/// not that the domain is missing.
fn checked_document<P: Portal>(
    ctx: &PortalContext<P>,
    name: &DomainName,
    page: &Page,
) -> Result<PortalDocument> {
    let document = PortalDocument::parse(&page.body);
    ctx.ensure_logged_in(page, &document)?;

    if page.was_redirected() {
        tracing::info!("{}: redirected to {}, non-existing domain?", name, page.final_url);
        return Err(ScrapeError::NotFound {
            domain: name.clone(),
            requested: page.requested.to_string(),
            landed: page.final_url.to_string(),
        });
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::DEFAULT_TIMEOUT;
    use crate::adapters::{HttpPortal, SessionJar};
    use crate::core::context::Endpoints;
    use httpmock::prelude::*;
    use std::sync::Arc;

    const NAV: &str = r#"<div id="nav"><div class="reb">Ausloggen</div></div>"#;

    fn context(base_url: &str) -> PortalContext<HttpPortal> {
        let portal =
            HttpPortal::new(Arc::new(SessionJar::default()), DEFAULT_TIMEOUT, "test").unwrap();
        PortalContext::new(portal, Endpoints::new(base_url).unwrap())
    }

    fn zone_page() -> String {
        format!(
            r#"<html><body>{}
            <table id="dnszone"><tbody>
              <tr id="a_1"><td id="rr_1_name">@</td><td id="rr_1_ttl">0</td>
                <td id="rr_1_type">A</td><td id="rr_1_data">1.2.3.4</td><td></td></tr>
              <tr id="a_2"><td id="rr_2_name">@</td><td id="rr_2_ttl"></td>
                <td id="rr_2_type"></td><td id="rr_2_data"></td>
                <td>ns1.example.com
                    hostmaster.example.com ...</td></tr>
            </tbody></table></body></html>"#,
            NAV
        )
    }

    #[tokio::test]
    async fn test_fetch_records_builds_domain() {
        let server = MockServer::start();
        let zone = server.mock(|when, then| {
            when.method(GET).path("/my/domains/*/com/example/rr/allinone");
            then.status(200).body(zone_page());
        });

        let ctx = context(&server.base_url());
        let domain = fetch_records(&ctx, &DomainName::from("example.com")).await.unwrap();

        zone.assert();
        assert_eq!(domain.locator.as_str(), "*/com/example/");
        assert_eq!(domain.records.len(), 2);
        assert_eq!(domain.records[&1].rtype, "A");
        assert_eq!(domain.records[&1].ttl, 86400);
        assert_eq!(domain.records[&2].rtype, "SOA");
        assert_eq!(domain.records[&2].ttl, 0);
        assert_eq!(domain.records[&2].data, "ns1.example.com hostmaster.example.com ...");
    }

    #[tokio::test]
    async fn test_redirect_means_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/my/domains/*/org/foreign/rr/allinone");
            then.status(302).header("Location", server.url("/my/domains/list"));
        });
        server.mock(|when, then| {
            when.method(GET).path("/my/domains/list");
            then.status(200).body(format!("<html><body>{}</body></html>", NAV));
        });

        let ctx = context(&server.base_url());
        let err = fetch_records(&ctx, &DomainName::from("foreign.org")).await.unwrap_err();
        match err {
            ScrapeError::NotFound { domain, landed, .. } => {
                assert_eq!(domain.as_str(), "foreign.org");
                assert!(landed.ends_with("/my/domains/list"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_redirect_to_login_means_session_lost() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/my/domains/*/com/example/contract/");
            then.status(302).header("Location", server.url("/my/login"));
        });
        server.mock(|when, then| {
            when.method(GET).path("/my/login");
            then.status(200)
                .body(r#"<html><body><div><div class="reb">Einloggen</div></div></body></html>"#);
        });

        let ctx = context(&server.base_url());
        let err = fetch_contract(&ctx, &DomainName::from("example.com")).await.unwrap_err();
        assert!(matches!(err, ScrapeError::NotAuthenticated { .. }));
    }

    #[tokio::test]
    async fn test_fetch_contract_reads_table() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/my/domains/*/com/example/contract/");
            then.status(200).body(format!(
                r#"<html><body>{}<table class="datastyle"><tbody>
                   <tr><td>Vertragsbeginn:</td><td>2015-03-01</td></tr>
                   <tr><td></td><td>ignored</td></tr>
                   <tr><td>Preis:</td><td> 9,90 EUR </td></tr>
                   </tbody></table></body></html>"#,
                NAV
            ));
        });

        let ctx = context(&server.base_url());
        let contract = fetch_contract(&ctx, &DomainName::from("example.com")).await.unwrap();
        assert_eq!(contract.len(), 2);
        assert_eq!(contract["Vertragsbeginn"], "2015-03-01");
        assert_eq!(contract["Preis"], "9,90 EUR");
    }

    #[tokio::test]
    async fn test_changed_markup_fails_loudly() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/my/domains/*/com/example/rr/allinone");
            then.status(200)
                .body(format!(r#"<html><body>{}<table id="zone-v2"></table></body></html>"#, NAV));
        });

        let ctx = context(&server.base_url());
        let err = fetch_records(&ctx, &DomainName::from("example.com")).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Parse { .. }));
    }
}
