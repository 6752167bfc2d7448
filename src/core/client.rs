use crate::core::auth::{AuthOutcome, Authenticator, Credentials, RetryPolicy};
use crate::core::context::PortalContext;
use crate::core::lister::{self, CrawlLimits};
use crate::core::inspector;
use crate::domain::model::{ContractInfo, Domain, DomainName, Registry};
use crate::domain::ports::Portal;
use crate::utils::error::{DomainFailure, Result, ScrapeError};

/// Owns the portal context and the registry for one run.
///
/// All registry mutation goes through here; the lister and inspector only
/// return values.
pub struct RegistrarClient<P: Portal> {
    ctx: PortalContext<P>,
    authenticator: Authenticator,
    registry: Registry,
    limits: CrawlLimits,
}

impl<P: Portal> RegistrarClient<P> {
    pub fn new(ctx: PortalContext<P>, retry: RetryPolicy, limits: CrawlLimits) -> Self {
        Self {
            ctx,
            authenticator: Authenticator::new(retry),
            registry: Registry::new(),
            limits,
        }
    }

    pub fn context(&self) -> &PortalContext<P> {
        &self.ctx
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub async fn login(&mut self, credentials: &Credentials) -> Result<AuthOutcome> {
        self.authenticator.establish(&self.ctx, credentials).await
    }

    /// Crawls the domain list and merges it. On failure the registry is left
    /// exactly as it was.
    pub async fn list_domains(&mut self) -> Result<usize> {
        let listing = lister::list_domains(&self.ctx, self.limits).await?;
        let count = listing.len();
        self.registry.merge_listing(listing);
        Ok(count)
    }

    /// Fetches the zone and replaces the domain's record set.
    pub async fn fetch_records(&mut self, name: &DomainName) -> Result<&Domain> {
        let fetched = inspector::fetch_records(&self.ctx, name).await?;
        if !self.registry.contains(name) {
            tracing::info!("Domain {} not found in current domain list", name);
        }
        self.registry.store_records(fetched);
        self.registry
            .get(name)
            .ok_or_else(|| ScrapeError::parse("registry", format!("{} vanished after store", name)))
    }

    /// Fetches contract info. It is stored only when the domain is already in
    /// the registry; the caller receives it either way.
    pub async fn fetch_contract(&mut self, name: &DomainName) -> Result<ContractInfo> {
        let contract = inspector::fetch_contract(&self.ctx, name).await?;
        if !self.registry.store_contract(name, contract.clone()) {
            tracing::warn!("Contract for {} fetched but domain is not in the registry", name);
        }
        Ok(contract)
    }

    /// Records, then contract, for one domain.
    pub async fn fetch_domain(&mut self, name: &DomainName) -> Result<()> {
        self.fetch_records(name).await?;
        self.fetch_contract(name).await?;
        Ok(())
    }

    /// Fetches each named domain, continuing past per-domain failures.
    ///
    /// Returns a `Batch` error listing every failed domain once all have been
    /// tried. A lost session stops the batch immediately.
    pub async fn fetch_domains(&mut self, names: &[DomainName]) -> Result<()> {
        let mut failures = Vec::new();

        for (index, name) in names.iter().enumerate() {
            tracing::info!("Fetching {} ({}/{})", name, index + 1, names.len());
            match self.fetch_domain(name).await {
                Ok(()) => {}
                Err(e) if e.aborts_batch() => return Err(e),
                Err(e) => {
                    tracing::warn!("{}: {}", name, e);
                    failures.push(DomainFailure {
                        domain: name.clone(),
                        error: e,
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ScrapeError::Batch {
                attempted: names.len(),
                failures,
            })
        }
    }

    /// Lists all domains, then fetches records and contract for each.
    pub async fn fetch_all(&mut self) -> Result<()> {
        self.list_domains().await?;
        let names = self.registry.names();
        self.fetch_domains(&names).await
    }
}
