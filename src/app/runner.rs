use crate::adapters::{HttpPortal, LocalStorage, SessionStore};
use crate::app::output;
use crate::config::ScraperConfig;
use crate::core::auth::Credentials;
use crate::core::client::RegistrarClient;
use crate::core::context::{Endpoints, PortalContext};
use crate::domain::model::DomainName;
use crate::utils::error::{Result, ScrapeError};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the names of all domains on the account.
    List,
    /// Crawl everything and print the registry as JSON.
    All,
    /// Fetch the named domains and print them as JSON.
    Domains(Vec<DomainName>),
}

/// What a run produced. `error` carries per-domain failures that did not
/// prevent output from being rendered.
#[derive(Debug)]
pub struct RunOutput {
    pub stdout: String,
    pub error: Option<ScrapeError>,
}

/// Runs one command against the portal.
///
/// The stored session for the configured user is loaded first and saved
/// again afterwards, whatever the command's outcome.
pub async fn execute(config: &ScraperConfig, command: &Command) -> Result<RunOutput> {
    let credentials = config.credentials();
    let store = SessionStore::for_user(LocalStorage::new(config.session_dir()), &credentials.username);
    let jar = Arc::new(store.load().await);

    let portal = HttpPortal::new(Arc::clone(&jar), config.timeout(), &config.portal.user_agent)?;
    let ctx = PortalContext::new(portal, Endpoints::new(&config.portal.base_url)?);
    let mut client = RegistrarClient::new(ctx, config.retry_policy(), config.crawl_limits());

    let outcome = run_command(&mut client, &credentials, command).await;

    if let Err(e) = store.save(&jar).await {
        tracing::warn!("Could not save session: {}", e);
    }

    let result = outcome?;
    let registry = client.registry();
    let stdout = match command {
        Command::List => output::render_domain_list(registry),
        Command::All | Command::Domains(_) => output::render_json(registry)?,
    };

    Ok(RunOutput {
        stdout,
        error: result.err(),
    })
}

/// Outer error: the run failed and there is nothing to print. Inner error:
/// per-domain failures, output is still rendered.
async fn run_command(
    client: &mut RegistrarClient<HttpPortal>,
    credentials: &Credentials,
    command: &Command,
) -> Result<std::result::Result<(), ScrapeError>> {
    client.login(credentials).await?;

    let result = match command {
        Command::List => client.list_domains().await.map(|count| {
            tracing::info!("{} domains on the account", count);
        }),
        Command::All => client.fetch_all().await,
        Command::Domains(names) => client.fetch_domains(names).await,
    };

    match result {
        Err(e @ ScrapeError::Batch { .. }) => Ok(Err(e)),
        Err(e) => Err(e),
        Ok(()) => Ok(Ok(())),
    }
}
