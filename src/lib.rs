pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{HttpPortal, LocalStorage, SessionJar, SessionStore};
pub use app::{execute, Command, RunOutput};
pub use config::ScraperConfig;
pub use core::{
    auth::{Authenticator, Credentials, RetryPolicy},
    client::RegistrarClient,
    context::{Endpoints, PortalContext},
};
pub use domain::model::{ContractInfo, Domain, DomainName, Locator, Registry, ResourceRecord};
pub use utils::error::{Result, ScrapeError};
