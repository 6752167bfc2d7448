pub mod auth;
pub mod client;
pub mod context;
pub mod inspector;
pub mod lister;
pub mod markup;

pub use crate::domain::model::{ContractInfo, Domain, DomainName, Locator, Registry, ResourceRecord};
pub use crate::domain::ports::{Page, Portal, Storage};
pub use crate::utils::error::Result;
