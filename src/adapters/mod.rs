// Adapters layer: concrete implementations for external systems (http, cookie session, local files).

pub mod http;
pub mod session;
pub mod storage;

pub use http::HttpPortal;
pub use session::{SessionJar, SessionStore};
pub use storage::LocalStorage;
