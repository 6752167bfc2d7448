//! Cookie session persisted per credential identity.

use crate::domain::ports::Storage;
use crate::utils::error::{Result, ScrapeError};
use cookie_store::RawCookie;
use parking_lot::RwLock;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use reqwest::Url;

/// Cookie jar shared with the HTTP client.
///
/// Backed by [`cookie_store::CookieStore`], so `Domain`, `Path`, `Max-Age` and
/// `Expires` follow RFC 6265 and a cookie cleared by the portal is dropped.
#[derive(Debug, Default)]
pub struct SessionJar {
    store: RwLock<cookie_store::CookieStore>,
}

impl SessionJar {
    /// Cookies that expired since the jar was saved are not loaded.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let store = cookie_store::serde::json::load(bytes).map_err(session_error)?;
        Ok(Self {
            store: RwLock::new(store),
        })
    }

    /// Keeps cookies without an expiry as well; the portal's login cookie is one.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        cookie_store::serde::json::save_incl_expired_and_nonpersistent(&self.store.read(), &mut buffer)
            .map_err(session_error)?;
        Ok(buffer)
    }

    pub fn len(&self) -> usize {
        self.store.read().iter_unexpired().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of the cookie `name` as it would be sent to `url`.
    pub fn get(&self, url: &Url, name: &str) -> Option<String> {
        self.store
            .read()
            .get_request_values(url)
            .find(|(cookie_name, _)| *cookie_name == name)
            .map(|(_, value)| value.to_string())
    }

    /// Applies one `Set-Cookie` header value received from `url`.
    pub fn apply_set_cookie(&self, url: &Url, header: &str) {
        match RawCookie::parse(header) {
            Ok(cookie) => self
                .store
                .write()
                .store_response_cookies(std::iter::once(cookie.into_owned()), url),
            Err(e) => tracing::debug!("Ignoring Set-Cookie from {}: {}", url, e),
        }
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            if let Ok(raw) = header.to_str() {
                self.apply_set_cookie(url, raw);
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self
            .store
            .read()
            .get_request_values(url)
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}

fn session_error(e: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::SessionError {
        message: e.to_string(),
    }
}

/// Loads and saves the [`SessionJar`] belonging to one username.
pub struct SessionStore<S: Storage> {
    storage: S,
    file_name: String,
}

impl<S: Storage> SessionStore<S> {
    pub fn for_user(storage: S, username: &str) -> Self {
        Self {
            storage,
            file_name: session_file_name(username),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Never fails: a missing or unreadable session starts empty.
    pub async fn load(&self) -> SessionJar {
        match self.storage.read_file(&self.file_name).await {
            Ok(bytes) => match SessionJar::from_json(&bytes) {
                Ok(jar) => {
                    tracing::debug!("Loaded {} cookies from {}", jar.len(), self.file_name);
                    jar
                }
                Err(e) => {
                    tracing::warn!("Ignoring corrupt session file {}: {}", self.file_name, e);
                    SessionJar::default()
                }
            },
            Err(ScrapeError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No stored session {}, starting fresh", self.file_name);
                SessionJar::default()
            }
            Err(e) => {
                tracing::warn!("Could not read session file {}: {}", self.file_name, e);
                SessionJar::default()
            }
        }
    }

    pub async fn save(&self, jar: &SessionJar) -> Result<()> {
        let data = jar.to_json()?;
        self.storage.write_file(&self.file_name, &data).await?;
        tracing::debug!("Saved {} cookies to {}", jar.len(), self.file_name);
        Ok(())
    }
}

/// File name derived from a hash of the username, so sessions of different
/// accounts never mix and the name itself reveals nothing.
pub fn session_file_name(username: &str) -> String {
    let digest = blake3::hash(username.as_bytes());
    format!("session_{}.json", hex::encode(&digest.as_bytes()[..16]))
}
