use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("click on {0} was intercepted by another element")]
    ClickIntercepted(String),

    #[error("timed out after {}s waiting for {what}", .after.as_secs())]
    Timeout { what: String, after: Duration },

    #[error("CDP error: {0}")]
    Cdp(String),
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// A browser cookie as persisted in the cookie store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    /// Seconds since the epoch; ignored for session cookies.
    #[serde(default)]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub session: bool,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

/// Element-level browser operations the Studio workflows are written against.
///
/// Every locator is an XPath expression. Lookups are immediate: waiting for an
/// element to appear is done by [`crate::browser::wait::wait_for`].
#[async_trait]
pub trait StudioDriver: Send {
    async fn goto(&mut self, url: &str) -> DriverResult<()>;
    async fn reload(&mut self) -> DriverResult<()>;
    async fn current_url(&mut self) -> DriverResult<String>;

    /// Number of elements currently matching `xpath`.
    async fn count(&mut self, xpath: &str) -> DriverResult<usize>;

    /// Clicks the first match. Fails with [`DriverError::ClickIntercepted`]
    /// when another element sits on top of the click point.
    async fn click(&mut self, xpath: &str) -> DriverResult<()>;
    async fn type_text(&mut self, xpath: &str, text: &str) -> DriverResult<()>;
    async fn select_all(&mut self, xpath: &str) -> DriverResult<()>;
    async fn press_key(&mut self, xpath: &str, key: &str) -> DriverResult<()>;
    async fn hover(&mut self, xpath: &str) -> DriverResult<()>;
    async fn scroll_into_view(&mut self, xpath: &str) -> DriverResult<()>;
    async fn attach_file(&mut self, xpath: &str, file: &Path) -> DriverResult<()>;

    async fn text(&mut self, xpath: &str) -> DriverResult<String>;
    async fn attribute(&mut self, xpath: &str, name: &str) -> DriverResult<Option<String>>;

    async fn run_script(&mut self, script: &str) -> DriverResult<serde_json::Value>;

    async fn cookies(&mut self) -> DriverResult<Vec<StoredCookie>>;
    async fn set_cookies(&mut self, cookies: &[StoredCookie]) -> DriverResult<()>;

    /// Shuts the browser down. Calling it twice is a no-op.
    async fn close(&mut self) -> DriverResult<()>;
}
