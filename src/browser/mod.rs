//! Browser Collaborator
//!
//! The rendered-page interface the evidence extractors run against. Each
//! criterion check opens its own session through a [`SessionFactory`];
//! sessions are stateful (zoom, scroll, injected attributes) and are
//! never shared between concurrent checks.

mod webdriver;

pub use webdriver::{WebDriverFactory, WebDriverSession};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("webdriver protocol error: {0}")]
    Protocol(String),
    #[error("page did not finish loading within {0}s")]
    LoadTimeout(u64),
    #[error("session already closed")]
    SessionClosed,
}

/// A live rendered page. All queries are read-mostly; mutating calls
/// (resize, scroll, script side effects) stay confined to this session.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Full outerHTML of every element matching a CSS selector.
    async fn outer_html_by_css(&self, selector: &str) -> Result<Vec<String>, BrowserError>;

    /// Opening tag of each matching element paired with the serialized
    /// values of the requested attributes. Keys keep document order.
    async fn attributes_by_css(
        &self,
        selector: &str,
        attributes: &[&str],
    ) -> Result<Vec<(String, String)>, BrowserError>;

    /// Run a synchronous script in the page and return its JSON result.
    async fn execute_script(&self, script: &str, args: Vec<Value>)
        -> Result<Value, BrowserError>;

    async fn screenshot_png_base64(&self) -> Result<String, BrowserError>;

    async fn set_window_size(&self, width: u32, height: u32) -> Result<(), BrowserError>;

    async fn scroll_to(&self, x: i64, y: i64) -> Result<(), BrowserError> {
        self.execute_script(
            "window.scrollTo(arguments[0], arguments[1]);",
            vec![Value::from(x), Value::from(y)],
        )
        .await
        .map(|_| ())
    }

    async fn page_title(&self) -> Result<String, BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    /// Tear the session down. Errors are reported but a closed or already
    /// dead session is not a check failure.
    async fn close(&self) -> Result<(), BrowserError>;
}

/// Opens an isolated session per check: render the URL and block until
/// the document reports `readyState == "complete"`, within a bounded
/// timeout.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, url: &str) -> Result<Box<dyn PageSession>, BrowserError>;
}
