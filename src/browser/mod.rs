//! Browser sessions
//!
//! A scrape needs very little from a browser: load a URL, hand back the
//! rendered markup, and (for the wait helpers) look an element up. That
//! surface is the [`BrowserSession`] trait. The remote WebDriver sidecar and
//! the in-process headless Chrome both implement it, and [`BrowserHandle`]
//! picks between them at runtime.

pub mod chrome;
pub mod retry;
pub mod wait;
pub mod webdriver;

use std::fmt;

use crate::config::BrowserMode;
use crate::error::SessionError;

pub use chrome::ChromeSession;
pub use retry::{establish, RetryPolicy};
pub use wait::{wait_for_element, wait_for_element_value, WaitOptions};
pub use webdriver::WebDriverSession;

/// Chrome flags suited to running inside a container
pub const CHROME_ARGS: [&str; 3] = ["--no-sandbox", "--headless=new", "--disable-dev-shm-usage"];

/// How to find an element on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css={}", s),
            Locator::XPath(s) => write!(f, "xpath={}", s),
        }
    }
}

/// Snapshot of an element found on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundElement {
    pub locator: Locator,
    pub outer_html: String,
    /// Current `value` of form inputs, if the element has one
    pub value: Option<String>,
}

/// The operations a scrape needs from a browser
#[allow(async_fn_in_trait)]
pub trait BrowserSession {
    async fn goto(&mut self, url: &str) -> Result<(), SessionError>;

    /// Markup as rendered after script execution
    async fn page_source(&mut self) -> Result<String, SessionError>;

    /// First element matching `locator`, or `None` if there is none yet
    async fn find(&mut self, locator: &Locator) -> Result<Option<FoundElement>, SessionError>;

    /// End the session; the browser side is released even if this errors
    async fn close(self) -> Result<(), SessionError>;
}

/// Opens new browser sessions; one attempt per call
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Session: BrowserSession;

    fn endpoint(&self) -> String;

    async fn connect(&self) -> Result<Self::Session, SessionError>;
}

/// Either kind of session, chosen by configuration
pub enum BrowserHandle {
    Remote(WebDriverSession),
    Local(ChromeSession),
}

impl BrowserSession for BrowserHandle {
    async fn goto(&mut self, url: &str) -> Result<(), SessionError> {
        match self {
            BrowserHandle::Remote(s) => s.goto(url).await,
            BrowserHandle::Local(s) => s.goto(url).await,
        }
    }

    async fn page_source(&mut self) -> Result<String, SessionError> {
        match self {
            BrowserHandle::Remote(s) => s.page_source().await,
            BrowserHandle::Local(s) => s.page_source().await,
        }
    }

    async fn find(&mut self, locator: &Locator) -> Result<Option<FoundElement>, SessionError> {
        match self {
            BrowserHandle::Remote(s) => s.find(locator).await,
            BrowserHandle::Local(s) => s.find(locator).await,
        }
    }

    async fn close(self) -> Result<(), SessionError> {
        match self {
            BrowserHandle::Remote(s) => s.close().await,
            BrowserHandle::Local(s) => s.close().await,
        }
    }
}

/// Connector for the configured [`BrowserMode`]
#[derive(Debug, Clone)]
pub struct ConfiguredConnector {
    mode: BrowserMode,
}

impl ConfiguredConnector {
    pub fn new(mode: BrowserMode) -> Self {
        Self { mode }
    }
}

impl Connector for ConfiguredConnector {
    type Session = BrowserHandle;

    fn endpoint(&self) -> String {
        match &self.mode {
            BrowserMode::Remote { endpoint } => endpoint.clone(),
            BrowserMode::Local => "local headless chrome".to_string(),
        }
    }

    async fn connect(&self) -> Result<BrowserHandle, SessionError> {
        match &self.mode {
            BrowserMode::Remote { endpoint } => WebDriverSession::connect(endpoint)
                .await
                .map(BrowserHandle::Remote),
            BrowserMode::Local => ChromeSession::launch().map(BrowserHandle::Local),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_display() {
        assert_eq!(Locator::Css("tbody".into()).to_string(), "css=tbody");
        assert_eq!(
            Locator::XPath("//input[@id='q']".into()).to_string(),
            "xpath=//input[@id='q']"
        );
    }

    #[test]
    fn test_configured_connector_endpoint() {
        let remote = ConfiguredConnector::new(BrowserMode::Remote {
            endpoint: "http://127.0.0.1:4444".to_string(),
        });
        assert_eq!(remote.endpoint(), "http://127.0.0.1:4444");
        let local = ConfiguredConnector::new(BrowserMode::Local);
        assert!(local.endpoint().contains("local"));
    }
}
