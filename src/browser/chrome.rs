// Local headless Chrome session
//
// Launches Chrome in-process instead of talking to a sidecar. Useful on a
// workstation; in containers the remote WebDriver endpoint is the default.
// headless_chrome calls block, which is fine for a strictly sequential run.

use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use tracing::{debug, info};

use super::{BrowserSession, FoundElement, Locator};
use crate::error::SessionError;

pub struct ChromeSession {
    // Dropping the browser kills the Chrome process
    browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeSession {
    /// Launch headless Chrome with sandboxing and /dev/shm usage disabled
    pub fn launch() -> Result<Self, SessionError> {
        info!("Launching headless Chrome browser");

        let options = LaunchOptions {
            headless: true,
            sandbox: false,
            args: vec![OsStr::new("--disable-dev-shm-usage")],
            ..Default::default()
        };

        let connect_err = |reason: String| SessionError::Connect {
            endpoint: "local headless chrome".to_string(),
            reason,
        };
        let browser = Browser::new(options).map_err(|e| {
            connect_err(format!("{} (is Chrome/Chromium installed?)", e))
        })?;
        let tab = browser
            .new_tab()
            .map_err(|e| connect_err(format!("failed to create new browser tab: {}", e)))?;

        Ok(Self { browser, tab })
    }
}

impl BrowserSession for ChromeSession {
    async fn goto(&mut self, url: &str) -> Result<(), SessionError> {
        let nav_err = |e: anyhow::Error| SessionError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        };
        self.tab.navigate_to(url).map_err(nav_err)?;
        self.tab.wait_until_navigated().map_err(nav_err)?;
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, SessionError> {
        self.tab
            .get_content()
            .map_err(|e| SessionError::Markup(e.to_string()))
    }

    async fn find(&mut self, locator: &Locator) -> Result<Option<FoundElement>, SessionError> {
        let found = match locator {
            Locator::Css(css) => self.tab.find_element(css),
            Locator::XPath(xpath) => self.tab.find_element_by_xpath(xpath),
        };
        let element = match found {
            Ok(el) => el,
            Err(e) if e.downcast_ref::<NoElementFound>().is_some() => return Ok(None),
            Err(e) => return Err(SessionError::Lookup(format!("{}: {}", locator, e))),
        };

        let outer_html = element
            .get_content()
            .map_err(|e| SessionError::Lookup(format!("{}: {}", locator, e)))?;
        let value = element
            .call_js_fn("function() { return this.value; }", vec![], false)
            .map_err(|e| SessionError::Lookup(format!("{}: {}", locator, e)))?
            .value
            .and_then(|v| v.as_str().map(str::to_string));

        Ok(Some(FoundElement {
            locator: locator.clone(),
            outer_html,
            value,
        }))
    }

    async fn close(self) -> Result<(), SessionError> {
        debug!("Closing headless Chrome tab");
        let closed = self
            .tab
            .close(true)
            .map(|_| ())
            .map_err(|e| SessionError::Release(e.to_string()));
        drop(self.browser);
        closed
    }
}
