// Remote WebDriver session (Selenium / chromedriver sidecar)

use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::{BrowserSession, FoundElement, Locator, CHROME_ARGS};
use crate::error::SessionError;

pub struct WebDriverSession {
    client: Client,
    endpoint: String,
}

impl WebDriverSession {
    /// Capabilities requested from the sidecar
    pub fn capabilities() -> Map<String, Value> {
        let mut caps = Map::new();
        caps.insert("browserName".to_string(), json!("chrome"));
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": CHROME_ARGS }));
        caps
    }

    /// Open one session; no retry here, see [`super::establish`]
    pub async fn connect(endpoint: &str) -> Result<Self, SessionError> {
        debug!("Requesting WebDriver session from {}", endpoint);
        let mut builder = ClientBuilder::native();
        builder.capabilities(Self::capabilities());
        let client = builder
            .connect(endpoint)
            .await
            .map_err(|e| SessionError::Connect {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        info!("WebDriver session opened on {}", endpoint);
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    fn lookup_err(locator: &Locator, e: CmdError) -> SessionError {
        SessionError::Lookup(format!("{}: {}", locator, e))
    }
}

/// The WebDriver "no such element" status; an absent element, not a failure
fn is_missing(e: &CmdError) -> bool {
    e.is_no_such_element()
}

impl BrowserSession for WebDriverSession {
    async fn goto(&mut self, url: &str) -> Result<(), SessionError> {
        self.client
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn page_source(&mut self) -> Result<String, SessionError> {
        self.client
            .source()
            .await
            .map_err(|e| SessionError::Markup(e.to_string()))
    }

    async fn find(&mut self, locator: &Locator) -> Result<Option<FoundElement>, SessionError> {
        let wd_locator = match locator {
            Locator::Css(css) => fantoccini::Locator::Css(css),
            Locator::XPath(xpath) => fantoccini::Locator::XPath(xpath),
        };
        let element = match self.client.find(wd_locator).await {
            Ok(el) => el,
            Err(e) if is_missing(&e) => return Ok(None),
            Err(e) => return Err(Self::lookup_err(locator, e)),
        };
        let outer_html = element
            .html(false)
            .await
            .map_err(|e| Self::lookup_err(locator, e))?;
        let value = element
            .prop("value")
            .await
            .map_err(|e| Self::lookup_err(locator, e))?;
        Ok(Some(FoundElement {
            locator: locator.clone(),
            outer_html,
            value,
        }))
    }

    async fn close(self) -> Result<(), SessionError> {
        debug!("Closing WebDriver session on {}", self.endpoint);
        self.client
            .close()
            .await
            .map_err(|e| SessionError::Release(e.to_string()))
    }
}
