// Element-wait helpers
//
// Poll a session until an element shows up (or until its value contains some
// text). Both return `None` on timeout or on lookup errors; neither ever
// fails the caller.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info};

use super::{BrowserSession, FoundElement, Locator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl WaitOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }
}

async fn poll_until<S, F>(
    session: &mut S,
    locator: &Locator,
    opts: WaitOptions,
    accept: F,
) -> Result<Option<FoundElement>, String>
where
    S: BrowserSession,
    F: Fn(&FoundElement) -> bool,
{
    let deadline = Instant::now() + opts.timeout;
    loop {
        match session.find(locator).await {
            Ok(Some(el)) if accept(&el) => return Ok(Some(el)),
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(opts.poll_interval.min(deadline - now)).await;
    }
}

/// Wait for an element matching `locator` to be present
pub async fn wait_for_element<S: BrowserSession>(
    session: &mut S,
    locator: &Locator,
    opts: WaitOptions,
) -> Option<FoundElement> {
    match poll_until(session, locator, opts, |_| true).await {
        Ok(Some(el)) => {
            info!("Element found: {}", locator);
            Some(el)
        }
        Ok(None) => {
            error!(
                "Error waiting for element: {} not present after {:?}",
                locator, opts.timeout
            );
            None
        }
        Err(e) => {
            error!("Error waiting for element: {}", e);
            None
        }
    }
}

/// Wait for the value of the element matching `locator` to contain `text`
pub async fn wait_for_element_value<S: BrowserSession>(
    session: &mut S,
    locator: &Locator,
    text: &str,
    opts: WaitOptions,
) -> Option<FoundElement> {
    let has_text = |el: &FoundElement| el.value.as_deref().is_some_and(|v| v.contains(text));
    match poll_until(session, locator, opts, has_text).await {
        Ok(Some(el)) => {
            info!("Element value found: {}", locator);
            Some(el)
        }
        Ok(None) => {
            error!(
                "Error waiting for element value: {:?} not in {} after {:?}",
                text, locator, opts.timeout
            );
            None
        }
        Err(e) => {
            error!("Error waiting for element value: {}", e);
            None
        }
    }
}
