//! Scrape orchestration
//!
//! One run is: open a browser session, load the page, let it settle, capture
//! the rendered markup, release the session, extract records, write them.
//! Every step either succeeds or ends the run with a typed error; nothing is
//! salvaged from a failed run.

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::browser::{
    establish, wait_for_element, BrowserSession, Connector, Locator, RetryPolicy, WaitOptions,
};
use crate::config::SourceSettings;
use crate::error::{fmt_duration, ScrapeError};
use crate::models::RankingRecord;
use crate::scraping::{Extractor, TableLayout};
use crate::storage::{self, TableStore};

/// Where to scrape from and where the records go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTarget {
    pub url: String,
    pub table_name: String,
    pub settle_delay: Duration,
    /// Waited for after the settle delay; a timeout is logged, not fatal
    pub ready: Option<Locator>,
}

impl ScrapeTarget {
    pub fn new(settings: &SourceSettings, layout: &TableLayout) -> Self {
        Self {
            url: settings.url.clone(),
            table_name: settings.table_name.clone(),
            settle_delay: settings.settle_delay,
            ready: layout.ready_selector.clone().map(Locator::Css),
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub source: String,
    pub table_name: String,
    pub written: usize,
    pub elapsed: Duration,
}

pub struct Orchestrator<'a, C, S> {
    connector: &'a C,
    store: &'a S,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl<'a, C: Connector, S: TableStore> Orchestrator<'a, C, S> {
    pub fn new(connector: &'a C, store: &'a S, retry: RetryPolicy, cancel: CancellationToken) -> Self {
        Self {
            connector,
            store,
            retry,
            cancel,
        }
    }

    /// Scrape `target` with `extractor` and write the records
    pub async fn run<E: Extractor>(
        &self,
        target: &ScrapeTarget,
        extractor: &E,
    ) -> Result<RunSummary, ScrapeError> {
        let started = Instant::now();
        info!("Starting the webscraper on url: {}", target.url);

        let records = self.scrape(target, extractor).await.map_err(|e| {
            error!("Error getting the {} url: {}", extractor.source_name(), e);
            e
        })?;
        let written = storage::write_many(self.store, &target.table_name, &records).await?;

        let summary = RunSummary {
            source: extractor.source_name().to_string(),
            table_name: target.table_name.clone(),
            written,
            elapsed: started.elapsed(),
        };
        info!(
            "Finished {} scrape: {} records written to {} in {}",
            summary.source,
            summary.written,
            summary.table_name,
            fmt_duration(summary.elapsed)
        );
        Ok(summary)
    }

    /// Everything that needs the browser; the session is closed on every path
    async fn scrape<E: Extractor>(
        &self,
        target: &ScrapeTarget,
        extractor: &E,
    ) -> Result<Vec<RankingRecord>, ScrapeError> {
        storage::validate_table_name(&target.table_name)?;

        let mut session = establish(self.connector, &self.retry, &self.cancel).await?;
        let markup = capture(&mut session, target).await;
        if let Err(e) = session.close().await {
            warn!("{}", e);
        }

        let markup = markup?;
        Ok(extractor.extract_markup(&markup)?)
    }
}

async fn capture<B: BrowserSession>(
    session: &mut B,
    target: &ScrapeTarget,
) -> Result<String, ScrapeError> {
    session.goto(&target.url).await?;

    if !target.settle_delay.is_zero() {
        info!(
            "Waiting {} for the page to settle",
            fmt_duration(target.settle_delay)
        );
        tokio::time::sleep(target.settle_delay).await;
    }

    if let Some(locator) = &target.ready {
        if wait_for_element(session, locator, WaitOptions::default())
            .await
            .is_none()
        {
            warn!("{} not ready; capturing the page anyway", locator);
        }
    }

    let markup = session.page_source().await?;
    info!("Captured {} bytes of rendered markup", markup.len());
    Ok(markup)
}
