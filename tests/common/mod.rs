#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cryptorank::browser::{BrowserSession, Connector, FoundElement, Locator, RetryPolicy};
use cryptorank::error::SessionError;
use cryptorank::models::{AttrValue, Item, ATTR_ID};
use cryptorank::storage::TableStore;

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name))
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {}", name, e))
}

pub fn fast_retry(max_attempts: Option<u32>) -> RetryPolicy {
    RetryPolicy {
        backoff: Duration::from_millis(5),
        max_attempts,
    }
}

/// What the fake browser saw, shared between connector and sessions
#[derive(Debug, Default)]
pub struct BrowserLog {
    pub connect_attempts: u32,
    pub visited: Vec<String>,
    pub opened: u32,
    pub closed: u32,
}

pub struct FakeSession {
    markup: String,
    fail_goto: bool,
    log: Arc<Mutex<BrowserLog>>,
}

impl BrowserSession for FakeSession {
    async fn goto(&mut self, url: &str) -> Result<(), SessionError> {
        if self.fail_goto {
            return Err(SessionError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        self.log.lock().unwrap().visited.push(url.to_string());
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, SessionError> {
        Ok(self.markup.clone())
    }

    async fn find(&mut self, locator: &Locator) -> Result<Option<FoundElement>, SessionError> {
        Ok(Some(FoundElement {
            locator: locator.clone(),
            outer_html: "<table></table>".to_string(),
            value: None,
        }))
    }

    async fn close(self) -> Result<(), SessionError> {
        self.log.lock().unwrap().closed += 1;
        Ok(())
    }
}

/// Connector that refuses the first `failures` attempts
pub struct FakeConnector {
    pub failures: u32,
    pub markup: String,
    pub fail_goto: bool,
    pub log: Arc<Mutex<BrowserLog>>,
}

impl FakeConnector {
    pub fn serving(markup: String) -> Self {
        Self {
            failures: 0,
            markup,
            fail_goto: false,
            log: Arc::new(Mutex::new(BrowserLog::default())),
        }
    }

    pub fn flapping(failures: u32, markup: String) -> Self {
        Self {
            failures,
            ..Self::serving(markup)
        }
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, BrowserLog> {
        self.log.lock().unwrap()
    }
}

impl Connector for FakeConnector {
    type Session = FakeSession;

    fn endpoint(&self) -> String {
        "fake://webdriver".to_string()
    }

    async fn connect(&self) -> Result<FakeSession, SessionError> {
        let mut log = self.log.lock().unwrap();
        log.connect_attempts += 1;
        if log.connect_attempts <= self.failures {
            return Err(SessionError::Connect {
                endpoint: self.endpoint(),
                reason: "connection refused".to_string(),
            });
        }
        log.opened += 1;
        Ok(FakeSession {
            markup: self.markup.clone(),
            fail_goto: self.fail_goto,
            log: Arc::clone(&self.log),
        })
    }
}

/// In-memory table store; optionally rejects the put with the given index
#[derive(Default)]
pub struct MemoryStore {
    pub fail_at: Option<u32>,
    puts: AtomicU32,
    items: Mutex<Vec<(String, Item)>>,
}

impl MemoryStore {
    pub fn failing_at(index: u32) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    pub fn items(&self, table: &str) -> Vec<Item> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == table)
            .map(|(_, item)| item.clone())
            .collect()
    }

    pub fn put_attempts(&self) -> u32 {
        self.puts.load(Ordering::SeqCst)
    }
}

impl TableStore for MemoryStore {
    async fn put(&self, table: &str, item: &Item) -> Result<(), String> {
        let index = self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(index) {
            return Err("ProvisionedThroughputExceededException".to_string());
        }
        self.items
            .lock()
            .unwrap()
            .push((table.to_string(), item.clone()));
        Ok(())
    }

    async fn delete_table(&self, table: &str) -> Result<(), String> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|(t, _)| t != table);
        if items.len() == before {
            return Err(format!("Requested resource not found: Table: {} not found", table));
        }
        Ok(())
    }
}

pub fn item_str(item: &Item, key: &str) -> String {
    match item.get(key) {
        Some(AttrValue::S(s)) => s.clone(),
        Some(AttrValue::N(n)) => n.to_string(),
        None => panic!("item {:?} has no {}", item.get(ATTR_ID), key),
    }
}
