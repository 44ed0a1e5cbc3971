//! Error handling for cryptorank
//!
//! Each failure kind of a scrape run has its own typed error. The top-level
//! [`ScrapeError`] wraps them so the runner can log one message and decide the
//! process exit status in one place.

use std::time::Duration;
use thiserror::Error;

/// Expected DOM substructure is absent or smaller than the layout requires
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("{source_name}: primary container `{selector}` not found")]
    MissingContainer {
        source_name: String,
        selector: String,
    },

    #[error("{source_name}: data table `{selector}` not found inside container")]
    MissingTable {
        source_name: String,
        selector: String,
    },

    #[error("{source_name}: table body `{selector}` not found inside table")]
    MissingBody {
        source_name: String,
        selector: String,
    },

    #[error("{source_name}: expected at least {expected} rows, found {found}")]
    TooFewRows {
        source_name: String,
        expected: usize,
        found: usize,
    },

    #[error("{source_name}: row {row} has {found} cells, expected at least {expected}")]
    TooFewCells {
        source_name: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{source_name}: row {row}: {field} not found ({detail})")]
    MissingField {
        source_name: String,
        row: usize,
        field: &'static str,
        detail: String,
    },

    #[error("{source_name}: invalid selector `{selector}`: {reason}")]
    InvalidSelector {
        source_name: String,
        selector: String,
        reason: String,
    },
}

/// Browser endpoint unreachable, or the page could not be driven
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to connect to browser endpoint {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("gave up connecting to browser endpoint after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<SessionError> },

    #[error("browser session establishment cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },

    #[error("failed to navigate to {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("failed to capture rendered markup: {0}")]
    Markup(String),

    #[error("element lookup failed: {0}")]
    Lookup(String),

    #[error("failed to release browser session: {0}")]
    Release(String),
}

/// The backing table service rejected a write or delete
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("invalid table name `{0}`: must be 3-255 characters of [A-Za-z0-9_.-]")]
    InvalidTableName(String),

    #[error("failed to write item {index} (id {id}) to table {table}: {reason}")]
    Put {
        table: String,
        index: usize,
        id: String,
        reason: String,
    },

    #[error("failed to delete table {table}: {reason}")]
    Delete { table: String, reason: String },

    #[error("failed to open table store: {0}")]
    Open(String),
}

/// Configuration missing or malformed at startup
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("{key} is set but {partner} is not; both are required together")]
    Unpaired {
        key: &'static str,
        partner: &'static str,
    },

    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("source {0} is not configured")]
    SourceNotConfigured(String),

    #[error("failed to read layouts file {path}: {reason}")]
    Layouts { path: String, reason: String },
}

/// Any failure of a scrape run
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("browser session failed: {0}")]
    Session(#[from] SessionError),

    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ScrapeError {
    /// Process exit status for this failure; every kind is fatal
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// Formats a duration for log lines (e.g. `1.25s`)
pub fn fmt_duration(d: Duration) -> String {
    format!("{:.2}s", d.as_secs_f64())
}
