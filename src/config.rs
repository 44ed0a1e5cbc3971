//! Run configuration
//!
//! Everything a run needs is read from the environment (optionally seeded
//! from a `.env` file) exactly once, validated, and handed to the components
//! as an [`AppConfig`]. Nothing reads the environment after startup.

use chrono_tz::Tz;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::browser::RetryPolicy;
use crate::error::ConfigError;
use crate::scraping::{LayoutSet, Source};

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// One configured scrape target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub source: Source,
    pub url: String,
    pub table_name: String,
    pub settle_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    DynamoDb { region: String },
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserMode {
    /// WebDriver sidecar at the given endpoint
    Remote { endpoint: String },
    /// Headless Chrome launched by this process
    Local,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub timezone: Tz,
    pub sources: Vec<SourceSettings>,
    pub storage: StorageBackend,
    pub browser: BrowserMode,
    pub retry: RetryPolicy,
    pub layouts: LayoutSet,
}

struct SourceKeys {
    source: Source,
    url: &'static str,
    table: &'static str,
    settle_ms: &'static str,
}

const SOURCE_KEYS: [SourceKeys; 2] = [
    SourceKeys {
        source: Source::CoinGecko,
        url: "COIN_GECKO_URL",
        table: "COIN_GECKO_TABLE_NAME",
        settle_ms: "COIN_GECKO_SETTLE_MS",
    },
    SourceKeys {
        source: Source::CoinMarketCap,
        url: "COIN_MARKET_CAP_URL",
        table: "COIN_MARKET_CAP_TABLE_NAME",
        settle_ms: "COIN_MARKET_CAP_SETTLE_MS",
    },
];

/// Load `.env` from the working directory if there is one
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<u64>, ConfigError> {
    non_empty(lookup, key)
        .map(|v| {
            v.parse::<u64>().map_err(|e| ConfigError::Invalid {
                key,
                value: v.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// `TIMEZONE`, as an IANA zone name
pub fn timezone(lookup: &impl Fn(&str) -> Option<String>) -> Result<Tz, ConfigError> {
    let raw = non_empty(lookup, "TIMEZONE").ok_or(ConfigError::Missing("TIMEZONE"))?;
    raw.parse::<Tz>().map_err(|e| ConfigError::Invalid {
        key: "TIMEZONE",
        value: raw.clone(),
        reason: e.to_string(),
    })
}

/// Built-in layouts, replaced by `LAYOUTS_FILE` where it says so
pub fn layouts(lookup: &impl Fn(&str) -> Option<String>) -> Result<LayoutSet, ConfigError> {
    let path = non_empty(lookup, "LAYOUTS_FILE").map(PathBuf::from);
    LayoutSet::load(path.as_deref())
}

fn default_sqlite_path() -> PathBuf {
    dir_spec::data_home()
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cryptorank")
        .join("tables.db")
}

fn sources(lookup: &impl Fn(&str) -> Option<String>) -> Result<Vec<SourceSettings>, ConfigError> {
    let mut out = Vec::new();
    for keys in &SOURCE_KEYS {
        let url = non_empty(lookup, keys.url);
        let table = non_empty(lookup, keys.table);
        let (url, table_name) = match (url, table) {
            (None, None) => continue,
            (Some(_), None) => {
                return Err(ConfigError::Unpaired {
                    key: keys.url,
                    partner: keys.table,
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::Unpaired {
                    key: keys.table,
                    partner: keys.url,
                })
            }
            (Some(u), Some(t)) => (u, t),
        };
        let settle_delay = parse_u64(lookup, keys.settle_ms)?
            .map(Duration::from_millis)
            .unwrap_or_else(|| keys.source.default_settle_delay());
        out.push(SourceSettings {
            source: keys.source,
            url,
            table_name,
            settle_delay,
        });
    }
    Ok(out)
}

/// Storage backend from `STORAGE_BACKEND` and its companion keys
pub fn storage(lookup: &impl Fn(&str) -> Option<String>) -> Result<StorageBackend, ConfigError> {
    let backend = non_empty(lookup, "STORAGE_BACKEND").unwrap_or_else(|| "dynamodb".to_string());
    match backend.to_ascii_lowercase().as_str() {
        "dynamodb" => {
            let region = non_empty(lookup, "AWS_REGION").ok_or(ConfigError::Missing("AWS_REGION"))?;
            Ok(StorageBackend::DynamoDb { region })
        }
        "sqlite" => {
            let path = non_empty(lookup, "SQLITE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_sqlite_path);
            Ok(StorageBackend::Sqlite { path })
        }
        _ => Err(ConfigError::Invalid {
            key: "STORAGE_BACKEND",
            value: backend,
            reason: "expected dynamodb or sqlite".to_string(),
        }),
    }
}

fn browser(lookup: &impl Fn(&str) -> Option<String>) -> Result<BrowserMode, ConfigError> {
    let mode = non_empty(lookup, "BROWSER_MODE").unwrap_or_else(|| "remote".to_string());
    match mode.to_ascii_lowercase().as_str() {
        "remote" => Ok(BrowserMode::Remote {
            endpoint: non_empty(lookup, "WEBDRIVER_URL")
                .unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string()),
        }),
        "local" => Ok(BrowserMode::Local),
        _ => Err(ConfigError::Invalid {
            key: "BROWSER_MODE",
            value: mode,
            reason: "expected remote or local".to_string(),
        }),
    }
}

fn retry(lookup: &impl Fn(&str) -> Option<String>) -> Result<RetryPolicy, ConfigError> {
    let backoff = parse_u64(lookup, "SESSION_RETRY_BACKOFF_MS")?
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_RETRY_BACKOFF);
    let max_attempts = match parse_u64(lookup, "SESSION_MAX_ATTEMPTS")? {
        Some(0) => {
            return Err(ConfigError::Invalid {
                key: "SESSION_MAX_ATTEMPTS",
                value: "0".to_string(),
                reason: "must be at least 1; leave unset for unbounded".to_string(),
            })
        }
        Some(n) => Some(u32::try_from(n).unwrap_or(u32::MAX)),
        None => None,
    };
    Ok(RetryPolicy {
        backoff,
        max_attempts,
    })
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            timezone: timezone(&lookup)?,
            sources: sources(&lookup)?,
            storage: storage(&lookup)?,
            browser: browser(&lookup)?,
            retry: retry(&lookup)?,
            layouts: layouts(&lookup)?,
        })
    }

    /// Settings for a source, failing if its URL/table pair was not set
    pub fn source(&self, source: Source) -> Result<&SourceSettings, ConfigError> {
        self.sources
            .iter()
            .find(|s| s.source == source)
            .ok_or_else(|| ConfigError::SourceNotConfigured(source.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("TIMEZONE", "Europe/Berlin"),
            ("AWS_REGION", "eu-central-1"),
            ("COIN_GECKO_URL", "https://www.coingecko.com/en/highlights/trending-crypto"),
            ("COIN_GECKO_TABLE_NAME", "coingecko-trends"),
        ]
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&base())).unwrap();
        assert_eq!(cfg.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(
            cfg.storage,
            StorageBackend::DynamoDb {
                region: "eu-central-1".to_string()
            }
        );
        assert_eq!(
            cfg.browser,
            BrowserMode::Remote {
                endpoint: DEFAULT_WEBDRIVER_URL.to_string()
            }
        );
        assert_eq!(cfg.retry.backoff, Duration::from_secs(1));
        assert_eq!(cfg.retry.max_attempts, None);

        let gecko = cfg.source(Source::CoinGecko).unwrap();
        assert_eq!(gecko.table_name, "coingecko-trends");
        assert_eq!(gecko.settle_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_missing_timezone_fails() {
        let pairs: Vec<_> = base().into_iter().filter(|(k, _)| *k != "TIMEZONE").collect();
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("TIMEZONE"));
    }

    #[test]
    fn test_unknown_timezone_fails() {
        let mut pairs = base();
        pairs[0] = ("TIMEZONE", "Mars/Olympus");
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TIMEZONE", .. }));
    }

    #[test]
    fn test_region_required_for_dynamodb_only() {
        let pairs: Vec<_> = base().into_iter().filter(|(k, _)| *k != "AWS_REGION").collect();
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("AWS_REGION"));

        let mut pairs = pairs;
        pairs.push(("STORAGE_BACKEND", "sqlite"));
        pairs.push(("SQLITE_PATH", "/tmp/rank.db"));
        let cfg = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(
            cfg.storage,
            StorageBackend::Sqlite {
                path: PathBuf::from("/tmp/rank.db")
            }
        );
    }

    #[test]
    fn test_url_without_table_is_rejected() {
        let mut pairs = base();
        pairs.push(("COIN_MARKET_CAP_URL", "https://coinmarketcap.com/trending-cryptocurrencies/"));
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Unpaired {
                key: "COIN_MARKET_CAP_URL",
                partner: "COIN_MARKET_CAP_TABLE_NAME"
            }
        );
    }

    #[test]
    fn test_unconfigured_source_is_reported() {
        let cfg = AppConfig::from_lookup(lookup(&base())).unwrap();
        let err = cfg.source(Source::CoinMarketCap).unwrap_err();
        assert_eq!(
            err,
            ConfigError::SourceNotConfigured("coinmarketcap".to_string())
        );
    }

    #[test]
    fn test_retry_and_settle_overrides() {
        let mut pairs = base();
        pairs.push(("SESSION_RETRY_BACKOFF_MS", "250"));
        pairs.push(("SESSION_MAX_ATTEMPTS", "5"));
        pairs.push(("COIN_GECKO_SETTLE_MS", "0"));
        pairs.push(("BROWSER_MODE", "local"));
        let cfg = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(cfg.retry.backoff, Duration::from_millis(250));
        assert_eq!(cfg.retry.max_attempts, Some(5));
        assert_eq!(cfg.browser, BrowserMode::Local);
        assert_eq!(
            cfg.source(Source::CoinGecko).unwrap().settle_delay,
            Duration::ZERO
        );
    }

    #[test]
    fn test_zero_max_attempts_is_invalid() {
        let mut pairs = base();
        pairs.push(("SESSION_MAX_ATTEMPTS", "0"));
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "SESSION_MAX_ATTEMPTS",
                ..
            }
        ));
    }

    #[test]
    fn test_garbage_number_is_invalid() {
        let mut pairs = base();
        pairs.push(("SESSION_RETRY_BACKOFF_MS", "soon"));
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("SESSION_RETRY_BACKOFF_MS"));
    }
}
