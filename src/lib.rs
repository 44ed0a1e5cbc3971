//! Cryptorank - trending-coin scraper for CoinGecko and CoinMarketCap
//!
//! Loads each site's trend table in a headless browser, extracts one
//! [`models::RankingRecord`] per row and writes the records, one item at a
//! time, to a key-value table (DynamoDB, or SQLite for local runs).

pub mod browser;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod scraping;
pub mod storage;
