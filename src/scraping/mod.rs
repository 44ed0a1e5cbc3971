// Web scraping module for extracting trend rankings from rendered pages
// Each source is a layout; extraction itself is shared

pub mod coingecko;
pub mod coinmarketcap;
pub mod extract;
pub mod layout;

use chrono_tz::Tz;
use std::fmt;
use std::time::Duration;

pub use extract::{Extractor, TableExtractor};
pub use layout::{CellField, LayoutSet, NameRule, RankingRule, TableLayout, TextRule};

/// A site whose trend table we scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Source {
    #[value(name = "coingecko")]
    CoinGecko,
    #[value(name = "coinmarketcap")]
    CoinMarketCap,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::CoinGecko, Source::CoinMarketCap];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::CoinGecko => "coingecko",
            Source::CoinMarketCap => "coinmarketcap",
        }
    }

    pub fn default_settle_delay(&self) -> Duration {
        match self {
            Source::CoinGecko => coingecko::SETTLE_DELAY,
            Source::CoinMarketCap => coinmarketcap::SETTLE_DELAY,
        }
    }

    /// This source's layout out of a layout set
    pub fn layout<'a>(&self, set: &'a LayoutSet) -> &'a TableLayout {
        match self {
            Source::CoinGecko => &set.coingecko,
            Source::CoinMarketCap => &set.coinmarketcap,
        }
    }

    pub fn extractor(&self, set: &LayoutSet, timezone: Tz) -> TableExtractor {
        TableExtractor::new(self.as_str(), self.layout(set).clone(), timezone)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_delay_only_for_coingecko() {
        assert_eq!(Source::CoinGecko.default_settle_delay(), Duration::from_secs(2));
        assert_eq!(Source::CoinMarketCap.default_settle_delay(), Duration::ZERO);
    }

    #[test]
    fn test_extractor_uses_source_layout() {
        let set = LayoutSet::default();
        let ex = Source::CoinMarketCap.extractor(&set, chrono_tz::UTC);
        assert_eq!(ex.source_name(), "coinmarketcap");
        assert_eq!(ex.layout(), &set.coinmarketcap);
    }
}
