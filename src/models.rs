// Record types produced by the extractors and written to the table store

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ranking of a coin within one scraped table.
///
/// CoinGecko rankings are derived from the row position, CoinMarketCap
/// rankings are read verbatim from a cell. Both are kept as-is so the stored
/// values match what each site shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Ranking {
    Position(u32),
    Text(String),
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ranking::Position(n) => write!(f, "{}", n),
            Ranking::Text(s) => f.write_str(s),
        }
    }
}

/// One row of a scraped trend table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingRecord {
    pub id: String,
    pub crypto_name: String,
    pub crypto_symbol: String,
    pub ranking: Ranking,
    pub change_24h: String,
    pub change_7d: String,
    pub change_30d: String,
    pub market_cap: String,
    pub volume_24h: String,
    pub scraped_at: String,
}

/// Attribute value of a stored item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    S(String),
    N(u64),
}

/// Flat item as written to a table, keyed by attribute name
pub type Item = BTreeMap<String, AttrValue>;

pub const ATTR_ID: &str = "id";
pub const ATTR_NAME: &str = "Crypto Name";
pub const ATTR_SYMBOL: &str = "Crypto Symbol";
pub const ATTR_RANKING: &str = "Ranking";
pub const ATTR_CHANGE_24H: &str = "24hrs % Change";
pub const ATTR_CHANGE_7D: &str = "7days % Change";
pub const ATTR_CHANGE_30D: &str = "30days % Change";
pub const ATTR_MARKET_CAP: &str = "Market Cap";
pub const ATTR_VOLUME_24H: &str = "24hrs Volume";
pub const ATTR_DATETIME: &str = "Datetime";

impl RankingRecord {
    /// Convert to the stored item shape.
    ///
    /// Attribute names match the tables written by earlier runs so existing
    /// analysis queries keep working.
    pub fn to_item(&self) -> Item {
        let s = |v: &str| AttrValue::S(v.to_string());
        let mut item = Item::new();
        item.insert(ATTR_ID.to_string(), s(&self.id));
        item.insert(ATTR_NAME.to_string(), s(&self.crypto_name));
        item.insert(ATTR_SYMBOL.to_string(), s(&self.crypto_symbol));
        let ranking = match &self.ranking {
            Ranking::Position(n) => AttrValue::N(u64::from(*n)),
            Ranking::Text(t) => s(t),
        };
        item.insert(ATTR_RANKING.to_string(), ranking);
        item.insert(ATTR_CHANGE_24H.to_string(), s(&self.change_24h));
        item.insert(ATTR_CHANGE_7D.to_string(), s(&self.change_7d));
        item.insert(ATTR_CHANGE_30D.to_string(), s(&self.change_30d));
        item.insert(ATTR_MARKET_CAP.to_string(), s(&self.market_cap));
        item.insert(ATTR_VOLUME_24H.to_string(), s(&self.volume_24h));
        item.insert(ATTR_DATETIME.to_string(), s(&self.scraped_at));
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ranking: Ranking) -> RankingRecord {
        RankingRecord {
            id: "6f1c".to_string(),
            crypto_name: "Bitcoin".to_string(),
            crypto_symbol: "BTC".to_string(),
            ranking,
            change_24h: "1.2%".to_string(),
            change_7d: "-3.4%".to_string(),
            change_30d: "10.0%".to_string(),
            market_cap: "$1,234,567".to_string(),
            volume_24h: "$89,012".to_string(),
            scraped_at: "2024-05-01T10:00:00+02:00".to_string(),
        }
    }

    #[test]
    fn test_positional_ranking_is_stored_as_number() {
        let item = record(Ranking::Position(7)).to_item();
        assert_eq!(item.get(ATTR_RANKING), Some(&AttrValue::N(7)));
        assert_eq!(item.len(), 10);
    }

    #[test]
    fn test_text_ranking_is_stored_verbatim() {
        let item = record(Ranking::Text("12".to_string())).to_item();
        assert_eq!(
            item.get(ATTR_RANKING),
            Some(&AttrValue::S("12".to_string()))
        );
        assert_eq!(
            item.get(ATTR_NAME),
            Some(&AttrValue::S("Bitcoin".to_string()))
        );
    }

    #[test]
    fn test_item_serializes_flat() {
        let item = record(Ranking::Position(1)).to_item();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["Ranking"], serde_json::json!(1));
        assert_eq!(json["24hrs Volume"], serde_json::json!("$89,012"));
    }
}
