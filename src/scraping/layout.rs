//! Column layouts for the scraped trend tables
//!
//! A layout names every structural selector and cell offset an extractor
//! relies on. When a site changes its markup, the fix is an edit to the
//! layout (built-in, or a `LAYOUTS_FILE` override), not to extraction code.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// How a cell's text becomes a field value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextRule {
    /// All text of the cell with leading and trailing whitespace dropped;
    /// inner whitespace is kept as rendered
    #[default]
    Full,
    /// First whitespace-separated token; an empty cell is an error
    FirstToken,
}

/// A field read from a fixed cell offset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellField {
    pub cell: usize,
    #[serde(default)]
    pub rule: TextRule,
}

impl CellField {
    pub const fn full(cell: usize) -> Self {
        Self {
            cell,
            rule: TextRule::Full,
        }
    }

    pub const fn first_token(cell: usize) -> Self {
        Self {
            cell,
            rule: TextRule::FirstToken,
        }
    }
}

/// Where the coin name and symbol come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NameRule {
    /// One element whose text reads `<name> <symbol>`; the last token is the
    /// symbol, everything before it the name
    Combined { cell: usize, selector: String },
    /// Two elements inside the same cell
    Separate {
        cell: usize,
        name_selector: String,
        symbol_selector: String,
    },
}

/// How the ranking of a row is determined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RankingRule {
    /// Row offset + 1, stored as a number
    RowPosition,
    /// Cell text, stored verbatim
    Cell { cell: usize },
}

/// Structural selectors and field mapping for one source's table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    pub container: String,
    pub table: String,
    pub body: String,
    #[serde(default = "default_row")]
    pub row: String,
    #[serde(default = "default_cell")]
    pub cell: String,
    pub min_rows: usize,
    pub min_cells: usize,
    pub name: NameRule,
    pub ranking: RankingRule,
    pub change_24h: CellField,
    pub change_7d: CellField,
    pub change_30d: CellField,
    pub market_cap: CellField,
    pub volume_24h: CellField,
    /// Read and logged only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<CellField>,
    /// CSS selector to wait for after the settle delay, before capture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_selector: Option<String>,
}

fn default_row() -> String {
    "tr".to_string()
}

fn default_cell() -> String {
    "td".to_string()
}

/// Effective layouts for both sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSet {
    pub coingecko: TableLayout,
    pub coinmarketcap: TableLayout,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutOverrides {
    coingecko: Option<TableLayout>,
    coinmarketcap: Option<TableLayout>,
}

impl Default for LayoutSet {
    fn default() -> Self {
        Self {
            coingecko: super::coingecko::layout(),
            coinmarketcap: super::coinmarketcap::layout(),
        }
    }
}

impl LayoutSet {
    /// Built-in layouts, with any source replaced by the TOML override file
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut set = Self::default();
        let Some(path) = path else {
            return Ok(set);
        };

        let layouts_err = |reason: String| ConfigError::Layouts {
            path: path.display().to_string(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| layouts_err(e.to_string()))?;
        set.apply_overrides(&raw).map_err(layouts_err)?;
        Ok(set)
    }

    fn apply_overrides(&mut self, raw: &str) -> Result<(), String> {
        let overrides: LayoutOverrides = toml::from_str(raw).map_err(|e| e.to_string())?;
        if let Some(layout) = overrides.coingecko {
            tracing::info!("Using coingecko layout from overrides file");
            self.coingecko = layout;
        }
        if let Some(layout) = overrides.coinmarketcap {
            tracing::info!("Using coinmarketcap layout from overrides file");
            self.coinmarketcap = layout;
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
