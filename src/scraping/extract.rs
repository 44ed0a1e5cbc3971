//! Layout-driven table extraction
//!
//! [`TableExtractor`] walks container -> table -> body -> rows -> cells as
//! described by a [`TableLayout`], checking each structural step before it
//! indexes into anything. Any missing piece fails the whole pass; no partial
//! record list is ever returned.
//!
//! A combined name element is split on whitespace: the last token is the
//! symbol and the tokens before it, joined by single spaces, are the name.
//! Text with fewer than two tokens is a missing symbol.

use chrono::Utc;
use chrono_tz::Tz;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};
use uuid::Uuid;

use super::layout::{CellField, NameRule, RankingRule, TableLayout, TextRule};
use crate::error::ExtractError;
use crate::models::{Ranking, RankingRecord};

/// Turns a rendered page into ranking records
pub trait Extractor {
    fn source_name(&self) -> &str;

    fn extract(&self, doc: &Html) -> Result<Vec<RankingRecord>, ExtractError>;

    /// Parse rendered markup and extract from it
    fn extract_markup(&self, markup: &str) -> Result<Vec<RankingRecord>, ExtractError> {
        let doc = Html::parse_document(markup);
        self.extract(&doc)
    }
}

/// Extractor for one source, driven entirely by its layout
#[derive(Debug, Clone)]
pub struct TableExtractor {
    source_name: String,
    layout: TableLayout,
    timezone: Tz,
}

struct Selectors {
    container: Selector,
    table: Selector,
    body: Selector,
    row: Selector,
    cell: Selector,
    name: NameSelectors,
}

enum NameSelectors {
    Combined {
        cell: usize,
        css: Selector,
        raw: String,
    },
    Separate {
        cell: usize,
        name: Selector,
        symbol: Selector,
        raw_name: String,
        raw_symbol: String,
    },
}

impl TableExtractor {
    pub fn new(source_name: impl Into<String>, layout: TableLayout, timezone: Tz) -> Self {
        Self {
            source_name: source_name.into(),
            layout,
            timezone,
        }
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    fn selector(&self, css: &str) -> Result<Selector, ExtractError> {
        Selector::parse(css).map_err(|e| ExtractError::InvalidSelector {
            source_name: self.source_name.clone(),
            selector: css.to_string(),
            reason: e.to_string(),
        })
    }

    fn compile(&self) -> Result<Selectors, ExtractError> {
        let name = match &self.layout.name {
            NameRule::Combined { cell, selector } => NameSelectors::Combined {
                cell: *cell,
                css: self.selector(selector)?,
                raw: selector.clone(),
            },
            NameRule::Separate {
                cell,
                name_selector,
                symbol_selector,
            } => NameSelectors::Separate {
                cell: *cell,
                name: self.selector(name_selector)?,
                symbol: self.selector(symbol_selector)?,
                raw_name: name_selector.clone(),
                raw_symbol: symbol_selector.clone(),
            },
        };
        Ok(Selectors {
            container: self.selector(&self.layout.container)?,
            table: self.selector(&self.layout.table)?,
            body: self.selector(&self.layout.body)?,
            row: self.selector(&self.layout.row)?,
            cell: self.selector(&self.layout.cell)?,
            name,
        })
    }

    /// Locate the table body and its rows, enforcing the row threshold
    fn rows<'a>(
        &self,
        doc: &'a Html,
        sel: &Selectors,
    ) -> Result<Vec<ElementRef<'a>>, ExtractError> {
        let container = doc
            .select(&sel.container)
            .next()
            .ok_or_else(|| ExtractError::MissingContainer {
                source_name: self.source_name.clone(),
                selector: self.layout.container.clone(),
            })?;

        let table = container
            .select(&sel.table)
            .next()
            .ok_or_else(|| ExtractError::MissingTable {
                source_name: self.source_name.clone(),
                selector: self.layout.table.clone(),
            })?;

        let body = table
            .select(&sel.body)
            .next()
            .ok_or_else(|| ExtractError::MissingBody {
                source_name: self.source_name.clone(),
                selector: self.layout.body.clone(),
            })?;

        let rows: Vec<ElementRef<'a>> = body.select(&sel.row).collect();
        if rows.len() < self.layout.min_rows {
            return Err(ExtractError::TooFewRows {
                source_name: self.source_name.clone(),
                expected: self.layout.min_rows,
                found: rows.len(),
            });
        }
        Ok(rows)
    }

    fn missing(&self, row: usize, field: &'static str, detail: impl Into<String>) -> ExtractError {
        ExtractError::MissingField {
            source_name: self.source_name.clone(),
            row,
            field,
            detail: detail.into(),
        }
    }

    fn cell<'a>(
        &self,
        cells: &[ElementRef<'a>],
        row: usize,
        index: usize,
        field: &'static str,
    ) -> Result<ElementRef<'a>, ExtractError> {
        cells
            .get(index)
            .copied()
            .ok_or_else(|| self.missing(row, field, format!("no cell at index {}", index)))
    }

    fn read_field(
        &self,
        cells: &[ElementRef<'_>],
        row: usize,
        mapping: &CellField,
        field: &'static str,
    ) -> Result<String, ExtractError> {
        let text = element_text(self.cell(cells, row, mapping.cell, field)?);
        match mapping.rule {
            TextRule::Full => Ok(text.trim().to_string()),
            TextRule::FirstToken => text
                .split_whitespace()
                .next()
                .map(str::to_string)
                .ok_or_else(|| self.missing(row, field, format!("cell {} is empty", mapping.cell))),
        }
    }

    fn read_name(
        &self,
        cells: &[ElementRef<'_>],
        row: usize,
        sel: &NameSelectors,
    ) -> Result<(String, String), ExtractError> {
        match sel {
            NameSelectors::Combined { cell, css, raw } => {
                let el = self
                    .cell(cells, row, *cell, "crypto name")?
                    .select(css)
                    .next()
                    .ok_or_else(|| self.missing(row, "crypto name", raw.clone()))?;
                split_name_symbol(&element_text(el))
                    .ok_or_else(|| self.missing(row, "crypto symbol", "name text has no symbol"))
            }
            NameSelectors::Separate {
                cell,
                name,
                symbol,
                raw_name,
                raw_symbol,
            } => {
                let cell = self.cell(cells, row, *cell, "crypto name")?;
                let name = cell
                    .select(name)
                    .next()
                    .ok_or_else(|| self.missing(row, "crypto name", raw_name.clone()))?;
                let symbol = cell
                    .select(symbol)
                    .next()
                    .ok_or_else(|| self.missing(row, "crypto symbol", raw_symbol.clone()))?;
                Ok((
                    element_text(name).trim().to_string(),
                    element_text(symbol).trim().to_string(),
                ))
            }
        }
    }

    fn read_row(
        &self,
        index: usize,
        row: ElementRef<'_>,
        sel: &Selectors,
    ) -> Result<RankingRecord, ExtractError> {
        let cells: Vec<ElementRef<'_>> = row.select(&sel.cell).collect();
        if cells.len() < self.layout.min_cells {
            return Err(ExtractError::TooFewCells {
                source_name: self.source_name.clone(),
                row: index,
                expected: self.layout.min_cells,
                found: cells.len(),
            });
        }

        let (crypto_name, crypto_symbol) = self.read_name(&cells, index, &sel.name)?;

        let ranking = match self.layout.ranking {
            RankingRule::RowPosition => Ranking::Position(index as u32 + 1),
            RankingRule::Cell { cell } => Ranking::Text(
                element_text(self.cell(&cells, index, cell, "ranking")?)
                    .trim()
                    .to_string(),
            ),
        };

        let l = &self.layout;
        let change_24h = self.read_field(&cells, index, &l.change_24h, "24h change")?;
        let change_7d = self.read_field(&cells, index, &l.change_7d, "7d change")?;
        let change_30d = self.read_field(&cells, index, &l.change_30d, "30d change")?;
        let market_cap = self.read_field(&cells, index, &l.market_cap, "market cap")?;
        let volume_24h = self.read_field(&cells, index, &l.volume_24h, "24h volume")?;

        let price = match &l.price {
            Some(mapping) => Some(self.read_field(&cells, index, mapping, "price")?),
            None => None,
        };

        info!(
            "Scraped {}, {}, {}, {}, {}, {}, {}, {}",
            ranking,
            crypto_name,
            crypto_symbol,
            change_24h,
            change_7d,
            change_30d,
            market_cap,
            volume_24h
        );
        if let Some(price) = price {
            debug!("{} price: {}", crypto_symbol, price);
        }

        Ok(RankingRecord {
            id: Uuid::new_v4().to_string(),
            crypto_name,
            crypto_symbol,
            ranking,
            change_24h,
            change_7d,
            change_30d,
            market_cap,
            volume_24h,
            scraped_at: Utc::now().with_timezone(&self.timezone).to_rfc3339(),
        })
    }
}

impl Extractor for TableExtractor {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn extract(&self, doc: &Html) -> Result<Vec<RankingRecord>, ExtractError> {
        info!(
            "Starting to scrape the {} crypto trend ranking results",
            self.source_name
        );
        let sel = self.compile()?;
        let rows = self.rows(doc, &sel)?;
        debug!("{}: found {} rows", self.source_name, rows.len());

        rows.into_iter()
            .enumerate()
            .map(|(index, row)| self.read_row(index, row, &sel))
            .collect()
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Split `"<name> <symbol>"` into name and symbol, symbol last
fn split_name_symbol(text: &str) -> Option<(String, String)> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let (symbol, name) = tokens.split_last()?;
    if name.is_empty() {
        return None;
    }
    Some((name.join(" "), symbol.to_string()))
}
