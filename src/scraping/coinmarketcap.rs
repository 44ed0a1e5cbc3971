// CoinMarketCap trending coins table
//
// Name and symbol are two paragraphs inside the coin cell. The rank cell is
// read as text rather than derived from the row position. The page renders
// synchronously enough that no settle delay is needed. The table lives under
// the Next.js application root.

use std::time::Duration;

use super::layout::{CellField, NameRule, RankingRule, TableLayout};

pub const SETTLE_DELAY: Duration = Duration::ZERO;

pub const MIN_ROWS: usize = 9;

/// Next.js application root that holds the rendered page content
const CONTAINER: &str = "div#__next";

pub fn layout() -> TableLayout {
    TableLayout {
        container: CONTAINER.to_string(),
        table: "table".to_string(),
        body: "tbody".to_string(),
        row: "tr".to_string(),
        cell: "td".to_string(),
        min_rows: MIN_ROWS,
        min_cells: 9,
        name: NameRule::Separate {
            cell: 2,
            name_selector: "p".to_string(),
            symbol_selector: "p.coin-item-symbol".to_string(),
        },
        ranking: RankingRule::Cell { cell: 1 },
        change_24h: CellField::full(4),
        change_7d: CellField::full(5),
        change_30d: CellField::full(6),
        market_cap: CellField::full(7),
        volume_24h: CellField::full(8),
        price: Some(CellField::full(3)),
        ready_selector: None,
    }
}
