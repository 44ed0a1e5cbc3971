// CoinGecko trending coins table
//
// The coin cell holds one element whose text is "<name> <symbol>"; the
// percentage and volume cells carry trailing markup (arrows, tooltips), so
// only their first token is kept. Ranking is the row position.

use std::time::Duration;

use super::layout::{CellField, NameRule, RankingRule, TableLayout};

/// Rendering needs a moment after navigation before the table is complete
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Fewer rows than this means the page was captured mid-render
pub const MIN_ROWS: usize = 14;

const NAME_SELECTOR: &str = r"div.tw-text-gray-700.dark\:tw-text-moon-100.tw-font-semibold.tw-text-sm.tw-leading-5";

pub fn layout() -> TableLayout {
    TableLayout {
        container: "main".to_string(),
        table: "table".to_string(),
        body: "tbody".to_string(),
        row: "tr".to_string(),
        cell: "td".to_string(),
        min_rows: MIN_ROWS,
        min_cells: 9,
        name: NameRule::Combined {
            cell: 2,
            selector: NAME_SELECTOR.to_string(),
        },
        ranking: RankingRule::RowPosition,
        change_24h: CellField::first_token(4),
        change_7d: CellField::first_token(5),
        change_30d: CellField::first_token(6),
        market_cap: CellField::first_token(7),
        volume_24h: CellField::first_token(8),
        price: None,
        ready_selector: None,
    }
}
