//! Output formatting module for CLI display
//!
//! Keeps presentation apart from the scrape itself: records and run
//! summaries go through here on their way to stdout.

use colored::Colorize;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use cryptorank::error::fmt_duration;
use cryptorank::models::RankingRecord;
use cryptorank::orchestrator::RunSummary;

/// Format extracted records as pretty JSON
pub fn format_records_json(records: &[RankingRecord]) -> String {
    serde_json::to_string_pretty(records)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Format extracted records for terminal table output
pub fn format_records_table(source: &str, records: &[RankingRecord]) -> String {
    #[derive(Tabled)]
    struct RecordRow {
        #[tabled(rename = "Rank")]
        ranking: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Symbol")]
        symbol: String,
        #[tabled(rename = "24h")]
        change_24h: String,
        #[tabled(rename = "7d")]
        change_7d: String,
        #[tabled(rename = "30d")]
        change_30d: String,
        #[tabled(rename = "Market Cap")]
        market_cap: String,
        #[tabled(rename = "24h Volume")]
        volume_24h: String,
    }

    let rows: Vec<RecordRow> = records
        .iter()
        .map(|r| RecordRow {
            ranking: r.ranking.to_string(),
            name: r.crypto_name.clone(),
            symbol: r.crypto_symbol.clone(),
            change_24h: colorize_change(&r.change_24h),
            change_7d: colorize_change(&r.change_7d),
            change_30d: colorize_change(&r.change_30d),
            market_cap: r.market_cap.clone(),
            volume_24h: r.volume_24h.clone(),
        })
        .collect();

    let mut output = format!(
        "\n{} {} records from {}\n\n",
        "✓".green().bold(),
        records.len(),
        source.cyan().bold()
    );
    let table = Table::new(rows)
        .with(Style::rounded())
        .modify(Columns::new(3..), Alignment::right())
        .to_string();
    output.push_str(&table);
    output.push('\n');
    output
}

/// Negative changes red, everything else green
fn colorize_change(change: &str) -> String {
    if change.starts_with('-') {
        change.red().to_string()
    } else if change.is_empty() {
        String::new()
    } else {
        change.green().to_string()
    }
}

/// Summaries of the runs of one `scrape` invocation
pub fn format_summaries(summaries: &[RunSummary], json: bool) -> String {
    if json {
        #[derive(Serialize)]
        struct JsonSummary<'a> {
            source: &'a str,
            table: &'a str,
            written: usize,
            elapsed_secs: f64,
        }
        let out: Vec<JsonSummary<'_>> = summaries
            .iter()
            .map(|s| JsonSummary {
                source: &s.source,
                table: &s.table_name,
                written: s.written,
                elapsed_secs: s.elapsed.as_secs_f64(),
            })
            .collect();
        return serde_json::to_string_pretty(&out)
            .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e));
    }

    summaries
        .iter()
        .map(|s| {
            format!(
                "{} {}: {} records written to {} ({})",
                "✓".green().bold(),
                s.source.cyan(),
                s.written,
                s.table_name.bold(),
                fmt_duration(s.elapsed)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptorank::models::Ranking;
    use std::time::Duration;

    fn record(rank: u32, change: &str) -> RankingRecord {
        RankingRecord {
            id: format!("id-{}", rank),
            crypto_name: "Solana".to_string(),
            crypto_symbol: "SOL".to_string(),
            ranking: Ranking::Position(rank),
            change_24h: change.to_string(),
            change_7d: "1.0%".to_string(),
            change_30d: "2.0%".to_string(),
            market_cap: "$80,000,000,000".to_string(),
            volume_24h: "$3,000,000,000".to_string(),
            scraped_at: "2024-05-01T10:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_table_lists_every_record() {
        colored::control::set_override(false);
        let out = format_records_table("coingecko", &[record(1, "-2.5%"), record(2, "0.4%")]);
        assert!(out.contains("2 records from coingecko"));
        assert!(out.contains("-2.5%"));
        assert!(out.contains("$80,000,000,000"));
        assert!(out.contains("Market Cap"));
    }

    #[test]
    fn test_json_records_keep_field_names() {
        let out = format_records_json(&[record(3, "1%")]);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v[0]["ranking"], serde_json::json!(3));
        assert_eq!(v[0]["crypto_symbol"], serde_json::json!("SOL"));
    }

    #[test]
    fn test_summary_json() {
        let summaries = vec![RunSummary {
            source: "coinmarketcap".to_string(),
            table_name: "cmc-trends".to_string(),
            written: 30,
            elapsed: Duration::from_millis(1500),
        }];
        let v: serde_json::Value =
            serde_json::from_str(&format_summaries(&summaries, true)).unwrap();
        assert_eq!(v[0]["written"], serde_json::json!(30));
        assert_eq!(v[0]["elapsed_secs"], serde_json::json!(1.5));
    }
}
