//! Pre-header block extraction: customer info and account summary
//!
//! Rows above the located header row fall into two groups: label/value
//! customer-info rows ("Account Name", "IFSC", "Currency") and summary
//! rows carrying explicit opening/closing balances. Balance extraction
//! takes the cell immediately after the "opening"/"closing" marker cell.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::grid::Grid;
use crate::models::CustomerInfoEntry;

/// Markers whose presence tags a pre-header row as summary, not customer
/// info
const SUMMARY_MARKERS: &[&str] = &[
    "opening balance",
    "closing balance",
    "total debit",
    "total credit",
    "total debits",
    "total credits",
];

/// Labels are letters, whitespace, colons and parentheses only; anything
/// with a digit is treated as data, not a label
fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z\s:()]+$").expect("static pattern"))
}

/// Result of scanning the rows above the header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryBlock {
    pub customer_info: Vec<CustomerInfoEntry>,
    pub opening: Option<f64>,
    pub closing: Option<f64>,
}

impl SummaryBlock {
    /// Value of the first customer-info label mentioning a currency
    pub fn currency(&self) -> Option<String> {
        self.customer_info
            .iter()
            .find(|entry| entry.label.to_lowercase().contains("currency"))
            .map(|entry| entry.value.clone())
            .filter(|value| !value.is_empty())
    }
}

/// A row with no meaningful text at all ("undefined"/"null" artifacts from
/// sloppy exporters count as blank)
fn is_blank_row(row: &[String]) -> bool {
    !row.iter().any(|cell| {
        let text = cell.trim().to_lowercase();
        !text.is_empty() && text != "undefined" && text != "null"
    })
}

fn is_summary_row(row: &[String]) -> bool {
    let text = row
        .iter()
        .map(|cell| cell.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    SUMMARY_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Strip everything but digits, decimal point and minus sign, then parse
fn clean_numeric(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Find the cell containing `marker` (or `alternate`) and numerically
/// parse the cell immediately after it. First match wins.
fn balance_after_marker(row: &[String], marker: &str, alternate: Option<&str>) -> Option<f64> {
    for (index, cell) in row.iter().enumerate() {
        let text = cell.to_lowercase();
        let hit = text.contains(marker)
            || alternate.map(|alt| text.contains(alt)).unwrap_or(false);
        if hit {
            if let Some(value) = row.get(index + 1).and_then(|next| clean_numeric(next)) {
                return Some(value);
            }
        }
    }
    None
}

/// Split the rows strictly before `header_row` into customer info and
/// explicit balances
pub fn extract(grid: &Grid, header_row: usize) -> SummaryBlock {
    let mut block = SummaryBlock::default();
    let mut currency_seen = false;

    for (row_index, row) in grid.rows()[..header_row.min(grid.len())].iter().enumerate() {
        if is_blank_row(row) {
            continue;
        }

        if is_summary_row(row) {
            if block.opening.is_none() {
                block.opening = balance_after_marker(row, "opening", None);
            }
            if block.closing.is_none() {
                block.closing = balance_after_marker(row, "closing", Some("final"));
            }
            continue;
        }

        // Currency is the terminal customer-info marker: the currency pair
        // itself is kept, everything after it is dropped
        if currency_seen {
            continue;
        }

        let mut cell_index = 0;
        while cell_index + 1 < row.len() {
            let label = row[cell_index].trim();
            if label.is_empty() || !label_pattern().is_match(label) {
                cell_index += 1;
                continue;
            }

            block.customer_info.push(CustomerInfoEntry {
                row_index,
                label: label.to_string(),
                value: row[cell_index + 1].trim().to_string(),
            });

            if label.to_lowercase().contains("currency") {
                currency_seen = true;
                break;
            }
            cell_index += 2;
        }
    }

    debug!(
        "Summary block: {} customer-info pairs, opening={:?}, closing={:?}",
        block.customer_info.len(),
        block.opening,
        block.closing
    );
    block
}
