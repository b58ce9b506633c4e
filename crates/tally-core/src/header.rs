//! Header-row location heuristics
//!
//! Real statement exports bury the transaction header under title lines,
//! customer-info blocks and account summaries. The locator scores each row
//! against keyword lists and falls back rather than failing: worst case it
//! returns row 0.

use tracing::debug;

use crate::grid::Grid;

/// Keywords that strongly indicate a transaction header row
const TRANSACTION_KEYWORDS: &[&str] = &[
    "date",
    "description",
    "narration",
    "particulars",
    "debit",
    "credit",
    "transaction",
];

/// Keywords common to both transaction and account-summary headers
const COMMON_KEYWORDS: &[&str] = &["value date", "ref", "reference", "amount", "balance"];

/// Tokens the detail-view locator requires before accepting a header
const DETAIL_TOKENS: &[&str] = &["particulars", "description", "narration"];

/// How many rows past the generic pick the detail locator will look
const DETAIL_FORWARD_SCAN: usize = 10;

/// Locator tuning
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Number of leading rows scanned for the header. The same bound is
    /// used for the statement flow and the transaction-detail flow.
    pub scan_rows: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self { scan_rows: 30 }
    }
}

fn populated_cells(row: &[String]) -> usize {
    row.iter().filter(|cell| !cell.is_empty()).count()
}

fn joined_lowercase(row: &[String]) -> String {
    row.iter()
        .map(|cell| cell.to_lowercase())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Title heuristic: a lone populated cell mentioning the account, or an
/// explicit statement title anywhere in the row
fn is_title_row(row: &[String]) -> bool {
    let populated: Vec<&String> = row.iter().filter(|cell| !cell.is_empty()).collect();

    if populated.len() == 1 {
        let text = populated[0].to_lowercase();
        if text.contains("statement") || text.contains("account") {
            return true;
        }
    }

    row.iter().any(|cell| {
        let text = cell.trim().to_lowercase();
        text == "statement of account" || text == "account statement"
    })
}

/// Summary heuristic: opening/closing balance lines, totals, or an
/// explicit summary marker
fn is_summary_row(row: &[String]) -> bool {
    let text = joined_lowercase(row);
    (text.contains("opening") && text.contains("balance"))
        || (text.contains("closing") && text.contains("balance"))
        || (text.contains("total") && (text.contains("debit") || text.contains("credit")))
        || text.contains("summary")
}

/// Count how many of the given keywords appear anywhere in the row
fn keyword_count(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|kw| text.contains(*kw)).count()
}

fn has_detail_token(row: &[String]) -> bool {
    let text = joined_lowercase(row);
    DETAIL_TOKENS.iter().any(|token| text.contains(token))
}

/// Locate the transaction header row. Total: always returns an index.
///
/// Priority order: keyword scoring over non-title, non-summary rows, then
/// the densest remaining row, then row 0.
pub fn locate(grid: &Grid, config: &LocatorConfig) -> usize {
    let bound = config.scan_rows.min(grid.len());

    for (index, row) in grid.rows()[..bound].iter().enumerate() {
        if is_title_row(row) || is_summary_row(row) {
            continue;
        }

        let text = joined_lowercase(row);
        let transaction_hits = keyword_count(&text, TRANSACTION_KEYWORDS);
        let common_hits = keyword_count(&text, COMMON_KEYWORDS);

        if transaction_hits >= 2 || (transaction_hits + common_hits >= 3 && transaction_hits >= 1) {
            return index;
        }
    }

    // No keyword match: fall back to the densest row with at least 3
    // populated cells, ignoring wide single-cell rows (likely titles)
    let mut best: Option<(usize, usize)> = None;
    for (index, row) in grid.rows()[..bound].iter().enumerate() {
        let populated = populated_cells(row);
        // Minimum 3 populated cells; this also rules out wide single-cell
        // title rows
        if populated < 3 {
            continue;
        }
        if best.map(|(_, count)| populated > count).unwrap_or(true) {
            best = Some((index, populated));
        }
    }

    if let Some((index, count)) = best {
        debug!("Header fallback: densest row {} ({} cells)", index, count);
        return index;
    }

    debug!("Header fallback: no candidate row, defaulting to row 0");
    0
}

/// Stricter variant for transaction-detail views
///
/// Requires a particulars/description/narration token so an account
/// *summary* header that also mentions dates and balances is not picked.
/// When the generic pick lacks the token, scans forward a few rows for one
/// that has it.
pub fn locate_detail(grid: &Grid, config: &LocatorConfig) -> usize {
    let generic = locate(grid, config);

    if grid
        .row(generic)
        .map(|row| has_detail_token(row))
        .unwrap_or(false)
    {
        return generic;
    }

    let end = (generic + 1 + DETAIL_FORWARD_SCAN).min(grid.len());
    for index in generic + 1..end {
        if let Some(row) = grid.row(index) {
            if has_detail_token(row) {
                debug!("Detail header: advanced from row {} to row {}", generic, index);
                return index;
            }
        }
    }

    generic
}
