//! Row normalization: raw grid row + column roles to a transaction
//!
//! Date parsing is a fixed-order format cascade with a spreadsheet
//! serial-date fallback. Amount parsing is locale-agnostic cleanup: strip
//! currency symbols and thousands separators, treat failure as zero.

use chrono::{Duration, NaiveDate};
use serde_json::json;

use crate::models::{ColumnMap, ColumnRole, NarrationParts, Transaction, TransactionType};

/// Date formats tried in order; the first that parses wins, so
/// "01-02-2024" is always day-first February 1st, never January 2nd
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%Y/%m/%d",
];

/// Spreadsheet serial for the Unix epoch (1970-01-01); smaller values are
/// assumed not to be serial dates
const SERIAL_EPOCH_GUARD: f64 = 25569.0;

/// Outcome of normalizing one grid row
#[derive(Debug, Clone)]
pub enum RowOutcome {
    /// A valid transaction
    Transaction(Transaction),
    /// Not a transaction row: blank, stray text, or no amounts at all.
    /// Excluded silently.
    Skip,
    /// Amount-bearing row whose date could not be parsed. Excluded, but
    /// counted so the caller can warn.
    UnparseableDate,
}

/// Parse a date cell through the format cascade, then the serial fallback
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }

    // Spreadsheet serial: days since 1899-12-30. Guard against plain
    // numbers (row counters, amounts) by requiring a post-epoch value.
    if let Ok(serial) = text.parse::<f64>() {
        if serial > SERIAL_EPOCH_GUARD {
            let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
            return base.checked_add_signed(Duration::days(serial as i64));
        }
    }

    None
}

/// Clean and parse an amount cell; unparseable input is zero
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .replace(['$', '€', '£', '₹', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");
    cleaned.parse().unwrap_or(0.0)
}

/// Like `parse_amount`, but distinguishes "no value" from zero
fn parse_amount_opt(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .replace(['$', '€', '£', '₹', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

fn cell<'a>(row: &'a [String], columns: &ColumnMap, role: ColumnRole) -> &'a str {
    columns
        .column(role)
        .and_then(|index| row.get(index))
        .map(String::as_str)
        .unwrap_or("")
}

/// Normalize one post-header grid row into a transaction
pub fn normalize_row(row: &[String], columns: &ColumnMap) -> RowOutcome {
    if row.iter().all(|c| c.trim().is_empty()) {
        return RowOutcome::Skip;
    }

    let date_text = cell(row, columns, ColumnRole::TransactionDate).trim();
    let debit_amount = parse_amount(cell(row, columns, ColumnRole::Debit)).abs();
    let credit_amount = parse_amount(cell(row, columns, ColumnRole::Credit)).abs();

    // Rows without date text are never transactions: stray labels and
    // total lines land here, amounts or not
    if date_text.is_empty() {
        return RowOutcome::Skip;
    }

    let transaction_date = match parse_date(date_text) {
        Some(date) => date,
        None => {
            // No transaction without a resolvable date. Amount-bearing
            // rows are worth warning about; the rest are stray text.
            return if debit_amount > 0.0 || credit_amount > 0.0 {
                RowOutcome::UnparseableDate
            } else {
                RowOutcome::Skip
            };
        }
    };

    // A total line that slipped past filtering carries no movement at all
    if debit_amount == 0.0 && credit_amount == 0.0 {
        return RowOutcome::Skip;
    }

    let value_date_text = cell(row, columns, ColumnRole::ValueDate).trim();
    let value_date = if value_date_text.is_empty() || value_date_text == date_text {
        transaction_date
    } else {
        parse_date(value_date_text).unwrap_or(transaction_date)
    };

    let description = cell(row, columns, ColumnRole::Description).trim().to_string();
    let reference_number = Some(cell(row, columns, ColumnRole::Reference).trim().to_string())
        .filter(|s| !s.is_empty());
    let balance = parse_amount_opt(cell(row, columns, ColumnRole::Balance));

    let transaction_type = if debit_amount > 0.0 && credit_amount > 0.0 {
        TransactionType::Both
    } else if debit_amount > 0.0 {
        TransactionType::Debit
    } else {
        TransactionType::Credit
    };

    RowOutcome::Transaction(Transaction {
        transaction_date,
        value_date: Some(value_date),
        description,
        reference_number,
        debit_amount,
        credit_amount,
        balance,
        transaction_type,
        original_data: Some(json!(row).to_string()),
    })
}

/// Display-layer narration split: mode of payment before the first `/`,
/// free text after it. Not part of the persisted transaction shape.
pub fn split_narration(description: &str) -> NarrationParts {
    match description.split_once('/') {
        Some((mode, rest)) => NarrationParts {
            mode_of_payment: mode.trim().to_string(),
            free_text: rest.trim().to_string(),
        },
        None => NarrationParts {
            mode_of_payment: description.trim().to_string(),
            free_text: "—".to_string(),
        },
    }
}
