//! Statement-level aggregation over the normalized transaction set

use tracing::debug;

use crate::models::{StatementSummary, Transaction};

/// Fold transactions into summary totals
///
/// Explicit opening/closing balances (from the pre-header summary block)
/// win; otherwise the first/last non-null running balance in date order is
/// used; otherwise the fields stay `None`, never zero.
pub fn aggregate(
    transactions: &[Transaction],
    explicit_opening: Option<f64>,
    explicit_closing: Option<f64>,
) -> StatementSummary {
    let total_debits = transactions.iter().map(|tx| tx.debit_amount).sum();
    let total_credits = transactions.iter().map(|tx| tx.credit_amount).sum();

    let period_start = transactions.iter().map(|tx| tx.transaction_date).min();
    let period_end = transactions.iter().map(|tx| tx.transaction_date).max();

    // Date-ascending order for the balance-column fallback; sort_by_key is
    // stable, so same-day rows keep their statement order
    let mut by_date: Vec<&Transaction> = transactions.iter().collect();
    by_date.sort_by_key(|tx| tx.transaction_date);

    let opening_balance = explicit_opening
        .or_else(|| by_date.iter().find_map(|tx| tx.balance));
    let closing_balance = explicit_closing
        .or_else(|| by_date.iter().rev().find_map(|tx| tx.balance));

    let summary = StatementSummary {
        opening_balance,
        closing_balance,
        period_start,
        period_end,
        total_debits,
        total_credits,
        transaction_count: transactions.len(),
    };

    debug!(
        "Aggregated {} transactions: debits {:.2}, credits {:.2}",
        summary.transaction_count, summary.total_debits, summary.total_credits
    );
    summary
}
