//! End-to-end statement parsing and the async ingest/reconcile flows
//!
//! Parsing is pure computation over an in-memory grid; the only async
//! boundaries are the initial fetch and the single persistence call.

use tracing::{debug, info, warn};

use crate::aggregate::aggregate;
use crate::columns;
use crate::error::Result;
use crate::grid::{load_grid, Grid, SourceFormat};
use crate::header::{self, LocatorConfig};
use crate::models::{
    ColumnMap, CustomerInfoEntry, MatchResult, PersistedTransaction, RowCandidate,
    StatementRecord, StatementSummary, Transaction,
};
use crate::normalize::{normalize_row, RowOutcome};
use crate::reconcile::match_rows;
use crate::store::{FileFetcher, StatementStore};
use crate::summary;

/// Everything a single parse invocation produced. Intermediate heuristic
/// outputs (header index, column roles) are kept for diagnostics; they are
/// not persisted.
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub header_row: usize,
    pub columns: ColumnMap,
    pub customer_info: Vec<CustomerInfoEntry>,
    pub currency: Option<String>,
    pub transactions: Vec<Transaction>,
    pub summary: StatementSummary,
    /// Amount-bearing rows excluded for an unrecognizable date
    pub skipped_dates: usize,
    /// Non-fatal warnings accumulated during the parse
    pub warnings: Vec<String>,
}

impl ParseReport {
    /// Build the payload handed to the storage collaborator
    pub fn into_record(self, file_name: &str) -> StatementRecord {
        StatementRecord {
            file_name: file_name.to_string(),
            file_period_start: self.summary.period_start,
            file_period_end: self.summary.period_end,
            opening_balance: self.summary.opening_balance,
            closing_balance: self.summary.closing_balance,
            total_debits: self.summary.total_debits,
            total_credits: self.summary.total_credits,
            currency: self.currency,
            transactions: self.transactions,
        }
    }
}

/// Run the full heuristic pipeline over an already-loaded grid
pub fn parse_grid(grid: &Grid, config: &LocatorConfig) -> ParseReport {
    let header_row = header::locate(grid, config);
    let columns = grid
        .row(header_row)
        .map(columns::classify)
        .unwrap_or_default();
    let block = summary::extract(grid, header_row);

    let mut transactions = Vec::new();
    let mut skipped_dates = 0usize;

    for row in grid.rows().iter().skip(header_row + 1) {
        match normalize_row(row, &columns) {
            RowOutcome::Transaction(tx) => transactions.push(tx),
            RowOutcome::Skip => {}
            RowOutcome::UnparseableDate => skipped_dates += 1,
        }
    }

    let statement_summary = aggregate(&transactions, block.opening, block.closing);

    let mut warnings = Vec::new();
    if skipped_dates > 0 {
        let message = if skipped_dates == 1 {
            "1 row skipped: unrecognized date".to_string()
        } else {
            format!("{} rows skipped: unrecognized date", skipped_dates)
        };
        warn!("{}", message);
        warnings.push(message);
    }

    debug!(
        "Parsed grid: header row {}, {} transactions, {} date skips",
        header_row,
        transactions.len(),
        skipped_dates
    );

    ParseReport {
        header_row,
        currency: block.currency(),
        customer_info: block.customer_info,
        columns,
        transactions,
        summary: statement_summary,
        skipped_dates,
        warnings,
    }
}

/// Decode statement bytes and run the pipeline
///
/// The only fatal failure is an unreadable or unsupported file; heuristic
/// ambiguity always resolves deterministically.
pub fn parse_statement(bytes: &[u8], file_name: &str) -> Result<ParseReport> {
    let format = SourceFormat::from_file_name(file_name)?;
    let grid = load_grid(bytes, format)?;
    let report = parse_grid(&grid, &LocatorConfig::default());

    info!(
        "Parsed {}: {} transactions, debits {:.2}, credits {:.2}",
        file_name,
        report.summary.transaction_count,
        report.summary.total_debits,
        report.summary.total_credits
    );
    Ok(report)
}

/// Fetch, parse and persist a statement. Persists exactly once per
/// successful parse.
pub async fn ingest(
    fetcher: &dyn FileFetcher,
    store: &dyn StatementStore,
    file_name: &str,
) -> Result<ParseReport> {
    let bytes = fetcher.fetch(file_name).await?;
    let report = parse_statement(&bytes, file_name)?;
    let record = report.clone().into_record(file_name);
    store.save_statement(&record).await?;
    Ok(report)
}

/// Reduce the transaction region of a freshly parsed grid to match
/// candidates, keeping the original grid row indices
fn candidates_from_grid(grid: &Grid, header_row: usize, columns: &ColumnMap) -> Vec<RowCandidate> {
    let mut candidates = Vec::new();
    for (index, row) in grid.rows().iter().enumerate().skip(header_row + 1) {
        if let RowOutcome::Transaction(tx) = normalize_row(row, columns) {
            candidates.push(RowCandidate {
                grid_row_index: index,
                date: tx.transaction_date,
                debit: tx.debit_amount,
                credit: tx.credit_amount,
            });
        }
    }
    candidates
}

/// Re-fetch a statement for display and match its rows against the
/// persisted transaction list
///
/// Recomputed on every view; the result is a pure function of the current
/// grid and the persisted list. Uses the stricter detail-view header
/// locator so an account-summary header is not mistaken for the
/// transaction table.
pub async fn reconcile_statement(
    fetcher: &dyn FileFetcher,
    persisted: &[PersistedTransaction],
    file_name: &str,
) -> Result<Vec<MatchResult>> {
    let bytes = fetcher.fetch(file_name).await?;
    let format = SourceFormat::from_file_name(file_name)?;
    let grid = load_grid(&bytes, format)?;

    let config = LocatorConfig::default();
    let header_row = header::locate_detail(&grid, &config);
    let columns = grid
        .row(header_row)
        .map(columns::classify)
        .unwrap_or_default();

    let candidates = candidates_from_grid(&grid, header_row, &columns);
    debug!(
        "Reconciling {}: {} candidate rows against {} persisted transactions",
        file_name,
        candidates.len(),
        persisted.len()
    );
    Ok(match_rows(&candidates, persisted))
}
