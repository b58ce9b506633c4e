//! Row-to-record reconciliation
//!
//! Matches live grid rows back to persisted transactions so UI enrichments
//! land on the right row even though no stable row identifier survives the
//! round trip. Exact matching (calendar day + amount) is kept strictly
//! separate from the positional fallback so each strategy stays testable
//! on its own.

use std::collections::HashMap;
use tracing::debug;

use crate::models::{
    MatchConfidence, MatchResult, PersistedTransaction, RowCandidate, RowEnrichment,
};

/// Cent-level tolerance for amount equality
const AMOUNT_EPSILON: f64 = 0.01;

fn amounts_match(persisted: &PersistedTransaction, candidate: &RowCandidate) -> bool {
    (candidate.debit > 0.0 && (persisted.debit - candidate.debit).abs() < AMOUNT_EPSILON)
        || (candidate.credit > 0.0 && (persisted.credit - candidate.credit).abs() < AMOUNT_EPSILON)
}

/// Match each candidate row to at most one persisted transaction
///
/// A candidate earns `Exact` only when exactly one persisted record shares
/// its calendar day and debit or credit amount; no match (or an ambiguous
/// tie) falls back to chronological positional alignment. Under the
/// positional fallback, several rows may align to the same record when
/// dates collide; that is an accepted limitation, not an error.
pub fn match_rows(
    candidates: &[RowCandidate],
    persisted: &[PersistedTransaction],
) -> Vec<MatchResult> {
    // Positional order: persisted transactions sorted by date ascending
    let mut by_date: Vec<&PersistedTransaction> = persisted.iter().collect();
    by_date.sort_by_key(|tx| tx.date);

    let mut results = Vec::with_capacity(candidates.len());

    for (position, candidate) in candidates.iter().enumerate() {
        let exact: Vec<&PersistedTransaction> = persisted
            .iter()
            .filter(|tx| tx.date == candidate.date && amounts_match(tx, candidate))
            .collect();

        let confidence = match exact.as_slice() {
            [only] => MatchConfidence::Exact {
                transaction_id: only.id,
            },
            _ => match by_date.get(position) {
                Some(tx) => {
                    debug!(
                        "Row {}: {} exact matches, positional fallback to id {}",
                        candidate.grid_row_index,
                        exact.len(),
                        tx.id
                    );
                    MatchConfidence::Positional { transaction_id: tx.id }
                }
                None => MatchConfidence::None,
            },
        };

        results.push(MatchResult {
            grid_row_index: candidate.grid_row_index,
            confidence,
        });
    }

    results
}

/// A match result joined with the enrichment stored for its transaction
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub result: MatchResult,
    /// `None` when the row is unmatched or carries no enrichment yet;
    /// the enrichment UI is disabled for unmatched rows
    pub enrichment: Option<RowEnrichment>,
}

/// Join match results against enrichments keyed by persisted transaction id
pub fn join_enrichments(
    results: &[MatchResult],
    enrichments: &HashMap<i64, RowEnrichment>,
) -> Vec<EnrichedRow> {
    results
        .iter()
        .map(|result| EnrichedRow {
            result: *result,
            enrichment: result
                .confidence
                .transaction_id()
                .and_then(|id| enrichments.get(&id).cloned()),
        })
        .collect()
}
