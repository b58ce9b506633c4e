//! Tally Core Library
//!
//! Turns arbitrary, human-formatted bank-statement spreadsheets into a
//! normalized ledger of dated, signed transactions:
//! - Grid loading for `.csv`/`.xlsx`/`.xls` exports
//! - Header-row location among title and summary blocks
//! - Column-role inference from header text
//! - Customer-info and opening/closing-balance extraction
//! - Multi-format date and amount normalization
//! - Statement totals aggregation
//! - Row-to-record reconciliation for attaching UI enrichments
//!
//! Heuristics are deterministic and total: ambiguity resolves via
//! documented fallbacks, never via errors. The only fatal failure is a
//! file that cannot be decoded into a grid at all.

pub mod aggregate;
pub mod columns;
pub mod error;
pub mod grid;
pub mod header;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;
pub mod store;
pub mod summary;

pub use error::{Error, Result};
pub use grid::{load_grid, Grid, SourceFormat};
pub use header::LocatorConfig;
pub use models::{
    ColumnMap, ColumnRole, CustomerInfoEntry, MatchConfidence, MatchResult, NarrationParts,
    PersistedTransaction, RowCandidate, RowEnrichment, StatementRecord, StatementSummary,
    Transaction, TransactionType,
};
pub use normalize::{split_narration, RowOutcome};
pub use pipeline::{ingest, parse_statement, reconcile_statement, ParseReport};
pub use reconcile::{join_enrichments, match_rows, EnrichedRow};
pub use store::{FileFetcher, MemoryFetcher, MemoryStore, StatementStore};
pub use summary::SummaryBlock;
