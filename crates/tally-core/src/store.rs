//! Collaborator interfaces: statement storage and file retrieval
//!
//! The core never owns persistence or transport; it talks to these traits
//! and suspends exactly once per call. In-memory implementations are
//! provided for tests and embedding hosts that keep everything local.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::models::{PersistedTransaction, RowEnrichment, StatementRecord};

/// Storage collaborator for parsed statements
///
/// Enrichment writes are idempotent upserts keyed by persisted transaction
/// id, never by grid row index, so a re-parse that reorders rows cannot
/// lose updates.
#[async_trait]
pub trait StatementStore: Send + Sync {
    /// Persist a parsed statement. Invoked exactly once per successful
    /// parse.
    async fn save_statement(&self, record: &StatementRecord) -> Result<()>;

    /// Persisted transactions for a statement, with their assigned ids
    async fn persisted_transactions(&self, file_name: &str) -> Result<Vec<PersistedTransaction>>;

    /// Idempotent enrichment upsert keyed by transaction id
    async fn upsert_enrichment(&self, transaction_id: i64, enrichment: RowEnrichment)
        -> Result<()>;

    /// All stored enrichments keyed by transaction id
    async fn enrichments(&self) -> Result<HashMap<i64, RowEnrichment>>;
}

/// File-retrieval collaborator; fetches the original spreadsheet bytes
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>>;
}

#[derive(Default)]
struct MemoryStoreInner {
    statements: HashMap<String, StatementRecord>,
    transactions: HashMap<String, Vec<PersistedTransaction>>,
    enrichments: HashMap<i64, RowEnrichment>,
    next_id: i64,
}

/// In-memory `StatementStore`, assigning sequential transaction ids
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryStoreInner> {
        // Mutex poisoning only happens if a holder panicked; tests want
        // the panic surfaced, not swallowed
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl StatementStore for MemoryStore {
    async fn save_statement(&self, record: &StatementRecord) -> Result<()> {
        let mut inner = self.lock();
        let persisted = record
            .transactions
            .iter()
            .map(|tx| {
                inner.next_id += 1;
                PersistedTransaction {
                    id: inner.next_id,
                    date: tx.transaction_date,
                    debit: tx.debit_amount,
                    credit: tx.credit_amount,
                }
            })
            .collect();
        inner
            .transactions
            .insert(record.file_name.clone(), persisted);
        inner
            .statements
            .insert(record.file_name.clone(), record.clone());
        Ok(())
    }

    async fn persisted_transactions(&self, file_name: &str) -> Result<Vec<PersistedTransaction>> {
        self.lock()
            .transactions
            .get(file_name)
            .cloned()
            .ok_or_else(|| Error::Storage(format!("No statement stored for {}", file_name)))
    }

    async fn upsert_enrichment(
        &self,
        transaction_id: i64,
        enrichment: RowEnrichment,
    ) -> Result<()> {
        self.lock().enrichments.insert(transaction_id, enrichment);
        Ok(())
    }

    async fn enrichments(&self) -> Result<HashMap<i64, RowEnrichment>> {
        Ok(self.lock().enrichments.clone())
    }
}

impl MemoryStore {
    /// The stored record for a file, if any (test convenience)
    pub fn statement(&self, file_name: &str) -> Option<StatementRecord> {
        self.lock().statements.get(file_name).cloned()
    }
}

/// In-memory `FileFetcher` backed by a name → bytes map
#[derive(Default)]
pub struct MemoryFetcher {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file_name: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(file_name.to_string(), bytes);
        self
    }
}

#[async_trait]
impl FileFetcher for MemoryFetcher {
    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>> {
        self.files
            .get(file_name)
            .cloned()
            .ok_or_else(|| Error::Fetch(format!("No such file: {}", file_name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(file_name: &str) -> StatementRecord {
        StatementRecord {
            file_name: file_name.to_string(),
            file_period_start: NaiveDate::from_ymd_opt(2024, 4, 1),
            file_period_end: NaiveDate::from_ymd_opt(2024, 4, 30),
            opening_balance: Some(1000.0),
            closing_balance: Some(900.0),
            total_debits: 100.0,
            total_credits: 0.0,
            currency: Some("INR".to_string()),
            transactions: vec![crate::models::Transaction {
                transaction_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
                value_date: None,
                description: "ATM WDL".to_string(),
                reference_number: None,
                debit_amount: 100.0,
                credit_amount: 0.0,
                balance: Some(900.0),
                transaction_type: crate::models::TransactionType::Debit,
                original_data: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let store = MemoryStore::new();
        store.save_statement(&record("a.csv")).await.unwrap();
        store.save_statement(&record("b.csv")).await.unwrap();

        let a = store.persisted_transactions("a.csv").await.unwrap();
        let b = store.persisted_transactions("b.csv").await.unwrap();
        assert_eq!(a[0].id, 1);
        assert_eq!(b[0].id, 2);
    }

    #[tokio::test]
    async fn test_missing_statement_errors() {
        let store = MemoryStore::new();
        assert!(store.persisted_transactions("nope.csv").await.is_err());
    }

    #[tokio::test]
    async fn test_enrichment_upsert_is_idempotent() {
        let store = MemoryStore::new();
        let first = RowEnrichment {
            category: Some("Food".to_string()),
            ..Default::default()
        };
        let second = RowEnrichment {
            category: Some("Dining".to_string()),
            notes: Some("team lunch".to_string()),
            ..Default::default()
        };
        store.upsert_enrichment(7, first).await.unwrap();
        store.upsert_enrichment(7, second.clone()).await.unwrap();

        let all = store.enrichments().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all.get(&7), Some(&second));
    }

    #[tokio::test]
    async fn test_memory_fetcher() {
        let fetcher = MemoryFetcher::new().with_file("s.csv", b"a,b".to_vec());
        assert_eq!(fetcher.fetch("s.csv").await.unwrap(), b"a,b".to_vec());
        assert!(fetcher.fetch("missing.csv").await.is_err());
    }
}
