//! Integration tests for tally-core
//!
//! These exercise the full load → locate → classify → normalize →
//! aggregate pipeline and the ingest → reconcile round trip against the
//! in-memory collaborators.

use chrono::NaiveDate;
use std::collections::HashMap;

use tally_core::{
    ingest, join_enrichments, parse_statement, reconcile_statement, MatchConfidence, MemoryFetcher,
    MemoryStore, RowEnrichment, StatementStore, TransactionType,
};

/// Build the messy 40-row statement: 3 title rows, 2 customer-info rows,
/// 1 currency row, 2 summary rows, 1 header row, 30 transaction rows (one
/// with an unparseable date), and a blank filler row.
fn messy_statement_csv() -> String {
    let mut lines = vec![
        "Acme Bank Ltd,,,,".to_string(),
        "Statement of Account,,,,".to_string(),
        "Savings Account 00123,,,,".to_string(),
        "Account Name,Jane Doe,,,".to_string(),
        "Branch,Main Street,,,".to_string(),
        "Currency,INR,,,".to_string(),
        "Opening Balance,\"10,000.00\",,,".to_string(),
        "Closing Balance,\"12,500.00\",,,".to_string(),
        ",,,,".to_string(),
        "Date,Particulars,Debit,Credit,Balance".to_string(),
    ];

    // 30 transaction rows across April 2024; row 17 gets a broken date
    let mut balance = 10_000.0;
    for day in 1..=30 {
        let (debit, credit) = if day % 3 == 0 {
            (0.0, 300.0)
        } else {
            (100.0, 0.0)
        };
        balance += credit - debit;
        let date = if day == 17 {
            "17th April".to_string()
        } else {
            format!("{:02}/04/2024", day)
        };
        let debit_cell = if debit > 0.0 {
            format!("{:.2}", debit)
        } else {
            String::new()
        };
        let credit_cell = if credit > 0.0 {
            format!("{:.2}", credit)
        } else {
            String::new()
        };
        lines.push(format!(
            "{},TXN DAY {},{},{},{:.2}",
            date, day, debit_cell, credit_cell, balance
        ));
    }

    lines.join("\n")
}

#[test]
fn test_end_to_end_messy_statement() {
    let csv = messy_statement_csv();
    let report = parse_statement(csv.as_bytes(), "messy.csv").unwrap();

    assert_eq!(report.header_row, 9);

    // 30 rows minus the one with the unrecognizable date
    assert_eq!(report.summary.transaction_count, 29);
    assert_eq!(report.skipped_dates, 1);
    assert_eq!(report.warnings, vec!["1 row skipped: unrecognized date"]);

    // Explicit balances from the summary block win over the balance column
    assert_eq!(report.summary.opening_balance, Some(10_000.0));
    assert_eq!(report.summary.closing_balance, Some(12_500.0));

    // Period spans the surviving rows
    assert_eq!(
        report.summary.period_start,
        NaiveDate::from_ymd_opt(2024, 4, 1)
    );
    assert_eq!(
        report.summary.period_end,
        NaiveDate::from_ymd_opt(2024, 4, 30)
    );

    // Customer info stops at the currency pair
    assert_eq!(report.currency, Some("INR".to_string()));
    let labels: Vec<&str> = report
        .customer_info
        .iter()
        .map(|entry| entry.label.as_str())
        .collect();
    assert!(labels.contains(&"Account Name"));
    assert!(labels.contains(&"Currency"));

    // Every surviving transaction satisfies the amount XOR invariant
    for tx in &report.transactions {
        assert!(tx.debit_amount > 0.0 || tx.credit_amount > 0.0);
        match tx.transaction_type {
            TransactionType::Debit => {
                assert!(tx.debit_amount > 0.0 && tx.credit_amount == 0.0)
            }
            TransactionType::Credit => {
                assert!(tx.credit_amount > 0.0 && tx.debit_amount == 0.0)
            }
            TransactionType::Both => {
                assert!(tx.debit_amount > 0.0 && tx.credit_amount > 0.0)
            }
        }
    }
}

#[test]
fn test_parse_twice_is_bit_identical() {
    let csv = messy_statement_csv();
    let a = parse_statement(csv.as_bytes(), "messy.csv").unwrap();
    let b = parse_statement(csv.as_bytes(), "messy.csv").unwrap();

    assert_eq!(a.summary, b.summary);
    let fingerprints_a: Vec<String> = a.transactions.iter().map(|t| t.fingerprint()).collect();
    let fingerprints_b: Vec<String> = b.transactions.iter().map(|t| t.fingerprint()).collect();
    assert_eq!(fingerprints_a, fingerprints_b);
}

#[tokio::test]
async fn test_ingest_then_exact_reconciliation() {
    let csv = messy_statement_csv();
    let fetcher = MemoryFetcher::new().with_file("messy.csv", csv.into_bytes());
    let store = MemoryStore::new();

    let report = ingest(&fetcher, &store, "messy.csv").await.unwrap();
    assert_eq!(report.summary.transaction_count, 29);

    let record = store.statement("messy.csv").unwrap();
    assert_eq!(record.transactions.len(), 29);
    assert_eq!(record.currency, Some("INR".to_string()));

    // Re-fetch and reconcile: every surviving row has a unique
    // date+amount, so all matches are exact
    let persisted = store.persisted_transactions("messy.csv").await.unwrap();
    let results = reconcile_statement(&fetcher, &persisted, "messy.csv")
        .await
        .unwrap();

    assert_eq!(results.len(), 29);
    for result in &results {
        assert!(
            matches!(result.confidence, MatchConfidence::Exact { .. }),
            "row {} was {:?}",
            result.grid_row_index,
            result.confidence
        );
    }
}

#[tokio::test]
async fn test_positional_reconciliation_when_amounts_drift() {
    // Persisted amounts disagree with the sheet (say, edited upstream);
    // counts and chronology still line up, so rows align positionally
    let csv = "\
Date,Particulars,Debit,Credit,Balance
01/04/2024,ROW ONE,100.00,,900.00
02/04/2024,ROW TWO,200.00,,700.00
";
    let fetcher = MemoryFetcher::new().with_file("drift.csv", csv.as_bytes().to_vec());
    let store = MemoryStore::new();
    ingest(&fetcher, &store, "drift.csv").await.unwrap();

    let mut persisted = store.persisted_transactions("drift.csv").await.unwrap();
    for tx in &mut persisted {
        tx.debit += 5.0;
    }

    let results = reconcile_statement(&fetcher, &persisted, "drift.csv")
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(
        results[0].confidence,
        MatchConfidence::Positional {
            transaction_id: persisted[0].id
        }
    );
    assert_eq!(
        results[1].confidence,
        MatchConfidence::Positional {
            transaction_id: persisted[1].id
        }
    );
}

#[tokio::test]
async fn test_enrichment_round_trip() {
    let csv = "\
Date,Particulars,Debit,Credit,Balance
14/05/2024,GROCER,100.00,,900.00
";
    let fetcher = MemoryFetcher::new().with_file("one.csv", csv.as_bytes().to_vec());
    let store = MemoryStore::new();
    ingest(&fetcher, &store, "one.csv").await.unwrap();

    let persisted = store.persisted_transactions("one.csv").await.unwrap();
    let id = persisted[0].id;
    store
        .upsert_enrichment(
            id,
            RowEnrichment {
                category: Some("Groceries".to_string()),
                proof: Some("receipt-42.jpg".to_string()),
                notes: None,
            },
        )
        .await
        .unwrap();

    let results = reconcile_statement(&fetcher, &persisted, "one.csv")
        .await
        .unwrap();
    assert_eq!(
        results[0].confidence,
        MatchConfidence::Exact { transaction_id: id }
    );

    let enrichments: HashMap<_, _> = store.enrichments().await.unwrap();
    let joined = join_enrichments(&results, &enrichments);
    let enrichment = joined[0].enrichment.as_ref().unwrap();
    assert_eq!(enrichment.category.as_deref(), Some("Groceries"));
    assert_eq!(enrichment.proof.as_deref(), Some("receipt-42.jpg"));
}

#[test]
fn test_unreadable_file_has_no_partial_result() {
    // Valid extension, garbage bytes
    let result = parse_statement(b"\x00\x01\x02 not a workbook", "broken.xlsx");
    assert!(result.is_err());
}
