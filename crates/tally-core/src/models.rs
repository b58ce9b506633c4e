//! Domain models for Tally

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Semantic role of a statement column, inferred from its header text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    TransactionDate,
    ValueDate,
    Description,
    Reference,
    Debit,
    Credit,
    Balance,
    Unknown,
}

impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransactionDate => "transaction_date",
            Self::ValueDate => "value_date",
            Self::Description => "description",
            Self::Reference => "reference",
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::Balance => "balance",
            Self::Unknown => "unknown",
        }
    }

    /// Roles that may be assigned to at most one column
    pub fn is_exclusive(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role assignment for every column of a located header row
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnMap {
    roles: Vec<ColumnRole>,
}

impl ColumnMap {
    pub fn new(roles: Vec<ColumnRole>) -> Self {
        Self { roles }
    }

    /// First column index assigned the given role, if any
    pub fn column(&self, role: ColumnRole) -> Option<usize> {
        self.roles.iter().position(|r| *r == role)
    }

    pub fn roles(&self) -> &[ColumnRole] {
        &self.roles
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Whether a transaction moved money out, in, or (rarely) both ways
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Debit,
    Credit,
    /// Combined row with both a debit and a credit amount
    Both,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::Both => "both",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            "both" => Ok(Self::Both),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A normalized statement transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_date: NaiveDate,
    /// Defaults to `transaction_date` when the statement has no value-date
    /// column or the cell repeats the transaction date
    pub value_date: Option<NaiveDate>,
    pub description: String,
    pub reference_number: Option<String>,
    /// Always >= 0; sign is carried by `transaction_type`
    pub debit_amount: f64,
    /// Always >= 0
    pub credit_amount: f64,
    /// Running balance after this row, when the statement carries one
    pub balance: Option<f64>,
    pub transaction_type: TransactionType,
    /// Original grid row captured as a JSON array (for reprocessing)
    pub original_data: Option<String>,
}

impl Transaction {
    /// Stable dedup fingerprint over date, description, amounts and reference
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.transaction_date.to_string().as_bytes());
        hasher.update(self.description.as_bytes());
        hasher.update(self.debit_amount.to_be_bytes());
        hasher.update(self.credit_amount.to_be_bytes());
        if let Some(ref reference) = self.reference_number {
            hasher.update(reference.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// A label/value pair extracted from a pre-header row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfoEntry {
    pub row_index: usize,
    pub label: String,
    pub value: String,
}

/// Statement-level totals derived from the transaction set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub opening_balance: Option<f64>,
    pub closing_balance: Option<f64>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub total_debits: f64,
    pub total_credits: f64,
    pub transaction_count: usize,
}

/// Payload handed to the storage collaborator after a successful parse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementRecord {
    pub file_name: String,
    pub file_period_start: Option<NaiveDate>,
    pub file_period_end: Option<NaiveDate>,
    pub opening_balance: Option<f64>,
    pub closing_balance: Option<f64>,
    pub total_debits: f64,
    pub total_credits: f64,
    pub currency: Option<String>,
    pub transactions: Vec<Transaction>,
}

/// A previously persisted transaction, as the reconciliation matcher sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedTransaction {
    pub id: i64,
    pub date: NaiveDate,
    pub debit: f64,
    pub credit: f64,
}

/// A live grid row reduced to the fields reconciliation matches on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowCandidate {
    pub grid_row_index: usize,
    pub date: NaiveDate,
    pub debit: f64,
    pub credit: f64,
}

/// How a grid row was matched to a persisted transaction, if at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "confidence", rename_all = "lowercase")]
pub enum MatchConfidence {
    /// Same calendar day and matching debit or credit amount
    Exact { transaction_id: i64 },
    /// Chronological positional alignment fallback
    Positional { transaction_id: i64 },
    /// No enrichment can be attached to this row
    None,
}

impl MatchConfidence {
    pub fn transaction_id(&self) -> Option<i64> {
        match self {
            Self::Exact { transaction_id } | Self::Positional { transaction_id } => {
                Some(*transaction_id)
            }
            Self::None => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact { .. } => "exact",
            Self::Positional { .. } => "positional",
            Self::None => "none",
        }
    }
}

/// Match outcome for a single grid row. Recomputed on every view, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub grid_row_index: usize,
    pub confidence: MatchConfidence,
}

/// UI-level enrichment attached to a persisted transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowEnrichment {
    pub category: Option<String>,
    pub proof: Option<String>,
    pub notes: Option<String>,
}

/// Display-layer decomposition of a transaction description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationParts {
    /// Text before the first `/`
    pub mode_of_payment: String,
    /// Text after the first `/`, or an em dash placeholder when absent
    pub free_text: String,
}
