//! Column-role classification from header text
//!
//! The rules are an ordered list of predicate/role pairs evaluated per
//! column; the first matching rule wins. Order matters: "value date" must
//! be checked before the generic "date", and description-like tokens
//! before "cr"/"dr" so a "Description" column is never read as a credit.

use crate::models::{ColumnMap, ColumnRole};

/// Ordered substring rules. Within one rule, any listed token matches.
const RULES: &[(ColumnRole, &[&str])] = &[
    (ColumnRole::ValueDate, &["value date"]),
    (ColumnRole::TransactionDate, &["date"]),
    (
        ColumnRole::Description,
        &["description", "narration", "particulars", "details"],
    ),
    (ColumnRole::Reference, &["reference", "ref", "cheque", "chq"]),
    (ColumnRole::Debit, &["debit", "withdrawal", "dr"]),
    (ColumnRole::Credit, &["credit", "deposit", "cr"]),
    (ColumnRole::Balance, &["balance"]),
];

/// Assign a semantic role to every column of the header row
///
/// Exclusive roles are claimed by the first column that matches; a later
/// column matching an already-claimed role falls through to the remaining
/// rules and ends up `Unknown` if none fit.
pub fn classify(header_row: &[String]) -> ColumnMap {
    let mut claimed: Vec<ColumnRole> = Vec::new();
    let mut roles = Vec::with_capacity(header_row.len());

    for cell in header_row {
        let text = cell.trim().to_lowercase();
        let mut assigned = ColumnRole::Unknown;

        if !text.is_empty() {
            for (role, tokens) in RULES {
                if claimed.contains(role) {
                    continue;
                }
                if tokens.iter().any(|token| text.contains(token)) {
                    assigned = *role;
                    claimed.push(*role);
                    break;
                }
            }
        }

        roles.push(assigned);
    }

    ColumnMap::new(roles)
}
