//! Invoice identifiers
//!
//! The invoice number is the reconciliation key across all three stores.
//! It is always carried normalized: trimmed, upper-cased, never empty.

use std::collections::BTreeSet;
use std::fmt;

/// Normalized invoice number (prefix + consecutive, e.g. `FV00123`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InvoiceId(String);

impl InvoiceId {
    /// Create a normalized invoice id. Returns `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            None
        } else {
            Some(InvoiceId(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The six-digit consecutive embedded after the two-character document
    /// prefix (characters 2..8 of the invoice number).
    pub fn consecutive(&self) -> String {
        self.0.chars().skip(2).take(6).collect()
    }
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize, de-duplicate (case-insensitively) and sort ascending.
///
/// Blank entries are dropped. Duplicates that differ only in case collapse to
/// a single id because normalization upper-cases before comparison.
pub fn normalize_invoice_set<I, S>(raw: I) -> Vec<InvoiceId>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let set: BTreeSet<InvoiceId> = raw
        .into_iter()
        .filter_map(|value| InvoiceId::new(value.as_ref()))
        .collect();
    set.into_iter().collect()
}
