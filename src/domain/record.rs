//! Per-invoice enrichment records
//!
//! [`ClinicalRecord`] holds the demographic/clinical block resolved from the
//! legacy stores. At most one source produces it; when no source has the
//! invoice the record is simply absent, which is a valid outcome, not an
//! error.

use serde::Serialize;

/// Demographic and clinical enrichment for one invoice.
///
/// All fields are already rendered as output-ready strings (dates in
/// `dd/mm/yyyy`, times in `HH:MM`); blank means the source had no value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClinicalRecord {
    pub surname1: String,
    pub surname2: String,
    pub given_name1: String,
    pub given_name2: String,
    pub document_type: String,
    pub document: String,
    pub birth_date: String,
    pub sex: String,
    pub phone: String,
    pub address: String,
    /// Two-character department prefix decomposed from the locality code
    pub department: String,
    /// Three-character municipality suffix decomposed from the locality code
    pub municipality: String,
    pub admission_date: String,
    pub admission_time: String,
    pub discharge_date: String,
    pub discharge_time: String,
    pub physician_surnames: String,
    pub physician_given_names: String,
    pub physician_document: String,
    pub physician_registry: String,
    /// Rendered as `code-description` by the source query
    pub service: String,
    pub total: String,
    pub service_quantity: String,
    pub unit_value: String,
    pub diagnosis_code: String,
}

/// Glosa (billing objection) reference attached to an invoice, resolved from
/// the primary store. Both parts blank when the invoice has none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlosaRef {
    pub number: String,
    pub response: String,
}

impl GlosaRef {
    /// Parse the store's packed `number|response` representation.
    pub fn from_packed(packed: &str) -> Self {
        let mut parts = packed.splitn(2, '|');
        GlosaRef {
            number: parts.next().unwrap_or("").to_string(),
            response: parts.next().unwrap_or("").to_string(),
        }
    }
}
