//! Store-facing resolution stages of the pipeline

pub mod clinical;
pub mod enrichment;
pub mod invoices;

pub use clinical::ClinicalDataResolver;
pub use enrichment::{EnrichmentReconciler, EnrichmentSet};
pub use invoices::{DateRange, InvoiceResolver};
