//! Core domain types for the FURIPS export pipeline

pub mod errors;
pub mod invoice;
pub mod job;
pub mod record;
pub mod result;

pub use errors::ExportError;
pub use invoice::{normalize_invoice_set, InvoiceId};
pub use job::{JobId, JobOutcome, JobRecord, JobStatus, Output, PlanDescriptor};
pub use record::{ClinicalRecord, GlosaRef};
pub use result::Result;
