// Furips - FURIPS claim batch export tool
// Licensed under the MIT License

//! # Furips - accident-insurance claim batch export
//!
//! Generates the two comma-delimited FURIPS flat files an IPS submits for
//! traffic-accident insurance claims, reconciling three stores:
//!
//! - **Primary** (Firebird): the live legacy transactional system, the
//!   source of truth for which invoices exist in a reporting window.
//! - **Analytical** (MySQL): a replicated documental database carrying the
//!   accident, vehicle, policy and person detail per invoice.
//! - **Snapshot** (Firebird, optional): a frozen previous instance of the
//!   legacy schema, used as a clinical fallback for historical invoices.
//!
//! One export run is a job: it discovers invoices, enriches them in batch,
//! completes clinical detail per invoice, maps every invoice into a
//! 102-field and a 9-field line, writes both files with CRLF line endings
//! and publishes per-job copies for download. Every store statement issued
//! on behalf of a job is appended to a per-job SQL transcript.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (resolution, mapping, job orchestration)
//! - [`adapters`] - Store gateways (Firebird, MySQL) and SQL auditing
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use furips::adapters::build_stores;
//! use furips::config::load_config;
//! use furips::core::job::{JobOrchestrator, JobRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("furips.toml")?;
//!     let stores = build_stores(&config)?;
//!     let orchestrator = JobOrchestrator::new(config.storage.clone(), stores);
//!
//!     let outcome = orchestrator
//!         .run(&JobRequest {
//!             start: "2024-01-01".into(),
//!             end: "2024-01-07".into(),
//!             entity_code: "001".into(),
//!         })
//!         .await?;
//!
//!     println!("published {} outputs", outcome.outputs.len());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
