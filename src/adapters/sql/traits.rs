//! Store gateway abstraction
//!
//! Every store client is a stateless query/execute gateway: each call opens a
//! fresh connection, runs one parameterized statement and closes the
//! connection again. The pipeline only ever sees this trait, which keeps the
//! reconciliation core independent of the concrete drivers (and lets tests
//! substitute in-memory stores).

use crate::domain::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Engine tag carried into the SQL audit transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Firebird,
    MySql,
}

impl Engine {
    pub fn tag(&self) -> &'static str {
        match self {
            Engine::Firebird => "FIREBIRD",
            Engine::MySql => "MYSQL",
        }
    }
}

/// Operation tag carried into the SQL audit transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    Execute,
}

impl Operation {
    pub fn tag(&self) -> &'static str {
        match self {
            Operation::Query => "QUERY",
            Operation::Execute => "EXECUTE",
        }
    }
}

/// Statement parameter. Values are always bound, never spliced into the
/// statement text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
}

impl SqlValue {
    /// Rendering used by the audit transcript only.
    pub fn render(&self) -> String {
        match self {
            SqlValue::Text(s) => format!("'{s}'"),
            SqlValue::Int(i) => i.to_string(),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

/// One result row with column names canonicalized to upper case.
///
/// The legacy schemas disagree on identifier casing between engines; every
/// adapter folds names on the way in so the mapping layer can address columns
/// by a single canonical spelling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlRow {
    columns: HashMap<String, String>,
}

impl SqlRow {
    pub fn new() -> Self {
        SqlRow::default()
    }

    /// Insert a column value; the name is upper-cased.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.columns.insert(name.to_uppercase(), value.into());
    }

    /// Column value, or `""` when the column is absent.
    pub fn get(&self, name: &str) -> &str {
        self.columns
            .get(&name.to_uppercase())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Column value when present and non-empty.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        let value = self.get(name);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Convenience constructor used by tests and fixtures.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut row = SqlRow::new();
        for (name, value) in pairs {
            row.insert(name, value);
        }
        row
    }
}

/// Stateless gateway to one relational store.
#[async_trait]
pub trait SqlGateway: Send + Sync {
    /// The engine behind this gateway, used for audit tagging.
    fn engine(&self) -> Engine;

    /// Run a parameterized select and collect all rows.
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>>;

    /// Run a parameterized statement that returns no rows.
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64>;
}
