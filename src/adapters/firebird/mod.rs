//! Legacy store gateway (Firebird)
//!
//! Serves both legacy instances: the live primary database and the frozen
//! previous snapshot (same schema, different file). The driver speaks the
//! wire protocol directly (rsfbclient pure-Rust mode), no client library
//! required. Like the MySQL gateway, every call is one connection, one
//! statement.
//!
//! The driver is synchronous; calls run on the blocking pool.

use crate::adapters::sql::traits::{Engine, SqlGateway, SqlRow, SqlValue};
use crate::config::FirebirdConfig;
use crate::domain::{ExportError, Result};
use async_trait::async_trait;
use rsfbclient::{Execute, Queryable, Row, SqlType};
use secrecy::ExposeSecret;

/// Gateway to one Firebird instance
pub struct FirebirdGateway {
    config: FirebirdConfig,
}

impl FirebirdGateway {
    pub fn new(config: FirebirdConfig) -> Self {
        FirebirdGateway { config }
    }
}

fn connect(
    config: &FirebirdConfig,
) -> std::result::Result<impl Queryable + Execute, rsfbclient::FbError> {
    rsfbclient::builder_pure_rust()
        .host(&config.host)
        .port(config.port)
        .db_name(&config.path)
        .user(&config.user)
        .pass(config.password.expose_secret().as_ref())
        .connect()
}

fn to_driver_params(params: &[SqlValue]) -> Vec<SqlType> {
    params
        .iter()
        .map(|p| match p {
            SqlValue::Text(s) => SqlType::Text(s.clone()),
            SqlValue::Int(i) => SqlType::Integer(*i),
        })
        .collect()
}

fn convert_row(row: Row) -> SqlRow {
    let mut out = SqlRow::new();
    for column in row.fields {
        let rendered = render_value(&column.value);
        out.insert(&column.name, rendered);
    }
    out
}

fn render_value(value: &SqlType) -> String {
    match value {
        SqlType::Text(s) => s.clone(),
        SqlType::Integer(i) => i.to_string(),
        SqlType::Floating(f) => f.to_string(),
        SqlType::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        SqlType::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        SqlType::Boolean(b) => {
            if *b {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        SqlType::Null => String::new(),
    }
}

#[async_trait]
impl SqlGateway for FirebirdGateway {
    fn engine(&self) -> Engine {
        Engine::Firebird
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>> {
        let config = self.config.clone();
        let sql = sql.to_string();
        let driver_params = to_driver_params(params);
        tokio::task::spawn_blocking(move || {
            let mut conn = connect(&config)
                .map_err(|e| ExportError::Store(format!("Firebird connection failed: {e}")))?;
            let rows: Vec<Row> = conn
                .query(&sql, driver_params)
                .map_err(|e| ExportError::Store(format!("Firebird query failed: {e}")))?;
            Ok(rows.into_iter().map(convert_row).collect())
        })
        .await
        .map_err(|e| ExportError::Store(format!("Firebird task failed: {e}")))?
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let config = self.config.clone();
        let sql = sql.to_string();
        let driver_params = to_driver_params(params);
        tokio::task::spawn_blocking(move || {
            let mut conn = connect(&config)
                .map_err(|e| ExportError::Store(format!("Firebird connection failed: {e}")))?;
            conn.execute(&sql, driver_params)
                .map_err(|e| ExportError::Store(format!("Firebird statement failed: {e}")))?;
            Ok(0u64)
        })
        .await
        .map_err(|e| ExportError::Store(format!("Firebird task failed: {e}")))?
    }
}
