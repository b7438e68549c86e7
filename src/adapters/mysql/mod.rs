//! Analytical store gateway (MySQL)
//!
//! Stateless: every call opens a fresh connection, runs one prepared
//! statement and disconnects. Volume is one batch query per job plus a
//! handful of small lookups, so per-call connection overhead is acceptable
//! and keeps resource usage bounded.

use crate::adapters::sql::traits::{Engine, SqlGateway, SqlRow, SqlValue};
use crate::config::MySqlConfig;
use crate::domain::{ExportError, Result};
use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, OptsBuilder, Params, Row, Value};
use secrecy::ExposeSecret;

/// Gateway to the replicated documental database
pub struct MySqlGateway {
    opts: Opts,
}

impl MySqlGateway {
    pub fn new(config: &MySqlConfig) -> Self {
        let builder = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port)
            .db_name(Some(config.database.clone()))
            .user(Some(config.user.clone()))
            .pass(Some(config.password.expose_secret().as_ref().to_string()));
        MySqlGateway {
            opts: Opts::from(builder),
        }
    }

    async fn connect(&self) -> Result<Conn> {
        Conn::new(self.opts.clone())
            .await
            .map_err(|e| ExportError::Store(format!("MySQL connection failed: {e}")))
    }
}

#[async_trait]
impl SqlGateway for MySqlGateway {
    fn engine(&self) -> Engine {
        Engine::MySql
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>> {
        let mut conn = self.connect().await?;
        let rows: Vec<Row> = conn
            .exec(sql, to_params(params))
            .await
            .map_err(|e| ExportError::Store(format!("MySQL query failed: {e}")))?;
        let result = rows.iter().map(convert_row).collect();
        let _ = conn.disconnect().await;
        Ok(result)
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let mut conn = self.connect().await?;
        conn.exec_drop(sql, to_params(params))
            .await
            .map_err(|e| ExportError::Store(format!("MySQL statement failed: {e}")))?;
        let affected = conn.affected_rows();
        let _ = conn.disconnect().await;
        Ok(affected)
    }
}

fn to_params(params: &[SqlValue]) -> Params {
    if params.is_empty() {
        return Params::Empty;
    }
    let values = params
        .iter()
        .map(|p| match p {
            SqlValue::Text(s) => Value::Bytes(s.clone().into_bytes()),
            SqlValue::Int(i) => Value::Int(*i),
        })
        .collect();
    Params::Positional(values)
}

fn convert_row(row: &Row) -> SqlRow {
    let mut out = SqlRow::new();
    for (index, column) in row.columns_ref().iter().enumerate() {
        let rendered = row.as_ref(index).map(render_value).unwrap_or_default();
        out.insert(&column.name_str(), rendered);
    }
    out
}

/// Render a MySQL value the way the mapping layer expects: plain text,
/// timestamps in ISO order so the first ten characters are the date.
fn render_value(value: &Value) -> String {
    match value {
        Value::NULL => String::new(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Date(year, month, day, hour, minute, second, _micros) => format!(
            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
        ),
        Value::Time(negative, days, hours, minutes, seconds, _micros) => {
            let sign = if *negative { "-" } else { "" };
            let total_hours = u32::from(*hours) + days * 24;
            format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_date_leads_with_iso_date() {
        let rendered = render_value(&Value::Date(2024, 1, 7, 0, 0, 0, 0));
        assert_eq!(&rendered[..10], "2024-01-07");
    }

    #[test]
    fn test_render_time_is_clock_shaped() {
        assert_eq!(render_value(&Value::Time(false, 0, 8, 10, 0, 0)), "08:10:00");
    }

    #[test]
    fn test_render_null_is_blank() {
        assert_eq!(render_value(&Value::NULL), "");
    }

    #[test]
    fn test_empty_params_use_empty_marker() {
        assert!(matches!(to_params(&[]), Params::Empty));
    }

    #[test]
    fn test_positional_params_preserve_order() {
        let params = to_params(&[SqlValue::from("FV1"), SqlValue::from(2i64)]);
        match params {
            Params::Positional(values) => {
                assert_eq!(values.len(), 2);
                assert!(matches!(values[1], Value::Int(2)));
            }
            _ => panic!("expected positional params"),
        }
    }
}
