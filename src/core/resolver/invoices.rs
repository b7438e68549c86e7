//! Invoice discovery against the primary store

use std::sync::Arc;

use crate::adapters::sql::{SqlGateway, SqlValue};
use crate::domain::{normalize_invoice_set, ExportError, InvoiceId, Result};

const DISCOVERY_SQL: &str = "\
select distinct f.codprefijo||f.numero as nfactura_tns
from factser f
inner join usuaxcon us on us.usuaxconid = f.usuaxconid
inner join contrato c on c.contaid = us.contaid
inner join entidad e on e.entid = c.entid
where f.fecha between ? and ?
  and f.codcomp = 'FV'
  and e.codigo = ?
  and f.fecasent is not null
  and f.fecanulada is null
order by 1";

/// Inclusive reporting window, both ends `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    /// Validates shape and ordering before any store is touched.
    pub fn new(start: &str, end: &str) -> Result<Self> {
        let start = start.trim().to_string();
        let end = end.trim().to_string();
        Self::check_date(&start)?;
        Self::check_date(&end)?;
        if start > end {
            return Err(ExportError::InvalidInput(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(DateRange { start, end })
    }

    fn check_date(value: &str) -> Result<()> {
        let well_formed = value.len() == 10
            && value.bytes().enumerate().all(|(i, b)| match i {
                4 | 7 => b == b'-',
                _ => b.is_ascii_digit(),
            });
        if well_formed {
            Ok(())
        } else {
            Err(ExportError::InvalidInput(format!(
                "expected date in YYYY-MM-DD format, got '{value}'"
            )))
        }
    }
}

/// Discovers the settled, non-voided sale invoices of one entity within a
/// date range.
pub struct InvoiceResolver {
    primary: Arc<dyn SqlGateway>,
}

impl InvoiceResolver {
    pub fn new(primary: Arc<dyn SqlGateway>) -> Self {
        InvoiceResolver { primary }
    }

    pub async fn discover(&self, range: &DateRange, entity_code: &str) -> Result<Vec<InvoiceId>> {
        let params = [
            SqlValue::from(range.start.as_str()),
            SqlValue::from(range.end.as_str()),
            SqlValue::from(entity_code),
        ];
        let rows = self.primary.query(DISCOVERY_SQL, &params).await?;
        let raw = rows.iter().map(|row| row.get("NFACTURA_TNS").to_string());
        Ok(normalize_invoice_set(raw))
    }
}
