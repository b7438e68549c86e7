//! Per-invoice clinical fallback
//!
//! Invoices whose documental row lacks clinical detail are completed from
//! the primary store, then from the frozen snapshot of the previous core
//! system. The stores are tried in order; the first one that knows the
//! invoice wins. A lookup failure of any kind leaves the record empty and
//! lets the export continue.

use std::sync::Arc;

use tracing::warn;

use crate::adapters::sql::{SqlGateway, SqlRow, SqlValue};
use crate::core::mapping::normalize::{
    clock_prefix, department_prefix, format_date, municipality_suffix, shift_discharge_time,
};
use crate::domain::{ClinicalRecord, GlosaRef, InvoiceId};

const CLINICAL_SQL: &str = "\
select
    f.codprefijo||f.numero as numero_tns,
    u.fechanac,
    u.tipodoc,
    u.sexo,
    u.telefono,
    u.direccion,
    u.apell1,
    u.apell2,
    u.nombre1,
    u.nombre2,
    m.codigo as cod_mpio,
    f.hora as horaser,
    f.fechaing,
    f.fechaegreso,
    p.nombre as nombre_medico,
    p.apellidos as apellidos_medico,
    p.cedula as doc_medico,
    p.regprof,
    s.codigo||'-'||s.descripcion as servicioprestado,
    cast(f.total as int) as total,
    SUM(df.cantidad) AS tottep,
    (f.total/SUM(df.cantidad)) as valor_det
from factser f
inner join usuaxcon us on us.usuaxconid=f.usuaxconid
inner join contrato c on c.contaid=us.contaid
inner join entidad e on e.entid=c.entid
inner join defactser df on df.factserid=f.factserid
inner join servicio s on s.servicioid=df.servicioid
inner join usuahosp u on u.usuahosid = us.usuahosid
inner join municipio m on m.munid=u.munid
inner join profesional p on p.profid=df.profrem
inner join departamento de on de.depaid=m.depaid
where f.codprefijo||f.numero = ?
group by f.codprefijo, f.numero, u.fechanac, u.tipodoc, u.sexo, u.telefono, u.direccion, u.apell1, u.apell2, u.nombre1, u.nombre2, m.codigo, f.hora, f.fechaing, f.fechaegreso, p.nombre, p.apellidos, p.cedula, p.regprof, s.codigo, s.descripcion, f.total";

/// Principal diagnosis lives behind either the procedures or the
/// consultations RIPS table depending on how the invoice was captured.
const DIAGNOSIS_SQL: [&str; 2] = [
    "select d.codigo from diagnostico d inner join ripproc r on r.diagp=d.diagid inner join defactser df on df.autorizacion=r.codcomp||r.codprefijo||r.numfact inner join factser f on f.factserid=df.factserid where f.codprefijo||f.numero = ?",
    "select d.codigo from diagnostico d inner join ripconsul r on r.diagp=d.diagid inner join defactser df on df.autorizacion=r.codcomp||r.codprefijo||r.numfact inner join factser f on f.factserid=df.factserid where f.codprefijo||f.numero = ?",
];

const GLOSA_SQL: &str = "select numero from glosas where fv = ?";

pub struct ClinicalDataResolver {
    gateways: Vec<Arc<dyn SqlGateway>>,
}

impl ClinicalDataResolver {
    /// `gateways` is the fallback chain in priority order.
    pub fn new(gateways: Vec<Arc<dyn SqlGateway>>) -> Self {
        ClinicalDataResolver { gateways }
    }

    /// Looks the invoice up across the chain. `None` means no store knows
    /// it. Lookup failures never bubble up: an unreachable store is skipped
    /// with a warning and a fully unreachable chain resolves to `None`, so
    /// the record is mapped from the documental row alone.
    pub async fn resolve(
        &self,
        invoice: &InvoiceId,
        victim_document: &str,
    ) -> Option<ClinicalRecord> {
        let params = [SqlValue::from(invoice.as_str())];
        for gateway in &self.gateways {
            let rows = match gateway.query(CLINICAL_SQL, &params).await {
                Ok(rows) => rows,
                Err(err) => {
                    warn!(invoice = invoice.as_str(), error = %err, "clinical store unreachable, trying next");
                    continue;
                }
            };
            if let Some(row) = rows.first() {
                let diagnosis = self.find_diagnosis(gateway.as_ref(), invoice).await;
                return Some(build_record(row, victim_document, diagnosis));
            }
        }
        None
    }

    async fn find_diagnosis(&self, gateway: &dyn SqlGateway, invoice: &InvoiceId) -> String {
        let params = [SqlValue::from(invoice.as_str())];
        for sql in DIAGNOSIS_SQL {
            let rows = match gateway.query(sql, &params).await {
                Ok(rows) => rows,
                Err(err) => {
                    warn!(invoice = invoice.as_str(), error = %err, "diagnosis lookup failed, leaving the code blank");
                    continue;
                }
            };
            if let Some(code) = rows.first().and_then(|row| row.get_non_empty("CODIGO")) {
                return code.to_string();
            }
        }
        String::new()
    }

    /// Glosa references live only in the primary store. An unknown invoice,
    /// like a failed lookup, yields the empty reference.
    pub async fn glosa(&self, invoice: &InvoiceId) -> GlosaRef {
        let Some(primary) = self.gateways.first() else {
            return GlosaRef::default();
        };
        let key = format!("FV{}", invoice.as_str());
        let rows = match primary.query(GLOSA_SQL, &[SqlValue::from(key.as_str())]).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(invoice = invoice.as_str(), error = %err, "glosa lookup failed, leaving the reference empty");
                return GlosaRef::default();
            }
        };
        rows.first()
            .and_then(|row| row.get_non_empty("NUMERO"))
            .map(GlosaRef::from_packed)
            .unwrap_or_default()
    }
}

fn build_record(row: &SqlRow, victim_document: &str, diagnosis: String) -> ClinicalRecord {
    let locality = row.get("COD_MPIO");
    let admission_time = clock_prefix(row.get("HORASER"));
    let admission_date = format_date(row.get("FECHAING"));
    let discharge_date = match format_date(row.get("FECHAEGRESO")) {
        date if date.is_empty() => admission_date.clone(),
        date => date,
    };
    ClinicalRecord {
        surname1: row.get("APELL1").to_string(),
        surname2: row.get("APELL2").to_string(),
        given_name1: row.get("NOMBRE1").to_string(),
        given_name2: row.get("NOMBRE2").to_string(),
        document_type: row.get("TIPODOC").to_string(),
        document: victim_document.to_string(),
        birth_date: format_date(row.get("FECHANAC")),
        sex: row.get("SEXO").to_string(),
        phone: row.get("TELEFONO").to_string(),
        address: row.get("DIRECCION").to_string(),
        department: department_prefix(locality),
        municipality: municipality_suffix(locality),
        discharge_time: shift_discharge_time(&admission_time),
        admission_time,
        admission_date,
        discharge_date,
        physician_surnames: row.get("APELLIDOS_MEDICO").to_string(),
        physician_given_names: row.get("NOMBRE_MEDICO").to_string(),
        physician_document: row.get("DOC_MEDICO").to_string(),
        physician_registry: row.get("REGPROF").to_string(),
        service: row.get("SERVICIOPRESTADO").to_string(),
        total: row
            .get_non_empty("TOTAL")
            .unwrap_or("0")
            .to_string(),
        service_quantity: row
            .get_non_empty("TOTTEP")
            .unwrap_or("1")
            .to_string(),
        unit_value: row.get("VALOR_DET").to_string(),
        diagnosis_code: diagnosis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sql::Engine;
    use crate::domain::{ExportError, Result};
    use async_trait::async_trait;

    struct ScriptedGateway {
        clinical: Vec<SqlRow>,
        diagnosis: Vec<SqlRow>,
        glosa: Vec<SqlRow>,
        down: bool,
        diagnosis_down: bool,
    }

    impl ScriptedGateway {
        fn empty() -> Self {
            ScriptedGateway {
                clinical: vec![],
                diagnosis: vec![],
                glosa: vec![],
                down: false,
                diagnosis_down: false,
            }
        }

        fn down() -> Self {
            ScriptedGateway {
                down: true,
                ..ScriptedGateway::empty()
            }
        }
    }

    #[async_trait]
    impl SqlGateway for ScriptedGateway {
        fn engine(&self) -> Engine {
            Engine::Firebird
        }

        async fn query(&self, sql: &str, _params: &[SqlValue]) -> Result<Vec<SqlRow>> {
            if self.down {
                return Err(ExportError::Store("no route to host".into()));
            }
            if sql.contains("from glosas") {
                Ok(self.glosa.clone())
            } else if sql.contains("diagnostico") {
                if self.diagnosis_down {
                    return Err(ExportError::Store("rips tables unavailable".into()));
                }
                Ok(self.diagnosis.clone())
            } else {
                Ok(self.clinical.clone())
            }
        }

        async fn execute(&self, _sql: &str, _params: &[SqlValue]) -> Result<u64> {
            Ok(0)
        }
    }

    fn invoice() -> InvoiceId {
        InvoiceId::new("FV000042").unwrap()
    }

    fn clinical_row() -> SqlRow {
        SqlRow::from_pairs([
            ("APELL1", "PEREZ"),
            ("NOMBRE1", "JUAN"),
            ("TIPODOC", "CC"),
            ("FECHANAC", "1990-06-15"),
            ("SEXO", "M"),
            ("COD_MPIO", "54001"),
            ("HORASER", "08:30:00"),
            ("FECHAING", "2024-01-05"),
            ("SERVICIOPRESTADO", "S101-TRANSFER"),
            ("TOTAL", "150000"),
            ("TOTTEP", "3"),
            ("VALOR_DET", "50000"),
        ])
    }

    #[tokio::test]
    async fn test_record_built_from_primary() {
        let primary = Arc::new(ScriptedGateway {
            clinical: vec![clinical_row()],
            diagnosis: vec![SqlRow::from_pairs([("CODIGO", "S099")])],
            ..ScriptedGateway::empty()
        });
        let resolver = ClinicalDataResolver::new(vec![primary]);
        let record = resolver.resolve(&invoice(), "123").await.unwrap();
        assert_eq!(record.surname1, "PEREZ");
        assert_eq!(record.document, "123");
        assert_eq!(record.birth_date, "15/06/1990");
        assert_eq!(record.department, "54");
        assert_eq!(record.municipality, "001");
        assert_eq!(record.admission_time, "08:30");
        assert_eq!(record.discharge_time, "09:00");
        assert_eq!(record.discharge_date, "05/01/2024");
        assert_eq!(record.diagnosis_code, "S099");
    }

    #[tokio::test]
    async fn test_falls_back_to_snapshot_when_primary_has_no_row() {
        let primary = Arc::new(ScriptedGateway::empty());
        let snapshot = Arc::new(ScriptedGateway {
            clinical: vec![clinical_row()],
            ..ScriptedGateway::empty()
        });
        let resolver = ClinicalDataResolver::new(vec![primary, snapshot]);
        let record = resolver.resolve(&invoice(), "123").await;
        assert!(record.is_some());
    }

    #[tokio::test]
    async fn test_unreachable_primary_is_skipped() {
        let primary = Arc::new(ScriptedGateway::down());
        let snapshot = Arc::new(ScriptedGateway {
            clinical: vec![clinical_row()],
            ..ScriptedGateway::empty()
        });
        let resolver = ClinicalDataResolver::new(vec![primary, snapshot]);
        let record = resolver.resolve(&invoice(), "123").await;
        assert!(record.is_some());
    }

    #[tokio::test]
    async fn test_whole_chain_down_resolves_to_none() {
        let resolver = ClinicalDataResolver::new(vec![
            Arc::new(ScriptedGateway::down()) as Arc<dyn SqlGateway>,
            Arc::new(ScriptedGateway::down()),
        ]);
        assert!(resolver.resolve(&invoice(), "123").await.is_none());
    }

    #[tokio::test]
    async fn test_diagnosis_failure_leaves_code_blank() {
        let primary = Arc::new(ScriptedGateway {
            clinical: vec![clinical_row()],
            diagnosis_down: true,
            ..ScriptedGateway::empty()
        });
        let resolver = ClinicalDataResolver::new(vec![primary]);
        let record = resolver.resolve(&invoice(), "123").await.unwrap();
        assert_eq!(record.surname1, "PEREZ");
        assert_eq!(record.diagnosis_code, "");
    }

    #[tokio::test]
    async fn test_unknown_invoice_resolves_to_none() {
        let resolver =
            ClinicalDataResolver::new(vec![Arc::new(ScriptedGateway::empty()) as Arc<dyn SqlGateway>]);
        assert!(resolver.resolve(&invoice(), "123").await.is_none());
    }

    #[tokio::test]
    async fn test_glosa_unpacks_number_and_response() {
        let primary = Arc::new(ScriptedGateway {
            glosa: vec![SqlRow::from_pairs([("NUMERO", "G-12|ACCEPTED")])],
            ..ScriptedGateway::empty()
        });
        let resolver = ClinicalDataResolver::new(vec![primary]);
        let glosa = resolver.glosa(&invoice()).await;
        assert_eq!(glosa.number, "G-12");
        assert_eq!(glosa.response, "ACCEPTED");
    }

    #[tokio::test]
    async fn test_missing_glosa_is_empty() {
        let resolver =
            ClinicalDataResolver::new(vec![Arc::new(ScriptedGateway::empty()) as Arc<dyn SqlGateway>]);
        let glosa = resolver.glosa(&invoice()).await;
        assert_eq!(glosa, GlosaRef::default());
    }

    #[tokio::test]
    async fn test_glosa_store_failure_is_empty() {
        let resolver =
            ClinicalDataResolver::new(vec![Arc::new(ScriptedGateway::down()) as Arc<dyn SqlGateway>]);
        let glosa = resolver.glosa(&invoice()).await;
        assert_eq!(glosa, GlosaRef::default());
    }
}
