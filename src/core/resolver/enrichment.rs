//! Batch enrichment from the analytical replica
//!
//! One query fetches the documental rows for every discovered invoice. A
//! replica outage is surfaced as a domain error with remediation guidance
//! instead of the raw driver failure.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapters::sql::{SqlGateway, SqlRow, SqlValue};
use crate::domain::{ExportError, InvoiceId, Result};

const BATCH_SQL_HEAD: &str = "\
select f.id, f.cedula, f.condicion_accidentado, f.direccion_ocurrencia, f.fecha_accidente, f.hora_accidente, f.departamento, f.municipio, f.zona, f.estado_aseguramiento, mm.descripcion as marca, f.placa, f.tipo_servicio, a.codigo_tns as codigo_aseguradora, p.numero_poliza, f.vigencia_poliza_desde, f.vigencia_poliza_hasta, pf.codificacion_siras, f.cobro_excedente, f.cod_diagnostico, td.codigo as tipodoc_propietario, f.n_documento_propietario, f.apellido1_propietario, f.apellido2_propietario, f.nombre1_propietario, f.nombre2_propietario, f.direccion_propietario, f.telefono_propietario, f.departamento_propietario, f.municipio_propietario, f.apellido1_conductor, f.apellido2_conductor, f.nombre1_conductor, f.nombre2_conductor, td2.codigo as tipodoc_conductor, f.victima_propietario, f.victima_conductor, f.n_documento_conductor, f.direccion_conductor, f.departamento_conductor, f.municipio_conductor, f.telefono_conductor, a2.placa as placa_amb, f.desde, f.hasta, f.ambulancia_medicalizada, f.descripcion_accidente, m.codigo as cod_municipio, d.codigo as cod_depto, f.zona_traslados, pf.nfactura_tns, pf.creado, a.descripcion,
       pf.inicio as fechaser, pf.fin as fecha_egreso,
       0 as total_facturado, 0 as total
from furips f
left join polizas p on p.id = f.id_poliza
left join polizas_facturas pf on pf.id_furips = f.id
left join aseguradoras a on a.id = p.id_aseguradora
left join tipo_documentos td on td.id = f.tipo_documento_propietario
left join tipo_documentos td2 on td2.id = f.tipo_documento_conductor
left join ambulancias a2 on a2.id = f.idambulancia
left join marca_motos mm on mm.id = f.marca
left join departamentos d on d.id = f.departamento
left join municipios m on m.id = f.municipio
where pf.nfactura_tns in (";

const BATCH_SQL_TAIL: &str = ")\norder by pf.nfactura_tns";

/// Result of the batch enrichment pass.
#[derive(Debug, Default)]
pub struct EnrichmentSet {
    rows: HashMap<String, SqlRow>,
    pub total: usize,
    pub with_data: usize,
    pub missing: Vec<InvoiceId>,
}

impl EnrichmentSet {
    pub fn row_for(&self, invoice: &InvoiceId) -> Option<&SqlRow> {
        self.rows.get(invoice.as_str())
    }
}

/// Fetches documental rows for a batch of invoices in one round trip.
pub struct EnrichmentReconciler {
    analytical: Arc<dyn SqlGateway>,
}

impl EnrichmentReconciler {
    pub fn new(analytical: Arc<dyn SqlGateway>) -> Self {
        EnrichmentReconciler { analytical }
    }

    pub async fn enrich(&self, invoices: &[InvoiceId]) -> Result<EnrichmentSet> {
        if invoices.is_empty() {
            return Ok(EnrichmentSet::default());
        }

        let placeholders = vec!["?"; invoices.len()].join(", ");
        let sql = format!("{BATCH_SQL_HEAD}{placeholders}{BATCH_SQL_TAIL}");
        let params: Vec<SqlValue> = invoices
            .iter()
            .map(|inv| SqlValue::from(inv.as_str()))
            .collect();

        let rows = self
            .analytical
            .query(&sql, &params)
            .await
            .map_err(|err| ExportError::EnrichmentUnavailable(err.to_string()))?;

        let mut set = EnrichmentSet {
            total: invoices.len(),
            ..EnrichmentSet::default()
        };
        // Duplicate rows per invoice can exist when several policies match;
        // the first one in replica order wins.
        for row in rows {
            let key = row.get("NFACTURA_TNS").trim().to_uppercase();
            if key.is_empty() {
                continue;
            }
            set.rows.entry(key).or_insert(row);
        }
        for invoice in invoices {
            if set.rows.contains_key(invoice.as_str()) {
                set.with_data += 1;
            } else {
                set.missing.push(invoice.clone());
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sql::Engine;
    use async_trait::async_trait;

    struct FixedGateway {
        rows: Vec<SqlRow>,
        fail: bool,
    }

    #[async_trait]
    impl SqlGateway for FixedGateway {
        fn engine(&self) -> Engine {
            Engine::MySql
        }

        async fn query(&self, _sql: &str, _params: &[SqlValue]) -> Result<Vec<SqlRow>> {
            if self.fail {
                Err(ExportError::Store("connection refused".into()))
            } else {
                Ok(self.rows.clone())
            }
        }

        async fn execute(&self, _sql: &str, _params: &[SqlValue]) -> Result<u64> {
            Ok(0)
        }
    }

    fn invoice(raw: &str) -> InvoiceId {
        InvoiceId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_partitions_enriched_and_missing() {
        let gateway = Arc::new(FixedGateway {
            rows: vec![SqlRow::from_pairs([
                ("NFACTURA_TNS", "FV001"),
                ("PLACA", "ABC123"),
            ])],
            fail: false,
        });
        let reconciler = EnrichmentReconciler::new(gateway);
        let set = reconciler
            .enrich(&[invoice("FV001"), invoice("FV002")])
            .await
            .unwrap();
        assert_eq!(set.total, 2);
        assert_eq!(set.with_data, 1);
        assert_eq!(set.missing, vec![invoice("FV002")]);
        assert_eq!(set.row_for(&invoice("FV001")).unwrap().get("PLACA"), "ABC123");
        assert!(set.row_for(&invoice("FV002")).is_none());
    }

    #[tokio::test]
    async fn test_first_row_wins_on_duplicates() {
        let gateway = Arc::new(FixedGateway {
            rows: vec![
                SqlRow::from_pairs([("NFACTURA_TNS", "FV001"), ("PLACA", "FIRST")]),
                SqlRow::from_pairs([("NFACTURA_TNS", "FV001"), ("PLACA", "SECOND")]),
            ],
            fail: false,
        });
        let reconciler = EnrichmentReconciler::new(gateway);
        let set = reconciler.enrich(&[invoice("FV001")]).await.unwrap();
        assert_eq!(set.row_for(&invoice("FV001")).unwrap().get("PLACA"), "FIRST");
    }

    #[tokio::test]
    async fn test_outage_becomes_enrichment_unavailable() {
        let gateway = Arc::new(FixedGateway {
            rows: vec![],
            fail: true,
        });
        let reconciler = EnrichmentReconciler::new(gateway);
        let err = reconciler.enrich(&[invoice("FV001")]).await.unwrap_err();
        assert!(matches!(err, ExportError::EnrichmentUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_the_query() {
        let gateway = Arc::new(FixedGateway {
            rows: vec![],
            fail: true,
        });
        let reconciler = EnrichmentReconciler::new(gateway);
        let set = reconciler.enrich(&[]).await.unwrap();
        assert_eq!(set.total, 0);
    }
}
