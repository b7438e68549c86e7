//! End-to-end export pipeline tests against scripted in-memory stores

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use furips::adapters::sql::{Engine, SqlGateway, SqlRow, SqlValue};
use furips::adapters::StoreSet;
use furips::config::StorageConfig;
use furips::core::job::{JobOrchestrator, JobRequest};
use furips::core::mapping::{LINE1_FIELD_COUNT, LINE2_FIELD_COUNT};
use furips::domain::{ExportError, JobStatus, Result};

/// Scripted store that dispatches on the statement text and records every
/// call it receives.
struct FakeStore {
    engine: Engine,
    invoices: Vec<&'static str>,
    batch_rows: Vec<SqlRow>,
    clinical: HashMap<String, SqlRow>,
    fail_queries: bool,
    fail_clinical: bool,
    calls: Mutex<Vec<(String, Vec<SqlValue>)>>,
}

impl FakeStore {
    fn firebird(invoices: Vec<&'static str>, clinical: HashMap<String, SqlRow>) -> Self {
        FakeStore {
            engine: Engine::Firebird,
            invoices,
            batch_rows: vec![],
            clinical,
            fail_queries: false,
            fail_clinical: false,
            calls: Mutex::new(vec![]),
        }
    }

    fn mysql(batch_rows: Vec<SqlRow>) -> Self {
        FakeStore {
            engine: Engine::MySql,
            invoices: vec![],
            batch_rows,
            clinical: HashMap::new(),
            fail_queries: false,
            fail_clinical: false,
            calls: Mutex::new(vec![]),
        }
    }

    fn failing(engine: Engine) -> Self {
        FakeStore {
            engine,
            invoices: vec![],
            batch_rows: vec![],
            clinical: HashMap::new(),
            fail_queries: true,
            fail_clinical: false,
            calls: Mutex::new(vec![]),
        }
    }

    fn clinical_down(mut self) -> Self {
        self.fail_clinical = true;
        self
    }

    fn query_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn executed(&self, fragment: &str) -> Vec<Vec<SqlValue>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(sql, _)| sql.contains(fragment))
            .map(|(_, params)| params.clone())
            .collect()
    }
}

#[async_trait]
impl SqlGateway for FakeStore {
    fn engine(&self) -> Engine {
        self.engine
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        if self.fail_queries {
            return Err(ExportError::Store("store is down".into()));
        }
        if sql.contains("select distinct f.codprefijo||f.numero") {
            return Ok(self
                .invoices
                .iter()
                .map(|inv| SqlRow::from_pairs([("NFACTURA_TNS", *inv)]))
                .collect());
        }
        if sql.contains("from furips f") {
            return Ok(self.batch_rows.clone());
        }
        if self.fail_clinical
            && (sql.contains("from glosas")
                || sql.contains("diagnostico")
                || sql.contains("from factser f"))
        {
            return Err(ExportError::Store("clinical tables unavailable".into()));
        }
        if sql.contains("from glosas") {
            return Ok(vec![]);
        }
        if sql.contains("from aseguradoras") {
            return Ok(vec![SqlRow::from_pairs([(
                "DESCRIPCION",
                "SEGUROS DEL ESTADO",
            )])]);
        }
        if sql.contains("diagnostico") {
            return Ok(vec![]);
        }
        if sql.contains("from factser f") {
            // clinical lookup; the invoice is the only parameter
            let invoice = match params.first() {
                Some(SqlValue::Text(text)) => text.clone(),
                _ => String::new(),
            };
            return Ok(self.clinical.get(&invoice).cloned().into_iter().collect());
        }
        Ok(vec![])
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(1)
    }
}

fn storage(root: &Path) -> StorageConfig {
    StorageConfig {
        work_dir: root.join("work"),
        plan_file: None,
        jobs_dir: root.join("jobs"),
        logs_dir: root.join("logs"),
        sql_dir: root.join("sql"),
        exports_dir: root.join("exports"),
    }
}

fn enriched_row(invoice: &str) -> SqlRow {
    SqlRow::from_pairs([
        ("NFACTURA_TNS", invoice),
        ("CEDULA", "1090123456"),
        ("ESTADO_ASEGURAMIENTO", "ASEGURADO"),
        ("MARCA", "YAMAHA"),
        ("PLACA", "ABC12D"),
        ("TIPO_SERVICIO", "PARTICULAR"),
        ("NUMERO_POLIZA", "P-001"),
        ("VIGENCIA_POLIZA_DESDE", "2024-01-01"),
        ("VIGENCIA_POLIZA_HASTA", "2024-12-31"),
        ("FECHA_ACCIDENTE", "2024-01-03"),
        ("HORA_ACCIDENTE", "14:20:00"),
        ("COD_DEPTO", "54"),
        ("COD_MUNICIPIO", "54001"),
        ("CONDICION_ACCIDENTADO", "CONDUCTOR"),
        ("TOTAL", "250000"),
    ])
}

fn clinical_row() -> SqlRow {
    SqlRow::from_pairs([
        ("APELL1", "GARCIA"),
        ("NOMBRE1", "ANA"),
        ("TIPODOC", "CC"),
        ("FECHANAC", "1992-04-10"),
        ("SEXO", "F"),
        ("COD_MPIO", "54001"),
        ("HORASER", "15:00:00"),
        ("FECHAING", "2024-01-03"),
        ("SERVICIOPRESTADO", "S101-TRASLADO"),
        ("TOTAL", "250000"),
        ("TOTTEP", "1"),
        ("VALOR_DET", "250000"),
    ])
}

struct Harness {
    _root: TempDir,
    storage: StorageConfig,
    primary: Arc<FakeStore>,
    orchestrator: JobOrchestrator,
}

fn harness(primary: FakeStore, analytical: FakeStore) -> Harness {
    let root = TempDir::new().unwrap();
    let storage = storage(root.path());
    let primary = Arc::new(primary);
    let stores = StoreSet {
        primary: primary.clone(),
        snapshot: None,
        analytical: Arc::new(analytical),
    };
    let orchestrator = JobOrchestrator::new(storage.clone(), stores);
    Harness {
        _root: root,
        storage,
        primary,
        orchestrator,
    }
}

fn request() -> JobRequest {
    JobRequest {
        start: "2024-01-01".into(),
        end: "2024-01-07".into(),
        entity_code: "001".into(),
    }
}

fn data_lines(path: &Path) -> Vec<String> {
    let raw = fs::read_to_string(path).unwrap();
    assert!(raw.ends_with("\r\n"));
    raw.split("\r\n")
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_full_export_produces_both_files() {
    let mut clinical = HashMap::new();
    clinical.insert("FV001001".to_string(), clinical_row());
    let h = harness(
        FakeStore::firebird(vec!["FV001001", "FV001002"], clinical),
        FakeStore::mysql(vec![enriched_row("FV001001")]),
    );

    let outcome = h.orchestrator.run(&request()).await.unwrap();

    let record = h
        .orchestrator
        .state_store()
        .load(outcome.job_id.as_str())
        .unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.progress, 100);
    assert_eq!(record.entity_name, "SEGUROS DEL ESTADO");
    assert!(record.finished_at.is_some());

    // both files carry one CRLF-terminated line per invoice, enriched or not
    let suffix = &record.suffix;
    let file1 = h.storage.work_dir.join(format!("FURIPS1{suffix}.txt"));
    let file2 = h.storage.work_dir.join(format!("FURIPS2{suffix}.txt"));
    let lines1 = data_lines(&file1);
    let lines2 = data_lines(&file2);
    assert_eq!(lines1.len(), 2);
    assert_eq!(lines2.len(), 2);
    for line in &lines1 {
        assert_eq!(line.split(',').count(), LINE1_FIELD_COUNT);
    }
    for line in &lines2 {
        assert_eq!(line.split(',').count(), LINE2_FIELD_COUNT);
    }

    // the enriched invoice carries clinical data, the missing one is mapped
    // from a blank row
    assert!(lines1[0].contains("GARCIA"));
    assert!(lines1[0].contains("ABC12D"));
    assert!(lines1[1].starts_with(",,FV001002,"));

    // published copies match the working files
    assert_eq!(outcome.outputs.len(), 2);
    for output in &outcome.outputs {
        let exported = output.exported.as_ref().unwrap();
        assert_eq!(
            fs::read(exported).unwrap(),
            fs::read(output.source.as_ref().unwrap()).unwrap()
        );
    }

    // plan file for the downstream process
    let plan = fs::read_to_string(h.storage.plan_file()).unwrap();
    assert_eq!(plan.trim(), format!("2024-01-01|2024-01-07|001|{suffix}"));

    // SQL transcript exists and identifies the job
    let transcript = fs::read_to_string(&outcome.sql_log).unwrap();
    assert!(transcript.contains(outcome.job_id.as_str()));
    assert!(transcript.contains("[FIREBIRD][QUERY]"));

    // progress counters were pushed to the primary store
    let varios = h.primary.executed("update varios");
    assert!(varios.contains(&vec![SqlValue::Int(2), SqlValue::Text("CANTIDADFURIPS".into())]));
    assert!(varios.contains(&vec![SqlValue::Int(2), SqlValue::Text("CANTIDADSUBIDA".into())]));
}

#[tokio::test]
async fn test_rerun_gets_fresh_job_and_same_content() {
    let h = harness(
        FakeStore::firebird(vec!["FV001001"], HashMap::new()),
        FakeStore::mysql(vec![enriched_row("FV001001")]),
    );

    let first = h.orchestrator.run(&request()).await.unwrap();
    let second = h.orchestrator.run(&request()).await.unwrap();
    assert_ne!(first.job_id, second.job_id);

    let content_first = fs::read(first.outputs[0].exported.as_ref().unwrap()).unwrap();
    let content_second = fs::read(second.outputs[0].exported.as_ref().unwrap()).unwrap();
    assert_eq!(content_first, content_second);
}

#[tokio::test]
async fn test_inverted_range_rejected_before_any_store_access() {
    let h = harness(
        FakeStore::firebird(vec![], HashMap::new()),
        FakeStore::mysql(vec![]),
    );
    let err = h
        .orchestrator
        .run(&JobRequest {
            start: "2024-02-01".into(),
            end: "2024-01-01".into(),
            entity_code: "001".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::InvalidInput(_)));
    assert_eq!(h.primary.query_count(), 0);
}

#[tokio::test]
async fn test_blank_entity_rejected() {
    let h = harness(
        FakeStore::firebird(vec![], HashMap::new()),
        FakeStore::mysql(vec![]),
    );
    let err = h
        .orchestrator
        .run(&JobRequest {
            start: "2024-01-01".into(),
            end: "2024-01-07".into(),
            entity_code: "  ".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::InvalidInput(_)));
}

#[tokio::test]
async fn test_no_invoices_fails_durably() {
    let h = harness(
        FakeStore::firebird(vec![], HashMap::new()),
        FakeStore::mysql(vec![]),
    );
    let err = h.orchestrator.run(&request()).await.unwrap_err();
    assert!(matches!(err, ExportError::NoInvoicesFound));

    let records = h.orchestrator.state_store().list_recent(1).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, JobStatus::Failed);

    // the planned total was reset before aborting
    let varios = h.primary.executed("update varios");
    assert!(varios.contains(&vec![SqlValue::Int(0), SqlValue::Text("CANTIDADFURIPS".into())]));

    // the process log records the abort
    let log_path = records[0].log.as_ref().unwrap();
    let log = fs::read_to_string(log_path).unwrap();
    assert!(log.contains("Process aborted:"));
}

#[tokio::test]
async fn test_replica_outage_fails_with_guidance() {
    let h = harness(
        FakeStore::firebird(vec!["FV001001"], HashMap::new()),
        FakeStore::failing(Engine::MySql),
    );
    let err = h.orchestrator.run(&request()).await.unwrap_err();
    assert!(matches!(err, ExportError::EnrichmentUnavailable(_)));
    assert!(err.to_string().contains("replicated"));

    let records = h.orchestrator.state_store().list_recent(1).unwrap();
    assert_eq!(records[0].status, JobStatus::Failed);
}

#[tokio::test]
async fn test_clinical_store_fault_does_not_abort_the_job() {
    let h = harness(
        FakeStore::firebird(vec!["FV001001"], HashMap::new()).clinical_down(),
        FakeStore::mysql(vec![enriched_row("FV001001")]),
    );

    let outcome = h.orchestrator.run(&request()).await.unwrap();

    let record = h
        .orchestrator
        .state_store()
        .load(outcome.job_id.as_str())
        .unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.progress, 100);

    // the record is mapped from the documental row alone, clinical blank
    let suffix = &record.suffix;
    let lines1 = data_lines(&h.storage.work_dir.join(format!("FURIPS1{suffix}.txt")));
    let lines2 = data_lines(&h.storage.work_dir.join(format!("FURIPS2{suffix}.txt")));
    assert_eq!(lines1.len(), 1);
    assert_eq!(lines2.len(), 1);
    assert_eq!(lines1[0].split(',').count(), LINE1_FIELD_COUNT);
    assert_eq!(lines2[0].split(',').count(), LINE2_FIELD_COUNT);
    assert!(lines1[0].contains("ABC12D"));
}

#[tokio::test]
async fn test_entity_name_falls_back_to_code_when_lookup_fails() {
    let h = harness(
        FakeStore::firebird(vec!["FV001001"], HashMap::new()),
        FakeStore::failing(Engine::MySql),
    );
    // the run fails later at enrichment; the plan-ready record already
    // carries the fallback name
    let _ = h.orchestrator.run(&request()).await.unwrap_err();
    let records = h.orchestrator.state_store().list_recent(1).unwrap();
    assert_eq!(records[0].entity_name, "001");
}
