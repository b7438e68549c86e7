//! Export job orchestration
//!
//! One `run` drives the whole pipeline: validate the request, persist the
//! plan, discover invoices, enrich and map them, write both flat files,
//! publish the copies and record every state transition along the way. Any
//! failure after the job record exists is written back as a durable
//! `failed` state before the error propagates.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, SecondsFormat};
use serde_json::json;
use tracing::{info, warn};

use crate::adapters::sql::{AuditedGateway, SqlAuditLog, SqlGateway, SqlValue};
use crate::adapters::StoreSet;
use crate::config::StorageConfig;
use crate::core::job::progress::{ProgressSink, StatusTableSink};
use crate::core::job::publish::ExportPublisher;
use crate::core::job::state::JobStateStore;
use crate::core::mapping::{self, REPORTING_NIT};
use crate::core::resolver::{ClinicalDataResolver, DateRange, EnrichmentReconciler, InvoiceResolver};
use crate::domain::{
    ExportError, InvoiceId, JobId, JobOutcome, PlanDescriptor, Result,
};

const ENTITY_NAME_SQL: &str =
    "select descripcion from aseguradoras where codigo_tns = ? limit 1";

/// Validated export request.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub start: String,
    pub end: String,
    pub entity_code: String,
}

pub struct JobOrchestrator {
    storage: StorageConfig,
    stores: StoreSet,
    state: JobStateStore,
    progress_override: Option<Arc<dyn ProgressSink>>,
}

impl JobOrchestrator {
    pub fn new(storage: StorageConfig, stores: StoreSet) -> Self {
        let state = JobStateStore::new(storage.jobs_dir.clone());
        JobOrchestrator {
            storage,
            stores,
            state,
            progress_override: None,
        }
    }

    /// Replace the store-backed progress sink, used by headless runs.
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress_override = Some(sink);
        self
    }

    pub fn state_store(&self) -> &JobStateStore {
        &self.state
    }

    pub async fn run(&self, request: &JobRequest) -> Result<JobOutcome> {
        let range = DateRange::new(&request.start, &request.end)?;
        let entity_code = request.entity_code.trim().to_string();
        if entity_code.is_empty() {
            return Err(ExportError::InvalidInput(
                "an entity code is required".into(),
            ));
        }

        self.ensure_directories()?;

        let job_id = JobId::generate();
        let suffix = build_suffix();
        let entity_name = self.resolve_entity_name(&entity_code).await;

        let audit = Arc::new(SqlAuditLog::create(&self.storage.sql_dir, &job_id)?);
        audit.write_header(&job_id, &entity_code, &entity_name, &range.start, &range.end)?;
        let primary: Arc<dyn SqlGateway> =
            Arc::new(AuditedGateway::new(self.stores.primary.clone(), audit.clone()));
        let snapshot: Option<Arc<dyn SqlGateway>> = self.stores.snapshot.clone().map(|s| {
            Arc::new(AuditedGateway::new(s, audit.clone())) as Arc<dyn SqlGateway>
        });
        let analytical: Arc<dyn SqlGateway> =
            Arc::new(AuditedGateway::new(self.stores.analytical.clone(), audit.clone()));

        let plan = self.write_plan(&range, &entity_code, &suffix)?;

        self.state.apply(
            &job_id,
            json!({
                "job_id": job_id.as_str(),
                "start_date": &range.start,
                "end_date": &range.end,
                "entity_code": &entity_code,
                "entity_name": &entity_name,
                "suffix": &suffix,
                "sql_log": audit.path(),
                "plan": &plan,
                "status": "plan-ready",
                "progress": 20,
                "message": "Plan ready to generate FURIPS files.",
                "created_at": now_stamp(),
            }),
        )?;

        let log_path = self.storage.logs_dir.join(format!("{job_id}.log"));
        let mut log = ProcessLog::create(&log_path)?;
        log.line(&format!("Plan generated: {}", plan.content))?;

        self.state.apply(
            &job_id,
            json!({
                "status": "running",
                "progress": 40,
                "message": "Querying stores and generating files.",
                "log": &log_path,
            }),
        )?;

        info!(job_id = %job_id, entity = %entity_code, start = %range.start, end = %range.end, "export job started");

        let generated = self
            .generate(&range, &entity_code, &suffix, primary, snapshot, analytical, &mut log)
            .await;
        let files = match generated {
            Ok(files) => {
                log.line("Process complete.")?;
                files
            }
            Err(err) => {
                let _ = log.line(&format!("Process aborted: {err}"));
                self.state.apply(
                    &job_id,
                    json!({
                        "status": "failed",
                        "message": err.to_string(),
                        "finished_at": now_stamp(),
                    }),
                )?;
                return Err(err);
            }
        };

        self.state.apply(
            &job_id,
            json!({"progress": 70, "message": "Files generated."}),
        )?;

        let publisher = ExportPublisher::new(self.storage.exports_dir.clone());
        let outputs = publisher.publish(&job_id, &suffix, &files)?;

        self.state.apply(
            &job_id,
            json!({
                "status": "completed",
                "progress": 100,
                "message": "FURIPS files generated.",
                "outputs": &outputs,
                "finished_at": now_stamp(),
            }),
        )?;

        info!(job_id = %job_id, outputs = outputs.len(), "export job completed");

        Ok(JobOutcome {
            job_id,
            plan,
            outputs,
            log: log_path,
            sql_log: audit.path().to_path_buf(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn generate(
        &self,
        range: &DateRange,
        entity_code: &str,
        suffix: &str,
        primary: Arc<dyn SqlGateway>,
        snapshot: Option<Arc<dyn SqlGateway>>,
        analytical: Arc<dyn SqlGateway>,
        log: &mut ProcessLog,
    ) -> Result<Vec<PathBuf>> {
        let progress: Arc<dyn ProgressSink> = match &self.progress_override {
            Some(sink) => sink.clone(),
            None => Arc::new(StatusTableSink::new(primary.clone())),
        };

        let invoices = InvoiceResolver::new(primary.clone())
            .discover(range, entity_code)
            .await?;
        if invoices.is_empty() {
            progress.planned_total(0).await?;
            log.line("No invoices found in the primary store for the requested range/entity.")?;
            return Err(ExportError::NoInvoicesFound);
        }

        let enrichment = EnrichmentReconciler::new(analytical)
            .enrich(&invoices)
            .await?;
        progress.planned_total(enrichment.total).await?;
        if !enrichment.missing.is_empty() {
            warn!(
                missing = enrichment.missing.len(),
                total = enrichment.total,
                "invoices without replica data will be generated blank"
            );
        }
        log.line(&format!(
            "Invoices discovered: {}; enriched from replica: {}; missing in replica (generated blank): {}",
            enrichment.total,
            enrichment.with_data,
            enrichment.missing.len()
        ))?;

        let mut chain: Vec<Arc<dyn SqlGateway>> = vec![primary];
        if let Some(snapshot) = snapshot {
            chain.push(snapshot);
        }
        let clinical = ClinicalDataResolver::new(chain);

        let file1 = self.storage.work_dir.join(format!("FURIPS1{suffix}.txt"));
        let file2 = self.storage.work_dir.join(format!("FURIPS2{suffix}.txt"));
        let mut out1 = File::create(&file1)?;
        let mut out2 = File::create(&file2)?;

        let total = invoices.len();
        for (offset, invoice) in invoices.iter().enumerate() {
            let count = offset + 1;
            progress.processed(count).await?;
            log.line(&format!("Processing record {count}/{total} ({invoice})", invoice = invoice.as_str()))?;

            let row = self.prepare_row(invoice, &enrichment, entity_code);
            let record = clinical.resolve(invoice, row.get("CEDULA")).await;
            let glosa = clinical.glosa(invoice).await;

            let lines = mapping::build_lines(invoice, &row, record.as_ref(), &glosa)?;
            out1.write_all(lines.line1.as_bytes())?;
            out1.write_all(b"\r\n")?;
            out2.write_all(lines.line2.as_bytes())?;
            out2.write_all(b"\r\n")?;
        }
        out1.flush()?;
        out2.flush()?;

        Ok(vec![file1, file2])
    }

    /// The documental row for one invoice, or a blank row when the replica
    /// has none. The invoice key always wins and a blank insurer code falls
    /// back to the requested entity.
    fn prepare_row(
        &self,
        invoice: &InvoiceId,
        enrichment: &crate::core::resolver::EnrichmentSet,
        entity_code: &str,
    ) -> crate::adapters::sql::SqlRow {
        let mut row = enrichment.row_for(invoice).cloned().unwrap_or_default();
        row.insert("NFACTURA_TNS", invoice.as_str());
        if row.get("CODIGO_ASEGURADORA").is_empty() {
            row.insert("CODIGO_ASEGURADORA", entity_code);
        }
        row
    }

    async fn resolve_entity_name(&self, entity_code: &str) -> String {
        let params = [SqlValue::from(entity_code)];
        match self.stores.analytical.query(ENTITY_NAME_SQL, &params).await {
            Ok(rows) => rows
                .first()
                .and_then(|row| row.get_non_empty("DESCRIPCION"))
                .map(|name| name.trim().to_string())
                .unwrap_or_else(|| entity_code.to_string()),
            Err(err) => {
                warn!(entity = entity_code, error = %err, "entity name lookup failed, using the code");
                entity_code.to_string()
            }
        }
    }

    fn write_plan(
        &self,
        range: &DateRange,
        entity_code: &str,
        suffix: &str,
    ) -> Result<PlanDescriptor> {
        let path = self.storage.plan_file();
        let content = format!("{}|{}|{}|{}", range.start, range.end, entity_code, suffix);
        fs::write(&path, format!("{content}\n"))?;
        Ok(PlanDescriptor { path, content })
    }

    fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.storage.work_dir)?;
        fs::create_dir_all(&self.storage.jobs_dir)?;
        fs::create_dir_all(&self.storage.logs_dir)?;
        fs::create_dir_all(&self.storage.sql_dir)?;
        fs::create_dir_all(&self.storage.exports_dir)?;
        if let Some(parent) = self.storage.plan_file().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// File-name suffix shared by the plan and both output files:
/// reporting NIT plus the run date as `%d%m%Y`.
pub fn build_suffix() -> String {
    format!("{REPORTING_NIT}{}", Local::now().format("%d%m%Y"))
}

fn now_stamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Line-oriented per-job process log, readable while the job runs.
struct ProcessLog {
    file: File,
}

impl ProcessLog {
    fn create(path: &std::path::Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(ProcessLog { file })
    }

    fn line(&mut self, text: &str) -> Result<()> {
        self.file.write_all(text.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        Ok(())
    }
}
