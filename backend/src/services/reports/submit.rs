//! # Report Submission Service
//!
//! `POST /api/reports/submit` receives one form submission and produces its
//! report in the background:
//!
//! 1.  **Ingestion**: the `namedValues` map is resolved into a typed
//!     `SubmissionRecord` against the configured field list.
//! 2.  **Job Scheduling**: a `job_id` is registered as `Pending` and returned
//!     to the caller immediately.
//! 3.  **Background Processing**: the pipeline runs inside
//!     `tokio::task::spawn_blocking`, since every collaborator call (SQLite,
//!     PDF rendering, outbox writes) is blocking.
//! 4.  **Progress Reporting**: each stage the pipeline reaches is forwarded to
//!     the job controller as `JobStatus::InProgress(stage)`; the job ends as
//!     `Completed(archival path)` or `Failed(message)`.

use crate::adapters::local_document::LocalDocumentEditor;
use crate::adapters::outbox::OutboxNotifier;
use crate::adapters::pdf_export::PdfExporter;
use crate::adapters::sqlite_storage::SqliteStorage;
use crate::config::ServerConfig;
use crate::job_controller::state::{JobUpdate, JobsState};
use crate::pipeline::ReportPipeline;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use common::jobs::JobStatus;
use common::model::submission::SubmissionRecord;
use common::requests::SubmitReportRequest;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

pub(crate) async fn process(
    state: web::Data<JobsState>,
    config: web::Data<ServerConfig>,
    payload: web::Json<SubmitReportRequest>,
) -> impl Responder {
    let record =
        SubmissionRecord::from_named_values(&payload.named_values, &config.report.fields);
    let job_id = schedule_report_job(state, config.into_inner(), record).await;
    HttpResponse::Ok().json(serde_json::json!({ "job_id": job_id }))
}

async fn schedule_report_job(
    state: web::Data<JobsState>,
    config: Arc<ServerConfig>,
    record: SubmissionRecord,
) -> String {
    let job_id = Uuid::new_v4().to_string();
    state.register(&job_id).await;

    let tx = state.tx.clone();
    let job_id_for_task = job_id.clone();

    tokio::spawn(async move {
        let tx_block = tx.clone();
        let job_id_for_blocking = job_id_for_task.clone();
        let handle = tokio::task::spawn_blocking(move || {
            run_report_blocking(&tx_block, &job_id_for_blocking, &config, &record)
        });

        let status = match handle.await {
            Ok(Ok(path)) => JobStatus::Completed(path),
            Ok(Err(e)) => {
                error!("Report job {} failed: {}", job_id_for_task, e);
                JobStatus::Failed(e)
            }
            Err(e) => {
                error!("Report job {} did not finish: {}", job_id_for_task, e);
                JobStatus::Failed(format!("Task join error: {}", e))
            }
        };
        let _ = tx
            .send(JobUpdate {
                job_id: job_id_for_task,
                status,
            })
            .await;
    });

    job_id
}

/// Wires the local adapters together and runs the pipeline for one record.
/// Returns the archival path on success.
fn run_report_blocking(
    tx: &mpsc::Sender<JobUpdate>,
    job_id: &str,
    config: &ServerConfig,
    record: &SubmissionRecord,
) -> Result<String, String> {
    let storage = SqliteStorage::open(&config.database_path).map_err(|e| e.to_string())?;
    let exporter = PdfExporter::new(&config.font_dir, &config.font_family);
    let editor = LocalDocumentEditor::new(&storage, &exporter);
    let notifier = OutboxNotifier::new(&config.outbox_dir);
    let pipeline = ReportPipeline::new(&config.report, &storage, &editor, &notifier);

    let mut report_stage = |stage| {
        let _ = tx.blocking_send(JobUpdate {
            job_id: job_id.to_string(),
            status: JobStatus::InProgress(stage),
        });
    };

    let outcome = pipeline
        .process(record, Utc::now(), &mut report_stage)
        .map_err(|e| e.to_string())?;
    info!(
        "Report job {} stored '{}' and notified {}",
        job_id, outcome.archival_path, outcome.recipient
    );
    Ok(outcome.archival_path)
}
