//! # Report Service Module
//!
//! HTTP entry points of the report pipeline.
//!
//! ## Sub-modules:
//! - `submit`: accepts a form submission and runs the pipeline as a background job.
//! - `status`: reports the progress of such a job.

mod status;
mod submit;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/reports";

/// Configures and returns the Actix `Scope` for report routes.
///
/// *   **`POST /submit`**: body `{ "namedValues": { question: value | [values] } }`.
///     Returns `{ "job_id": ... }` at once; the report is produced in the background.
/// *   **`GET /status/{job_id}`**: the job's `JobStatus`, or `404` for an unknown id.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/submit", post().to(submit::process))
        .route("/status/{job_id}", get().to(status::process))
}
