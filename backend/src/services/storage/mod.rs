//! # Storage Service Module
//!
//! HTTP access to the SQLite-backed `FileStorage`. This is how photos get
//! into storage before a submission references them, and how stored reports
//! and photos are read back.
//!
//! ## Sub-modules:
//! - `upload`: multipart upload into a named top-level folder.
//! - `download`: returns a stored file with its MIME type.

mod download;
mod upload;

use crate::error::ReportError;
use actix_web::web::{get, post, scope};
use actix_web::{HttpResponse, Scope};
use log::error;

const API_PATH: &str = "/api/storage";

/// Configures and returns the Actix `Scope` for storage routes.
///
/// *   **`POST /upload`**: multipart with a `json` part (`UploadTarget`) followed by a
///     `file` part. Returns `{ "file_id": ..., "url": ".../open?id=<file_id>" }`.
/// *   **`GET /files/{file_id}`**: the stored file, `404` if unknown.
/// *   **`GET /open?id=<file_id>`**: same, addressed like the upload `url`.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/upload", post().to(upload::process))
        .route("/files/{file_id}", get().to(download::process))
        .route("/open", get().to(download::process_query))
}

/// Maps a storage failure onto an HTTP status.
pub(crate) fn error_response(err: &ReportError) -> HttpResponse {
    match err {
        ReportError::NotFound { .. } => HttpResponse::NotFound().body(err.to_string()),
        ReportError::PermissionDenied(_) => HttpResponse::Forbidden().body(err.to_string()),
        ReportError::MalformedInput(_) | ReportError::Serialization(_) => {
            HttpResponse::BadRequest().body(format!("Error: {}", err))
        }
        _ => {
            error!("Storage request failed: {}", err);
            HttpResponse::InternalServerError().body(format!("Error: {}", err))
        }
    }
}
