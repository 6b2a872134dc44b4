use crate::adapters::sqlite_storage::SqliteStorage;
use crate::config::ServerConfig;
use crate::error::{ReportError, ReportResult};
use crate::pipeline::capabilities::{Blob, FileStorage};
use crate::services::storage::error_response;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use common::requests::UploadTarget;
use futures_util::StreamExt;
use log::info;
use serde::Serialize;
use serde_json::from_slice;

#[derive(Debug, Serialize)]
pub struct StoredFile {
    pub file_id: String,
    pub url: String,
}

/// HTTP handler wrapper that converts the upload result to an `HttpResponse`.
pub(crate) async fn process(payload: Multipart, config: web::Data<ServerConfig>) -> impl Responder {
    match upload_file(payload, config).await {
        Ok(stored) => HttpResponse::Ok().json(stored),
        Err(e) => error_response(&e),
    }
}

/// Reads the `json` target part and the `file` part, then stores the file.
async fn upload_file(
    mut payload: Multipart,
    config: web::Data<ServerConfig>,
) -> ReportResult<StoredFile> {
    let malformed = |e: actix_multipart::MultipartError| ReportError::MalformedInput(e.to_string());

    let mut target: Option<UploadTarget> = None;
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(malformed)?;
        let part_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match part_name.as_deref() {
            Some("json") => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    bytes.extend_from_slice(&chunk.map_err(malformed)?);
                }
                target = Some(from_slice(&bytes)?);
            }
            Some("file") => {
                if target.is_none() {
                    return Err(ReportError::MalformedInput(
                        "UploadTarget JSON must be sent before the file".into(),
                    ));
                }
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    bytes.extend_from_slice(&chunk.map_err(malformed)?);
                }
                upload = Some((filename, bytes));
            }
            _ => {}
        }
    }

    let target = target.ok_or_else(|| ReportError::MalformedInput("Missing UploadTarget".into()))?;
    let (filename, bytes) =
        upload.ok_or_else(|| ReportError::MalformedInput("Missing file".into()))?;

    let database_path = config.database_path.clone();
    web::block(move || {
        let storage = SqliteStorage::open(&database_path)?;
        store_upload(&storage, &target, &filename, bytes)
    })
    .await
    .map_err(|e| ReportError::Io(std::io::Error::other(e.to_string())))?
}

/// Stores `bytes` as `filename` in the top-level folder `target.folder`.
///
/// A missing folder is created and, when `target.read_only` is set, locked
/// after the file lands in it. An existing read-only folder rejects the upload.
pub(crate) fn store_upload(
    storage: &SqliteStorage,
    target: &UploadTarget,
    filename: &str,
    bytes: Vec<u8>,
) -> ReportResult<StoredFile> {
    if target.folder.trim().is_empty() {
        return Err(ReportError::MalformedInput("upload folder name is empty".into()));
    }
    let name = if filename.is_empty() { "upload" } else { filename };

    let (folder, created) = storage.find_or_create_top_level_folder(&target.folder)?;

    // Empty MIME type: the storage guesses it from the file name.
    let file_id = storage.create_file(&folder, &Blob::new(name, "", bytes))?;
    if created && target.read_only {
        storage.set_read_only(&folder, true)?;
    }

    info!("Stored upload '{}' in '{}' as {}", name, target.folder, file_id);
    Ok(StoredFile {
        url: format!("{}/open?id={}", super::API_PATH, file_id),
        file_id: file_id.0,
    })
}
