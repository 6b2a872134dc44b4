use crate::adapters::sqlite_storage::SqliteStorage;
use crate::config::ServerConfig;
use crate::error::{ReportError, ReportResult};
use crate::pipeline::capabilities::{Blob, FileId, FileStorage};
use crate::services::storage::error_response;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct OpenQuery {
    id: String,
}

pub(crate) async fn process(
    file_id: web::Path<String>,
    config: web::Data<ServerConfig>,
) -> impl Responder {
    respond(file_id.into_inner(), config).await
}

pub(crate) async fn process_query(
    query: web::Query<OpenQuery>,
    config: web::Data<ServerConfig>,
) -> impl Responder {
    respond(query.into_inner().id, config).await
}

async fn respond(file_id: String, config: web::Data<ServerConfig>) -> HttpResponse {
    let database_path = config.database_path.clone();
    let result: ReportResult<Blob> = web::block(move || {
        let storage = SqliteStorage::open(&database_path)?;
        storage.get_file(&FileId(file_id))
    })
    .await
    .unwrap_or_else(|e| Err(ReportError::Io(std::io::Error::other(e.to_string()))));

    match result {
        Ok(blob) => HttpResponse::Ok()
            .content_type(blob.mime_type)
            .insert_header(ContentDisposition {
                disposition: DispositionType::Inline,
                parameters: vec![DispositionParam::Filename(blob.name)],
            })
            .body(blob.bytes),
        Err(e) => error_response(&e),
    }
}
